//! Voronoi tessellation by half-plane clipping.
//!
//! Each cell starts as the bounding rectangle and is cut by the bisector
//! with every neighbor that can still reach it. Neighbors come from an
//! R-tree in order of distance, so the loop stops as soon as the next seed
//! is more than twice the cell's radius away.

use geo::{Coord, LineString, Polygon, Rect};
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::error::{GeotourError, Result};

type Seed = GeomWithData<[f64; 2], usize>;

/// Voronoi cell of every seed, bounded by `bounds`, in seed order.
///
/// Seeds must be distinct; a seed outside `bounds` gets whatever part of
/// its cell falls inside (possibly an empty polygon).
pub fn voronoi_cells(seeds: &[(f64, f64)], bounds: Rect<f64>) -> Result<Vec<Polygon<f64>>> {
    if seeds.is_empty() {
        return Err(GeotourError::EmptyInput {
            message: "tessellation needs at least one point".to_string(),
        });
    }

    let tree = RTree::bulk_load(
        seeds
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Seed::new([x, y], i))
            .collect(),
    );

    let cells = seeds
        .par_iter()
        .enumerate()
        .map(|(i, &(x, y))| {
            let mut cell = rect_ring(bounds);
            for neighbor in tree.nearest_neighbor_iter(&[x, y]) {
                if neighbor.data == i {
                    continue;
                }
                let [nx, ny] = *neighbor.geom();
                let distance = ((nx - x).powi(2) + (ny - y).powi(2)).sqrt();
                if distance > 2.0 * max_radius(&cell, (x, y)) {
                    break;
                }
                cell = clip_half_plane(&cell, (x, y), (nx, ny));
                if cell.is_empty() {
                    break;
                }
            }
            to_polygon(cell)
        })
        .collect();

    Ok(cells)
}

fn rect_ring(bounds: Rect<f64>) -> Vec<(f64, f64)> {
    let (min, max) = (bounds.min(), bounds.max());
    vec![(min.x, min.y), (max.x, min.y), (max.x, max.y), (min.x, max.y)]
}

fn max_radius(cell: &[(f64, f64)], center: (f64, f64)) -> f64 {
    cell.iter()
        .map(|(x, y)| ((x - center.0).powi(2) + (y - center.1).powi(2)).sqrt())
        .fold(0.0, f64::max)
}

/// Keep the part of convex `cell` closer to `site` than to `other`
/// (Sutherland-Hodgman against the perpendicular bisector).
pub fn clip_half_plane(
    cell: &[(f64, f64)],
    site: (f64, f64),
    other: (f64, f64),
) -> Vec<(f64, f64)> {
    let normal = (other.0 - site.0, other.1 - site.1);
    let mid = ((site.0 + other.0) / 2.0, (site.1 + other.1) / 2.0);
    // <= 0 inside
    let side = |p: (f64, f64)| (p.0 - mid.0) * normal.0 + (p.1 - mid.1) * normal.1;

    let mut out = Vec::with_capacity(cell.len() + 1);
    for i in 0..cell.len() {
        let current = cell[i];
        let next = cell[(i + 1) % cell.len()];
        let (sc, sn) = (side(current), side(next));

        if sc <= 0.0 {
            out.push(current);
        }
        if (sc <= 0.0) != (sn <= 0.0) {
            let t = sc / (sc - sn);
            out.push((
                current.0 + t * (next.0 - current.0),
                current.1 + t * (next.1 - current.1),
            ));
        }
    }
    out
}

fn to_polygon(cell: Vec<(f64, f64)>) -> Polygon<f64> {
    let mut coords: Vec<Coord<f64>> = cell.into_iter().map(|(x, y)| Coord { x, y }).collect();
    if coords.len() < 3 {
        coords.clear();
    }
    // LineString closes itself in Polygon::new
    Polygon::new(LineString::new(coords), vec![])
}
