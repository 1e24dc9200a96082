//! Two-dimensional Gaussian kernel density estimation on a regular grid.

use geo::{Coord, Rect};
use ndarray::Array2;
use rayon::prelude::*;

use crate::error::{GeotourError, Result};

/// Kernel contributions beyond this many bandwidths are ignored
const KERNEL_CUTOFF: f64 = 4.0;

/// Density values sampled at cell centers of a grid over `extent`
#[derive(Debug, Clone)]
pub struct DensityGrid {
    /// Row-major, row 0 at the bottom (lowest y)
    pub values: Array2<f64>,
    pub extent: Rect<f64>,
}

impl DensityGrid {
    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Rectangle covered by cell (`row`, `col`)
    pub fn cell_rect(&self, row: usize, col: usize) -> Rect<f64> {
        let dx = self.extent.width() / self.cols() as f64;
        let dy = self.extent.height() / self.rows() as f64;
        let x0 = self.extent.min().x + col as f64 * dx;
        let y0 = self.extent.min().y + row as f64 * dy;
        Rect::new(Coord { x: x0, y: y0 }, Coord { x: x0 + dx, y: y0 + dy })
    }

    /// Cut the density into `n_levels` equal-width levels from zero to the
    /// maximum. Level 0 holds the lowest densities.
    pub fn levels(&self, n_levels: usize) -> Array2<usize> {
        let max = self.max();
        let n = n_levels.max(1);
        self.values.mapv(|v| {
            if max <= 0.0 {
                0
            } else {
                ((v / max * n as f64).floor() as usize).min(n - 1)
            }
        })
    }
}

/// Per-axis bandwidth by Scott's rule: `sigma * n^(-1/6)`
pub fn scott_bandwidth(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let factor = (n as f64).powf(-1.0 / 6.0);
    let (sx, sy) = std_dev(points);
    Some((sx * factor, sy * factor))
}

fn std_dev(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let (mx, my) = points
        .iter()
        .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
    let (mx, my) = (mx / n, my / n);
    let (vx, vy) = points.iter().fold((0.0, 0.0), |(ax, ay), (x, y)| {
        (ax + (x - mx).powi(2), ay + (y - my).powi(2))
    });
    ((vx / (n - 1.0)).sqrt(), (vy / (n - 1.0)).sqrt())
}

/// Evaluate a product Gaussian kernel density over a `cols` x `rows` grid
/// covering `extent`. Rows are computed in parallel.
pub fn estimate(
    points: &[(f64, f64)],
    extent: Rect<f64>,
    cols: usize,
    rows: usize,
    bandwidth: (f64, f64),
) -> Result<DensityGrid> {
    if points.is_empty() {
        return Err(GeotourError::EmptyInput {
            message: "density estimate needs at least one point".to_string(),
        });
    }
    if cols == 0 || rows == 0 {
        return Err(GeotourError::invalid("gridsize", "grid must have at least one cell"));
    }
    let (hx, hy) = bandwidth;
    if !(hx > 0.0 && hy > 0.0) {
        return Err(GeotourError::invalid(
            "bandwidth",
            format!("bandwidth must be positive, got ({}, {})", hx, hy),
        ));
    }

    let dx = extent.width() / cols as f64;
    let dy = extent.height() / rows as f64;
    let min = extent.min();
    let norm = 1.0 / (2.0 * std::f64::consts::PI * hx * hy * points.len() as f64);

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map_iter(|row| {
            let y = min.y + (row as f64 + 0.5) * dy;
            (0..cols).map(move |col| {
                let x = min.x + (col as f64 + 0.5) * dx;
                let sum: f64 = points
                    .iter()
                    .filter_map(|(px, py)| {
                        let u = (x - px) / hx;
                        let v = (y - py) / hy;
                        if u.abs() > KERNEL_CUTOFF || v.abs() > KERNEL_CUTOFF {
                            None
                        } else {
                            Some((-0.5 * (u * u + v * v)).exp())
                        }
                    })
                    .sum();
                sum * norm
            })
        })
        .collect();

    let values = Array2::from_shape_vec((rows, cols), data).map_err(|e| {
        GeotourError::ImageGeneration {
            message: format!("density grid shape: {}", e),
        }
    })?;

    Ok(DensityGrid { values, extent })
}
