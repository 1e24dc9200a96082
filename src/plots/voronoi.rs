//! Voronoi tessellation of point data.

use geo::{Coord, Polygon, Rect};
use std::collections::HashMap;
use tracing::debug;

use super::{open_axes, points_extent, polygons_extent, with_alpha, PlotOptions, DEFAULT_EDGECOLOR};
use crate::canvas::Axes;
use crate::colormaps::{get_colormap, HueScale};
use crate::error::{GeotourError, Result};
use crate::frame::GeoFrame;
use crate::logging::log_fallible_operation;
use crate::tessellation::voronoi_cells;

/// Share of the point spread added around the points when nothing else
/// bounds the cells
const BOUNDS_PADDING: f64 = 0.05;

/// A distinct projected location and the rows found there
struct Site {
    location: (f64, f64),
    rows: Vec<usize>,
}

/// Split the plane into the cells closest to each point and draw them.
///
/// Cells are bounded by the clip geometry when given, otherwise by the
/// padded extent of the points. Rows sharing a location share one cell,
/// colored by the mean of their hue values.
pub fn voronoi(frame: &GeoFrame, opts: &PlotOptions, ax: Option<Axes>) -> Result<Axes> {
    let details = format!("{} rows", frame.len());
    log_fallible_operation("voronoi", Some(&details), || draw(frame, opts, ax))
}

fn draw(frame: &GeoFrame, opts: &PlotOptions, ax: Option<Axes>) -> Result<Axes> {
    let hue = match &opts.hue {
        Some(hue) => Some(hue.resolve(frame)?),
        None => None,
    };

    let mut ax = open_axes(frame, opts, ax)?;
    let projection = ax.projection().clone();

    let sites = group_sites(
        frame
            .points()
            .into_iter()
            .filter_map(|(row, p)| projection.project(p.x(), p.y()).map(|xy| (row, xy))),
    );
    if sites.is_empty() {
        return Err(GeotourError::EmptyInput {
            message: "no visible points to tessellate".to_string(),
        });
    }
    let seeds: Vec<(f64, f64)> = sites.iter().map(|s| s.location).collect();
    debug!(rows = frame.len(), sites = seeds.len(), "Grouped coincident points");

    let clip: Vec<Polygon<f64>> = opts
        .clip
        .as_ref()
        .map(|clip| projection.project_multipolygon(clip).0)
        .unwrap_or_default();

    let bounds = match polygons_extent(&clip) {
        Some(extent) => extent,
        None => padded_bounds(&seeds)?,
    };
    ax.fit(Some(bounds))?;

    let cells = voronoi_cells(&seeds, bounds)?;

    let scale = match &hue {
        Some(values) => {
            let cell_hues: Vec<Option<f64>> =
                sites.iter().map(|s| mean_hue(values, &s.rows)).collect();
            let cmap = get_colormap(&opts.cmap)?;
            Some(HueScale::new(&cell_hues, opts.classifier()?, cmap.as_ref())?)
        }
        None => None,
    };
    let face = opts.face(None)?;
    let edge = opts.edge(Some(DEFAULT_EDGECOLOR))?;

    let mut painter = ax.painter(opts.zorder)?;
    for (i, cell) in cells.iter().enumerate() {
        let fill = match &scale {
            Some(scale) => Some(with_alpha(scale.color(i), opts.alpha)),
            None => face,
        };
        if let Some(fill) = fill {
            painter.fill_polygon(cell, fill);
        }
        if let Some(edge) = edge {
            painter.stroke_polygon(cell, edge, opts.linewidth);
        }
    }
    if !clip.is_empty() {
        painter.clip_to(&clip);
    }
    drop(painter);

    if opts.legend {
        if let Some(scale) = &scale {
            ax.set_legend(scale.legend().clone());
        }
    }

    Ok(ax)
}

/// Group rows by identical location, keeping first-seen order
fn group_sites<I>(points: I) -> Vec<Site>
where
    I: IntoIterator<Item = (usize, (f64, f64))>,
{
    let mut index: HashMap<(u64, u64), usize> = HashMap::new();
    let mut sites: Vec<Site> = Vec::new();
    for (row, (x, y)) in points {
        // -0.0 and 0.0 are the same place
        let key = ((x + 0.0).to_bits(), (y + 0.0).to_bits());
        match index.get(&key) {
            Some(&i) => sites[i].rows.push(row),
            None => {
                index.insert(key, sites.len());
                sites.push(Site {
                    location: (x, y),
                    rows: vec![row],
                });
            }
        }
    }
    sites
}

fn mean_hue(values: &[Option<f64>], rows: &[usize]) -> Option<f64> {
    let present: Vec<f64> = rows
        .iter()
        .filter_map(|&row| values.get(row).copied().flatten())
        .filter(|v| v.is_finite())
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

fn padded_bounds(seeds: &[(f64, f64)]) -> Result<Rect<f64>> {
    let extent = points_extent(seeds).ok_or_else(|| GeotourError::EmptyInput {
        message: "no points to bound".to_string(),
    })?;
    let pad = |span: f64| if span > 0.0 { span * BOUNDS_PADDING } else { 0.5 };
    let (px, py) = (pad(extent.width()), pad(extent.height()));
    Ok(Rect::new(
        Coord {
            x: extent.min().x - px,
            y: extent.min().y - py,
        },
        Coord {
            x: extent.max().x + px,
            y: extent.max().y + py,
        },
    ))
}
