//! Kernel density heatmaps of point data.

use geo::{Coord, Polygon, Rect};
use tracing::debug;

use super::{open_axes, polygons_extent, with_alpha, PlotOptions};
use crate::canvas::Axes;
use crate::colormaps::{bucket_palette, get_colormap};
use crate::error::{GeotourError, Result};
use crate::frame::GeoFrame;
use crate::kde::{estimate, scott_bandwidth};
use crate::logging::log_fallible_operation;

/// Padding around the points, in bandwidths, when no clip bounds the grid
const EXTENT_PADDING: f64 = 3.0;

/// Density-specific parameters
#[derive(Debug, Clone, PartialEq)]
pub struct KdeOptions {
    /// Fill levels instead of drawing contour lines
    pub shade: bool,
    pub n_levels: usize,
    /// Also fill the lowest level (the background of the density)
    pub shade_lowest: bool,
    /// Kernel bandwidth in projected units; Scott's rule when unset
    pub bandwidth: Option<(f64, f64)>,
    /// Grid cells along the longer side
    pub gridsize: usize,
}

impl Default for KdeOptions {
    fn default() -> Self {
        Self {
            shade: false,
            n_levels: 10,
            shade_lowest: true,
            bandwidth: None,
            gridsize: 100,
        }
    }
}

impl KdeOptions {
    pub fn shade(mut self, shade: bool) -> Self {
        self.shade = shade;
        self
    }

    pub fn n_levels(mut self, n_levels: usize) -> Self {
        self.n_levels = n_levels;
        self
    }

    pub fn shade_lowest(mut self, shade_lowest: bool) -> Self {
        self.shade_lowest = shade_lowest;
        self
    }

    pub fn bandwidth(mut self, bandwidth: (f64, f64)) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    pub fn gridsize(mut self, gridsize: usize) -> Self {
        self.gridsize = gridsize;
        self
    }
}

/// Estimate the density of the frame's points and draw it as filled levels
/// or level boundaries. With `opts.clip`, the grid covers the clip geometry
/// and nothing is drawn outside it.
pub fn kdeplot(
    frame: &GeoFrame,
    kde_opts: &KdeOptions,
    opts: &PlotOptions,
    ax: Option<Axes>,
) -> Result<Axes> {
    let details = format!("{} rows", frame.len());
    log_fallible_operation("kdeplot", Some(&details), || draw(frame, kde_opts, opts, ax))
}

fn draw(
    frame: &GeoFrame,
    kde_opts: &KdeOptions,
    opts: &PlotOptions,
    ax: Option<Axes>,
) -> Result<Axes> {
    if kde_opts.n_levels == 0 {
        return Err(GeotourError::invalid("n_levels", "need at least one level"));
    }

    let mut ax = open_axes(frame, opts, ax)?;
    let projection = ax.projection().clone();

    let points: Vec<(f64, f64)> = frame
        .points()
        .iter()
        .filter_map(|(_, p)| projection.project(p.x(), p.y()))
        .collect();
    if points.is_empty() {
        return Err(GeotourError::EmptyInput {
            message: "no visible points to estimate a density from".to_string(),
        });
    }

    let bandwidth = match kde_opts.bandwidth.or_else(|| scott_bandwidth(&points)) {
        Some((hx, hy)) if hx > 0.0 && hy > 0.0 => (hx, hy),
        _ => {
            return Err(GeotourError::invalid(
                "bandwidth",
                "points have zero spread along an axis; set a bandwidth explicitly",
            ))
        }
    };

    let clip: Vec<Polygon<f64>> = opts
        .clip
        .as_ref()
        .map(|clip| projection.project_multipolygon(clip).0)
        .unwrap_or_default();

    let extent = match polygons_extent(&clip) {
        Some(extent) => extent,
        None => padded_extent(&points, bandwidth),
    };
    ax.fit(Some(extent))?;

    let (cols, rows) = grid_shape(extent, kde_opts.gridsize);
    debug!(cols, rows, hx = bandwidth.0, hy = bandwidth.1, "Density grid");
    let grid = estimate(&points, extent, cols, rows, bandwidth)?;
    let levels = grid.levels(kde_opts.n_levels);

    let cmap = get_colormap(&opts.cmap)?;
    let palette: Vec<[u8; 4]> = bucket_palette(kde_opts.n_levels, cmap.as_ref())
        .into_iter()
        .map(|c| with_alpha(c, opts.alpha))
        .collect();

    let mut painter = ax.painter(opts.zorder)?;
    if kde_opts.shade {
        for ((row, col), &level) in levels.indexed_iter() {
            if level == 0 && !kde_opts.shade_lowest {
                continue;
            }
            painter.fill_polygon(&grid.cell_rect(row, col).to_polygon(), palette[level]);
        }
    } else {
        // Level boundaries run along the shared cell edges
        for ((row, col), &level) in levels.indexed_iter() {
            let cell = grid.cell_rect(row, col);
            let (min, max) = (cell.min(), cell.max());
            if col + 1 < cols {
                let right = levels[[row, col + 1]];
                if right != level {
                    let color = palette[level.max(right)];
                    painter.stroke_projected_segment((max.x, min.y), (max.x, max.y), color, opts.linewidth);
                }
            }
            if row + 1 < rows {
                let above = levels[[row + 1, col]];
                if above != level {
                    let color = palette[level.max(above)];
                    painter.stroke_projected_segment((min.x, max.y), (max.x, max.y), color, opts.linewidth);
                }
            }
        }
    }
    if !clip.is_empty() {
        painter.clip_to(&clip);
    }
    drop(painter);

    Ok(ax)
}

fn padded_extent(points: &[(f64, f64)], bandwidth: (f64, f64)) -> Rect<f64> {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    let (px, py) = (EXTENT_PADDING * bandwidth.0, EXTENT_PADDING * bandwidth.1);
    Rect::new(
        Coord { x: min_x - px, y: min_y - py },
        Coord { x: max_x + px, y: max_y + py },
    )
}

/// Columns and rows giving roughly square cells, `gridsize` along the
/// longer side
fn grid_shape(extent: Rect<f64>, gridsize: usize) -> (usize, usize) {
    let n = gridsize.max(1);
    let (w, h) = (extent.width(), extent.height());
    if !(w > 0.0 && h > 0.0) {
        return (n, n);
    }
    let short = |ratio: f64| ((n as f64 * ratio).round() as usize).max(1);
    if w >= h {
        (n, short(h / w))
    } else {
        (short(w / h), n)
    }
}
