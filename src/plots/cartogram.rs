//! Regions resized by a data value.

use geo::{Centroid, MultiPolygon, Polygon, Scale};

use super::{hue_scale, open_axes, polygons_extent, with_alpha, PlotOptions, DEFAULT_EDGECOLOR};
use crate::canvas::Axes;
use crate::colormaps::parse_color;
use crate::error::{GeotourError, Result};
use crate::frame::GeoFrame;
use crate::logging::log_fallible_operation;

/// Face color when neither hue nor facecolor is given
const DEFAULT_FACECOLOR: [u8; 4] = [31, 119, 180, 255];

/// Cartogram-specific parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CartogramOptions {
    /// Numeric column driving the size of each region
    pub scale: String,
    /// Scale factors given to the smallest and largest value
    pub limits: (f64, f64),
    /// Also draw the unscaled outlines
    pub trace: bool,
    pub trace_color: String,
}

impl CartogramOptions {
    pub fn new(scale: &str) -> Self {
        Self {
            scale: scale.to_string(),
            limits: (0.2, 1.0),
            trace: false,
            trace_color: "lightgray".to_string(),
        }
    }

    pub fn limits(mut self, low: f64, high: f64) -> Self {
        self.limits = (low, high);
        self
    }

    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    fn validate(&self) -> Result<()> {
        let (low, high) = self.limits;
        if !(low.is_finite() && high.is_finite() && low >= 0.0 && low <= high) {
            return Err(GeotourError::invalid(
                "limits",
                format!("limits must satisfy 0 <= low <= high, got ({}, {})", low, high),
            ));
        }
        Ok(())
    }
}

/// Scale factor of every value, interpolated linearly between `limits`.
/// Missing values have no factor.
pub fn scale_factors(values: &[Option<f64>], limits: (f64, f64)) -> Vec<Option<f64>> {
    let finite = values.iter().flatten().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (low, high) = limits;

    values
        .iter()
        .map(|v| match v {
            Some(v) if v.is_finite() => Some(if max > min {
                low + (v - min) / (max - min) * (high - low)
            } else {
                high
            }),
            _ => None,
        })
        .collect()
}

/// Shrink each region about its centroid in proportion to `scale`.
///
/// The view covers the unscaled regions so overlays of the same
/// geometry line up.
pub fn cartogram(
    frame: &GeoFrame,
    cartogram_opts: &CartogramOptions,
    opts: &PlotOptions,
    ax: Option<Axes>,
) -> Result<Axes> {
    let details = format!("{} rows, scale={}", frame.len(), cartogram_opts.scale);
    log_fallible_operation("cartogram", Some(&details), || draw(frame, cartogram_opts, opts, ax))
}

fn draw(
    frame: &GeoFrame,
    cartogram_opts: &CartogramOptions,
    opts: &PlotOptions,
    ax: Option<Axes>,
) -> Result<Axes> {
    cartogram_opts.validate()?;

    let factors = scale_factors(&frame.column(&cartogram_opts.scale)?, cartogram_opts.limits);
    let scale = hue_scale(frame, opts)?;

    let mut ax = open_axes(frame, opts, ax)?;
    let projection = ax.projection().clone();

    let unscaled: Vec<Vec<Polygon<f64>>> = frame.polygons_per_record();
    let projected_unscaled: Vec<Polygon<f64>> = unscaled
        .iter()
        .flatten()
        .filter_map(|p| projection.project_polygon(p))
        .collect();
    ax.fit(polygons_extent(&projected_unscaled))?;

    let edge = opts.edge(Some(DEFAULT_EDGECOLOR))?;
    let face = opts.face(Some(DEFAULT_FACECOLOR))?;
    let trace_color = if cartogram_opts.trace {
        parse_color(&cartogram_opts.trace_color)?
    } else {
        None
    };

    let mut painter = ax.painter(opts.zorder)?;

    if let Some(trace_color) = trace_color {
        for shape in &projected_unscaled {
            painter.stroke_polygon(shape, trace_color, opts.linewidth);
        }
    }

    for (row, (polys, factor)) in unscaled.iter().zip(&factors).enumerate() {
        let Some(factor) = factor else {
            continue;
        };
        let region = MultiPolygon::new(polys.clone());
        let Some(center) = region.centroid() else {
            continue;
        };
        let scaled = region.scale_around_point(*factor, *factor, center);

        let fill = match &scale {
            Some(scale) => Some(with_alpha(scale.color(row), opts.alpha)),
            None => face,
        };
        for shape in scaled.iter().filter_map(|p| projection.project_polygon(p)) {
            if let Some(fill) = fill {
                painter.fill_polygon(&shape, fill);
            }
            if let Some(edge) = edge {
                painter.stroke_polygon(&shape, edge, opts.linewidth);
            }
        }
    }
    drop(painter);

    if opts.legend {
        if let Some(scale) = &scale {
            ax.set_legend(scale.legend().clone());
        }
    }

    Ok(ax)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Record;
    use geo::{polygon, Geometry};
    use serde_json::{json, Map, Value};

    fn regions() -> GeoFrame {
        let records = [(0.0, 10.0), (20.0, 40.0)]
            .iter()
            .map(|&(x, pop)| {
                let properties = match json!({ "pop_est": pop }) {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                Record {
                    geometry: Geometry::Polygon(polygon![
                        (x: x, y: 0.0), (x: x + 10.0, y: 0.0), (x: x + 10.0, y: 10.0), (x: x, y: 10.0)
                    ]),
                    properties,
                }
            })
            .collect();
        GeoFrame::new(records)
    }

    #[test]
    fn test_scale_factors() {
        let factors = scale_factors(&[Some(10.0), None, Some(40.0), Some(25.0)], (0.2, 1.0));
        assert_eq!(factors[0], Some(0.2));
        assert_eq!(factors[1], None);
        assert_eq!(factors[2], Some(1.0));
        assert!((factors[3].unwrap() - 0.6).abs() < 1e-12);

        assert_eq!(scale_factors(&[Some(3.0)], (0.2, 1.0)), vec![Some(1.0)]);
    }

    #[test]
    fn test_invalid_limits() {
        let opts = CartogramOptions::new("pop_est").limits(1.0, 0.5);
        assert!(cartogram(&regions(), &opts, &PlotOptions::default(), None).is_err());
    }

    #[test]
    fn test_small_regions_shrink() {
        let opts = PlotOptions::default()
            .figsize(3.0, 1.0)
            .facecolor("red")
            .edgecolor("None");
        let ax = cartogram(&regions(), &CartogramOptions::new("pop_est"), &opts, None).unwrap();
        let t = ax.transform().unwrap();
        let img = ax.render();

        // The low-population square is shrunk to 20% about its center
        let (cx, cy) = t.apply(5.0, 5.0);
        let (corner_x, corner_y) = t.apply(1.0, 1.0);
        assert_eq!(img.get_pixel(cx as u32, cy as u32).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(corner_x as u32, corner_y as u32).0, [255, 255, 255, 255]);

        // The largest keeps its full size
        let (bx, by) = t.apply(21.0, 1.0);
        assert_eq!(img.get_pixel(bx as u32, by as u32).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_trace_draws_unscaled_outlines() {
        let opts = PlotOptions::default()
            .figsize(3.0, 1.0)
            .facecolor("red")
            .edgecolor("None");
        let left_edge = |ax: &Axes| {
            let (ex, ey) = ax.transform().unwrap().apply(0.0, 5.0);
            ax.render().get_pixel(ex.round() as u32, ey as u32).0
        };

        let plain = cartogram(&regions(), &CartogramOptions::new("pop_est"), &opts, None).unwrap();
        assert_eq!(left_edge(&plain), [255, 255, 255, 255]);

        let traced = CartogramOptions::new("pop_est").trace(true);
        let ax = cartogram(&regions(), &traced, &opts, None).unwrap();
        // lightgray
        assert_eq!(left_edge(&ax), [211, 211, 211, 255]);
        // The shrunken region is still filled on top
        let (cx, cy) = ax.transform().unwrap().apply(5.0, 5.0);
        assert_eq!(ax.render().get_pixel(cx as u32, cy as u32).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_unknown_scale_column() {
        let opts = CartogramOptions::new("nope");
        assert!(cartogram(&regions(), &opts, &PlotOptions::default(), None).is_err());
    }
}
