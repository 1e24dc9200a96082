//! Regions colored by a data value.


use super::{hue_scale, open_axes, polygons_extent, with_alpha, PlotOptions, DEFAULT_EDGECOLOR};
use crate::canvas::Axes;
use crate::error::{GeotourError, Result};
use crate::frame::GeoFrame;
use crate::logging::log_fallible_operation;

/// Fill every region with the color of its hue bucket.
///
/// `opts.hue` is required. Values are split into `opts.k` buckets (or
/// colored continuously when `k` is `None`); rows without a value use the
/// no-data color.
pub fn choropleth(frame: &GeoFrame, opts: &PlotOptions, ax: Option<Axes>) -> Result<Axes> {
    let details = format!("{} rows", frame.len());
    log_fallible_operation("choropleth", Some(&details), || draw(frame, opts, ax))
}

fn draw(frame: &GeoFrame, opts: &PlotOptions, ax: Option<Axes>) -> Result<Axes> {
    let scale = hue_scale(frame, opts)?.ok_or_else(|| {
        GeotourError::invalid("hue", "a choropleth needs a hue column or series")
    })?;

    let mut ax = open_axes(frame, opts, ax)?;
    let projection = ax.projection().clone();

    let shapes: Vec<_> = frame
        .polygons_per_record()
        .iter()
        .map(|polys| {
            polys
                .iter()
                .filter_map(|p| projection.project_polygon(p))
                .collect::<Vec<_>>()
        })
        .collect();

    ax.fit(polygons_extent(shapes.iter().flatten()))?;

    let edge = opts.edge(Some(DEFAULT_EDGECOLOR))?;
    {
        let mut painter = ax.painter(opts.zorder)?;
        for (row, polys) in shapes.iter().enumerate() {
            let color = with_alpha(scale.color(row), opts.alpha);
            for shape in polys {
                painter.fill_polygon(shape, color);
                if let Some(edge) = edge {
                    painter.stroke_polygon(shape, edge, opts.linewidth);
                }
            }
        }
    }

    if opts.legend {
        ax.set_legend(scale.legend().clone());
    }

    Ok(ax)
}
