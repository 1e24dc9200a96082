//! Plain geometry plot: polygon outlines, optionally filled.

use geo::{Geometry, Polygon};

use super::{open_axes, points_extent, polygons_extent, union_extent, PlotOptions, DEFAULT_EDGECOLOR};
use crate::canvas::Axes;
use crate::error::Result;
use crate::frame::GeoFrame;
use crate::logging::log_fallible_operation;

const MARKER_RADIUS: i32 = 2;

/// Draw the frame's geometry.
///
/// Polygons get an edge (black unless `edgecolor` says otherwise) and a face
/// only when `facecolor` is set. Point geometries are drawn as small
/// markers.
pub fn polyplot(frame: &GeoFrame, opts: &PlotOptions, ax: Option<Axes>) -> Result<Axes> {
    let details = format!("{} rows", frame.len());
    log_fallible_operation("polyplot", Some(&details), || draw(frame, opts, ax))
}

fn draw(frame: &GeoFrame, opts: &PlotOptions, ax: Option<Axes>) -> Result<Axes> {
    let mut ax = open_axes(frame, opts, ax)?;
    let projection = ax.projection().clone();

    let shapes: Vec<Polygon<f64>> = frame
        .polygons()
        .iter()
        .filter_map(|p| projection.project_polygon(p))
        .collect();

    let markers: Vec<(f64, f64)> = frame
        .records()
        .iter()
        .flat_map(|r| match &r.geometry {
            Geometry::Point(p) => vec![*p],
            Geometry::MultiPoint(mp) => mp.0.clone(),
            _ => Vec::new(),
        })
        .filter_map(|p| projection.project(p.x(), p.y()))
        .collect();

    ax.fit(union_extent(polygons_extent(&shapes), points_extent(&markers)))?;

    let edge = opts.edge(Some(DEFAULT_EDGECOLOR))?;
    let face = opts.face(None)?;

    let mut painter = ax.painter(opts.zorder)?;
    for shape in &shapes {
        if let Some(face) = face {
            painter.fill_polygon(shape, face);
        }
        if let Some(edge) = edge {
            painter.stroke_polygon(shape, edge, opts.linewidth);
        }
    }
    if let Some(color) = face.or(edge) {
        for &(x, y) in &markers {
            painter.fill_point(x, y, MARKER_RADIUS, color);
        }
    }

    Ok(ax)
}
