//! # geotour
//!
//! Geospatial plots rendered straight to images.
//!
//! Datasets are read from GeoJSON into [`GeoFrame`]s, which the calls in
//! [`plots`] draw onto layered [`Axes`] through a map [`Projection`]. The
//! [`tour`] module strings them together into a short guided tour.
//!
//! ## Plots
//!
//! - **polyplot**: outlines (and optional fills) of the geometry
//! - **choropleth**: regions colored by a classified value
//! - **cartogram**: regions shrunk in proportion to a value
//! - **kdeplot**: kernel density of point data, shaded or as level lines
//! - **voronoi**: the plane split around points, colored by a value
//!
//! Every plot takes the axes of an earlier one to draw on top of it.

pub mod canvas;
pub mod colormaps;
pub mod config;
pub mod datasets;
pub mod error;
pub mod frame;
pub mod kde;
pub mod logging;
pub mod plots;
pub mod projection;
pub mod tessellation;
pub mod tour;

pub use canvas::Axes;
pub use config::Config;
pub use error::{GeotourError, Result};
pub use frame::{GeoFrame, Record};
pub use logging::{
    generate_run_id, init_tracing, log_dataset_load_stats, log_error, log_fallible_operation,
    log_operation_end, log_operation_start, log_timed_operation,
};
pub use plots::{CartogramOptions, Hue, KdeOptions, PlotOptions, Scheme};
pub use projection::Projection;
pub use tour::{run_tour, TourReport};
