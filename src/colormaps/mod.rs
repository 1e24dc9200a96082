//! Colormaps and hue classification for map rendering.
//!
//! This module provides matplotlib-style named colormaps and the bucketing
//! used by choropleths and tessellations.

pub mod classify;
pub mod colormap;

pub use classify::{bin_edges, bin_of, bucket_palette, classify, Classifier, HueScale, Legend};
pub use colormap::{get_colormap, parse_color, Colormap, NO_DATA_COLOR};
