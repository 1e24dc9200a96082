//! Common test utilities for geotour.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod assertions;
pub mod image_utils;
pub mod test_data;
