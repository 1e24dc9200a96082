//! Colormap trait and utilities.
//!
//! This module defines the common interface for all colormaps and the
//! named gradient presets behind it.

use colorgrad::Gradient;

use crate::error::{GeotourError, Result};

/// Color used for features with a missing hue value
pub const NO_DATA_COLOR: [u8; 4] = [211, 211, 211, 255];

/// Trait for color mapping implementations
pub trait Colormap {
    /// Map a normalized value (0.0 to 1.0) to an RGBA color
    fn map_normalized(&self, value: f32) -> [u8; 4];

    /// Map a value to an RGBA color given the data range
    fn map(&self, value: f32, min: f32, max: f32) -> [u8; 4] {
        let normalized = if max > min {
            ((value - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.map_normalized(normalized)
    }

    /// Get the name of this colormap
    fn name(&self) -> &str;
}

/// A colormap backed by a `colorgrad` preset
pub struct GradientColormap {
    name: String,
    gradient: Gradient,
    reversed: bool,
}

impl Colormap for GradientColormap {
    fn map_normalized(&self, value: f32) -> [u8; 4] {
        let t = value.clamp(0.0, 1.0) as f64;
        let t = if self.reversed { 1.0 - t } else { t };
        self.gradient.at(t).to_rgba8()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Get a colormap by name.
///
/// Names are case-insensitive and follow matplotlib (`Greens`, `Reds`,
/// `viridis`); a `_r` suffix reverses the map.
pub fn get_colormap(name: &str) -> Result<Box<dyn Colormap>> {
    let lower = name.to_lowercase();
    let (base, reversed) = match lower.strip_suffix("_r") {
        Some(base) => (base, true),
        None => (lower.as_str(), false),
    };

    let gradient = match base {
        "greens" => colorgrad::greens(),
        "reds" => colorgrad::reds(),
        "blues" => colorgrad::blues(),
        "oranges" => colorgrad::oranges(),
        "purples" => colorgrad::purples(),
        "greys" | "grays" => colorgrad::greys(),
        "viridis" => colorgrad::viridis(),
        "plasma" => colorgrad::plasma(),
        "inferno" => colorgrad::inferno(),
        "magma" => colorgrad::magma(),
        "cividis" => colorgrad::cividis(),
        "turbo" => colorgrad::turbo(),
        _ => {
            return Err(GeotourError::invalid(
                "cmap",
                format!("Unknown colormap: {}", name),
            ))
        }
    };

    Ok(Box::new(GradientColormap {
        name: lower.clone(),
        gradient,
        reversed,
    }))
}

/// Parse a color given by CSS name or hex code; `"none"` means no color
pub fn parse_color(spec: &str) -> Result<Option<[u8; 4]>> {
    let trimmed = spec.trim();
    if trimmed.eq_ignore_ascii_case("none") || trimmed.is_empty() {
        return Ok(None);
    }
    colorgrad::Color::from_html(trimmed)
        .map(|c| Some(c.to_rgba8()))
        .map_err(|e| GeotourError::invalid("color", format!("{}: {}", spec, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brightness(c: [u8; 4]) -> u32 {
        c[0] as u32 + c[1] as u32 + c[2] as u32
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(get_colormap("Greens").unwrap().name(), "greens");
        assert_eq!(get_colormap("REDS").unwrap().name(), "reds");
        assert!(get_colormap("rainbow_unicorn").is_err());
    }

    #[test]
    fn test_sequential_maps_darken() {
        let reds = get_colormap("Reds").unwrap();
        let low = reds.map_normalized(0.0);
        let high = reds.map_normalized(1.0);
        assert!(brightness(low) > brightness(high));
        assert!(high[0] > high[2]);
    }

    #[test]
    fn test_reversed_map() {
        let greens = get_colormap("greens").unwrap();
        let reversed = get_colormap("greens_r").unwrap();
        assert_eq!(greens.map_normalized(0.0), reversed.map_normalized(1.0));
        assert_eq!(greens.map_normalized(1.0), reversed.map_normalized(0.0));
    }

    #[test]
    fn test_degenerate_range_maps_to_middle() {
        let viridis = get_colormap("viridis").unwrap();
        assert_eq!(viridis.map(3.0, 3.0, 3.0), viridis.map_normalized(0.5));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("None").unwrap(), None);
        assert_eq!(parse_color("white").unwrap(), Some([255, 255, 255, 255]));
        assert_eq!(parse_color("#ff0000").unwrap(), Some([255, 0, 0, 255]));
        assert_eq!(parse_color("gray").unwrap(), Some([128, 128, 128, 255]));
        assert!(parse_color("not-a-color").is_err());
    }
}
