//! Map projections from lon/lat degrees to planar coordinates.
//!
//! Projections with an unset center are completed from the data being
//! plotted via [`Projection::centered_on`], so a bare `Orthographic` looks
//! straight down at the middle of the dataset.

use geo::{Coord, LineString, MultiPolygon, Polygon, Rect};
use std::f64::consts::{FRAC_PI_4, PI};
use std::str::FromStr;

use crate::error::{GeotourError, Result};

/// Latitude limit of the Web Mercator square
pub const MERCATOR_MAX_LATITUDE: f64 = 85.051_128_78;

/// Default standard parallels for Albers equal-area
pub const ALBERS_STANDARD_PARALLELS: (f64, f64) = (20.0, 50.0);

/// Supported map projections
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Equirectangular: longitude and latitude used directly as x and y
    PlateCarree,
    /// View of the globe from infinitely far away
    Orthographic {
        central_longitude: Option<f64>,
        central_latitude: Option<f64>,
    },
    /// Conic equal-area projection
    AlbersEqualArea {
        central_longitude: Option<f64>,
        central_latitude: Option<f64>,
        standard_parallels: (f64, f64),
    },
    /// Spherical Mercator as used by web tiles
    WebMercator,
}

impl Default for Projection {
    fn default() -> Self {
        Projection::PlateCarree
    }
}

impl Projection {
    pub fn orthographic() -> Self {
        Projection::Orthographic {
            central_longitude: None,
            central_latitude: None,
        }
    }

    pub fn albers_equal_area() -> Self {
        Projection::AlbersEqualArea {
            central_longitude: None,
            central_latitude: None,
            standard_parallels: ALBERS_STANDARD_PARALLELS,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Projection::PlateCarree => "platecarree",
            Projection::Orthographic { .. } => "orthographic",
            Projection::AlbersEqualArea { .. } => "albersequalarea",
            Projection::WebMercator => "webmercator",
        }
    }

    /// Fill any unset center from the middle of `bounds` (lon/lat degrees)
    pub fn centered_on(&self, bounds: Option<Rect<f64>>) -> Projection {
        let center = bounds.map(|b| b.center()).unwrap_or(Coord { x: 0.0, y: 0.0 });
        match self {
            Projection::Orthographic {
                central_longitude,
                central_latitude,
            } => Projection::Orthographic {
                central_longitude: Some(central_longitude.unwrap_or(center.x)),
                central_latitude: Some(central_latitude.unwrap_or(center.y)),
            },
            Projection::AlbersEqualArea {
                central_longitude,
                central_latitude,
                standard_parallels,
            } => Projection::AlbersEqualArea {
                central_longitude: Some(central_longitude.unwrap_or(center.x)),
                central_latitude: Some(central_latitude.unwrap_or(center.y)),
                standard_parallels: *standard_parallels,
            },
            other => other.clone(),
        }
    }

    /// Project a lon/lat pair; `None` when the point is not visible
    pub fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        match self {
            Projection::PlateCarree => Some((lon, lat)),
            Projection::Orthographic {
                central_longitude,
                central_latitude,
            } => {
                let lambda = wrap_longitude(lon - central_longitude.unwrap_or(0.0)).to_radians();
                let phi = lat.to_radians();
                let phi0 = central_latitude.unwrap_or(0.0).to_radians();

                let cos_c = phi0.sin() * phi.sin() + phi0.cos() * phi.cos() * lambda.cos();
                if cos_c < 0.0 {
                    return None;
                }
                let x = phi.cos() * lambda.sin();
                let y = phi0.cos() * phi.sin() - phi0.sin() * phi.cos() * lambda.cos();
                Some((x, y))
            }
            Projection::AlbersEqualArea {
                central_longitude,
                central_latitude,
                standard_parallels,
            } => {
                let lambda = wrap_longitude(lon - central_longitude.unwrap_or(0.0)).to_radians();
                let phi = lat.to_radians();
                let phi0 = central_latitude.unwrap_or(0.0).to_radians();
                let phi1 = standard_parallels.0.to_radians();
                let phi2 = standard_parallels.1.to_radians();

                let n = (phi1.sin() + phi2.sin()) / 2.0;
                if n.abs() < 1e-10 {
                    // Symmetric parallels degenerate to cylindrical equal-area
                    return Some((lambda, phi.sin() - phi0.sin()));
                }
                let c = phi1.cos().powi(2) + 2.0 * n * phi1.sin();
                let rho = (c - 2.0 * n * phi.sin()).max(0.0).sqrt() / n;
                let rho0 = (c - 2.0 * n * phi0.sin()).max(0.0).sqrt() / n;
                let theta = n * lambda;
                Some((rho * theta.sin(), rho0 - rho * theta.cos()))
            }
            Projection::WebMercator => {
                let lat = lat.clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE);
                let x = wrap_longitude(lon).to_radians();
                let y = (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                Some((x, y))
            }
        }
    }

    /// Project a ring, dropping vertices that are not visible
    pub fn project_ring(&self, ring: &LineString<f64>) -> Option<LineString<f64>> {
        let coords: Vec<Coord<f64>> = ring
            .coords()
            .filter_map(|c| self.project(c.x, c.y))
            .map(|(x, y)| Coord { x, y })
            .collect();
        if coords.len() < 3 {
            None
        } else {
            Some(LineString::new(coords))
        }
    }

    /// Project a polygon; holes that vanish are dropped, a vanished
    /// exterior drops the polygon.
    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
        let exterior = self.project_ring(polygon.exterior())?;
        let interiors = polygon
            .interiors()
            .iter()
            .filter_map(|ring| self.project_ring(ring))
            .collect();
        Some(Polygon::new(exterior, interiors))
    }

    pub fn project_multipolygon(&self, polygons: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon::new(
            polygons
                .iter()
                .filter_map(|p| self.project_polygon(p))
                .collect(),
        )
    }

    /// Boundary of the projected world, where it has one worth drawing
    pub fn outline(&self) -> Option<LineString<f64>> {
        match self {
            Projection::Orthographic { .. } => {
                let steps = 180;
                let coords = (0..=steps)
                    .map(|i| {
                        let t = 2.0 * PI * i as f64 / steps as f64;
                        Coord {
                            x: t.cos(),
                            y: t.sin(),
                        }
                    })
                    .collect();
                Some(LineString::new(coords))
            }
            _ => None,
        }
    }

    /// Parse a projection name, optionally with a `:lon,lat` center
    pub fn parse_projection(s: &str) -> Result<Self> {
        let (name, center) = match s.split_once(':') {
            Some((name, center)) => (name, Some(parse_center(center)?)),
            None => (s, None),
        };
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        let (central_longitude, central_latitude) = match center {
            Some((lon, lat)) => (Some(lon), Some(lat)),
            None => (None, None),
        };

        match key.as_str() {
            "platecarree" | "equirectangular" => Ok(Projection::PlateCarree),
            "orthographic" => Ok(Projection::Orthographic {
                central_longitude,
                central_latitude,
            }),
            "albers" | "albersequalarea" => Ok(Projection::AlbersEqualArea {
                central_longitude,
                central_latitude,
                standard_parallels: ALBERS_STANDARD_PARALLELS,
            }),
            "mercator" | "webmercator" => Ok(Projection::WebMercator),
            _ => Err(GeotourError::invalid(
                "projection",
                format!("Unknown map projection: {}", s),
            )),
        }
    }
}

impl FromStr for Projection {
    type Err = GeotourError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Projection::parse_projection(s)
    }
}

fn parse_center(s: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(GeotourError::invalid(
            "projection",
            format!("Center must be 'lon,lat', got: {}", s),
        ));
    }
    let lon = parts[0].parse::<f64>().map_err(|_| {
        GeotourError::invalid("projection", format!("Invalid center longitude: {}", parts[0]))
    })?;
    let lat = parts[1].parse::<f64>().map_err(|_| {
        GeotourError::invalid("projection", format!("Invalid center latitude: {}", parts[1]))
    })?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeotourError::invalid(
            "projection",
            format!("Center latitude out of range: {}", lat),
        ));
    }
    Ok((lon, lat))
}

/// Wrap a longitude difference into [-180, 180)
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
