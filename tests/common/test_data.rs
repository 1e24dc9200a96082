//! Test data generation utilities.
//!
//! Small synthetic stand-ins for the bundled datasets, written as GeoJSON
//! files with the same names and columns.

use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

pub const WORLD: &str = "naturalearth_lowres";
pub const BOROUGHS: &str = "nyc_boroughs";
pub const COLLISIONS: &str = "nyc_injurious_collisions";

/// Number of features in the synthetic collisions file
pub const COLLISION_COUNT: usize = 80;

/// Closed ring of an axis-aligned rectangle
fn rect_ring(x0: f64, y0: f64, x1: f64, y1: f64) -> Value {
    json!([[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]])
}

fn rect_polygon(x0: f64, y0: f64, x1: f64, y1: f64) -> Value {
    json!({ "type": "Polygon", "coordinates": [rect_ring(x0, y0, x1, y1)] })
}

fn feature(geometry: Value, properties: Value) -> Value {
    json!({ "type": "Feature", "geometry": geometry, "properties": properties })
}

fn collection(features: Vec<Value>) -> Value {
    json!({ "type": "FeatureCollection", "features": features })
}

fn write_json(path: &Path, value: &Value) -> std::io::Result<()> {
    std::fs::write(path, serde_json::to_string(value)?)
}

/// Countries on several continents, Japan as a multipolygon
pub fn world() -> Value {
    let country = |name: &str, continent: &str, pop: f64, gdp: f64, geometry: Value| {
        feature(
            geometry,
            json!({ "name": name, "continent": continent, "pop_est": pop, "gdp_md_est": gdp }),
        )
    };
    collection(vec![
        country("Nigeria", "Africa", 190.0e6, 1.1e6, rect_polygon(3.0, 4.0, 14.0, 14.0)),
        country("Egypt", "Africa", 97.0e6, 1.1e6, rect_polygon(25.0, 22.0, 35.0, 31.0)),
        country("South Africa", "Africa", 54.0e6, 0.74e6, rect_polygon(17.0, -34.0, 32.0, -22.0)),
        country("France", "Europe", 67.0e6, 2.7e6, rect_polygon(-5.0, 42.0, 8.0, 51.0)),
        country(
            "Japan",
            "Asia",
            126.0e6,
            4.9e6,
            json!({
                "type": "MultiPolygon",
                "coordinates": [
                    [rect_ring(130.0, 31.0, 136.0, 35.0)],
                    [rect_ring(139.0, 36.0, 145.0, 44.0)]
                ]
            }),
        ),
        country("Brazil", "South America", 207.0e6, 3.0e6, rect_polygon(-73.0, -33.0, -35.0, 5.0)),
    ])
}

/// Borough extents in lon/lat
pub const BOROUGH_RECTS: [(&str, [f64; 4]); 3] = [
    ("Manhattan", [-74.02, 40.70, -73.93, 40.88]),
    ("Brooklyn", [-74.04, 40.57, -73.86, 40.70]),
    ("Queens", [-73.93, 40.70, -73.70, 40.80]),
];

pub fn boroughs() -> Value {
    collection(
        BOROUGH_RECTS
            .iter()
            .map(|(name, [x0, y0, x1, y1])| {
                feature(rect_polygon(*x0, *y0, *x1, *y1), json!({ "BoroName": name }))
            })
            .collect(),
    )
}

/// Points spread over the boroughs; every tenth repeats the previous
/// location
pub fn collisions() -> Value {
    let mut state: u64 = 42;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut features = Vec::with_capacity(COLLISION_COUNT);
    let mut last = (0.0, 0.0);
    for i in 0..COLLISION_COUNT {
        let (_, [x0, y0, x1, y1]) = BOROUGH_RECTS[i % BOROUGH_RECTS.len()];
        let location = if i % 10 == 9 {
            last
        } else {
            (x0 + (x1 - x0) * next(), y0 + (y1 - y0) * next())
        };
        last = location;
        features.push(feature(
            json!({ "type": "Point", "coordinates": [location.0, location.1] }),
            json!({ "NUMBER OF PERSONS INJURED": i % 4, "UNIQUE KEY": i }),
        ));
    }
    collection(features)
}

/// Write all three datasets into a fresh temporary directory
pub fn create_test_data_dir() -> std::io::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    write_json(&dir.path().join(format!("{}.geojson", WORLD)), &world())?;
    write_json(&dir.path().join(format!("{}.geojson", BOROUGHS)), &boroughs())?;
    write_json(&dir.path().join(format!("{}.geojson", COLLISIONS)), &collisions())?;
    Ok(dir)
}
