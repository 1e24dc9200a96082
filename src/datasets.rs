//! Bundled dataset lookup and GeoJSON loading.
//!
//! Dataset identifiers resolve to `<data_dir>/<file>`; the files are parsed
//! into [`GeoFrame`]s.

use geojson::{Feature, GeoJson};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{GeotourError, Result};
use crate::frame::{geometry_kind, GeoFrame, Record};
use crate::logging::log_dataset_load_stats;

/// World country boundaries with population and GDP estimates
pub const NATURALEARTH_LOWRES: &str = "naturalearth_lowres";
/// New York City borough boundaries
pub const NYC_BOROUGHS: &str = "nyc_boroughs";
/// Traffic collisions with at least one injury
pub const NYC_INJURIOUS_COLLISIONS: &str = "nyc_injurious_collisions";

static DATASETS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (NATURALEARTH_LOWRES, "naturalearth_lowres.geojson"),
        (NYC_BOROUGHS, "nyc_boroughs.geojson"),
        (NYC_INJURIOUS_COLLISIONS, "nyc_injurious_collisions.geojson"),
    ])
});

/// Names of every known dataset, sorted
pub fn available() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = DATASETS.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Resolve a dataset identifier to its file under `data_dir`
pub fn get_path(data_dir: &Path, name: &str) -> Result<PathBuf> {
    let file = DATASETS
        .get(name)
        .ok_or_else(|| GeotourError::DatasetNotFound {
            name: name.to_string(),
        })?;
    Ok(data_dir.join(file))
}

/// Resolve and read a dataset in one step
pub fn load(data_dir: &Path, name: &str) -> Result<GeoFrame> {
    read_file(&get_path(data_dir, name)?)
}

/// Read a GeoJSON file into a frame
pub fn read_file(path: &Path) -> Result<GeoFrame> {
    if !path.exists() {
        return Err(GeotourError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    let reader = BufReader::new(File::open(path)?);
    let geojson = GeoJson::from_reader(reader)?;
    let frame = from_geojson(geojson)?;

    let mut kinds: Vec<&str> = frame
        .records()
        .iter()
        .map(|r| geometry_kind(&r.geometry))
        .collect();
    kinds.sort_unstable();
    kinds.dedup();

    log_dataset_load_stats(
        &path.display().to_string(),
        frame.len(),
        &frame.columns(),
        &kinds,
    );

    Ok(frame)
}

/// Convert parsed GeoJSON into a frame.
///
/// A FeatureCollection gives one row per feature; a lone Feature or
/// Geometry gives a single row. Features without geometry are skipped.
pub fn from_geojson(geojson: GeoJson) -> Result<GeoFrame> {
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };

    let total = features.len();
    let mut records = Vec::with_capacity(total);

    for (index, feature) in features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!(feature_index = index, "Skipping feature without geometry");
            continue;
        };

        let geometry: geo::Geometry<f64> =
            geometry
                .value
                .try_into()
                .map_err(|e: geojson::Error| GeotourError::Geometry {
                    message: format!("Feature {}: {}", index, e),
                })?;

        records.push(Record {
            geometry,
            properties: feature.properties.unwrap_or_default(),
        });
    }

    debug!(
        features = total,
        records = records.len(),
        "Converted GeoJSON features"
    );

    Ok(GeoFrame::new(records))
}
