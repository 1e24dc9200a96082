//! End-to-end runs of the guided tour on synthetic datasets.

mod common;

use common::image_utils::{assert_image_dimensions, count_drawn_pixels, detect_image_format, load_image};
use common::test_data::create_test_data_dir;
use geotour::config::Config;
use geotour::tour::{run_tour, TourReport, MANIFEST_FILE};
use geotour::GeotourError;
use image::ImageFormat;
use pretty_assertions::assert_eq;
use std::path::Path;

fn tour_config(data_dir: &Path, output_dir: &Path, format: &str) -> Config {
    let mut config = Config::default();
    config.data.data_dir = data_dir.to_path_buf();
    config.output.output_dir = output_dir.to_path_buf();
    config.output.dpi = 40;
    config.output.format = format.to_string();
    config
}

#[test]
fn test_tour_writes_every_figure_and_manifest() {
    let data = create_test_data_dir().expect("Failed to create test data");
    let out = tempfile::tempdir().expect("Failed to create output dir");
    let config = tour_config(data.path(), &out.path().join("figures"), "png");
    config.validate().expect("config should be valid");

    let report = run_tour(&config).expect("tour should succeed");

    let names: Vec<&str> = report.figures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "world",
            "orthographic",
            "gdp_per_capita",
            "africa_population",
            "collision_density",
            "collision_voronoi",
        ]
    );

    for figure in &report.figures {
        let file_name = figure.path.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(file_name, format!("{:02}_{}.png", figure.index, figure.name));

        let bytes = std::fs::read(&figure.path).expect("figure should exist");
        assert_eq!(detect_image_format(&bytes), Some(ImageFormat::Png));

        let image = load_image(&figure.path).expect("figure should decode");
        assert_image_dimensions(&image, figure.width, figure.height).unwrap();
        assert!(
            count_drawn_pixels(&image.to_rgba8()) > 0,
            "{} is blank",
            figure.name
        );
    }

    // Figure sizes in inches times dpi
    assert_eq!((report.figures[0].width, report.figures[0].height), (320, 160));
    assert_eq!((report.figures[3].width, report.figures[3].height), (280, 320));

    let manifest = std::fs::read_to_string(out.path().join("figures").join(MANIFEST_FILE))
        .expect("manifest should exist");
    let saved: TourReport = serde_json::from_str(&manifest).expect("manifest should parse");
    assert_eq!(saved.run_id, report.run_id);
    assert_eq!(saved.figures, report.figures);
    assert_eq!(saved.format, "png");
}

#[test]
fn test_tour_jpeg_output() {
    let data = create_test_data_dir().expect("Failed to create test data");
    let out = tempfile::tempdir().expect("Failed to create output dir");
    let config = tour_config(data.path(), out.path(), "jpeg");

    let report = run_tour(&config).expect("tour should succeed");
    assert_eq!(report.figures.len(), 6);
    for figure in &report.figures {
        assert_eq!(figure.path.extension().unwrap(), "jpeg");
        let bytes = std::fs::read(&figure.path).unwrap();
        assert_eq!(detect_image_format(&bytes), Some(ImageFormat::Jpeg));
    }
}

#[test]
fn test_tour_stops_on_missing_dataset() {
    let data = create_test_data_dir().expect("Failed to create test data");
    std::fs::remove_file(data.path().join("nyc_boroughs.geojson")).unwrap();
    let out = tempfile::tempdir().unwrap();

    let err = run_tour(&tour_config(data.path(), out.path(), "png")).unwrap_err();
    assert!(matches!(err, GeotourError::Io(_)), "unexpected error: {}", err);
    assert!(!out.path().join(MANIFEST_FILE).exists());
}

#[test]
fn test_invalid_format_rejected_by_validation() {
    let config = tour_config(Path::new("data"), Path::new("out"), "gif");
    assert!(config.validate().is_err());
}
