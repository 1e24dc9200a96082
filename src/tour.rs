//! The guided tour: six figures showing each kind of plot on the bundled
//! datasets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::canvas::Axes;
use crate::config::Config;
use crate::datasets::{self, NATURALEARTH_LOWRES, NYC_BOROUGHS, NYC_INJURIOUS_COLLISIONS};
use crate::error::{GeotourError, Result};
use crate::frame::GeoFrame;
use crate::logging::{generate_run_id, log_fallible_operation, log_timed_operation};
use crate::plots::{
    cartogram, choropleth, kdeplot, polyplot, voronoi, CartogramOptions, KdeOptions, PlotOptions,
};
use crate::projection::Projection;

/// File listing the figures of a run, written next to them
pub const MANIFEST_FILE: &str = "manifest.json";

/// Column of the collisions dataset holding the injury count
pub const INJURED_COLUMN: &str = "NUMBER OF PERSONS INJURED";

/// One saved figure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FigureRecord {
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Summary of a tour run, saved as the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourReport {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub format: String,
    pub figures: Vec<FigureRecord>,
}

struct Datasets {
    world: GeoFrame,
    boroughs: GeoFrame,
    collisions: GeoFrame,
}

/// Render every figure of the tour into `config.output.output_dir`.
///
/// Stops at the first failing step; figures saved before it stay on disk
/// but no manifest is written.
pub fn run_tour(config: &Config) -> Result<TourReport> {
    let run_id = generate_run_id();
    let details = format!("run_id={}", run_id);
    log_fallible_operation("tour", Some(&details), || render_tour(config, run_id))
}

fn render_tour(config: &Config, run_id: String) -> Result<TourReport> {
    let data_dir = &config.data.data_dir;
    let data = Datasets {
        world: datasets::load(data_dir, NATURALEARTH_LOWRES)?,
        boroughs: datasets::load(data_dir, NYC_BOROUGHS)?,
        collisions: datasets::load(data_dir, NYC_INJURIOUS_COLLISIONS)?,
    };

    let output_dir = &config.output.output_dir;
    std::fs::create_dir_all(output_dir)?;

    let dpi = config.output.dpi;
    let steps: [(&str, fn(&Datasets, u32) -> Result<Axes>); 6] = [
        ("world", world_outlines),
        ("orthographic", orthographic_globe),
        ("gdp_per_capita", gdp_per_capita),
        ("africa_population", africa_population),
        ("collision_density", collision_density),
        ("collision_voronoi", collision_voronoi),
    ];

    let mut figures = Vec::with_capacity(steps.len());
    for (i, (name, step)) in steps.iter().enumerate() {
        let index = i + 1;
        let ax = log_timed_operation(name, || step(&data, dpi))?;
        let path = figure_path(output_dir, index, name, &config.output.format);
        ax.save(&path)?;
        info!(figure = index, path = %path.display(), "Saved figure");
        figures.push(FigureRecord {
            index,
            name: name.to_string(),
            path,
            width: ax.width(),
            height: ax.height(),
        });
    }

    let report = TourReport {
        run_id,
        created_at: Utc::now(),
        format: config.output.format.clone(),
        figures,
    };
    let manifest = serde_json::to_string_pretty(&report)?;
    std::fs::write(output_dir.join(MANIFEST_FILE), manifest)?;

    Ok(report)
}

/// `NN_<name>.<format>` inside `output_dir`
pub fn figure_path(output_dir: &Path, index: usize, name: &str, format: &str) -> PathBuf {
    output_dir.join(format!("{:02}_{}.{}", index, name, format))
}

fn world_outlines(data: &Datasets, dpi: u32) -> Result<Axes> {
    polyplot(&data.world, &PlotOptions::default().figsize(8.0, 4.0).dpi(dpi), None)
}

fn orthographic_globe(data: &Datasets, dpi: u32) -> Result<Axes> {
    let opts = PlotOptions::default()
        .projection(Projection::orthographic())
        .figsize(8.0, 4.0)
        .dpi(dpi);
    let mut ax = polyplot(&data.world, &opts, None)?;
    ax.draw_outline(true);
    Ok(ax)
}

fn gdp_per_capita(data: &Datasets, dpi: u32) -> Result<Axes> {
    let hue = data.world.ratio("gdp_md_est", "pop_est")?;
    let opts = PlotOptions::default()
        .hue_values(hue)
        .cmap("Greens")
        .figsize(8.0, 4.0)
        .dpi(dpi);
    choropleth(&data.world, &opts, None)
}

fn africa_population(data: &Datasets, dpi: u32) -> Result<Axes> {
    let africa = data.world.query_eq("continent", "Africa")?;
    if africa.is_empty() {
        return Err(GeotourError::EmptyInput {
            message: "no countries with continent 'Africa'".to_string(),
        });
    }
    let opts = PlotOptions::default()
        .edgecolor("None")
        .figsize(7.0, 8.0)
        .dpi(dpi);
    let ax = cartogram(
        &africa,
        &CartogramOptions::new("pop_est").limits(0.2, 1.0),
        &opts,
        None,
    )?;
    polyplot(&africa, &PlotOptions::default().edgecolor("gray"), Some(ax))
}

fn collision_density(data: &Datasets, dpi: u32) -> Result<Axes> {
    let opts = PlotOptions::default()
        .clip(data.boroughs.polygons())
        .cmap("Reds")
        .projection(Projection::albers_equal_area())
        .dpi(dpi);
    let ax = kdeplot(&data.collisions, &KdeOptions::default().shade(true), &opts, None)?;
    polyplot(&data.boroughs, &PlotOptions::default().zorder(1), Some(ax))
}

fn collision_voronoi(data: &Datasets, dpi: u32) -> Result<Axes> {
    let opts = PlotOptions::default()
        .projection(Projection::albers_equal_area())
        .clip(data.boroughs.simplify(0.001).polygons())
        .hue_column(INJURED_COLUMN)
        .cmap("Reds")
        .k(None)
        .legend(true)
        .edgecolor("white")
        .linewidth(0.5)
        .dpi(dpi);
    let ax = voronoi(&data.collisions.head(1000), &opts, None)?;
    polyplot(
        &data.boroughs,
        &PlotOptions::default().edgecolor("black").zorder(1),
        Some(ax),
    )
}
