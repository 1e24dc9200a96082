//! geotour - render the guided tour of map plots
//!
//! Loads the bundled datasets and writes every figure of the tour to the
//! output directory.

use anyhow::Context;
use tracing::{error, info};

use geotour::{init_tracing, log_error, run_tour, Config};

fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    init_tracing(&config.log_level);
    info!("Starting geotour v{}", env!("CARGO_PKG_VERSION"));

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!(
        data_dir = %config.data.data_dir.display(),
        output_dir = %config.output.output_dir.display(),
        "Running tour"
    );

    let report = run_tour(&config)
        .map_err(|e| {
            log_error(&e, "tour");
            e
        })
        .context("tour failed")?;

    info!(
        run_id = %report.run_id,
        figures = report.figures.len(),
        "Tour finished"
    );
    Ok(())
}
