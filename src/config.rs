//! Configuration management for geotour.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GeotourError, Result};

/// Command-line arguments for geotour
#[derive(Parser, Debug)]
#[command(name = "geotour")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the bundled GeoJSON datasets
    #[arg(short, long, env = "GEOTOUR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory the rendered figures are written to
    #[arg(short, long, env = "GEOTOUR_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Pixels per inch of figure size
    #[arg(long, env = "GEOTOUR_DPI")]
    pub dpi: Option<u32>,

    /// Output image format (png or jpeg)
    #[arg(short, long, env = "GEOTOUR_FORMAT")]
    pub format: Option<String>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "GEOTOUR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GEOTOUR_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Dataset location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding `<dataset>.geojson` files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Figure output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory figures are saved into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Pixels per inch of figure size
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Image format: png or jpeg
    #[serde(default = "default_format")]
    pub format: String,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Dataset configuration
    #[serde(default)]
    pub data: DataConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Build configuration from already parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments (clap already folded in env vars)
        if let Some(data_dir) = args.data_dir {
            config.data.data_dir = data_dir;
        }
        if let Some(output_dir) = args.output_dir {
            config.output.output_dir = output_dir;
        }
        if let Some(dpi) = args.dpi {
            config.output.dpi = dpi;
        }
        if let Some(format) = args.format {
            config.output.format = format.to_lowercase();
        }
        if let Some(log_level) = args.log_level {
            config.log_level = log_level;
        }

        Ok(config)
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.data = other.data;
        self.output = other.output;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.data.data_dir.as_os_str().is_empty() {
            return Err(GeotourError::Config {
                message: "Data directory cannot be empty".to_string(),
            });
        }

        if self.output.output_dir.as_os_str().is_empty() {
            return Err(GeotourError::Config {
                message: "Output directory cannot be empty".to_string(),
            });
        }

        if self.output.dpi == 0 {
            return Err(GeotourError::Config {
                message: "DPI cannot be 0".to_string(),
            });
        }

        match self.output.format.as_str() {
            "png" | "jpeg" => {}
            _ => {
                return Err(GeotourError::Config {
                    message: format!(
                        "Invalid output format: {}. Must be one of: png, jpeg",
                        self.output.format
                    ),
                });
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(GeotourError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            output: OutputConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            dpi: default_dpi(),
            format: default_format(),
        }
    }
}

// Default value functions for serde
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_dpi() -> u32 {
    100
}

fn default_format() -> String {
    "png".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
