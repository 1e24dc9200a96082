//! Error types for the geotour library.
//!
//! A single error enum covers dataset loading, parameter validation,
//! projection and rendering failures.

use thiserror::Error;

/// The main error type for geotour operations.
#[derive(Error, Debug)]
pub enum GeotourError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// GeoJSON parsing errors
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Unknown dataset identifier
    #[error("Dataset not found: {name}")]
    DatasetNotFound { name: String },

    /// Column missing from a frame
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Geometry that cannot be used for the requested operation
    #[error("Geometry error: {message}")]
    Geometry { message: String },

    /// Nothing to draw
    #[error("Empty input: {message}")]
    EmptyInput { message: String },

    /// Image generation errors
    #[error("Image generation error: {message}")]
    ImageGeneration { message: String },
}

/// Convenience type alias for Results with GeotourError
pub type Result<T> = std::result::Result<T, GeotourError>;

impl GeotourError {
    /// Shorthand for an [`GeotourError::InvalidParameter`]
    pub fn invalid(param: &str, message: impl Into<String>) -> Self {
        GeotourError::InvalidParameter {
            param: param.to_string(),
            message: message.into(),
        }
    }
}
