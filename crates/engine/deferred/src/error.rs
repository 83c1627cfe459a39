//! Error types for the deferred shading pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, configuring or rendering a frame
#[derive(Error, Debug)]
pub enum Error {
    /// Window, GL context, shader or texture creation failed
    #[error("Resource initialization failed: {0}")]
    ResourceInit(String),

    /// A dataset could not be read
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Filename metadata or a configuration file could not be parsed
    #[error(transparent)]
    ConfigParse(#[from] ConfigParseError),

    /// Camera inputs describe a degenerate view or projection
    #[error("Invalid camera configuration: {0}")]
    InvalidCameraConfig(String),

    /// Pixel data handed to export does not describe an image
    #[error("Export failed: {0}")]
    Export(String),

    /// Image encoding or writing failed
    #[error("Image export error: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors raised by dataset stores
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset itself does not exist
    #[error("Dataset not found: {}", .0.display())]
    MissingDataset(PathBuf),

    /// The dataset exists but has no buffer under this key
    #[error("Dataset '{dataset}' has no buffer named '{key}'")]
    MissingKey { dataset: String, key: String },

    /// Buffer length does not match width * height * channels
    #[error("Buffer '{key}' has {actual} floats, expected {expected}")]
    SizeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// Buffer bytes are not a whole number of floats
    #[error("Buffer '{key}' is malformed: {reason}")]
    Malformed { key: String, reason: String },

    /// No backend can read this dataset
    #[error("Unsupported dataset: {0}")]
    Unsupported(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HDF5 library error
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

/// Errors raised while parsing filename metadata or scene configuration
#[derive(Error, Debug)]
pub enum ConfigParseError {
    /// Fewer delimiter-separated fields than the encoding requires
    #[error("'{name}' is missing the {field} field")]
    MissingField { name: String, field: &'static str },

    /// A positional field is not a number
    #[error("'{name}': {field} field '{value}' is not a number")]
    InvalidNumber {
        name: String,
        field: &'static str,
        value: String,
    },

    /// Scene configuration TOML is invalid
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Scene configuration is structurally valid but semantically wrong
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
