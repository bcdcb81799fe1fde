use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayerError {
    #[error("failed to read layer {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse layer {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("output io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("output serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("hex size must be a positive number of meters, got {0}")]
    InvalidHexSize(f64),
}
