//! Error types for tacet-format.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lattice setup error: {0}")]
    LbmError(#[from] tacet_lbm::LbmError),

    #[error("Unsupported descriptor: {0}")]
    UnsupportedDescriptor(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, FormatError>;
