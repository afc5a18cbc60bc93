//! Error types for slice store operations

use thiserror::Error;

/// Main error type for slice store operations
#[derive(Error, Debug)]
pub enum SliceDbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Invalid slice kind: {0:?} (expected \"img\" or \"seg\")")]
    InvalidKind(String),

    #[error("Invalid slice plane: {0:?} (expected \"xy\", \"xz\" or \"yz\")")]
    InvalidPlane(String),

    #[error("Malformed key: {0:?}")]
    MalformedKey(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Empty volume: {0}")]
    EmptyVolume(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
}

/// Specialized Result type for slice store operations
pub type Result<T> = std::result::Result<T, SliceDbError>;

impl From<rocksdb::Error> for SliceDbError {
    fn from(err: rocksdb::Error) -> Self {
        SliceDbError::Storage(err.to_string())
    }
}

impl From<bincode::Error> for SliceDbError {
    fn from(err: bincode::Error) -> Self {
        SliceDbError::Serialization(err.to_string())
    }
}
