//! Unified error handling for quadstream.
//!
//! Every fallible operation in the crate returns [`StreamResult`]; recoverable
//! conditions (corrupt cache records, per-command delivery failures) are
//! handled where they occur and never surface through this type.

use std::path::PathBuf;

use crate::world::core::{TerrainPos, VoxelPos};

pub type StreamResult<T> = Result<T, StreamError>;

/// Master error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoded stream truncated at byte {offset}")]
    TruncatedStream { offset: usize },

    #[error("encoded stream has {remaining} unconsumed trailing bytes")]
    TrailingBytes { remaining: usize },

    #[error("generator failed for chunk {pos}: {source}")]
    GeneratorFailed {
        pos: TerrainPos,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("remote fill delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("world border marker not found while probing from {start}")]
    BorderNotFound { start: VoxelPos },

    #[error("invalid config: {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
