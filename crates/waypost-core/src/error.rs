//! Error types for Waypost.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaypostError {
    #[error("Failed to read module tree at {path}: {source}")]
    TreeRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load module {path}: {reason}")]
    ModuleLoad { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
