use std::path::PathBuf;
use thiserror::Error;

use crate::collect::CollectReport;
use crate::merge::MergeError;
use crate::render::{RenderError, RenderReport};

/// The main error type for cocokit operations.
#[derive(Debug, Error)]
pub enum CocokitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create {path}: {source}")]
    FileCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("Mask rendering aborted: {0}")]
    Render(#[from] RenderError),

    #[error("Mask rendering finished with {failed} failure(s)")]
    RenderIncomplete { failed: usize, report: RenderReport },

    #[error("Collection finished with {failed} failed copy operation(s)")]
    CollectIncomplete { failed: usize, report: CollectReport },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
