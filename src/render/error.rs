use std::path::PathBuf;

use thiserror::Error;

use crate::ir::ImageId;
use crate::mask::DecodeError;

/// Failure while rendering the masks of one image.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image {image_id} ({file_name}): {reason}")]
    Dimensions {
        image_id: ImageId,
        file_name: String,
        reason: String,
    },

    #[error("failed to read image dimensions from {path}: {source}")]
    DimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("failed to write mask {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("mask buffer does not match {width}x{height} for {path}")]
    InvalidRaster {
        path: PathBuf,
        height: u32,
        width: u32,
    },

    #[error("output directory {path} does not exist")]
    MissingDestination { path: PathBuf },

    #[error("failed to combine instance masks: {0}")]
    Aggregate(#[from] DecodeError),
}

impl RenderError {
    /// Errors that doom every remaining unit of the batch, not just this one.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::MissingDestination { .. })
    }
}
