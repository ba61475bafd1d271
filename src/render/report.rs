//! Mask rendering report.

use serde::Serialize;
use std::fmt;

/// One unit of work that did not complete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderFailure {
    /// What failed: an image, an annotation, or an instance mask file.
    pub unit: String,
    pub reason: String,
}

impl RenderFailure {
    pub fn new(unit: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            unit: unit.into(),
            reason: reason.to_string(),
        }
    }
}

/// Counts and failures of one rendering run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub images_total: usize,
    pub images_rendered: usize,
    pub images_failed: usize,

    pub annotations_decoded: usize,
    /// Annotations whose segmentation could not be decoded.
    pub annotations_skipped: usize,
    /// Annotations without a `segmentation` field.
    pub annotations_without_segmentation: usize,
    /// Annotations whose `image_id` matches no image.
    pub annotations_orphaned: usize,

    pub instance_masks_written: usize,
    pub instance_masks_failed: usize,

    pub failures: Vec<RenderFailure>,
}

impl RenderReport {
    /// True if every image and every instance mask was written.
    ///
    /// Skipped annotations do not count against completeness.
    pub fn is_complete(&self) -> bool {
        self.images_failed == 0 && self.instance_masks_failed == 0
    }

    /// Failed images plus failed instance masks.
    pub fn failed_count(&self) -> usize {
        self.images_failed + self.instance_masks_failed
    }
}

impl fmt::Display for RenderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Rendered: {}/{} images ({} failed)",
            self.images_rendered, self.images_total, self.images_failed
        )?;
        writeln!(
            f,
            "  annotations: {} decoded, {} skipped, {} without segmentation, {} orphaned",
            self.annotations_decoded,
            self.annotations_skipped,
            self.annotations_without_segmentation,
            self.annotations_orphaned
        )?;
        if self.instance_masks_written > 0 || self.instance_masks_failed > 0 {
            writeln!(
                f,
                "  instance masks: {} written, {} failed",
                self.instance_masks_written, self.instance_masks_failed
            )?;
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures ({}):", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  - {}: {}", failure.unit, failure.reason)?;
            }
        }

        Ok(())
    }
}
