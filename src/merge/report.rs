//! Merge report types.
//!
//! Like the other reports in this crate, a [`MergeReport`] renders as
//! human-readable text through `Display` and as JSON through `Serialize`.

use serde::Serialize;
use std::fmt;

/// Record counts of one dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DatasetCounts {
    pub images: usize,
    pub annotations: usize,
}

/// A non-fatal observation made while merging.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum MergeWarning {
    /// Both inputs define `categories` and they are not equal; the first
    /// dataset's categories were kept.
    CategoriesDiffer,
    /// Annotation ids of the second dataset that were not integers and were
    /// removed.
    DroppedAnnotationIds { count: usize },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::CategoriesDiffer => write!(
                f,
                "categories differ between inputs; keeping categories from the first dataset"
            ),
            MergeWarning::DroppedAnnotationIds { count } => write!(
                f,
                "{count} annotation(s) in the second dataset had a non-numeric id, which was removed"
            ),
        }
    }
}

/// What a successful merge did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub first: DatasetCounts,
    pub second: DatasetCounts,
    pub output: DatasetCounts,
    /// Offset added to every image id of the second dataset.
    pub image_id_offset: u64,
    /// Offset added to every annotation id of the second dataset.
    pub annotation_id_offset: u64,
    pub warnings: Vec<MergeWarning>,
}

impl MergeReport {
    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Merged: images={}, annotations={}",
            self.output.images, self.output.annotations
        )?;
        writeln!(
            f,
            "  first:  {} images, {} annotations",
            self.first.images, self.first.annotations
        )?;
        writeln!(
            f,
            "  second: {} images, {} annotations (image ids +{}, annotation ids +{})",
            self.second.images,
            self.second.annotations,
            self.image_id_offset,
            self.annotation_id_offset
        )?;

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
            }
        }

        Ok(())
    }
}
