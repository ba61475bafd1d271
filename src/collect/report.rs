//! Bulk collection report.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A file that could not be copied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CollectFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub reason: String,
}

/// Outcome of a collection run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CollectReport {
    pub found: usize,
    pub copied: usize,
    pub failed: usize,
    pub failures: Vec<CollectFailure>,
}

impl CollectReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for CollectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Collected: {}/{} files ({} failed)",
            self.copied, self.found, self.failed
        )?;

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures ({}):", self.failures.len())?;
            for failure in &self.failures {
                writeln!(
                    f,
                    "  - {} -> {}: {}",
                    failure.source.display(),
                    failure.destination.display(),
                    failure.reason
                )?;
            }
        }
        Ok(())
    }
}
