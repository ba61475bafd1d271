use std::fmt;

use thiserror::Error;

/// Which input of a merge an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetLabel {
    First,
    Second,
}

impl fmt::Display for DatasetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetLabel::First => write!(f, "first dataset"),
            DatasetLabel::Second => write!(f, "second dataset"),
        }
    }
}

/// Conditions that make two datasets unsafe to merge.
///
/// Every variant is fatal: the merge produces no output at all.
/// Identifier remapping only ever touches the second dataset, so the image
/// and id variants refer to records of that input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("{dataset}: `{key}` {problem}")]
    InvalidSchema {
        dataset: DatasetLabel,
        key: String,
        problem: String,
    },

    #[error("image at index {index} in second dataset has no `id`")]
    MissingImageId { index: usize },

    #[error("image at index {index} in second dataset has a non-numeric `id`: {value}")]
    InvalidImageId { index: usize, value: String },

    #[error("image id {id} appears more than once in second dataset")]
    DuplicateImageId { id: u64 },

    #[error("annotation at index {index} in {dataset} {}", describe_reference(.image_id))]
    DanglingReference {
        dataset: DatasetLabel,
        index: usize,
        image_id: Option<String>,
    },

    /// Only reachable through an id of `0` in the second dataset, which the
    /// offset moves onto the first dataset's largest id.
    #[error("{kind} id {id} of the second dataset collides with the first dataset after offsetting")]
    IdCollision { kind: &'static str, id: u64 },

    #[error("{kind} id {id} + offset {offset} does not fit in 64 bits")]
    IdOverflow {
        kind: &'static str,
        id: u64,
        offset: u64,
    },
}

fn describe_reference(image_id: &Option<String>) -> String {
    match image_id {
        Some(id) => format!("references unknown image_id {id}"),
        None => "has no `image_id`".to_string(),
    }
}

impl MergeError {
    pub(crate) fn schema(dataset: DatasetLabel, key: &str, problem: impl Into<String>) -> Self {
        MergeError::InvalidSchema {
            dataset,
            key: key.to_string(),
            problem: problem.into(),
        }
    }
}
