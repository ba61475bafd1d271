//! Merging two COCO annotation corpora.
//!
//! The second dataset's image and annotation ids are shifted past the
//! largest ids of the first dataset, annotation `image_id`s are rewritten
//! through the resulting mapping, and the records are concatenated with
//! all of the first dataset first. Top-level metadata comes from the first
//! dataset.
//!
//! A merge either returns one consistent document or fails with a
//! [`MergeError`]; nothing is written in between.

mod error;
mod remap;
mod report;

pub use error::{DatasetLabel, MergeError};
pub use remap::{build_offset, ids_of, remap_annotations, remap_images, IdMapping, RemappedAnnotations};
pub use report::{DatasetCounts, MergeReport, MergeWarning};

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::ir::id_from_value;

/// Top-level keys copied from the first dataset ahead of everything else.
const METADATA_KEYS: [&str; 3] = ["info", "licenses", "categories"];

/// A merged document and the report describing it.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedDataset {
    pub document: Value,
    pub report: MergeReport,
}

/// Merges `second` into `first`.
///
/// Key order of the result: `info`, `licenses`, `categories` (when the first
/// dataset has them), `images`, `annotations`, then any remaining keys of the
/// first dataset in their original order. Keys that only the second dataset
/// has are dropped.
///
/// # Errors
/// Fails without producing output when either input lacks an `images` or
/// `annotations` list, when an annotation of either input references an
/// image that input does not have, or when the second dataset's
/// identifiers cannot be remapped safely (see [`remap_images`] and [`remap_annotations`]).
///
/// # Example
/// ```
/// use cocokit::merge::merge;
/// use serde_json::json;
///
/// let a = json!({"images": [{"id": 1}], "annotations": [{"id": 1, "image_id": 1}]});
/// let b = json!({"images": [{"id": 1}], "annotations": [{"id": 1, "image_id": 1}]});
///
/// let merged = merge(&a, &b)?;
/// assert_eq!(merged.document["images"][1]["id"], 2);
/// assert_eq!(merged.document["annotations"][1]["image_id"], 2);
/// # Ok::<(), cocokit::merge::MergeError>(())
/// ```
pub fn merge(first: &Value, second: &Value) -> Result<MergedDataset, MergeError> {
    let a = validate_coco_like(first, DatasetLabel::First)?;
    let b = validate_coco_like(second, DatasetLabel::Second)?;
    check_references(a.images, a.annotations, DatasetLabel::First)?;

    let image_id_offset = build_offset(ids_of(a.images, "id"));
    let annotation_id_offset = build_offset(ids_of(a.annotations, "id"));
    log::debug!(
        "offsetting second dataset: image ids +{image_id_offset}, annotation ids +{annotation_id_offset}"
    );

    let (images_b, mapping) = remap_images(b.images, image_id_offset)?;
    let remapped = remap_annotations(b.annotations, &mapping, annotation_id_offset)?;
    ensure_disjoint("image", a.images, &images_b)?;
    ensure_disjoint("annotation", a.annotations, &remapped.annotations)?;

    let mut report = MergeReport {
        first: a.counts(),
        second: b.counts(),
        image_id_offset,
        annotation_id_offset,
        ..Default::default()
    };

    let mut merged = Map::new();
    for key in METADATA_KEYS {
        if let Some(value) = a.root.get(key) {
            merged.insert(key.to_string(), value.clone());
        }
    }

    if let (Some(cats_a), Some(cats_b)) = (a.root.get("categories"), b.root.get("categories")) {
        if cats_a != cats_b {
            log::warn!("categories differ between files; keeping categories from the first file");
            report.warnings.push(MergeWarning::CategoriesDiffer);
        }
    }
    if remapped.dropped_ids > 0 {
        report.warnings.push(MergeWarning::DroppedAnnotationIds {
            count: remapped.dropped_ids,
        });
    }

    let images: Vec<Value> = a.images.iter().cloned().chain(images_b).collect();
    let annotations: Vec<Value> = a
        .annotations
        .iter()
        .cloned()
        .chain(remapped.annotations)
        .collect();
    report.output = DatasetCounts {
        images: images.len(),
        annotations: annotations.len(),
    };
    merged.insert("images".to_string(), Value::Array(images));
    merged.insert("annotations".to_string(), Value::Array(annotations));

    for (key, value) in a.root {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }

    Ok(MergedDataset {
        document: Value::Object(merged),
        report,
    })
}

/// Borrowed view of an input that passed [`validate_coco_like`].
struct CocoLike<'a> {
    root: &'a Map<String, Value>,
    images: &'a [Value],
    annotations: &'a [Value],
}

impl CocoLike<'_> {
    fn counts(&self) -> DatasetCounts {
        DatasetCounts {
            images: self.images.len(),
            annotations: self.annotations.len(),
        }
    }
}

/// Checks that `payload` is an object with `images` and `annotations` lists.
fn validate_coco_like(payload: &Value, dataset: DatasetLabel) -> Result<CocoLike<'_>, MergeError> {
    let root = payload
        .as_object()
        .ok_or_else(|| MergeError::schema(dataset, "(root)", "must be a JSON object"))?;

    Ok(CocoLike {
        root,
        images: list_field(root, "images", dataset)?,
        annotations: list_field(root, "annotations", dataset)?,
    })
}

/// Fails on the first annotation whose `image_id` names no image of the
/// same dataset. The second dataset gets the same check during remapping.
fn check_references(images: &[Value], annotations: &[Value], dataset: DatasetLabel) -> Result<(), MergeError> {
    let known: HashSet<u64> = ids_of(images, "id").collect();
    for (index, annotation) in annotations.iter().enumerate() {
        let raw = annotation.get("image_id");
        if raw.and_then(id_from_value).is_some_and(|id| known.contains(&id)) {
            continue;
        }
        return Err(MergeError::DanglingReference {
            dataset,
            index,
            image_id: raw.map(Value::to_string),
        });
    }
    Ok(())
}

/// Fails if any id of `shifted` is also an id of `existing`.
fn ensure_disjoint(kind: &'static str, existing: &[Value], shifted: &[Value]) -> Result<(), MergeError> {
    let taken: HashSet<u64> = ids_of(existing, "id").collect();
    match ids_of(shifted, "id").find(|id| taken.contains(id)) {
        Some(id) => Err(MergeError::IdCollision { kind, id }),
        None => Ok(()),
    }
}

fn list_field<'a>(
    root: &'a Map<String, Value>,
    key: &str,
    dataset: DatasetLabel,
) -> Result<&'a [Value], MergeError> {
    match root.get(key) {
        None => Err(MergeError::schema(dataset, key, "is missing")),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(MergeError::schema(dataset, key, "must be a list")),
    }
}
