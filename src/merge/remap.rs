//! Identifier remapping for the second dataset of a merge.
//!
//! The second dataset's ids are shifted by a constant offset (the largest id
//! already used by the first dataset), so the two id spaces cannot overlap
//! without renumbering anything from scratch.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde_json::Value;

use super::error::{DatasetLabel, MergeError};
use crate::ir::{id_from_value, ImageId};

/// Old image id -> new image id, built once per merge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdMapping {
    map: HashMap<ImageId, ImageId>,
}

impl IdMapping {
    /// Looks up the new id for `old`.
    pub fn get(&self, old: ImageId) -> Option<ImageId> {
        self.map.get(&old).copied()
    }

    /// Number of mapped images.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if no image was mapped.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over `(old, new)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ImageId, ImageId)> + '_ {
        self.map.iter().map(|(&old, &new)| (old, new))
    }
}

/// Annotations after remapping, plus how many carried an unusable `id`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemappedAnnotations {
    pub annotations: Vec<Value>,
    pub dropped_ids: usize,
}

/// The offset that moves a second id space clear of `existing_ids`:
/// their maximum, or `0` when there are none.
///
/// ```
/// use cocokit::merge::build_offset;
///
/// assert_eq!(build_offset(std::iter::empty()), 0);
/// assert_eq!(build_offset([5, 2, 9]), 9);
/// ```
pub fn build_offset<I>(existing_ids: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    existing_ids.into_iter().max().unwrap_or(0)
}

/// Readable values of `key` across `records`; records without a usable
/// value are skipped.
pub fn ids_of<'a>(records: &'a [Value], key: &'a str) -> impl Iterator<Item = u64> + 'a {
    records
        .iter()
        .filter_map(move |record| record.get(key).and_then(id_from_value))
}

/// Shifts every image id by `offset` and records the mapping.
///
/// # Errors
/// - [`MergeError::MissingImageId`] if an image has no `id`
/// - [`MergeError::InvalidImageId`] if an `id` is not a non-negative integer
/// - [`MergeError::DuplicateImageId`] if two images share an `id`
/// - [`MergeError::IdOverflow`] if a shifted id exceeds `u64`
pub fn remap_images(images: &[Value], offset: u64) -> Result<(Vec<Value>, IdMapping), MergeError> {
    let mut remapped = Vec::with_capacity(images.len());
    let mut mapping = IdMapping::default();

    for (index, image) in images.iter().enumerate() {
        let raw = image
            .get("id")
            .ok_or(MergeError::MissingImageId { index })?;
        let old = id_from_value(raw).ok_or_else(|| MergeError::InvalidImageId {
            index,
            value: raw.to_string(),
        })?;
        let new = shift("image", old, offset)?;

        match mapping.map.entry(ImageId::new(old)) {
            Entry::Occupied(_) => return Err(MergeError::DuplicateImageId { id: old }),
            Entry::Vacant(slot) => {
                slot.insert(ImageId::new(new));
            }
        }

        let mut image = image.clone();
        if let Some(obj) = image.as_object_mut() {
            obj.insert("id".to_string(), Value::from(new));
        }
        remapped.push(image);
    }

    Ok((remapped, mapping))
}

/// Points every annotation at its remapped image and shifts annotation ids
/// by `ann_id_offset`.
///
/// An `id` that is not a non-negative integer is removed from the output
/// record; the annotation itself is kept.
///
/// # Errors
/// - [`MergeError::DanglingReference`] if an annotation has no `image_id`
///   or its `image_id` is not in `image_id_mapping`
/// - [`MergeError::IdOverflow`] if a shifted annotation id exceeds `u64`
pub fn remap_annotations(
    annotations: &[Value],
    image_id_mapping: &IdMapping,
    ann_id_offset: u64,
) -> Result<RemappedAnnotations, MergeError> {
    let mut out = RemappedAnnotations {
        annotations: Vec::with_capacity(annotations.len()),
        dropped_ids: 0,
    };

    for (index, annotation) in annotations.iter().enumerate() {
        let raw_image_id = annotation
            .get("image_id")
            .ok_or(MergeError::DanglingReference {
                dataset: DatasetLabel::Second,
                index,
                image_id: None,
            })?;
        let new_image_id = id_from_value(raw_image_id)
            .and_then(|old| image_id_mapping.get(ImageId::new(old)))
            .ok_or_else(|| MergeError::DanglingReference {
                dataset: DatasetLabel::Second,
                index,
                image_id: Some(raw_image_id.to_string()),
            })?;

        let mut annotation = annotation.clone();
        if let Some(obj) = annotation.as_object_mut() {
            obj.insert("image_id".to_string(), Value::from(new_image_id.as_u64()));

            match obj.get("id").map(|raw| (id_from_value(raw), raw.to_string())) {
                Some((Some(old), _)) => {
                    let new = shift("annotation", old, ann_id_offset)?;
                    obj.insert("id".to_string(), Value::from(new));
                }
                Some((None, raw)) => {
                    log::debug!("dropping unusable annotation id {raw} at index {index}");
                    obj.shift_remove("id");
                    out.dropped_ids += 1;
                }
                None => {}
            }
        }
        out.annotations.push(annotation);
    }

    Ok(out)
}

fn shift(kind: &'static str, id: u64, offset: u64) -> Result<u64, MergeError> {
    id.checked_add(offset)
        .ok_or(MergeError::IdOverflow { kind, id, offset })
}
