//! Typed COCO model used by the mask rendering path.
//!
//! The merge path works on raw JSON documents so that every field survives
//! untouched; rendering only needs a handful of fields per record, so it
//! reads this narrower typed view instead. Fields that are frequently
//! missing or sloppily typed in real datasets (`height`, `width`, annotation
//! ids) are optional here, and resolution is deferred to the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{lenient_dimension, lenient_id, ImageId};

/// A COCO document as seen by the mask renderer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CocoDocument {
    /// All images in the document.
    pub images: Vec<Image>,

    /// All annotations in the document.
    #[serde(default)]
    pub annotations: Vec<Annotation>,

    /// Category definitions, passed through without interpretation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Value>,
}

/// An image record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Image {
    /// Unique identifier for this image.
    pub id: ImageId,

    /// Filename or path of the image.
    #[serde(default)]
    pub file_name: String,

    /// Height in pixels, when recorded in the document.
    #[serde(default, deserialize_with = "lenient_dimension", skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Width in pixels, when recorded in the document.
    #[serde(default, deserialize_with = "lenient_dimension", skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl Image {
    /// Creates a new image with known dimensions.
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, height: u32, width: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            height: Some(height),
            width: Some(width),
        }
    }

    /// Creates an image whose dimensions must be resolved from its pixel file.
    pub fn without_dimensions(id: impl Into<ImageId>, file_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            height: None,
            width: None,
        }
    }

    /// Returns `(height, width)` if both are recorded and positive.
    pub fn recorded_dimensions(&self) -> Option<(u32, u32)> {
        match (self.height, self.width) {
            (Some(h), Some(w)) if h > 0 && w > 0 => Some((h, w)),
            _ => None,
        }
    }

    /// The file name without directories or extension, used to name masks.
    pub fn base_name(&self) -> String {
        std::path::Path::new(&self.file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// An annotation record.
///
/// `segmentation` is kept as raw JSON; it is classified into a
/// [`Segmentation`](crate::mask::Segmentation) only when decoded, so a
/// malformed payload costs one annotation rather than the whole document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub image_id: Option<u64>,

    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,

    /// Alternate instance identifier some exporters write instead of `id`.
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u64>,

    /// Legacy spelling of the annotation identifier.
    #[serde(
        default,
        rename = "annId",
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub ann_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Value>,
}

impl Annotation {
    /// Creates an annotation for `image_id` carrying `segmentation`.
    pub fn new(image_id: impl Into<ImageId>, segmentation: Value) -> Self {
        Self {
            image_id: Some(image_id.into().as_u64()),
            segmentation: Some(segmentation),
            ..Default::default()
        }
    }

    /// Sets the annotation id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the category id.
    pub fn with_category(mut self, category_id: u64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Sets the alternate instance id.
    pub fn with_instance_id(mut self, instance_id: u64) -> Self {
        self.instance_id = Some(instance_id);
        self
    }

    /// The image this annotation belongs to, if it names one.
    pub fn image(&self) -> Option<ImageId> {
        self.image_id.map(ImageId::new)
    }

    /// The secondary identifier: `instance_id`, then `annId`.
    pub fn secondary_id(&self) -> Option<u64> {
        self.instance_id.or(self.ann_id)
    }
}
