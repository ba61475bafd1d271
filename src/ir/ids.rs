//! The image identifier newtype.
//!
//! Image ids are the one identifier that crosses module boundaries (the
//! merge mapping, annotation grouping, render errors), so they get their
//! own type; other ids stay plain `u64`.
//!
//! COCO files in the wild are loose about how identifiers are spelled, so
//! this module also owns the rule for reading an identifier out of an
//! arbitrary JSON value: see [`id_from_value`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// A unique identifier for an image in the dataset.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl ImageId {
    /// Creates a new ImageId.
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ImageId {
    fn from(id: u64) -> Self {
        ImageId::new(id)
    }
}

/// Reads a non-negative integer identifier from a JSON value.
///
/// Accepted spellings:
/// - unsigned integers (`7`)
/// - integral floats (`7.0`)
/// - decimal strings, surrounding whitespace ignored (`"7"`)
///
/// Everything else (negative numbers, fractions, booleans, `null`, objects)
/// yields `None`.
pub fn id_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Some(v);
            }
            let f = n.as_f64()?;
            if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
                Some(f as u64)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Serde helper: deserializes an optional identifier with [`id_from_value`]
/// semantics, mapping unreadable values to `None` instead of failing.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}

/// Serde helper for image sizes: same spellings as [`lenient_id`], but
/// values that do not fit in `u32` also read as `None`, leaving the size to
/// be resolved from the pixel file.
pub(crate) fn lenient_dimension<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(id_from_value)
        .and_then(|v| u32::try_from(v).ok()))
}
