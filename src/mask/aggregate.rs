//! Combining per-instance masks for one image.

use std::fmt;

use serde::Serialize;

use super::{DecodeError, RasterMask};

/// How a set of instance masks is combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateMode {
    /// Logical OR of every mask.
    Union,
    /// Keep each mask separately, tagged with its [`InstanceLabel`].
    PerInstance,
}

/// The label attached to a per-instance mask, and where it came from.
///
/// Selection order is fixed: the annotation's own id, then the secondary
/// (instance) id, then the category id, then `0`. Only an absent value
/// falls through; an id of `0` is a real id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum InstanceLabel {
    Annotation(u64),
    Secondary(u64),
    Category(u64),
    Default,
}

impl InstanceLabel {
    /// The numeric label.
    pub fn value(&self) -> u64 {
        match *self {
            InstanceLabel::Annotation(v) | InstanceLabel::Secondary(v) | InstanceLabel::Category(v) => v,
            InstanceLabel::Default => 0,
        }
    }
}

impl fmt::Display for InstanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Picks the label for an instance mask.
pub fn select_label(
    annotation_id: Option<u64>,
    secondary_id: Option<u64>,
    category_id: Option<u64>,
) -> InstanceLabel {
    if let Some(id) = annotation_id {
        InstanceLabel::Annotation(id)
    } else if let Some(id) = secondary_id {
        InstanceLabel::Secondary(id)
    } else if let Some(id) = category_id {
        InstanceLabel::Category(id)
    } else {
        InstanceLabel::Default
    }
}

/// A decoded instance mask with its label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledMask {
    pub label: InstanceLabel,
    pub mask: RasterMask,
}

/// Result of [`aggregate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Aggregated {
    Union(RasterMask),
    PerInstance(Vec<LabeledMask>),
}

/// Combines the instance masks of one `height x width` image.
///
/// An empty input is not an error: in [`AggregateMode::Union`] it yields an
/// all-background mask of the requested size.
///
/// # Errors
/// [`DecodeError::SizeMismatch`] if any mask is not `height x width`.
pub fn aggregate(
    masks: Vec<LabeledMask>,
    height: u32,
    width: u32,
    mode: AggregateMode,
) -> Result<Aggregated, DecodeError> {
    match mode {
        AggregateMode::Union => union(masks.iter().map(|m| &m.mask), height, width).map(Aggregated::Union),
        AggregateMode::PerInstance => {
            for labeled in &masks {
                check_dimensions(&labeled.mask, height, width)?;
            }
            Ok(Aggregated::PerInstance(masks))
        }
    }
}

/// ORs masks together onto an all-background `height x width` canvas.
pub fn union<'a, I>(masks: I, height: u32, width: u32) -> Result<RasterMask, DecodeError>
where
    I: IntoIterator<Item = &'a RasterMask>,
{
    let mut merged = RasterMask::empty(height, width);
    for mask in masks {
        merged.union_with(mask)?;
    }
    Ok(merged)
}

fn check_dimensions(mask: &RasterMask, height: u32, width: u32) -> Result<(), DecodeError> {
    if mask.dimensions() != (height, width) {
        return Err(DecodeError::SizeMismatch {
            height,
            width,
            found_height: mask.height(),
            found_width: mask.width(),
        });
    }
    Ok(())
}
