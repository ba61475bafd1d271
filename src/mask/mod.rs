//! Segmentation decoding and mask aggregation.
//!
//! - [`Segmentation`] is the closed set of COCO segmentation encodings,
//!   classified from a raw JSON value by shape.
//! - [`decode`] turns one segmentation into a [`RasterMask`] for a given
//!   image size.
//! - [`aggregate`] combines the instance masks of an image, either into a
//!   single union mask or as labeled per-instance masks.
//!
//! Masks have exactly two pixel levels ([`BACKGROUND`] and [`FOREGROUND`]
//! when exported as 8-bit) and always match the size of their image.

mod aggregate;
mod decode;
mod polygon;
mod raster;
pub mod rle;

pub use aggregate::{aggregate, select_label, union, AggregateMode, Aggregated, InstanceLabel, LabeledMask};
pub use decode::{decode, decode_value, DecodeError, Segmentation};
pub use polygon::{ring_to_runs, MAX_COORDINATE};
pub use raster::{RasterMask, BACKGROUND, FOREGROUND};
