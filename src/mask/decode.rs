//! Segmentation payload classification and decoding.

use serde_json::Value;
use thiserror::Error;

use super::polygon::{ring_to_runs, MAX_COORDINATE};
use super::raster::RasterMask;
use super::rle::decode_counts_string;

/// Why a single segmentation could not be turned into a mask.
///
/// All variants are recoverable: the offending annotation is skipped and
/// its siblings are still rendered.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed segmentation: {0}")]
    Malformed(String),

    #[error("run lengths cover {actual} pixels, expected {expected}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("mask is {found_height}x{found_width}, expected {height}x{width}")]
    SizeMismatch {
        height: u32,
        width: u32,
        found_height: u32,
        found_width: u32,
    },
}

/// The three segmentation encodings COCO allows.
#[derive(Clone, Debug, PartialEq)]
pub enum Segmentation {
    /// One or more rings of `[x0, y0, x1, y1, ...]`.
    Polygon(Vec<Vec<f64>>),

    /// `{"counts": [..], "size": [h, w]}`
    UncompressedRle { height: u32, width: u32, counts: Vec<u32> },

    /// `{"counts": "..", "size": [h, w]}`
    CompressedRle { height: u32, width: u32, counts: String },
}

impl Segmentation {
    /// Classifies a raw `segmentation` value by its shape: a list is a
    /// polygon, an object whose `counts` is a list is uncompressed RLE, an
    /// object whose `counts` is a string is compressed RLE.
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Array(rings) => parse_polygon(rings),
            Value::Object(obj) => {
                let (height, width) = parse_size(obj.get("size"))?;
                match obj.get("counts") {
                    Some(Value::Array(raw)) => Ok(Segmentation::UncompressedRle {
                        height,
                        width,
                        counts: parse_counts(raw)?,
                    }),
                    Some(Value::String(s)) => Ok(Segmentation::CompressedRle {
                        height,
                        width,
                        counts: s.clone(),
                    }),
                    Some(_) => Err(malformed("`counts` must be a list or a string")),
                    None => Err(malformed("RLE is missing `counts`")),
                }
            }
            other => Err(malformed(format!(
                "unsupported segmentation type: {}",
                json_type_name(other)
            ))),
        }
    }

    /// Short name of the encoding, for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Segmentation::Polygon(_) => "polygon",
            Segmentation::UncompressedRle { .. } => "rle",
            Segmentation::CompressedRle { .. } => "compressed-rle",
        }
    }
}

/// Decodes a segmentation into a `height x width` mask.
///
/// Polygon rings are rasterized independently and unioned. RLE payloads
/// must declare the same size as the image they belong to.
///
/// # Example
/// ```
/// use cocokit::mask::{decode, Segmentation};
///
/// let rle = Segmentation::UncompressedRle { height: 2, width: 2, counts: vec![0, 4] };
/// let mask = decode(&rle, 2, 2)?;
/// assert_eq!(mask.area(), 4);
/// # Ok::<(), cocokit::mask::DecodeError>(())
/// ```
pub fn decode(segmentation: &Segmentation, height: u32, width: u32) -> Result<RasterMask, DecodeError> {
    match segmentation {
        Segmentation::Polygon(rings) => {
            let mut mask = RasterMask::empty(height, width);
            for ring in rings {
                let runs = ring_to_runs(ring, height, width);
                mask.union_with(&RasterMask::from_runs(height, width, &runs)?)?;
            }
            Ok(mask)
        }
        Segmentation::UncompressedRle {
            height: h,
            width: w,
            counts,
        } => {
            check_size(*h, *w, height, width)?;
            RasterMask::from_runs(height, width, counts)
        }
        Segmentation::CompressedRle {
            height: h,
            width: w,
            counts,
        } => {
            check_size(*h, *w, height, width)?;
            let runs = decode_counts_string(counts)?;
            RasterMask::from_runs(height, width, &runs)
        }
    }
}

/// Classifies and decodes a raw `segmentation` value in one step.
pub fn decode_value(value: &Value, height: u32, width: u32) -> Result<RasterMask, DecodeError> {
    decode(&Segmentation::from_value(value)?, height, width)
}

/// Structural checks only: every ring is a list of an even number of finite
/// coordinates within [`MAX_COORDINATE`]. The first ring must describe at
/// least a triangle, as that is what marks the payload as a polygon; later
/// rings may be degenerate and simply cover nothing.
fn parse_polygon(rings: &[Value]) -> Result<Segmentation, DecodeError> {
    match rings.first() {
        None => return Err(malformed("polygon has no rings")),
        Some(Value::Array(first)) if first.len() < 6 => {
            return Err(malformed(format!(
                "first ring has {} coordinates, at least 6 are required",
                first.len()
            )));
        }
        Some(_) => {}
    }

    let mut parsed = Vec::with_capacity(rings.len());
    for (idx, ring) in rings.iter().enumerate() {
        let Value::Array(coords) = ring else {
            return Err(malformed(format!("ring {idx} is not a list of coordinates")));
        };
        if coords.len() % 2 != 0 {
            return Err(malformed(format!(
                "ring {idx} has an odd number of coordinates ({})",
                coords.len()
            )));
        }
        let xy = coords
            .iter()
            .map(|c| c.as_f64())
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| malformed(format!("ring {idx} contains a non-numeric coordinate")))?;
        if let Some(c) = xy.iter().find(|c| !c.is_finite() || c.abs() > MAX_COORDINATE) {
            return Err(malformed(format!(
                "ring {idx} has coordinate {c} outside ±{MAX_COORDINATE}"
            )));
        }
        if !xy.is_empty() {
            parsed.push(xy);
        }
    }
    Ok(Segmentation::Polygon(parsed))
}

fn parse_size(size: Option<&Value>) -> Result<(u32, u32), DecodeError> {
    let Some(Value::Array(dims)) = size else {
        return Err(malformed("RLE is missing `size`"));
    };
    let dims: Vec<u32> = dims
        .iter()
        .map(|d| d.as_u64().and_then(|d| u32::try_from(d).ok()))
        .collect::<Option<_>>()
        .ok_or_else(|| malformed("`size` must hold non-negative integers"))?;
    match dims.as_slice() {
        [h, w] => Ok((*h, *w)),
        _ => Err(malformed("`size` must be [height, width]")),
    }
}

fn parse_counts(raw: &[Value]) -> Result<Vec<u32>, DecodeError> {
    raw.iter()
        .enumerate()
        .map(|(idx, c)| match c.as_u64() {
            Some(n) => u32::try_from(n)
                .map_err(|_| malformed(format!("count {idx} is too large ({n})"))),
            None => Err(malformed(format!("count {idx} is not a non-negative integer: {c}"))),
        })
        .collect()
}

fn check_size(found_height: u32, found_width: u32, height: u32, width: u32) -> Result<(), DecodeError> {
    if (found_height, found_width) != (height, width) {
        return Err(DecodeError::SizeMismatch {
            height,
            width,
            found_height,
            found_width,
        });
    }
    Ok(())
}

fn malformed(message: impl Into<String>) -> DecodeError {
    DecodeError::Malformed(message.into())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
