//! COCO run-length codec.
//!
//! Uncompressed RLE is a plain list of run lengths. The compressed form packs
//! the same list into a printable string: each run is written as a sequence
//! of 6-bit groups (5 payload bits plus a continuation bit at `0x20`),
//! offset by `'0'` (48). The final group of a value sign-extends from bit
//! `0x10`. From the fourth run on, values are stored as the difference from
//! the run two positions earlier, so similar consecutive shapes compress
//! well.

use super::DecodeError;

const CHAR_OFFSET: u8 = 48;
const PAYLOAD_BITS: u32 = 5;
const PAYLOAD_MASK: i64 = 0x1f;
const SIGN_BIT: i64 = 0x10;
const MORE_BIT: i64 = 0x20;

/// Unpacks a compressed counts string into run lengths.
///
/// # Errors
/// [`DecodeError::Malformed`] when the string contains characters outside
/// the 64-symbol alphabet, ends in the middle of a value, or decodes to a
/// negative or oversized run.
pub fn decode_counts_string(s: &str) -> Result<Vec<u32>, DecodeError> {
    let bytes = s.as_bytes();
    let mut counts: Vec<u32> = Vec::with_capacity(bytes.len());
    let mut pos = 0usize;

    while pos < bytes.len() {
        let mut x: i64 = 0;
        let mut shift = 0u32;
        loop {
            let Some(&byte) = bytes.get(pos) else {
                return Err(DecodeError::Malformed(
                    "compressed counts end inside a value".to_string(),
                ));
            };
            if !(CHAR_OFFSET..CHAR_OFFSET + 64).contains(&byte) {
                return Err(DecodeError::Malformed(format!(
                    "invalid character {:?} in compressed counts",
                    byte as char
                )));
            }
            if shift + PAYLOAD_BITS >= i64::BITS {
                return Err(DecodeError::Malformed(
                    "compressed run length overflows".to_string(),
                ));
            }

            let c = (byte - CHAR_OFFSET) as i64;
            x |= (c & PAYLOAD_MASK) << shift;
            shift += PAYLOAD_BITS;
            pos += 1;

            if c & MORE_BIT == 0 {
                if c & SIGN_BIT != 0 {
                    x |= -1i64 << shift;
                }
                break;
            }
        }

        if counts.len() > 2 {
            x += counts[counts.len() - 2] as i64;
        }
        let run = u32::try_from(x).map_err(|_| {
            DecodeError::Malformed(format!("run {} decodes to invalid length {x}", counts.len()))
        })?;
        counts.push(run);
    }

    Ok(counts)
}

/// Packs run lengths into the compressed counts string.
pub fn encode_counts_string(counts: &[u32]) -> String {
    let mut out = String::with_capacity(counts.len() * 2);
    for (i, &count) in counts.iter().enumerate() {
        let mut x = count as i64;
        if i > 2 {
            x -= counts[i - 2] as i64;
        }
        loop {
            let mut c = x & PAYLOAD_MASK;
            x >>= PAYLOAD_BITS;
            let more = if c & SIGN_BIT != 0 { x != -1 } else { x != 0 };
            if more {
                c |= MORE_BIT;
            }
            out.push((c as u8 + CHAR_OFFSET) as char);
            if !more {
                break;
            }
        }
    }
    out
}
