//! Fuzz target for compressed RLE decoding.
//!
//! Treats the input as a compressed counts string and decodes it onto a
//! small raster. Valid strings must also survive re-encoding unchanged.
//!
//! Run with:
//!   cargo +nightly fuzz run rle_counts_decode

#![no_main]

use cocokit::mask::{decode, rle, Segmentation};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(counts) = rle::decode_counts_string(text) {
        let again = rle::decode_counts_string(&rle::encode_counts_string(&counts));
        assert_eq!(again.as_ref(), Ok(&counts));
    }

    let segmentation = Segmentation::CompressedRle {
        height: 16,
        width: 16,
        counts: text.to_string(),
    };
    let _ = decode(&segmentation, 16, 16);
});
