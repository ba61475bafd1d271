//! Fuzz target for merging two arbitrary JSON documents.
//!
//! The input is split at the first NUL byte into two documents. Whatever
//! they contain, a merge must either fail cleanly or produce a document
//! with unique image ids.
//!
//! Run with:
//!   cargo +nightly fuzz run merge_json

#![no_main]

use std::collections::HashSet;

use cocokit::merge::merge;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Some(split) = data.iter().position(|&b| b == 0) else {
        return;
    };
    let (Ok(first), Ok(second)) = (
        serde_json::from_slice::<Value>(&data[..split]),
        serde_json::from_slice::<Value>(&data[split + 1..]),
    ) else {
        return;
    };

    let Ok(merged) = merge(&first, &second) else {
        return;
    };

    // Uniqueness only holds when the first dataset's own ids were unique.
    let first_ids: Vec<_> = first["images"].as_array().into_iter().flatten().map(|i| i["id"].clone()).collect();
    let first_unique = first_ids.iter().map(Value::to_string).collect::<HashSet<_>>().len() == first_ids.len();
    if first_unique && first_ids.iter().all(Value::is_u64) {
        let ids: Vec<_> = merged.document["images"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|i| i["id"].as_u64())
            .collect();
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }
});
