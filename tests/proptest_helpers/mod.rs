#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

use cocokit::mask::RasterMask;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{json, Value};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Distinct positive image ids in arbitrary order.
fn arb_image_ids(max_images: usize) -> BoxedStrategy<Vec<u64>> {
    prop::collection::btree_set(1u64..10_000, 0..=max_images)
        .prop_map(|ids: BTreeSet<u64>| ids.into_iter().collect::<Vec<_>>())
        .prop_flat_map(|ids| Just(ids).prop_shuffle())
        .boxed()
}

/// A raw COCO-like document whose annotations all reference one of its
/// images. Annotation ids may repeat, as they do in the wild.
pub fn arb_coco_dataset(tag: &'static str) -> BoxedStrategy<Value> {
    arb_image_ids(12)
        .prop_flat_map(move |image_ids| {
            let n_images = image_ids.len();
            let annotations = if n_images == 0 {
                Just(Vec::new()).boxed()
            } else {
                prop::collection::vec((0..n_images, 1u64..10_000, 1u64..4), 0..24).boxed()
            };
            (Just(image_ids), annotations)
        })
        .prop_map(move |(image_ids, anns)| {
            let images: Vec<Value> = image_ids
                .iter()
                .map(|id| json!({"id": id, "file_name": format!("{tag}_{id}.jpg"), "height": 8, "width": 8}))
                .collect();
            let annotations: Vec<Value> = anns
                .iter()
                .map(|(image_idx, ann_id, category_id)| {
                    json!({
                        "id": ann_id,
                        "image_id": image_ids[*image_idx],
                        "category_id": category_id,
                        "segmentation": [[0, 0, 4, 0, 4, 4, 0, 4]]
                    })
                })
                .collect();
            json!({
                "categories": [{"id": 1, "name": "fiber"}],
                "images": images,
                "annotations": annotations
            })
        })
        .boxed()
}

pub fn list<'a>(doc: &'a Value, key: &str) -> &'a [Value] {
    doc[key].as_array().map(Vec::as_slice).unwrap_or(&[])
}

pub fn id_of(record: &Value, key: &str) -> u64 {
    record[key].as_u64().expect("integer id")
}

/// `file_name` of the image each annotation points at, in annotation order.
pub fn annotation_file_names(doc: &Value) -> Vec<String> {
    let by_id: HashMap<u64, &str> = list(doc, "images")
        .iter()
        .map(|img| (id_of(img, "id"), img["file_name"].as_str().unwrap_or_default()))
        .collect();
    list(doc, "annotations")
        .iter()
        .map(|ann| by_id[&id_of(ann, "image_id")].to_string())
        .collect()
}

/// Run lengths for a `height x width` raster, alternating background and
/// foreground and summing to the pixel count.
pub fn arb_runs(height: u32, width: u32) -> BoxedStrategy<Vec<u32>> {
    let total = height * width;
    prop::collection::vec(0u32..=total, 0..8)
        .prop_map(move |mut cuts| {
            cuts.push(0);
            cuts.push(total);
            cuts.sort_unstable();
            cuts.windows(2).map(|w| w[1] - w[0]).collect()
        })
        .boxed()
}

/// An arbitrary small mask.
pub fn arb_mask() -> BoxedStrategy<RasterMask> {
    (1u32..12, 1u32..12)
        .prop_flat_map(|(h, w)| (Just(h), Just(w), arb_runs(h, w)))
        .prop_map(|(h, w, runs)| RasterMask::from_runs(h, w, &runs).expect("runs cover the raster"))
        .boxed()
}
