use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;

mod common;
use common::{write_bmp, write_file};

fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("read output");
    serde_json::from_str(&text).expect("parse output")
}

fn ids(doc: &Value, list: &str, key: &str) -> Vec<u64> {
    doc[list]
        .as_array()
        .expect("list")
        .iter()
        .map(|item| item[key].as_u64().expect("integer"))
        .collect()
}

fn luma(path: &Path) -> image::GrayImage {
    image::open(path).expect("open mask").to_luma8()
}

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("cocokit 0.1.0\n");
}

// Merge subcommand tests

#[test]
fn merge_offsets_second_dataset() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("merged.json");

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args([
        "merge",
        "tests/fixtures/instances_a.json",
        "tests/fixtures/instances_b.json",
        "-o",
    ])
    .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Merged: images=4, annotations=5"));

    let merged = read_json(&out);
    assert_eq!(ids(&merged, "images", "id"), vec![1, 3, 4, 5]);
    assert_eq!(ids(&merged, "annotations", "id"), vec![1, 2, 3, 4, 5]);
    assert_eq!(ids(&merged, "annotations", "image_id"), vec![1, 3, 5, 4, 5]);
    assert_eq!(merged["info"]["description"], "Fiber survey, batch A");
    assert_eq!(merged["licenses"][0]["name"], "CC-BY-4.0");
}

#[test]
fn merge_output_is_pretty_printed_with_trailing_newline() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("merged.json");

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args([
        "merge",
        "tests/fixtures/instances_a.json",
        "tests/fixtures/instances_b.json",
        "--output",
    ])
    .arg(&out);
    cmd.assert().success();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("{\n  \"info\""));
    assert!(text.ends_with("}\n"));
}

#[test]
fn merge_json_report() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("merged.json");

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args([
        "merge",
        "tests/fixtures/instances_a.json",
        "tests/fixtures/instances_b.json",
        "--report",
        "json",
        "-o",
    ])
    .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"image_id_offset\": 3"))
        .stdout(predicates::str::contains("\"annotation_id_offset\": 2"));
}

#[test]
fn merge_dangling_reference_fails_without_output() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("merged.json");

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args([
        "merge",
        "tests/fixtures/instances_a.json",
        "tests/fixtures/instances_b_dangling.json",
        "-o",
    ])
    .arg(&out);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("99"));

    assert!(!out.exists());
}

#[test]
fn merge_nonexistent_file_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args([
        "merge",
        "nonexistent_file.json",
        "tests/fixtures/instances_b.json",
        "-o",
    ])
    .arg(tmp.path().join("merged.json"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("nonexistent_file.json"));
}

// Masks subcommand tests

#[test]
fn masks_writes_union_and_instance_masks() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    let out = tmp.path().join("masks");
    let instances = tmp.path().join("instances");
    write_bmp(&images.join("frame.bmp"), 3, 2);

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args(["masks", "--coco", "tests/fixtures/masks_sample.json", "--images"])
        .arg(&images)
        .arg("--out")
        .arg(&out)
        .arg("--instance-out")
        .arg(&instances);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Rendered: 4/4 images (0 failed)"))
        .stdout(predicates::str::contains("2 skipped"));

    let square = luma(&out.join("square.png"));
    assert_eq!(square.dimensions(), (4, 4));
    assert_eq!(square.get_pixel(1, 1).0, [255]);
    assert_eq!(square.get_pixel(0, 0).0, [0]);

    let mixed = luma(&out.join("mixed.png"));
    assert_eq!(mixed.get_pixel(0, 0).0, [255]);
    assert_eq!(mixed.get_pixel(1, 0).0, [255]);
    assert_eq!(mixed.get_pixel(0, 1).0, [255]);
    assert_eq!(mixed.get_pixel(1, 1).0, [0]);

    let empty = luma(&out.join("empty.png"));
    assert_eq!(empty.dimensions(), (5, 3));
    assert!(empty.pixels().all(|p| p.0 == [0]));

    let frame = luma(&out.join("frame.png"));
    assert_eq!(frame.dimensions(), (3, 2));

    for name in ["square_10.png", "mixed_11.png", "mixed_7.png", "frame_12.png"] {
        assert!(instances.join(name).is_file(), "missing instance mask {name}");
    }
    let instance_7 = luma(&instances.join("mixed_7.png"));
    assert_eq!(instance_7.get_pixel(0, 0).0, [255]);
    assert_eq!(instance_7.get_pixel(1, 0).0, [0]);
}

#[test]
fn masks_json_report_counts_orphans() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    write_bmp(&images.join("frame.bmp"), 3, 2);

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args(["masks", "--coco", "tests/fixtures/masks_sample.json", "--jobs", "2", "--report", "json"])
        .arg("--images")
        .arg(&images)
        .arg("--out")
        .arg(tmp.path().join("masks"));
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"images_rendered\": 4"))
        .stdout(predicates::str::contains("\"annotations_orphaned\": 1"))
        .stdout(predicates::str::contains("\"annotations_skipped\": 2"));
}

#[test]
fn masks_unresolvable_image_is_counted() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("masks");

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args(["masks", "--coco", "tests/fixtures/masks_sample.json", "--out"])
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Rendered: 3/4 images (1 failed)"));

    assert!(out.join("square.png").is_file());
    assert!(!out.join("frame.png").exists());
}

#[test]
fn masks_strict_fails_on_unresolvable_image() {
    let tmp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args(["masks", "--coco", "tests/fixtures/masks_sample.json", "--strict", "--out"])
        .arg(tmp.path().join("masks"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("1 failure(s)"));
}

#[test]
fn masks_zero_jobs_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.args(["masks", "--coco", "tests/fixtures/masks_sample.json", "--jobs", "0", "--out"])
        .arg(tmp.path().join("masks"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("--jobs"));
}

// Collect subcommand tests

#[test]
fn collect_copies_fused_images() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("survey");
    for (dir, contents) in [("a/plot_1", "one"), ("b/plot_1", "two"), ("plot_2", "three")] {
        write_file(&root.join(dir).join("fused.jpg"), contents.as_bytes());
    }
    let dest = root.join("data");

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.arg("collect").arg(&root).arg(&dest);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Collected: 3/3 files (0 failed)"));

    assert_eq!(fs::read_to_string(dest.join("plot_1.jpg")).unwrap(), "one");
    assert_eq!(fs::read_to_string(dest.join("plot_1_2.jpg")).unwrap(), "two");
    assert_eq!(fs::read_to_string(dest.join("plot_2.jpg")).unwrap(), "three");
}

#[test]
fn collect_custom_name() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("survey");
    write_file(&root.join("plot_9/rgb.png"), b"px");
    let dest = tmp.path().join("out");

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.arg("collect")
        .arg(&root)
        .arg(&dest)
        .args(["--name", "rgb.png", "--report", "json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"copied\": 1"));

    assert!(dest.join("plot_9.png").is_file());
}

#[test]
fn collect_missing_root_fails() {
    let tmp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("cocokit").unwrap();
    cmd.arg("collect")
        .arg(tmp.path().join("nope"))
        .arg(tmp.path().join("dest"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("not a directory"));
}
