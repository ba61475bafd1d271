//! COCO JSON reading and writing.
//!
//! Two views of the same file format are offered:
//!
//! - **Raw documents** ([`read_json_document`], [`write_json_document`]):
//!   a `serde_json::Value` holding the whole file. The merge path uses this
//!   so that fields it does not understand are carried through verbatim,
//!   with their original key order (serde_json `preserve_order`).
//! - **Typed documents** ([`read_coco_document`]): the narrower
//!   [`CocoDocument`] used by the mask renderer.
//!
//! # Output
//!
//! Written documents are UTF-8, pretty-printed with two-space indentation,
//! keep non-ASCII characters unescaped, and end with a trailing newline.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::Value;

use super::model::CocoDocument;
use crate::error::CocokitError;

/// Reads any JSON document from a file.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid JSON.
pub fn read_json_document(path: &Path) -> Result<Value, CocokitError> {
    let file = File::open(path).map_err(|source| CocokitError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| CocokitError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a COCO file into the typed renderer view.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use cocokit::ir::io_coco_json::read_coco_document;
///
/// let doc = read_coco_document(Path::new("annotations/instances.json"))?;
/// println!("{} images", doc.images.len());
/// # Ok::<(), cocokit::CocokitError>(())
/// ```
pub fn read_coco_document(path: &Path) -> Result<CocoDocument, CocokitError> {
    let file = File::open(path).map_err(|source| CocokitError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| CocokitError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a typed COCO document from a string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<CocoDocument, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses a typed COCO document from a byte slice.
///
/// Useful for fuzzing and processing raw bytes without UTF-8 validation overhead.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoDocument, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Writes a JSON document to a file, followed by a newline.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_json_document(path: &Path, document: &Value) -> Result<(), CocokitError> {
    let file = File::create(path).map_err(|source| CocokitError::FileCreate {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, document).map_err(|source| {
        CocokitError::JsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Renders a JSON document exactly as [`write_json_document`] would write it.
pub fn to_document_string(document: &Value) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(document)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_string_has_trailing_newline_and_keeps_unicode() {
        let doc = json!({"info": {"description": "Fasern – Übersicht"}, "images": []});
        let out = to_document_string(&doc).expect("serialize");
        assert!(out.ends_with("}\n"));
        assert!(out.contains("Fasern – Übersicht"));
        assert!(out.contains("\n  \"images\": []"));
    }

    #[test]
    fn test_document_string_preserves_key_order() {
        let doc: Value =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "images": [], "annotations": []}"#)
                .expect("parse");
        let out = to_document_string(&doc).expect("serialize");
        let zeta = out.find("zeta").expect("zeta present");
        let alpha = out.find("alpha").expect("alpha present");
        assert!(zeta < alpha);
    }

    #[test]
    fn test_typed_document_requires_images() {
        assert!(from_coco_str(r#"{"annotations": []}"#).is_err());
        let doc = from_coco_str(r#"{"images": []}"#).expect("parse");
        assert!(doc.annotations.is_empty());
    }

    #[test]
    fn test_write_and_read_document_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.json");
        let doc = json!({"images": [{"id": 1}], "annotations": []});

        write_json_document(&path, &doc).expect("write");
        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.ends_with('\n'));
        assert_eq!(read_json_document(&path).expect("parse back"), doc);
    }
}
