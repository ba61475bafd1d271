//! COCO data model for cocokit.
//!
//! Two representations of a COCO file live here:
//!
//! 1. **Raw JSON** (`serde_json::Value`), read and written by
//!    [`io_coco_json`]. The merge path rewrites identifiers in place and
//!    leaves every other field alone, so it never goes through a typed
//!    model that could drop unknown keys.
//!
//! 2. **Typed records** ([`CocoDocument`], [`Image`], [`Annotation`]) for
//!    the mask renderer, which only needs ids, dimensions and segmentation.
//!
//! Image identifiers are wrapped in [`ImageId`] wherever they cross module
//! boundaries.
//!
//! # Example
//!
//! ```
//! use cocokit::ir::{Annotation, CocoDocument, Image};
//! use serde_json::json;
//!
//! let doc = CocoDocument {
//!     images: vec![Image::new(1u64, "image.jpg", 480, 640)],
//!     annotations: vec![
//!         Annotation::new(1u64, json!([[10.0, 10.0, 50.0, 10.0, 50.0, 40.0]])).with_id(1),
//!     ],
//!     ..Default::default()
//! };
//! assert_eq!(doc.images[0].recorded_dimensions(), Some((480, 640)));
//! ```

mod ids;
pub mod io_coco_json;
mod model;

// Re-export core types for convenient access
pub use ids::{id_from_value, ImageId};
pub use model::{Annotation, CocoDocument, Image};
