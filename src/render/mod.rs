//! Batch rendering of COCO segmentations into mask images.
//!
//! For every image in a document the renderer resolves the image size,
//! decodes each annotation's segmentation, writes the union mask to
//! `<out_dir>/<base><suffix>` and, when an instance directory is given,
//! one mask per annotation to `<instance_dir>/<base>_<label><suffix>`.
//!
//! Images are independent units and run in parallel on the current rayon
//! pool. A bad annotation costs only that annotation, and a bad image costs
//! only that image; both are counted in the [`RenderReport`]. Errors for
//! which [`RenderError::is_fatal`] holds stop the whole batch.

mod capability;
mod error;
mod outcome;
mod report;

pub use capability::{DimensionResolver, FileDimensionResolver, PngSink, RasterSink};
pub use error::RenderError;
pub use outcome::Outcome;
pub use report::{RenderFailure, RenderReport};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::ir::{Annotation, CocoDocument, Image, ImageId};
use crate::mask::{aggregate, decode_value, select_label, union, AggregateMode, Aggregated, LabeledMask};

/// Where and how masks are written.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Directory for union masks. Must exist.
    pub out_dir: PathBuf,
    /// Directory for per-instance masks; `None` disables them.
    pub instance_dir: Option<PathBuf>,
    /// Appended to the image base name, extension included.
    pub suffix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("masks"),
            instance_dir: None,
            suffix: ".png".to_string(),
        }
    }
}

/// Annotations grouped by the image they reference, in document order.
#[derive(Debug, Default)]
pub struct AnnotationGroups<'a> {
    by_image: HashMap<ImageId, Vec<&'a Annotation>>,
    /// Annotations without an `image_id`, or naming an image not in the document.
    pub orphaned: usize,
}

impl<'a> AnnotationGroups<'a> {
    /// The annotations of `image`, possibly none.
    pub fn for_image(&self, image: ImageId) -> &[&'a Annotation] {
        self.by_image.get(&image).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Groups the annotations of `doc` by image.
pub fn group_annotations(doc: &CocoDocument) -> AnnotationGroups<'_> {
    let known: HashSet<ImageId> = doc.images.iter().map(|image| image.id).collect();
    let mut groups = AnnotationGroups::default();

    for annotation in &doc.annotations {
        match annotation.image() {
            Some(id) if known.contains(&id) => groups.by_image.entry(id).or_default().push(annotation),
            _ => groups.orphaned += 1,
        }
    }

    if groups.orphaned > 0 {
        log::warn!(
            "{} annotation(s) reference no known image and were ignored",
            groups.orphaned
        );
    }
    groups
}

/// Renders the masks of every image in `doc`.
///
/// # Errors
/// Returns the first fatal error (see [`RenderError::is_fatal`]). Units
/// still pending when it happens are not started.
pub fn render_masks<R, S>(
    doc: &CocoDocument,
    resolver: &R,
    sink: &S,
    options: &RenderOptions,
) -> Result<RenderReport, RenderError>
where
    R: DimensionResolver,
    S: RasterSink,
{
    let groups = group_annotations(doc);
    let abort = AtomicBool::new(false);
    log::debug!(
        "rendering {} image(s) with {} rayon thread(s)",
        doc.images.len(),
        rayon::current_num_threads()
    );

    let outcomes: Vec<Option<Outcome<ImageRender, RenderError>>> = doc
        .images
        .par_iter()
        .map(|image| {
            if abort.load(Ordering::Relaxed) {
                return None;
            }
            let result = render_image(image, groups.for_image(image.id), resolver, sink, options);
            let outcome = Outcome::classify(result, RenderError::is_fatal);
            if outcome.is_fatal() {
                abort.store(true, Ordering::Relaxed);
            }
            Some(outcome)
        })
        .collect();

    let mut report = RenderReport {
        images_total: doc.images.len(),
        annotations_orphaned: groups.orphaned,
        ..Default::default()
    };

    for (image, outcome) in doc.images.iter().zip(outcomes) {
        match outcome {
            None => {}
            Some(Outcome::Ok(rendered)) => rendered.fold_into(&mut report),
            Some(Outcome::Skipped(err)) => {
                log::warn!("skipping {}: {}", describe(image), err);
                report.images_failed += 1;
                report.failures.push(RenderFailure::new(describe(image), &err));
            }
            Some(Outcome::Fatal(err)) => return Err(err),
        }
    }

    log::info!(
        "rendered {}/{} image(s), skipped {} annotation(s)",
        report.images_rendered,
        report.images_total,
        report.annotations_skipped
    );
    Ok(report)
}

/// Tallies for one successfully rendered image.
#[derive(Debug, Default)]
struct ImageRender {
    decoded: usize,
    skipped: usize,
    without_segmentation: usize,
    instances_written: usize,
    instances_failed: usize,
    failures: Vec<RenderFailure>,
}

impl ImageRender {
    fn fold_into(self, report: &mut RenderReport) {
        report.images_rendered += 1;
        report.annotations_decoded += self.decoded;
        report.annotations_skipped += self.skipped;
        report.annotations_without_segmentation += self.without_segmentation;
        report.instance_masks_written += self.instances_written;
        report.instance_masks_failed += self.instances_failed;
        report.failures.extend(self.failures);
    }
}

fn render_image<R, S>(
    image: &Image,
    annotations: &[&Annotation],
    resolver: &R,
    sink: &S,
    options: &RenderOptions,
) -> Result<ImageRender, RenderError>
where
    R: DimensionResolver,
    S: RasterSink,
{
    let (height, width) = resolver.resolve(image)?;
    let mut rendered = ImageRender::default();
    let mut masks = Vec::with_capacity(annotations.len());

    for annotation in annotations {
        let Some(segmentation) = &annotation.segmentation else {
            rendered.without_segmentation += 1;
            continue;
        };
        let label = select_label(annotation.id, annotation.secondary_id(), annotation.category_id);
        match decode_value(segmentation, height, width) {
            Ok(mask) => {
                rendered.decoded += 1;
                masks.push(LabeledMask { label, mask });
            }
            Err(err) => {
                let unit = format!("annotation {} of {}", label, describe(image));
                log::warn!("skipping {unit}: {err}");
                rendered.skipped += 1;
                rendered.failures.push(RenderFailure::new(unit, &err));
            }
        }
    }

    let base = mask_base_name(image);
    let merged = union(masks.iter().map(|m| &m.mask), height, width)?;
    sink.persist(&merged, &options.out_dir.join(format!("{base}{}", options.suffix)))?;

    let Some(instance_dir) = &options.instance_dir else {
        return Ok(rendered);
    };
    if let Aggregated::PerInstance(instances) = aggregate(masks, height, width, AggregateMode::PerInstance)? {
        for instance in instances {
            let path = instance_dir.join(format!("{base}_{}{}", instance.label, options.suffix));
            match sink.persist(&instance.mask, &path) {
                Ok(()) => rendered.instances_written += 1,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    log::warn!("{err}");
                    rendered.instances_failed += 1;
                    rendered
                        .failures
                        .push(RenderFailure::new(path.display().to_string(), &err));
                }
            }
        }
    }

    Ok(rendered)
}

/// Base name for an image's masks; the image id when the file name has no stem.
fn mask_base_name(image: &Image) -> String {
    let base = image.base_name();
    if base.is_empty() {
        image.id.to_string()
    } else {
        base
    }
}

fn describe(image: &Image) -> String {
    format!("image {} ({})", image.id, image.file_name)
}
