//! Cocokit: merge COCO annotation corpora and render their segmentations.
//!
//! Cocokit combines two COCO-format datasets into one without identifier
//! collisions, and decodes COCO segmentations (polygons, uncompressed RLE,
//! compressed RLE) into binary mask images.
//!
//! # Modules
//!
//! - [`ir`]: COCO records, identifier types, and JSON I/O
//! - [`mask`]: Segmentation decoding, RLE codec, and mask aggregation
//! - [`merge`]: Identifier remapping and corpus merging
//! - [`render`]: Batch mask rendering over a document
//! - [`collect`]: Bulk collection of same-named files
//! - [`error`]: Error types for cocokit operations

pub mod collect;
pub mod error;
pub mod ir;
pub mod mask;
pub mod merge;
pub mod render;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use error::CocokitError;

/// The cocokit CLI application.
#[derive(Parser)]
#[command(name = "cocokit")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Merge a second COCO dataset into a first one.
    Merge(MergeArgs),
    /// Render segmentation masks for every image of a COCO dataset.
    Masks(MasksArgs),
    /// Copy same-named files from run directories into one directory.
    Collect(CollectArgs),
}

/// Arguments for the merge subcommand.
#[derive(clap::Args)]
struct MergeArgs {
    /// First dataset; its metadata and ids are kept.
    first: PathBuf,

    /// Second dataset; its ids are offset past the first's.
    second: PathBuf,

    /// Output file for the merged dataset.
    #[arg(short, long)]
    output: PathBuf,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    report: String,
}

/// Arguments for the masks subcommand.
#[derive(clap::Args)]
struct MasksArgs {
    /// COCO annotation file.
    #[arg(long)]
    coco: PathBuf,

    /// Directory that relative image file names are resolved against when
    /// an image has no recorded dimensions.
    #[arg(long)]
    images: Option<PathBuf>,

    /// Directory for union masks (created if missing).
    #[arg(long)]
    out: PathBuf,

    /// Suffix appended to the image base name, extension included.
    #[arg(long, default_value = ".png")]
    suffix: String,

    /// Also write one mask per annotation into this directory.
    #[arg(long)]
    instance_out: Option<PathBuf>,

    /// Number of worker threads (defaults to one per core).
    #[arg(long, env = "COCOKIT_JOBS")]
    jobs: Option<usize>,

    /// Exit non-zero if any image or instance mask failed.
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    report: String,
}

/// Arguments for the collect subcommand.
#[derive(clap::Args)]
struct CollectArgs {
    /// Directory tree to search.
    root: PathBuf,

    /// Destination directory (created if missing).
    dest: PathBuf,

    /// File name to search for.
    #[arg(long, default_value = "fused.jpg")]
    name: String,

    /// Number of worker threads (defaults to one per core).
    #[arg(long, env = "COCOKIT_JOBS")]
    jobs: Option<usize>,

    /// Exit non-zero if any copy failed.
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    report: String,
}

/// Run the cocokit CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocokitError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Merge(args)) => run_merge(args),
        Some(Commands::Masks(args)) => run_masks(args),
        Some(Commands::Collect(args)) => run_collect(args),
        None => {
            println!("cocokit {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Merge COCO annotation corpora and render segmentation masks.");
            println!();
            println!("Run 'cocokit --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the merge subcommand.
fn run_merge(args: MergeArgs) -> Result<(), CocokitError> {
    let first = ir::io_coco_json::read_json_document(&args.first)?;
    let second = ir::io_coco_json::read_json_document(&args.second)?;

    // Nothing is written unless the merge succeeded as a whole.
    let merged = merge::merge(&first, &second)?;
    ir::io_coco_json::write_json_document(&args.output, &merged.document)?;
    log::info!("wrote merged dataset to {}", args.output.display());

    print_report(&merged.report, &args.report)
}

/// Execute the masks subcommand.
fn run_masks(args: MasksArgs) -> Result<(), CocokitError> {
    let doc = ir::io_coco_json::read_coco_document(&args.coco)?;

    create_dir(&args.out)?;
    if let Some(dir) = &args.instance_out {
        create_dir(dir)?;
    }

    let options = render::RenderOptions {
        out_dir: args.out,
        instance_dir: args.instance_out,
        suffix: args.suffix,
    };
    let resolver = render::FileDimensionResolver::new(args.images);
    let report = with_jobs(args.jobs, || {
        render::render_masks(&doc, &resolver, &render::PngSink, &options)
    })??;

    print_report(&report, &args.report)?;

    if args.strict && !report.is_complete() {
        return Err(CocokitError::RenderIncomplete {
            failed: report.failed_count(),
            report,
        });
    }
    Ok(())
}

/// Execute the collect subcommand.
fn run_collect(args: CollectArgs) -> Result<(), CocokitError> {
    if !args.root.is_dir() {
        return Err(CocokitError::InvalidArgument(format!(
            "'{}' is not a directory",
            args.root.display()
        )));
    }
    create_dir(&args.dest)?;

    let options = collect::CollectOptions { file_name: args.name };
    let report = with_jobs(args.jobs, || {
        collect::collect_files(&args.root, &args.dest, &options)
    })??;

    print_report(&report, &args.report)?;

    if args.strict && !report.is_complete() {
        return Err(CocokitError::CollectIncomplete {
            failed: report.failed,
            report,
        });
    }
    Ok(())
}

/// Runs `op` on a dedicated pool of `jobs` threads, or on the global pool.
fn with_jobs<T, F>(jobs: Option<usize>, op: F) -> Result<T, CocokitError>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match jobs {
        Some(0) => Err(CocokitError::InvalidArgument(
            "--jobs must be at least 1".to_string(),
        )),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            Ok(pool.install(op))
        }
        None => Ok(op()),
    }
}

fn create_dir(path: &Path) -> Result<(), CocokitError> {
    fs::create_dir_all(path).map_err(|source| CocokitError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn print_report<R>(report: &R, format: &str) -> Result<(), CocokitError>
where
    R: Serialize + std::fmt::Display,
{
    match format {
        "json" => {
            let json = serde_json::to_string_pretty(report).map_err(|source| CocokitError::JsonWrite {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
            println!("{json}");
        }
        _ => print!("{report}"),
    }
    Ok(())
}
