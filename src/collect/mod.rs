//! Bulk collection of same-named files into one flat directory.
//!
//! Capture pipelines often leave one image per run directory, all with the
//! same file name (`run_a/fused.jpg`, `run_b/fused.jpg`, ...). Collection
//! finds every such file under a root and copies it to
//! `<dest>/<parent_dir_name>.<ext>`. Parent names that repeat get `_2`,
//! `_3`, ... suffixes in discovery order, which is sorted by path.
//!
//! Copies run in parallel on the current rayon pool; a failed copy is
//! counted and logged and does not stop the others.

mod report;

pub use report::{CollectFailure, CollectReport};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::CocokitError;

/// Options for [`collect_files`].
#[derive(Clone, Debug)]
pub struct CollectOptions {
    /// File name to search for.
    pub file_name: String,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            file_name: "fused.jpg".to_string(),
        }
    }
}

/// A planned copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyPlan {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Finds every file called `file_name` under `root`, in sorted path order.
///
/// Entries inside `exclude` (typically the destination directory) are not
/// searched.
pub fn find_files(root: &Path, file_name: &str, exclude: Option<&Path>) -> Result<Vec<PathBuf>, CocokitError> {
    let excluded = exclude.and_then(|dir| fs::canonicalize(dir).ok());
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match &excluded {
            Some(skip) if entry.file_type().is_dir() => {
                fs::canonicalize(entry.path()).map_or(true, |path| &path != skip)
            }
            _ => true,
        });

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| CocokitError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.file_name() == file_name {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Makes names unique: the first occurrence keeps its name, later ones get
/// `_2`, `_3`, ... (skipping any suffix already taken).
pub fn unique_names<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for name in names {
        let count = seen.entry(name).or_insert(0);
        *count += 1;
        let mut candidate = if *count == 1 {
            name.to_string()
        } else {
            format!("{name}_{count}")
        };
        while used.contains(&candidate) {
            *count += 1;
            candidate = format!("{name}_{count}");
        }
        used.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Pairs each source with its destination under `dest`.
pub fn plan_copies(sources: Vec<PathBuf>, dest: &Path, file_name: &str) -> Vec<CopyPlan> {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let parents: Vec<String> = sources
        .iter()
        .map(|source| {
            source
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect();
    let names = unique_names(parents.iter().map(String::as_str));

    sources
        .into_iter()
        .zip(names)
        .map(|(source, name)| CopyPlan {
            source,
            destination: dest.join(format!("{name}{extension}")),
        })
        .collect()
}

/// Copies every `options.file_name` under `root` into `dest`.
///
/// `dest` must already exist.
///
/// # Errors
/// Only traversal of `root` can fail the whole run; copy failures end up in
/// the report.
pub fn collect_files(root: &Path, dest: &Path, options: &CollectOptions) -> Result<CollectReport, CocokitError> {
    let sources = find_files(root, &options.file_name, Some(dest))?;
    log::info!(
        "found {} {} file(s) under {}",
        sources.len(),
        options.file_name,
        root.display()
    );
    let plans = plan_copies(sources, dest, &options.file_name);

    let results: Vec<Result<(), CollectFailure>> = plans
        .par_iter()
        .map(|plan| {
            fs::copy(&plan.source, &plan.destination)
                .map(|_| log::debug!("copied {} -> {}", plan.source.display(), plan.destination.display()))
                .map_err(|err| {
                    log::warn!("failed to copy {}: {}", plan.source.display(), err);
                    CollectFailure {
                        source: plan.source.clone(),
                        destination: plan.destination.clone(),
                        reason: err.to_string(),
                    }
                })
        })
        .collect();

    let mut report = CollectReport {
        found: plans.len(),
        ..Default::default()
    };
    for result in results {
        match result {
            Ok(()) => report.copied += 1,
            Err(failure) => {
                report.failed += 1;
                report.failures.push(failure);
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    #[test]
    fn test_unique_names_in_discovery_order() {
        assert_eq!(
            unique_names(["a", "b", "a", "a", "c"]),
            vec!["a", "b", "a_2", "a_3", "c"]
        );
    }

    #[test]
    fn test_unique_names_skip_taken_suffix() {
        assert_eq!(unique_names(["a_2", "a", "a"]), vec!["a_2", "a", "a_3"]);
    }

    #[test]
    fn test_plan_uses_parent_and_extension() {
        let plans = plan_copies(
            vec![
                PathBuf::from("root/x/run1/fused.jpg"),
                PathBuf::from("root/y/run1/fused.jpg"),
            ],
            Path::new("dest"),
            "fused.jpg",
        );
        assert_eq!(plans[0].destination, PathBuf::from("dest/run1.jpg"));
        assert_eq!(plans[1].destination, PathBuf::from("dest/run1_2.jpg"));
    }

    #[test]
    fn test_collect_copies_all_matches() {
        let root = tempfile::tempdir().expect("tempdir");
        touch(&root.path().join("a/run1/fused.jpg"), "one");
        touch(&root.path().join("b/run1/fused.jpg"), "two");
        touch(&root.path().join("run2/fused.jpg"), "three");
        touch(&root.path().join("run2/other.jpg"), "ignored");
        let dest = root.path().join("data");
        fs::create_dir(&dest).expect("mkdir dest");

        let report = collect_files(root.path(), &dest, &CollectOptions::default()).expect("collect");

        assert_eq!(report.found, 3);
        assert_eq!(report.copied, 3);
        assert!(report.is_complete());
        assert_eq!(fs::read_to_string(dest.join("run1.jpg")).expect("read"), "one");
        assert_eq!(fs::read_to_string(dest.join("run1_2.jpg")).expect("read"), "two");
        assert_eq!(fs::read_to_string(dest.join("run2.jpg")).expect("read"), "three");
    }

    #[test]
    fn test_destination_is_not_searched() {
        let root = tempfile::tempdir().expect("tempdir");
        let dest = root.path().join("data");
        touch(&dest.join("fused.jpg"), "already collected");
        touch(&root.path().join("run/fused.jpg"), "new");

        let found = find_files(root.path(), "fused.jpg", Some(&dest)).expect("find");
        assert_eq!(found, vec![root.path().join("run/fused.jpg")]);
    }

    #[test]
    fn test_missing_root_fails() {
        let root = tempfile::tempdir().expect("tempdir");
        let missing = root.path().join("nope");
        assert!(matches!(
            find_files(&missing, "fused.jpg", None),
            Err(CocokitError::Walk { .. })
        ));
    }
}
