//! Directory traversal and the corpus-wide textual region-tag sweep.
//!
//! The sweep is the grep-equivalent source of truth for which tags exist
//! anywhere in the tree, whether or not the extractor structurally parsed
//! them. Unreadable files are diagnostics, not failures.

use crate::regions::start_tag_on_line;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Every file under `root_dir`, dot-directories skipped.
pub fn walk_files(root_dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root_dir)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .map(|name| name.starts_with('.'))
                        .unwrap_or(false))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    paths
}

/// Collect every region tag textually present under `root_dir`.
pub fn sweep_region_tags(root_dir: &Path) -> BTreeSet<String> {
    walk_files(root_dir)
        .par_iter()
        .map(|path| {
            let contents = match fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable file");
                    return BTreeSet::new();
                }
            };
            contents
                .lines()
                .filter_map(start_tag_on_line)
                .filter(|tag| tag.len() > 1)
                .map(str::to_string)
                .collect::<BTreeSet<String>>()
        })
        .reduce(BTreeSet::new, |mut acc, tags| {
            acc.extend(tags);
            acc
        })
}
