//! Whole-corpus analysis pipeline.
//!
//! Per-file work (region extraction, interval matching) runs in parallel;
//! everything that reads or mutates corpus-wide method state afterwards
//! (correlation, closure, overrides, dedup) runs single-threaded.

use crate::closure::{is_invocation_wrapper, redistribute_wrapper_tests, resolve_closure};
use crate::correlate::attach_test_references;
use crate::dedupe::dedupe_methods;
use crate::files::sweep_region_tags;
use crate::matcher::assign_region_tags;
use crate::metadata::{load_metadata_files, untested_tags};
use crate::overrides::apply_overrides;
use crate::regions::{extract_regions, IGNORED_REGION_TAGS};
use crate::schema::{Analysis, RegionEntry, SnippetIndex};
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Load the extractor-produced snippet index and normalize its relative
/// paths against the index file's directory.
pub fn load_index(data_json: &Path) -> Result<SnippetIndex> {
    let contents = fs::read_to_string(data_json)
        .with_context(|| format!("read snippet index {}", data_json.display()))?;
    let mut index: SnippetIndex = serde_json::from_str(&contents)
        .with_context(|| format!("parse snippet index {}", data_json.display()))?;

    let parent = data_json.parent().unwrap_or_else(|| Path::new(""));
    for method in &mut index.snippets {
        if method.end_line < method.start_line {
            bail!(
                "method {} in {} has end_line {} before start_line {}",
                method.name,
                data_json.display(),
                method.end_line,
                method.start_line
            );
        }
        if method.source_path.is_relative() {
            method.source_path = parent.join(&method.source_path);
        }
    }
    for references in index.test_method_map.values_mut() {
        for (test_file, _) in references {
            if test_file.is_relative() {
                *test_file = parent.join(&test_file);
            }
        }
    }

    Ok(index)
}

/// Run the full pipeline for one directory tree.
pub fn analyze_dir(data_json: &Path, root_dir: &Path) -> Result<Analysis> {
    let index = load_index(data_json)?;
    let mut methods = index.snippets;

    let source_files: BTreeSet<PathBuf> = methods
        .iter()
        .map(|method| method.source_path.clone())
        .collect();
    for source_file in &source_files {
        if !source_file.is_file() {
            bail!(
                "source path {} referenced by {} not found on disk",
                source_file.display(),
                data_json.display()
            );
        }
    }

    // Per-file stage: extract regions, in parallel.
    let extracted: Vec<(PathBuf, Vec<RegionEntry>, Vec<String>)> = source_files
        .par_iter()
        .map(|source_file| {
            let contents = fs::read_to_string(source_file)
                .with_context(|| format!("read source file {}", source_file.display()))?;
            let (regions, ignored) = extract_regions(&contents, source_file)?;
            Ok((source_file.clone(), regions, ignored))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut grep_tags = sweep_region_tags(root_dir);
    let mut ignored_tags: BTreeSet<String> = BTreeSet::new();

    let regions_by_file: BTreeMap<&Path, &[RegionEntry]> = extracted
        .iter()
        .map(|(path, regions, ignored)| {
            ignored_tags.extend(ignored.iter().cloned());
            grep_tags.extend(regions.iter().map(|region| region.tag.clone()));
            (path.as_path(), regions.as_slice())
        })
        .collect();

    for method in &mut methods {
        if let Some(regions) = regions_by_file.get(method.source_path.as_path()) {
            assign_region_tags(std::slice::from_mut(method), regions);
        }
    }

    attach_test_references(&mut methods, &index.test_method_map);

    redistribute_wrapper_tests(&mut methods);
    resolve_closure(&mut methods);

    methods.retain(|method| !method.region_tags.is_empty() || is_invocation_wrapper(method));

    let metadata_files = load_metadata_files(root_dir);
    apply_overrides(&mut methods, &metadata_files);

    let methods = dedupe_methods(methods);

    // Globally ignored tags never count as textual or structural.
    for tag in IGNORED_REGION_TAGS {
        if grep_tags.remove(*tag) {
            ignored_tags.insert(tag.to_string());
        }
    }

    let source_tags: BTreeSet<String> = methods
        .iter()
        .flat_map(|method| method.region_tags.iter().cloned())
        .filter(|tag| !ignored_tags.contains(tag))
        .collect();

    // Tags manually marked untested join the ignored set for reporting.
    ignored_tags.extend(untested_tags(&metadata_files));

    Ok(Analysis {
        grep_tags,
        source_tags,
        ignored_tags,
        methods,
    })
}
