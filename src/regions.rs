//! Region-tag extraction from raw file text.
//!
//! Markers look like `[START tag]` / `[END tag]` behind any comment leader.
//! Ranges wrapped in `[START_EXCLUDE]` / `[END_EXCLUDE]` are stripped before
//! pairing so excluded markers never participate in regions.

use crate::schema::RegionEntry;
use anyhow::{bail, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Region tags too generic to identify a single snippet.
pub const IGNORED_REGION_TAGS: &[&str] = &["app", "all"];

fn start_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[START ([^\]\s]+)\]").unwrap())
}

fn end_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[END ([^\]\s]+)\]").unwrap())
}

/// Extract the start-marker tag from one line, if any. Used both here and
/// by the corpus-wide textual sweep.
pub fn start_tag_on_line(line: &str) -> Option<&str> {
    start_marker()
        .captures(line)
        .map(|caps| caps.get(1).unwrap().as_str())
}

fn end_tag_on_line(line: &str) -> Option<&str> {
    end_marker()
        .captures(line)
        .map(|caps| caps.get(1).unwrap().as_str())
}

/// Drop lines inside `[START_EXCLUDE]`..`[END_EXCLUDE]` ranges, the marker
/// lines included. Line numbering of surviving lines is preserved.
fn without_excluded_ranges(content: &str) -> Vec<(u32, &str)> {
    let mut kept = Vec::new();
    let mut excluding = false;
    for (idx, line) in content.lines().enumerate() {
        if line.contains("[START_EXCLUDE") {
            excluding = true;
            continue;
        }
        if line.contains("[END_EXCLUDE") {
            excluding = false;
            continue;
        }
        if !excluding {
            kept.push((idx as u32 + 1, line));
        }
    }
    kept
}

/// Extract `(tag, start, end)` regions from one file's text.
///
/// Returns the regions for non-ignored tags plus the ignored tag names seen.
/// Mismatched marker counts, globally or for any single tag, are fatal.
pub fn extract_regions(
    content: &str,
    source_path: &Path,
) -> Result<(Vec<RegionEntry>, Vec<String>)> {
    let lines = without_excluded_ranges(content);

    let mut starts: Vec<(u32, String)> = Vec::new();
    let mut ends: Vec<(u32, String)> = Vec::new();
    for (line_no, line) in &lines {
        if let Some(tag) = start_tag_on_line(line) {
            starts.push((*line_no, tag.to_string()));
        }
        if let Some(tag) = end_tag_on_line(line) {
            ends.push((*line_no, tag.to_string()));
        }
    }

    if starts.len() != ends.len() {
        bail!(
            "mismatched region tags in {}: {} start marker(s), {} end marker(s)",
            source_path.display(),
            starts.len(),
            ends.len()
        );
    }

    starts.sort();
    ends.sort();

    let mut tag_names: Vec<String> = starts.iter().map(|(_, tag)| tag.clone()).collect();
    tag_names.sort();
    tag_names.dedup();

    let mut ignored = Vec::new();
    let mut regions = Vec::new();
    for tag in tag_names {
        if IGNORED_REGION_TAGS.contains(&tag.as_str()) {
            ignored.push(tag);
            continue;
        }

        let tag_starts: Vec<u32> = starts
            .iter()
            .filter(|(_, t)| *t == tag)
            .map(|(n, _)| *n)
            .collect();
        let tag_ends: Vec<u32> = ends
            .iter()
            .filter(|(_, t)| *t == tag)
            .map(|(n, _)| *n)
            .collect();

        if tag_starts.len() != tag_ends.len() {
            bail!(
                "mismatched region tag [{tag}] in {}",
                source_path.display()
            );
        }

        for (start_line, end_line) in tag_starts.into_iter().zip(tag_ends) {
            regions.push(RegionEntry {
                tag: tag.clone(),
                start_line,
                end_line,
            });
        }
    }

    Ok((regions, ignored))
}
