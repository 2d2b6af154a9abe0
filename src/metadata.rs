//! Discovery and parsing of `.snippet-data.yml` metadata files.
//!
//! Each metadata file maps region-tag strings to a directive object.
//! Reserved directive keys are `tested`, `overwrite`, and `additions`; any
//! other key is read as a test-file path with a list of test method names.
//! Values are kept as raw YAML so the validator can report wrong shapes
//! instead of failing to parse them.

use rayon::prelude::*;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

pub const METADATA_FILE_NAMES: &[&str] = &[".snippet-data.yml", ".snippet-data.yaml"];

pub const RESERVED_KEYS: &[&str] = &["tested", "overwrite", "additions"];

/// One region tag's directive, fields still in raw YAML form.
#[derive(Debug, Clone, Default)]
pub struct Directive {
    pub tested: Option<Value>,
    pub overwrite: Option<Value>,
    pub additions: Option<Value>,
    /// Non-reserved keys: relative test-file path -> raw value (expected to
    /// be a list of test method names).
    pub test_files: BTreeMap<String, Value>,
}

impl Directive {
    pub fn is_overwrite(&self) -> bool {
        matches!(self.overwrite, Some(Value::Bool(true)))
    }

    pub fn is_marked_untested(&self) -> bool {
        matches!(self.tested, Some(Value::Bool(false)))
    }

    /// The additions value as a tag list, if it is one.
    pub fn additions_list(&self) -> Option<Vec<String>> {
        match &self.additions {
            Some(Value::Sequence(items)) => Some(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Manual test declarations: `(relative_path, test_names)` per file key.
    pub fn manual_test_entries(&self) -> Vec<(String, Vec<String>)> {
        self.test_files
            .iter()
            .map(|(path, value)| {
                let names = match value {
                    Value::Sequence(items) => items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                    _ => Vec::new(),
                };
                (path.clone(), names)
            })
            .collect()
    }

    /// True when the directive carries a reserved key other than
    /// `overwrite`. Such entries are not manual-test declarations.
    pub fn has_reserved_key_besides_overwrite(&self) -> bool {
        self.tested.is_some() || self.additions.is_some()
    }
}

/// One parsed metadata file.
#[derive(Debug, Clone)]
pub struct MetadataFile {
    pub path: PathBuf,
    pub entries: BTreeMap<String, Directive>,
}

impl MetadataFile {
    /// Resolve a test-file key against this metadata file's directory.
    pub fn resolve_test_path(&self, key: &str) -> PathBuf {
        let path = Path::new(key);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(path)
        }
    }
}

fn parse_directive(tag: &str, value: &Value, path: &Path) -> Option<Directive> {
    let Value::Mapping(mapping) = value else {
        warn!(
            tag,
            path = %path.display(),
            "metadata entry is not a mapping, skipping"
        );
        return None;
    };

    let mut directive = Directive::default();
    for (key, entry_value) in mapping {
        let Some(key) = key.as_str() else {
            warn!(tag, path = %path.display(), "non-string metadata key, skipping entry");
            return None;
        };
        match key {
            "tested" => directive.tested = Some(entry_value.clone()),
            "overwrite" => directive.overwrite = Some(entry_value.clone()),
            "additions" => directive.additions = Some(entry_value.clone()),
            other => {
                directive
                    .test_files
                    .insert(other.to_string(), entry_value.clone());
            }
        }
    }
    Some(directive)
}

/// Parse one metadata file. Unreadable or unparsable files are skipped with
/// a warning; they are an I/O concern, not a validation violation.
pub fn parse_metadata_file(path: &Path) -> Option<MetadataFile> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read metadata file");
            return None;
        }
    };
    let parsed: Value = match serde_yaml::from_str(&contents) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not parse metadata file");
            return None;
        }
    };
    let Value::Mapping(mapping) = parsed else {
        warn!(path = %path.display(), "metadata file is not a mapping, skipping");
        return None;
    };

    let mut entries = BTreeMap::new();
    for (tag, value) in &mapping {
        let Some(tag) = tag.as_str() else {
            warn!(path = %path.display(), "non-string region tag key, skipping");
            continue;
        };
        if let Some(directive) = parse_directive(tag, value, path) {
            entries.insert(tag.to_string(), directive);
        }
    }

    Some(MetadataFile {
        path: path.to_path_buf(),
        entries,
    })
}

/// Find and parse every metadata file under `root_dir`, in path order.
/// Parsing is side-effect-free, so files are handled in parallel and merged
/// by sorting afterwards.
pub fn load_metadata_files(root_dir: &Path) -> Vec<MetadataFile> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root_dir)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .map(|name| entry.file_type().is_dir() && name.starts_with('.'))
                    .unwrap_or(false)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| METADATA_FILE_NAMES.contains(&name))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    let mut files: Vec<MetadataFile> = paths
        .par_iter()
        .filter_map(|path| parse_metadata_file(path))
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Tags explicitly marked `tested: false` across all metadata files.
pub fn untested_tags(files: &[MetadataFile]) -> Vec<String> {
    let mut tags: Vec<String> = files
        .iter()
        .flat_map(|file| {
            file.entries
                .iter()
                .filter(|(_, directive)| directive.is_marked_untested())
                .map(|(tag, _)| tag.clone())
        })
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
