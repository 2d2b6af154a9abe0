//! Metadata validation against the detected tag sets.
//!
//! Every directive in every metadata file is cross-checked against the
//! textually present tags (the grep sweep) and the structurally matched
//! tags (post-pipeline). All violations in a run are collected; none
//! short-circuits. A run is valid iff no violation of any kind occurred.

use crate::metadata::MetadataFile;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A reserved key with a fixed required value has a different value.
    InvalidAttribute {
        attr: String,
        yaml_path: PathBuf,
        region_tag: String,
        actual: String,
        expected: String,
    },
    /// An `additions` value that is not a list.
    AdditionsKeyNotAList {
        region_tag: String,
        yaml_path: PathBuf,
    },
    /// A directive tag (or additions member) absent from the textual set.
    UnusedRegionTag {
        region_tag: String,
        yaml_path: PathBuf,
    },
    /// A manual-test path key that resolves to no file on disk.
    MissingTestFile {
        test_path: PathBuf,
        yaml_path: PathBuf,
    },
    /// A tag present textually but never structurally matched, without the
    /// `tested: false` escape hatch.
    UnparsedRegionTag {
        region_tag: String,
        yaml_path: PathBuf,
    },
    /// A tag marked `tested: false` that was structurally matched anyway.
    DetectedTagMarkedUndetected {
        region_tag: String,
        yaml_path: PathBuf,
    },
    /// A tag declared in more than one metadata file.
    RepeatedTag { region_tag: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::InvalidAttribute {
                attr,
                yaml_path,
                region_tag,
                actual,
                expected,
            } => write!(
                f,
                "Invalid {attr} value in file {} for tag {region_tag}: \
                 {actual}, expected {expected} (or omission)",
                yaml_path.display()
            ),
            Violation::AdditionsKeyNotAList {
                region_tag,
                yaml_path,
            } => write!(
                f,
                "Additions key for {region_tag} in {} is not a list!",
                yaml_path.display()
            ),
            Violation::UnusedRegionTag {
                region_tag,
                yaml_path,
            } => write!(
                f,
                "Yaml file {} contains region tag not used in source files: {region_tag}",
                yaml_path.display()
            ),
            Violation::MissingTestFile {
                test_path,
                yaml_path,
            } => write!(
                f,
                "Test file {} used in {} not found!",
                test_path.display(),
                yaml_path.display()
            ),
            Violation::UnparsedRegionTag {
                region_tag,
                yaml_path,
            } => write!(
                f,
                "Yaml file {} contains unparsed region tag: {region_tag}. \
                 Remove it, or label it with \"tested: false\".",
                yaml_path.display()
            ),
            Violation::DetectedTagMarkedUndetected {
                region_tag,
                yaml_path,
            } => write!(
                f,
                "Parsed tag {region_tag} in file {} marked untested!",
                yaml_path.display()
            ),
            Violation::RepeatedTag { region_tag } => write!(
                f,
                "Region tag {region_tag} is used multiple times in .snippet-data.yml files!"
            ),
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
    }
}

fn check_region_tags(
    files: &[MetadataFile],
    grep_tags: &BTreeSet<String>,
    source_tags: &BTreeSet<String>,
    violations: &mut Vec<Violation>,
) {
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    for file in files {
        for (tag, directive) in &file.entries {
            let should_be_in_source = !directive.is_marked_untested();

            if !grep_tags.contains(tag) {
                violations.push(Violation::UnusedRegionTag {
                    region_tag: tag.clone(),
                    yaml_path: file.path.clone(),
                });
            } else if should_be_in_source && !source_tags.contains(tag) {
                violations.push(Violation::UnparsedRegionTag {
                    region_tag: tag.clone(),
                    yaml_path: file.path.clone(),
                });
            } else if !should_be_in_source && source_tags.contains(tag) {
                violations.push(Violation::DetectedTagMarkedUndetected {
                    region_tag: tag.clone(),
                    yaml_path: file.path.clone(),
                });
            }

            if !seen.insert(tag) {
                violations.push(Violation::RepeatedTag {
                    region_tag: tag.clone(),
                });
            }
        }
    }
}

fn check_attributes(
    files: &[MetadataFile],
    grep_tags: &BTreeSet<String>,
    violations: &mut Vec<Violation>,
) {
    for file in files {
        for (tag, directive) in &file.entries {
            if let Some(tested) = &directive.tested {
                if tested != &Value::Bool(false) {
                    violations.push(Violation::InvalidAttribute {
                        attr: "tested".to_string(),
                        yaml_path: file.path.clone(),
                        region_tag: tag.clone(),
                        actual: format_value(tested),
                        expected: "false".to_string(),
                    });
                }
            }
            if let Some(overwrite) = &directive.overwrite {
                if overwrite != &Value::Bool(true) {
                    violations.push(Violation::InvalidAttribute {
                        attr: "overwrite".to_string(),
                        yaml_path: file.path.clone(),
                        region_tag: tag.clone(),
                        actual: format_value(overwrite),
                        expected: "true".to_string(),
                    });
                }
            }

            if directive.additions.is_some() {
                match directive.additions_list() {
                    None => violations.push(Violation::AdditionsKeyNotAList {
                        region_tag: tag.clone(),
                        yaml_path: file.path.clone(),
                    }),
                    Some(added) => {
                        for added_tag in added {
                            if !grep_tags.contains(&added_tag) {
                                violations.push(Violation::UnusedRegionTag {
                                    region_tag: added_tag,
                                    yaml_path: file.path.clone(),
                                });
                            }
                        }
                    }
                }
            }

            for (rel_path, _) in directive.manual_test_entries() {
                let test_path = file.resolve_test_path(&rel_path);
                if !test_path.exists() {
                    violations.push(Violation::MissingTestFile {
                        test_path,
                        yaml_path: file.path.clone(),
                    });
                }
            }
        }
    }
}

/// Cross-check every directive against the detected tag sets. Returns every
/// violation found; the run is valid iff the result is empty.
pub fn validate_metadata(
    files: &[MetadataFile],
    grep_tags: &BTreeSet<String>,
    source_tags: &BTreeSet<String>,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_region_tags(files, grep_tags, source_tags, &mut violations);
    check_attributes(files, grep_tags, &mut violations);
    violations
}
