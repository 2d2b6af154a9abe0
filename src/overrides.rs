//! Metadata-driven overrides of automatically detected coverage.
//!
//! Three directives apply, in a fixed order: `overwrite` discards
//! auto-detected tests first, manual test declarations attach explicit
//! tests second, and `additions` unions tag equivalence classes last so it
//! operates on fully test-populated tag sets.

use crate::metadata::MetadataFile;
use crate::schema::{SnippetMethod, TestReference};
use std::collections::{BTreeMap, BTreeSet};

pub fn apply_overrides(methods: &mut [SnippetMethod], files: &[MetadataFile]) {
    apply_overwrites(methods, files);
    apply_manual_tests(methods, files);
    apply_additions(methods, files);
}

/// Clear test references of every method whose tag set intersects a tag
/// marked `overwrite: true`.
fn apply_overwrites(methods: &mut [SnippetMethod], files: &[MetadataFile]) {
    let overwritten: BTreeSet<&str> = files
        .iter()
        .flat_map(|file| {
            file.entries
                .iter()
                .filter(|(_, directive)| directive.is_overwrite())
                .map(|(tag, _)| tag.as_str())
        })
        .collect();
    if overwritten.is_empty() {
        return;
    }

    for method in methods {
        if method
            .region_tags
            .iter()
            .any(|tag| overwritten.contains(tag.as_str()))
        {
            method.test_references.clear();
        }
    }
}

/// Attach explicitly declared tests to every method carrying the entry's
/// tag. Only keys whose resolved file exists on disk contribute.
fn apply_manual_tests(methods: &mut [SnippetMethod], files: &[MetadataFile]) {
    let mut test_tag_map: BTreeMap<String, Vec<TestReference>> = BTreeMap::new();

    for file in files {
        for (tag, directive) in &file.entries {
            if directive.has_reserved_key_besides_overwrite() {
                continue;
            }
            for (rel_path, test_names) in directive.manual_test_entries() {
                let test_path = file.resolve_test_path(&rel_path);
                if !test_path.exists() {
                    continue;
                }
                let refs = test_tag_map.entry(tag.clone()).or_default();
                for test_name in test_names {
                    refs.push(TestReference::new(test_path.clone(), test_name));
                }
            }
        }
    }

    for method in methods {
        for tag in &method.region_tags {
            if let Some(refs) = test_tag_map.get(tag) {
                method.test_references.extend(refs.iter().cloned());
            }
        }
    }
}

/// Union-find style merge of additions groups into equivalence classes.
fn additions_classes(files: &[MetadataFile]) -> Vec<BTreeSet<String>> {
    let mut classes: Vec<BTreeSet<String>> = Vec::new();

    for file in files {
        for (tag, directive) in &file.entries {
            let Some(added) = directive.additions_list() else {
                continue;
            };
            let mut class: BTreeSet<String> = added.into_iter().collect();
            class.insert(tag.clone());

            // Merge every existing class sharing a member into the new one.
            let (overlapping, disjoint): (Vec<_>, Vec<_>) = classes
                .into_iter()
                .partition(|existing| !existing.is_disjoint(&class));
            for existing in overlapping {
                class.extend(existing);
            }
            classes = disjoint;
            classes.push(class);
        }
    }

    classes
}

/// Replace each method's tag set with its union against every equivalence
/// class it intersects. Symmetric: triggering from any member of a class
/// yields the same result.
fn apply_additions(methods: &mut [SnippetMethod], files: &[MetadataFile]) {
    let classes = additions_classes(files);
    if classes.is_empty() {
        return;
    }

    for method in methods {
        for class in &classes {
            if !method.region_tags.is_disjoint(class) {
                method.region_tags.extend(class.iter().cloned());
            }
        }
    }
}
