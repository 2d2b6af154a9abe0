//! Collapse methods sharing an identical region-tag set.
//!
//! Two methods with the same (order-independent) tag set describe the same
//! logical snippet; only the first encountered is kept. Invocation wrappers
//! carry no tags of their own but are structurally meaningful, so they are
//! kept and keyed by source path and name instead.

use crate::closure::is_invocation_wrapper;
use crate::schema::SnippetMethod;
use std::collections::HashSet;

pub fn dedupe_methods(methods: Vec<SnippetMethod>) -> Vec<SnippetMethod> {
    let mut seen_tag_sets: HashSet<String> = HashSet::new();
    let mut seen_wrappers: HashSet<(String, String)> = HashSet::new();
    let mut kept = Vec::new();

    for method in methods {
        if is_invocation_wrapper(&method) {
            let key = (
                method.source_path.display().to_string(),
                method.name.clone(),
            );
            if seen_wrappers.insert(key) {
                kept.push(method);
            }
            continue;
        }

        let key: Vec<&str> = method.region_tags.iter().map(|s| s.as_str()).collect();
        if seen_tag_sets.insert(key.join(",")) {
            kept.push(method);
        }
    }

    kept
}
