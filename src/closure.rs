//! Call-graph closure: a snippet that invokes helper snippets inherits
//! their region tags and test references.

use crate::schema::SnippetMethod;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Methods that exist only to invoke a documented snippet from within a
/// test. Their test attribution belongs to what they invoke.
pub const WRAPPER_METHOD_NAMES: &[&str] = &["run_sample"];

pub fn is_invocation_wrapper(method: &SnippetMethod) -> bool {
    WRAPPER_METHOD_NAMES.contains(&method.name.as_str())
}

/// Pre-pass: hand each invocation wrapper's test references to its declared
/// children (matched by name within the same source file), then clear the
/// wrapper's own children and test references so the main pass cannot
/// self-attribute tests through it.
pub fn redistribute_wrapper_tests(methods: &mut [SnippetMethod]) {
    let wrapper_indices: Vec<usize> = methods
        .iter()
        .enumerate()
        .filter(|(_, m)| is_invocation_wrapper(m))
        .map(|(i, _)| i)
        .collect();

    for wrapper_idx in wrapper_indices {
        let children = methods[wrapper_idx].children.clone();
        let tests = methods[wrapper_idx].test_references.clone();
        let source_path = methods[wrapper_idx].source_path.clone();

        for (idx, method) in methods.iter_mut().enumerate() {
            if idx != wrapper_idx
                && method.source_path == source_path
                && children.contains(&method.name)
            {
                method.test_references.extend(tests.iter().cloned());
            }
        }

        let wrapper = &mut methods[wrapper_idx];
        wrapper.children.clear();
        wrapper.test_references.clear();
    }
}

/// Merge every method's transitive children into it, depth-first.
///
/// Children resolve by name within the same source file through a
/// precomputed index. The visited set (keyed by name, class, and source
/// path) makes traversal cycle-safe; on a cycle each participant still ends
/// up with the union of the whole cycle's tags and tests. Idempotent.
pub fn resolve_closure(methods: &mut [SnippetMethod]) {
    let mut index: HashMap<(PathBuf, String), usize> = HashMap::new();
    for (idx, method) in methods.iter().enumerate() {
        index
            .entry((method.source_path.clone(), method.name.clone()))
            .or_insert(idx);
    }

    for root in 0..methods.len() {
        let mut visited = HashSet::new();
        visited.insert(methods[root].identity());
        merge_children(root, methods, &index, &mut visited);
    }
}

fn merge_children(
    idx: usize,
    methods: &mut [SnippetMethod],
    index: &HashMap<(PathBuf, String), usize>,
    visited: &mut HashSet<(String, String, PathBuf)>,
) {
    let children = methods[idx].children.clone();
    let source_path = methods[idx].source_path.clone();

    for child_name in children {
        let Some(&child_idx) = index.get(&(source_path.clone(), child_name)) else {
            continue;
        };
        if child_idx == idx {
            continue;
        }

        if visited.insert(methods[child_idx].identity()) {
            merge_children(child_idx, methods, index, visited);
        }

        let (tags, tests) = {
            let child = &methods[child_idx];
            (child.region_tags.clone(), child.test_references.clone())
        };
        let parent = &mut methods[idx];
        parent.region_tags.extend(tags);
        parent.test_references.extend(tests);
    }
}
