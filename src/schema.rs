//! Schema types for snippet methods, test references, and analysis results.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// How the external extractor detected a snippet method. Determines which
/// fields participate in test-key construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    /// Top-level method invoked directly by tests.
    DirectInvocation,
    /// Route handler declaring one or more HTTP methods per URL.
    FlaskRouter,
    /// Route handler bound to a single HTTP method per URL.
    Webapp2Router,
}

/// One test case, identified by its file and method name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestReference {
    pub test_file: PathBuf,
    pub test_name: String,
}

impl TestReference {
    pub fn new(test_file: impl Into<PathBuf>, test_name: impl Into<String>) -> Self {
        TestReference {
            test_file: test_file.into(),
            test_name: test_name.into(),
        }
    }
}

/// A structurally detected top-level code unit and its accumulated
/// region-tag / test-coverage state.
///
/// Identity fields, the line span, `parser`, `children`, and the routing
/// fields come from the external extractor; `region_tags` and
/// `test_references` are populated by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetMethod {
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub method_name: Option<String>,
    pub parser: ParserKind,
    pub source_path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub http_methods: Vec<String>,
    #[serde(default)]
    pub region_tags: BTreeSet<String>,
    #[serde(default)]
    pub test_references: BTreeSet<TestReference>,
}

impl SnippetMethod {
    /// Identity key used by the closure resolver's visited set.
    pub fn identity(&self) -> (String, String, PathBuf) {
        (
            self.name.clone(),
            self.class_name.clone(),
            self.source_path.clone(),
        )
    }
}

/// Extractor output: the snippet records plus the test-key map produced by
/// the external test-file scanner. Keys are `caller|target` strings.
#[derive(Debug, Clone, Deserialize)]
pub struct SnippetIndex {
    pub snippets: Vec<SnippetMethod>,
    #[serde(default)]
    pub test_method_map: BTreeMap<String, Vec<(PathBuf, String)>>,
}

/// One `[START tag]`/`[END tag]` pair extracted from a file. Lines are
/// 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEntry {
    pub tag: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// Final result of analyzing a directory tree.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Tags textually present anywhere under the root, minus ignored tags.
    pub grep_tags: BTreeSet<String>,
    /// Tags carried by at least one surviving snippet method.
    pub source_tags: BTreeSet<String>,
    /// Globally ignored tags seen in source, plus `tested: false` tags.
    pub ignored_tags: BTreeSet<String>,
    /// Deduplicated snippet methods.
    pub methods: Vec<SnippetMethod>,
}
