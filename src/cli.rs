//! CLI argument parsing for the snippet coverage audit workflow.
//!
//! The CLI layer only parses arguments and resolves input paths; all tag
//! and coverage semantics live in the pipeline modules.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default snippet index filename, resolved against the root directory.
pub const DEFAULT_DATA_JSON: &str = "snippet_data.json";

/// Root CLI entrypoint for the audit workflow.
///
/// All four subcommands operate on the same root-directory-plus-index pair,
/// so each arg struct resolves its index path through `data_json_path()`
/// rather than defaulting inside the handlers.
#[derive(Parser, Debug)]
#[command(
    name = "snaudit",
    version,
    about = "Region-tag and test-coverage audit for code sample repositories",
    after_help = "Commands:\n  list-region-tags <ROOT>        Report detected, undetected, and ignored region tags\n  list-source-files <ROOT>       List snippet source files filtered by test coverage\n  inject-snippet-mapping <ROOT>  Add region_tags attributes to an XUnit report\n  validate-yaml <ROOT>           Check .snippet-data.yml files for violations\n\nExamples:\n  snaudit list-region-tags samples/\n  snaudit list-region-tags samples/ --hide-undetected --output tags.txt\n  snaudit list-source-files samples/ --tested-files none\n  snaudit inject-snippet-mapping samples/ --input report.xml\n  snaudit validate-yaml samples/",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level audit commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    ListRegionTags(ListRegionTagsArgs),
    ListSourceFiles(ListSourceFilesArgs),
    InjectSnippetMapping(InjectSnippetMappingArgs),
    ValidateYaml(ValidateYamlArgs),
}

/// Coverage filter for `list-source-files`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestedFilesFilter {
    /// Files where every snippet method has at least one test
    All,
    /// Files where at least one snippet method has a test
    Some,
    /// Files where no snippet method has a test
    None,
    /// Every snippet source file
    #[value(name = "*")]
    Any,
}

/// Tag-report inputs for one directory tree.
#[derive(Parser, Debug)]
#[command(about = "Report detected, undetected, and ignored region tags")]
pub struct ListRegionTagsArgs {
    /// Directory tree containing the snippet sources
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Snippet index produced by the extractor (default: ROOT/snippet_data.json)
    #[arg(long, value_name = "PATH")]
    pub data_json: Option<PathBuf>,

    /// Omit tags matched to a snippet method
    #[arg(long)]
    pub hide_detected: bool,

    /// Omit tags present in the tree but matched to no method
    #[arg(long)]
    pub hide_undetected: bool,

    /// Omit per-tag test counts
    #[arg(long)]
    pub hide_test_counts: bool,

    /// Omit per-tag source file paths
    #[arg(long)]
    pub hide_filenames: bool,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Source-file listing inputs for one directory tree.
#[derive(Parser, Debug)]
#[command(about = "List snippet source files filtered by test coverage")]
pub struct ListSourceFilesArgs {
    /// Directory tree containing the snippet sources
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Snippet index produced by the extractor (default: ROOT/snippet_data.json)
    #[arg(long, value_name = "PATH")]
    pub data_json: Option<PathBuf>,

    /// Coverage filter: all, some, none, or * for every file
    #[arg(long, value_enum, default_value = "*")]
    pub tested_files: TestedFilesFilter,

    /// Write the listing to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// XUnit augmentation inputs for one directory tree.
#[derive(Parser, Debug)]
#[command(about = "Add region_tags attributes to an XUnit report")]
pub struct InjectSnippetMappingArgs {
    /// Directory tree containing the snippet sources
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Snippet index produced by the extractor (default: ROOT/snippet_data.json)
    #[arg(long, value_name = "PATH")]
    pub data_json: Option<PathBuf>,

    /// XUnit report to augment (default: stdin)
    #[arg(long, value_name = "XML")]
    pub input: Option<PathBuf>,

    /// Write the augmented report to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Metadata validation inputs for one directory tree.
#[derive(Parser, Debug)]
#[command(about = "Check .snippet-data.yml files for violations")]
pub struct ValidateYamlArgs {
    /// Directory tree containing the snippet sources
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Snippet index produced by the extractor (default: ROOT/snippet_data.json)
    #[arg(long, value_name = "PATH")]
    pub data_json: Option<PathBuf>,

    /// Write the validation report to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl ListRegionTagsArgs {
    pub fn data_json_path(&self) -> PathBuf {
        resolve_data_json(&self.root, self.data_json.as_deref())
    }
}

impl ListSourceFilesArgs {
    pub fn data_json_path(&self) -> PathBuf {
        resolve_data_json(&self.root, self.data_json.as_deref())
    }
}

impl InjectSnippetMappingArgs {
    pub fn data_json_path(&self) -> PathBuf {
        resolve_data_json(&self.root, self.data_json.as_deref())
    }
}

impl ValidateYamlArgs {
    pub fn data_json_path(&self) -> PathBuf {
        resolve_data_json(&self.root, self.data_json.as_deref())
    }
}

fn resolve_data_json(root: &std::path::Path, explicit: Option<&std::path::Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => root.join(DEFAULT_DATA_JSON),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_json_defaults_under_root() {
        let args = ListRegionTagsArgs::parse_from(["list-region-tags", "samples"]);
        assert_eq!(args.data_json_path(), PathBuf::from("samples/snippet_data.json"));
    }

    #[test]
    fn explicit_data_json_wins() {
        let args = ListRegionTagsArgs::parse_from([
            "list-region-tags",
            "samples",
            "--data-json",
            "/tmp/index.json",
        ]);
        assert_eq!(args.data_json_path(), PathBuf::from("/tmp/index.json"));
    }

    #[test]
    fn tested_files_filter_parses_star() {
        let args =
            ListSourceFilesArgs::parse_from(["list-source-files", "samples", "--tested-files", "*"]);
        assert_eq!(args.tested_files, TestedFilesFilter::Any);
    }
}
