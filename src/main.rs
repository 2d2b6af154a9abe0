use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod analyze;
mod cli;
mod closure;
mod correlate;
mod dedupe;
mod files;
mod matcher;
mod metadata;
mod overrides;
mod regions;
mod schema;
mod validate;
mod xunit;

use analyze::analyze_dir;
use cli::{
    Command, InjectSnippetMappingArgs, ListRegionTagsArgs, ListSourceFilesArgs, RootArgs,
    TestedFilesFilter, ValidateYamlArgs,
};
use metadata::load_metadata_files;
use validate::validate_metadata;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();

    match args.command {
        Command::ListRegionTags(args) => cmd_list_region_tags(args),
        Command::ListSourceFiles(args) => cmd_list_source_files(args),
        Command::InjectSnippetMapping(args) => cmd_inject_snippet_mapping(args),
        Command::ValidateYaml(args) => cmd_validate_yaml(args),
    }
}

/// Write report lines to the output file when given, stdout otherwise.
fn write_output(lines: &[String], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let mut contents = lines.join("\n");
            contents.push('\n');
            fs::write(path, contents)
                .with_context(|| format!("write output file {}", path.display()))
        }
        None => {
            for line in lines {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn cmd_list_region_tags(args: ListRegionTagsArgs) -> Result<()> {
    let analysis = analyze_dir(&args.data_json_path(), &args.root)?;
    if !args.hide_undetected && !args.hide_test_counts {
        warn!("test counts are not available for undetected region tags");
    }
    let lines = region_tag_report(&analysis, &args);
    write_output(&lines, args.output.as_deref())
}

/// Build the tag report. Each detected tag appears exactly once, with its
/// test count summed over every method carrying it and the first such
/// method's source file.
fn region_tag_report(analysis: &schema::Analysis, args: &ListRegionTagsArgs) -> Vec<String> {
    let mut lines = Vec::new();

    if !args.hide_detected {
        lines.push("Detected region tags:".to_string());
        for tag in &analysis.source_tags {
            let mut test_count = 0;
            let mut source_file = None;
            for method in &analysis.methods {
                if method.region_tags.contains(tag) {
                    test_count += method.test_references.len();
                    if source_file.is_none() {
                        source_file = Some(&method.source_path);
                    }
                }
            }

            let mut line = format!("  {tag}");
            if !args.hide_test_counts {
                line.push_str(&format!(" ({test_count} test(s))"));
            }
            lines.push(line);
            if !args.hide_filenames {
                if let Some(path) = source_file {
                    lines.push(format!("    Source file: {}", path.display()));
                }
            }
        }
    }

    if !args.hide_undetected {
        lines.push("Undetected region tags:".to_string());
        for tag in &analysis.grep_tags {
            if !analysis.source_tags.contains(tag) && !analysis.ignored_tags.contains(tag) {
                lines.push(format!("  {tag}"));
            }
        }
    }

    if !analysis.ignored_tags.is_empty() {
        lines.push("Ignored region tags:".to_string());
        for tag in &analysis.ignored_tags {
            lines.push(format!("  {tag}"));
        }
    }

    lines
}

fn cmd_list_source_files(args: ListSourceFilesArgs) -> Result<()> {
    let analysis = analyze_dir(&args.data_json_path(), &args.root)?;

    let mut all_files: BTreeSet<PathBuf> = BTreeSet::new();
    let mut tested_files: BTreeSet<PathBuf> = BTreeSet::new();
    let mut untested_files: BTreeSet<PathBuf> = BTreeSet::new();
    for method in &analysis.methods {
        all_files.insert(method.source_path.clone());
        if method.test_references.is_empty() {
            untested_files.insert(method.source_path.clone());
        } else {
            tested_files.insert(method.source_path.clone());
        }
    }

    let selected: Vec<PathBuf> = match args.tested_files {
        TestedFilesFilter::Any => all_files.into_iter().collect(),
        TestedFilesFilter::Some => tested_files.into_iter().collect(),
        TestedFilesFilter::All => tested_files
            .into_iter()
            .filter(|path| !untested_files.contains(path))
            .collect(),
        TestedFilesFilter::None => untested_files
            .into_iter()
            .filter(|path| !tested_files.contains(path))
            .collect(),
    };

    let lines: Vec<String> = selected
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    write_output(&lines, args.output.as_deref())
}

fn cmd_inject_snippet_mapping(args: InjectSnippetMappingArgs) -> Result<()> {
    let analysis = analyze_dir(&args.data_json_path(), &args.root)?;

    let xml = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read xunit report {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("read xunit report from stdin")?;
            buffer
        }
    };

    let augmented = xunit::inject_region_tags(&xml, &analysis.methods)?;
    write_output(&[augmented], args.output.as_deref())
}

fn cmd_validate_yaml(args: ValidateYamlArgs) -> Result<()> {
    let analysis = analyze_dir(&args.data_json_path(), &args.root)?;
    let metadata_files = load_metadata_files(&args.root);

    let violations =
        validate_metadata(&metadata_files, &analysis.grep_tags, &analysis.source_tags);

    let mut lines: Vec<String> = violations
        .iter()
        .map(|violation| violation.to_string())
        .collect();
    let invalid = !violations.is_empty();
    lines.push(if invalid {
        "Invalid file(s) found!".to_string()
    } else {
        "All files are valid.".to_string()
    });

    write_output(&lines, args.output.as_deref())?;
    if invalid {
        std::process::exit(1);
    }
    Ok(())
}
