use std::fs;
use std::path::Path;
use std::process::Command;

const MAIN_PY: &str = "\
# [START detectable_tag]
def method_1():
    return 1
# [END detectable_tag]


# [START another_detectable_tag]
def method_2():
    return 2
# [END another_detectable_tag]
";

const LOOSE_PY: &str = "\
# [START undetectable_tag]
print('not indexed by the extractor')
# [END undetectable_tag]
";

fn write_fixture(dir: &Path) {
    fs::write(dir.join("main.py"), MAIN_PY).expect("write main.py");
    fs::write(dir.join("loose.py"), LOOSE_PY).expect("write loose.py");
    fs::write(
        dir.join("main_test.py"),
        "def test_method_one(): pass\ndef test_method_two(): pass\n",
    )
    .expect("write main_test.py");

    let data = serde_json::json!({
        "snippets": [
            {
                "name": "method_1",
                "class_name": "main",
                "method_name": "method_1",
                "parser": "direct_invocation",
                "source_path": "main.py",
                "start_line": 2,
                "end_line": 3,
                "children": []
            },
            {
                "name": "method_2",
                "class_name": "main",
                "method_name": "method_2",
                "parser": "direct_invocation",
                "source_path": "main.py",
                "start_line": 8,
                "end_line": 9,
                "children": []
            }
        ],
        "test_method_map": {
            "main|method_1": [["main_test.py", "test_method_one"]],
            "main|method_2": [["main_test.py", "test_method_two"]]
        }
    });
    fs::write(
        dir.join("snippet_data.json"),
        serde_json::to_string_pretty(&data).expect("serialize index"),
    )
    .expect("write snippet_data.json");
}

fn run(dir: &Path, args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_snaudit");
    Command::new(bin)
        .args(args)
        .arg(dir)
        .output()
        .expect("run snaudit")
}

#[test]
fn list_region_tags_reports_one_test_per_tag() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    write_fixture(temp_dir.path());

    let output = run(temp_dir.path(), &["list-region-tags"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");

    assert!(stdout.contains("Detected region tags:"));
    assert!(stdout.contains("  detectable_tag (1 test(s))"));
    assert!(stdout.contains("  another_detectable_tag (1 test(s))"));
    assert!(stdout.contains("    Source file: "));
    assert!(stdout.contains("main.py"));
    assert!(stdout.contains("Undetected region tags:"));
    assert!(stdout.contains("  undetectable_tag"));
}

#[test]
fn list_region_tags_hide_flags_trim_the_report() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    write_fixture(temp_dir.path());

    let output = run(
        temp_dir.path(),
        &[
            "list-region-tags",
            "--hide-undetected",
            "--hide-test-counts",
            "--hide-filenames",
        ],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");

    assert!(stdout.contains("  detectable_tag\n"));
    assert!(!stdout.contains("test(s)"));
    assert!(!stdout.contains("Source file:"));
    assert!(!stdout.contains("Undetected region tags:"));
}

#[test]
fn list_source_files_filters_by_coverage() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    write_fixture(temp_dir.path());

    let all = run(temp_dir.path(), &["list-source-files", "--tested-files", "all"]);
    assert!(all.status.success());
    let stdout = String::from_utf8(all.stdout).expect("utf8 stdout");
    assert!(stdout.contains("main.py"));

    let none = run(
        temp_dir.path(),
        &["list-source-files", "--tested-files", "none"],
    );
    assert!(none.status.success());
    assert!(String::from_utf8(none.stdout)
        .expect("utf8 stdout")
        .trim()
        .is_empty());
}

#[test]
fn validate_yaml_accepts_untested_marker_for_unparsed_tag() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    write_fixture(temp_dir.path());
    fs::write(
        temp_dir.path().join(".snippet-data.yml"),
        "undetectable_tag:\n  tested: false\n",
    )
    .expect("write metadata");

    let output = run(temp_dir.path(), &["validate-yaml"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.contains("All files are valid."));
}

#[test]
fn validate_yaml_fails_on_unknown_tag() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    write_fixture(temp_dir.path());
    fs::write(
        temp_dir.path().join(".snippet-data.yml"),
        "tag_that_exists_nowhere:\n  tested: false\n",
    )
    .expect("write metadata");

    let output = run(temp_dir.path(), &["validate-yaml"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.contains("region tag not used in source files"));
    assert!(stdout.contains("Invalid file(s) found!"));
}

#[test]
fn inject_snippet_mapping_labels_matching_testcases() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    write_fixture(temp_dir.path());

    let report = temp_dir.path().join("report.xml");
    fs::write(
        &report,
        r#"<testsuite><testcase classname="main_test" name="test_method_one"/><testcase classname="main_test" name="test_unrelated"/></testsuite>"#,
    )
    .expect("write xunit report");

    let bin = env!("CARGO_BIN_EXE_snaudit");
    let output = Command::new(bin)
        .arg("inject-snippet-mapping")
        .arg(temp_dir.path())
        .arg("--input")
        .arg(&report)
        .output()
        .expect("run snaudit");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");

    assert!(stdout.contains(r#"name="test_method_one" region_tags="detectable_tag""#));
    assert!(!stdout.contains(r#"test_unrelated" region_tags"#));
}

#[test]
fn output_flag_writes_the_report_to_a_file() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    write_fixture(temp_dir.path());

    let out_path = temp_dir.path().join("tags.txt");
    let bin = env!("CARGO_BIN_EXE_snaudit");
    let status = Command::new(bin)
        .arg("list-region-tags")
        .arg(temp_dir.path())
        .arg("--output")
        .arg(&out_path)
        .status()
        .expect("run snaudit");
    assert!(status.success());

    let contents = fs::read_to_string(&out_path).expect("read report file");
    assert!(contents.contains("Detected region tags:"));
}

#[test]
fn shared_tag_counts_aggregate_across_methods() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    fs::write(
        temp_dir.path().join("main.py"),
        "\
# [START tag_a]
def parent():
    helper()
    return 1
# [END tag_a]


# [START tag_b]
def helper():
    return 2
# [END tag_b]
",
    )
    .expect("write main.py");
    fs::write(
        temp_dir.path().join("main_test.py"),
        "def test_parent(): pass\ndef test_both(): pass\ndef test_helper(): pass\n",
    )
    .expect("write main_test.py");

    let data = serde_json::json!({
        "snippets": [
            {
                "name": "parent",
                "class_name": "main",
                "method_name": "parent",
                "parser": "direct_invocation",
                "source_path": "main.py",
                "start_line": 2,
                "end_line": 4,
                "children": ["helper"]
            },
            {
                "name": "helper",
                "class_name": "main",
                "method_name": "helper",
                "parser": "direct_invocation",
                "source_path": "main.py",
                "start_line": 9,
                "end_line": 10,
                "children": []
            }
        ],
        "test_method_map": {
            "main|parent": [
                ["main_test.py", "test_parent"],
                ["main_test.py", "test_both"]
            ],
            "main|helper": [["main_test.py", "test_helper"]]
        }
    });
    fs::write(
        temp_dir.path().join("snippet_data.json"),
        serde_json::to_string_pretty(&data).expect("serialize index"),
    )
    .expect("write snippet_data.json");

    let output = run(temp_dir.path(), &["list-region-tags"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");

    // Closure gives the parent tag_b too; the shared tag must be reported
    // once, with counts from both carrying methods.
    assert_eq!(stdout.matches("  tag_b (").count(), 1);
    assert!(stdout.contains("  tag_b (4 test(s))"));
    assert!(stdout.contains("  tag_a (3 test(s))"));
}
