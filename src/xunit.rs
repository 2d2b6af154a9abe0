//! XUnit report augmentation.
//!
//! For every `<testcase classname=... name=...>` whose derived test key
//! matches a snippet method's test references, a `region_tags` attribute is
//! set to the union of the method's region tags and any tags already on the
//! element. Everything else in the document passes through unchanged.

use crate::schema::SnippetMethod;
use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::Path;

const REGION_TAGS_ATTR: &str = "region_tags";

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Test key for a testcase element: the last classname segment that does
/// not start with "Test", plus the test name.
fn testcase_key(classname: &str, name: &str) -> Option<(String, String)> {
    let caller = classname
        .split('.')
        .filter(|part| !part.starts_with("Test"))
        .next_back()?;
    Some((caller.to_string(), name.to_string()))
}

/// Region tags of every method one of whose test references matches the
/// key, compared as `(test file stem, test name)`.
fn tags_for_key(methods: &[SnippetMethod], key: &(String, String)) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    for method in methods {
        let matched = method.test_references.iter().any(|reference| {
            file_stem(&reference.test_file) == key.0 && reference.test_name == key.1
        });
        if matched {
            tags.extend(method.region_tags.iter().cloned());
        }
    }
    tags
}

fn augment_testcase(element: &BytesStart<'_>, methods: &[SnippetMethod]) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);

    let mut classname = None;
    let mut test_name = None;
    let mut existing_tags: BTreeSet<String> = BTreeSet::new();

    for attribute in element.attributes() {
        let attribute = attribute.context("read testcase attribute")?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .context("decode testcase attribute")?
            .into_owned();
        match key.as_str() {
            "classname" => classname = Some(value.clone()),
            "name" => test_name = Some(value.clone()),
            REGION_TAGS_ATTR => {
                existing_tags.extend(
                    value
                        .split(',')
                        .filter(|tag| !tag.is_empty())
                        .map(str::to_string),
                );
                continue; // re-added below with the merged value
            }
            _ => {}
        }
        out.push_attribute((key.as_str(), value.as_str()));
    }

    let matched_tags = match (classname, test_name) {
        (Some(classname), Some(test_name)) => testcase_key(&classname, &test_name)
            .map(|key| tags_for_key(methods, &key))
            .unwrap_or_default(),
        _ => BTreeSet::new(),
    };

    existing_tags.extend(matched_tags);
    if !existing_tags.is_empty() {
        let joined = existing_tags.into_iter().collect::<Vec<_>>().join(",");
        out.push_attribute((REGION_TAGS_ATTR, joined.as_str()));
    }

    Ok(out)
}

/// Rewrite an XUnit document, injecting `region_tags` attributes.
pub fn inject_region_tags(xml: &str, methods: &[SnippetMethod]) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    loop {
        match reader.read_event().context("parse xunit document")? {
            Event::Eof => break,
            Event::Start(element) if element.name().as_ref() == b"testcase" => {
                let augmented = augment_testcase(&element, methods)?;
                writer.write_event(Event::Start(augmented))?;
            }
            Event::Empty(element) if element.name().as_ref() == b"testcase" => {
                let augmented = augment_testcase(&element, methods)?;
                writer.write_event(Event::Empty(augmented))?;
            }
            event => writer.write_event(event)?,
        }
    }

    String::from_utf8(writer.into_inner().into_inner()).context("encode xunit document")
}
