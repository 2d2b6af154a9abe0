//! Correlation of snippet methods with scanned test references.
//!
//! The external test-file scanner emits a map from "test keys" to the tests
//! that exercise them. A test key is a `(caller, target)` pair flattened to
//! a `caller|target` string: `class|method` for direct invocation,
//! `http_method|url` for HTTP-routed invocation. Each method reconstructs
//! its own candidate keys from its parser kind and looks them up.

use crate::schema::{ParserKind, SnippetMethod, TestReference};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const KEY_SEPARATOR: &str = "|";

fn test_key(caller: &str, target: &str) -> String {
    format!("{caller}{KEY_SEPARATOR}{target}")
}

/// Candidate test keys for one method.
pub fn candidate_keys(method: &SnippetMethod) -> Vec<String> {
    match method.parser {
        ParserKind::DirectInvocation => {
            let target = method.method_name.as_deref().unwrap_or(&method.name);
            vec![test_key(&method.class_name, target)]
        }
        ParserKind::Webapp2Router => match (&method.url, method.http_methods.first()) {
            (Some(url), Some(http_method)) => vec![test_key(http_method, url)],
            _ => Vec::new(),
        },
        ParserKind::FlaskRouter => match &method.url {
            Some(url) => method
                .http_methods
                .iter()
                .map(|http_method| test_key(http_method, url))
                .collect(),
            None => Vec::new(),
        },
    }
}

/// Union matching test references from the scanner map into each method.
pub fn attach_test_references(
    methods: &mut [SnippetMethod],
    test_method_map: &BTreeMap<String, Vec<(PathBuf, String)>>,
) {
    for method in methods {
        for key in candidate_keys(method) {
            let Some(entries) = test_method_map.get(&key) else {
                continue;
            };
            for (test_file, test_name) in entries {
                method
                    .test_references
                    .insert(TestReference::new(test_file.clone(), test_name.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(parser: ParserKind) -> SnippetMethod {
        SnippetMethod {
            name: "handler".to_string(),
            class_name: "main".to_string(),
            method_name: Some("handler".to_string()),
            parser,
            source_path: "main.py".into(),
            start_line: 1,
            end_line: 5,
            children: Vec::new(),
            url: None,
            http_methods: Vec::new(),
            region_tags: Default::default(),
            test_references: Default::default(),
        }
    }

    #[test]
    fn direct_invocation_uses_class_and_method() {
        let m = method(ParserKind::DirectInvocation);
        assert_eq!(candidate_keys(&m), vec!["main|handler".to_string()]);
    }

    #[test]
    fn single_route_parser_uses_first_http_method() {
        let mut m = method(ParserKind::Webapp2Router);
        m.url = Some("/".to_string());
        m.http_methods = vec!["get".to_string()];
        assert_eq!(candidate_keys(&m), vec!["get|/".to_string()]);
    }

    #[test]
    fn multi_route_parser_emits_one_key_per_http_method() {
        let mut m = method(ParserKind::FlaskRouter);
        m.url = Some("/things".to_string());
        m.http_methods = vec!["get".to_string(), "post".to_string()];
        assert_eq!(
            candidate_keys(&m),
            vec!["get|/things".to_string(), "post|/things".to_string()]
        );
    }

    #[test]
    fn attaches_matching_references() {
        let mut methods = vec![method(ParserKind::DirectInvocation)];
        let mut map = BTreeMap::new();
        map.insert(
            "main|handler".to_string(),
            vec![(PathBuf::from("main_test.py"), "test_handler".to_string())],
        );
        map.insert(
            "main|other".to_string(),
            vec![(PathBuf::from("main_test.py"), "test_other".to_string())],
        );

        attach_test_references(&mut methods, &map);

        assert_eq!(methods[0].test_references.len(), 1);
        let test = methods[0].test_references.iter().next().unwrap();
        assert_eq!(test.test_name, "test_handler");
    }
}
