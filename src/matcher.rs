//! Tolerant interval matching between method spans and region spans.
//!
//! Upstream line numbers can be off by a few lines (decorators, multi-line
//! statements at a method's head or tail), so the match is a heuristic with
//! a bounded fudge factor rather than an exact-span comparison.

use crate::schema::{RegionEntry, SnippetMethod};

/// Maximum boundary tolerance, in lines.
pub const TAG_LINE_TOLERANCE: u32 = 8;

/// True when the method span and the region span overlap within tolerance:
/// either the region encloses the method or the method encloses the region,
/// each boundary allowed to be off by up to `min(method_len, 8)` lines.
pub fn overlaps(method: &SnippetMethod, region: &RegionEntry) -> bool {
    let tolerance = (method.end_line.saturating_sub(method.start_line) + 1).min(TAG_LINE_TOLERANCE);

    let region_encloses_method = region.start_line <= method.start_line + tolerance
        && method.end_line <= region.end_line + tolerance;
    let method_encloses_region = method.start_line <= region.start_line + tolerance
        && region.end_line <= method.end_line + tolerance;

    region_encloses_method || method_encloses_region
}

/// Set each method's `region_tags` to the tags of all overlapping regions.
/// Both slices must belong to the same source file.
pub fn assign_region_tags(methods: &mut [SnippetMethod], regions: &[RegionEntry]) {
    for method in methods {
        method.region_tags = regions
            .iter()
            .filter(|region| overlaps(method, region))
            .map(|region| region.tag.clone())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParserKind;

    fn method(start_line: u32, end_line: u32) -> SnippetMethod {
        SnippetMethod {
            name: "m".to_string(),
            class_name: "main".to_string(),
            method_name: Some("m".to_string()),
            parser: ParserKind::DirectInvocation,
            source_path: "main.py".into(),
            start_line,
            end_line,
            children: Vec::new(),
            url: None,
            http_methods: Vec::new(),
            region_tags: Default::default(),
            test_references: Default::default(),
        }
    }

    fn region(tag: &str, start_line: u32, end_line: u32) -> RegionEntry {
        RegionEntry {
            tag: tag.to_string(),
            start_line,
            end_line,
        }
    }

    #[test]
    fn identical_spans_always_overlap() {
        assert!(overlaps(&method(10, 20), &region("t", 10, 20)));
    }

    #[test]
    fn region_enclosing_method_within_tolerance_overlaps() {
        // Region starts 3 lines below the method head; method is long enough
        // for the full 8-line tolerance.
        assert!(overlaps(&method(10, 40), &region("t", 13, 45)));
    }

    #[test]
    fn short_methods_get_reduced_tolerance() {
        // Two-line method: tolerance is 2, so a region starting 3 lines in
        // does not count as enclosing it.
        assert!(!overlaps(&method(10, 11), &region("t", 13, 30)));
        assert!(overlaps(&method(10, 11), &region("t", 12, 30)));
    }

    #[test]
    fn disjoint_spans_do_not_overlap() {
        assert!(!overlaps(&method(10, 20), &region("t", 100, 120)));
    }

    #[test]
    fn assigns_all_overlapping_tags() {
        let mut methods = vec![method(5, 15)];
        let regions = vec![
            region("outer", 1, 20),
            region("inner", 7, 12),
            region("far", 200, 210),
        ];
        assign_region_tags(&mut methods, &regions);
        let tags: Vec<&str> = methods[0].region_tags.iter().map(|s| s.as_str()).collect();
        assert_eq!(tags, vec!["inner", "outer"]);
    }
}
