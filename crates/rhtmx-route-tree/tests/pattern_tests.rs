//! Integration tests for pattern compilation and segment matching
//!
//! Covers:
//! - Matching named, positional, wildcard and repeated parameters
//! - Consumed prefixes handed to descendants
//! - Case sensitivity, strict and end options
//! - The default matcher and its compile cache
//! - Reverse routing

use pretty_assertions::assert_eq;
use rhtmx_route_tree::*;
use rstest::rstest;

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ============================================================================
// Matching
// ============================================================================

#[rstest]
#[case("/path/:id", "/path/1", "/path/1", &[("id", "1")], "/path/")]
#[case("/path/1/:id", "/path/1/2", "/path/1/2", &[("id", "2")], "/path/1/")]
#[case("/:child", "/child/", "/child/", &[("child", "child")], "/")]
#[case("/:child", "/child", "/child", &[("child", "child")], "/")]
#[case("(/child)", "/child", "/child", &[("0", "/child")], "")]
#[case("/child1/:c1/(inde)(.*).html", "/child1/child2/index.html", "/child1/child2/index.html", &[("c1", "child2"), ("0", "inde"), ("1", "x")], "/child1/")]
#[case("/child1/(child2)", "/child1/child2", "/child1/child2", &[("0", "child2")], "/child1/")]
#[case("/child1/child2/", "/child1/child2/", "/child1/child2/", &[], "/child1/child2/")]
#[case("/:child1", "/child1/", "/child1/", &[("child1", "child1")], "/")]
fn test_match_and_consumed_prefix(
    #[case] pattern: &str,
    #[case] path: &str,
    #[case] matched: &str,
    #[case] expected: &[(&str, &str)],
    #[case] consumed: &str,
) {
    let compiled = Pattern::compile(pattern).unwrap();
    let found = compiled.exec(path).unwrap();

    assert_eq!(found.matched_text(), matched);
    assert_eq!(found.params, params(expected));
    assert_eq!(found.consumed, consumed);
    assert_eq!(found.index, 0);
    assert_eq!(found.input, path);
}

#[rstest]
#[case("/path/:id", "/wrong")]
#[case("/path/:id", "/path")]
#[case("/user", "/users")]
#[case("/posts/:year(\\d+)", "/posts/latest")]
#[case("/parent/child", "/parent")]
fn test_no_match_is_none(#[case] pattern: &str, #[case] path: &str) {
    assert_eq!(Pattern::compile(pattern).unwrap().exec(path), None);
}

#[test]
fn test_prefix_match_leaves_remainder_for_descendants() {
    let found = Pattern::compile("/parent").unwrap().exec("/parent/child").unwrap();
    assert_eq!(found.matched_text(), "/parent");
    assert_eq!(found.remainder(), "/child");
}

#[test]
fn test_escaped_characters_match_literally() {
    let pattern = Pattern::compile("/par\\ent1/parent2/:child/").unwrap();
    let found = pattern.exec("/parent1/parent2/child/").unwrap();

    assert_eq!(found.params, params(&[("child", "child")]));
    assert_eq!(found.matched_text(), "/parent1/parent2/child/");
    assert_eq!(found.consumed, "/parent1/parent2/");
}

#[test]
fn test_optional_parameter() {
    let pattern = Pattern::compile("/users/:id?").unwrap();
    assert_eq!(pattern.exec("/users").unwrap().params, Params::new());
    assert_eq!(pattern.exec("/users/7").unwrap().params, params(&[("id", "7")]));
}

#[test]
fn test_repeated_parameter_captures_all_segments() {
    let pattern = Pattern::compile("/files/:segments+").unwrap();
    let found = pattern.exec("/files/a/b/c").unwrap();
    assert_eq!(found.param("segments"), Some("a/b/c"));
    assert!(pattern.exec("/files").is_none());

    let pattern = Pattern::compile("/files/:segments*").unwrap();
    assert!(pattern.exec("/files").unwrap().params.is_empty());
}

#[test]
fn test_wildcard_captures_remainder() {
    let pattern = Pattern::compile("/docs/*").unwrap();
    assert_eq!(pattern.keys()[0].kind, KeyKind::Wildcard);

    let found = pattern.exec("/docs/guide/intro").unwrap();
    assert_eq!(found.params, params(&[("0", "guide/intro")]));
}

#[test]
fn test_brace_group_prefix() {
    let pattern = Pattern::compile("{/:lang}?/about").unwrap();
    assert!(pattern.exec("/about").unwrap().params.is_empty());
    assert_eq!(pattern.exec("/en/about").unwrap().params, params(&[("lang", "en")]));
}

#[test]
fn test_optional_literal_group() {
    let pattern = Pattern::compile("/book{s}?").unwrap();
    assert!(pattern.is_match("/book"));
    assert!(pattern.is_match("/books"));
    assert_eq!(pattern.consumed_prefix(), "/book");
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_case_insensitive_by_default() {
    let pattern = Pattern::compile("/About").unwrap();
    assert!(pattern.is_match("/about"));

    let sensitive = Pattern::compile_with("/About", &CompileOptions::default().with_sensitive(true)).unwrap();
    assert!(!sensitive.is_match("/about"));
    assert!(sensitive.is_match("/About"));
}

#[test]
fn test_end_requires_full_match() {
    let options = CompileOptions::default().with_end(true);
    let pattern = Pattern::compile_with("/a", &options).unwrap();

    assert!(pattern.exec("/a/b").is_none());
    assert_eq!(pattern.exec("/a/").unwrap().matched_text(), "/a/");
}

#[test]
fn test_strict_drops_trailing_delimiter() {
    let loose = Pattern::compile("/:child").unwrap();
    assert_eq!(loose.exec("/child/").unwrap().matched_text(), "/child/");

    let strict = Pattern::compile_with("/:child", &CompileOptions::default().with_strict(true)).unwrap();
    assert_eq!(strict.exec("/child/").unwrap().matched_text(), "/child");

    let exact = Pattern::compile_with("/:child", &CompileOptions::default().with_strict(true).with_end(true)).unwrap();
    assert!(exact.exec("/child/").is_none());
    assert!(exact.exec("/child").is_some());
}

#[test]
fn test_compilation_is_deterministic() {
    let a = Pattern::compile("/child1/:c1/(inde)(.*).html").unwrap();
    let b = Pattern::compile("/child1/:c1/(inde)(.*).html").unwrap();

    assert_eq!(a.tokens(), b.tokens());
    assert_eq!(a.regex().as_str(), b.regex().as_str());
    for path in ["/child1/child2/index.html", "/child1/x/inde.html", "/nope"] {
        assert_eq!(a.exec(path), b.exec(path));
    }
}

#[rstest]
#[case("/:")]
#[case("/(abc")]
#[case("/(a(b))")]
#[case("/(?abc)")]
#[case("/()")]
#[case("/a\\")]
#[case("/{a")]
#[case("(a)+")]
#[case("/([)")]
fn test_invalid_patterns_are_rejected(#[case] source: &str) {
    assert!(Pattern::compile(source).is_err(), "{source} should not compile");
}

// ============================================================================
// Matcher Capability
// ============================================================================

#[test]
fn test_pattern_matcher_reports_syntax_errors() {
    let matcher = PatternMatcher::new();
    let err = matcher.match_route("/users/:", "/users/1").unwrap_err();
    assert_eq!(err, PatternSyntaxError::MissingParameterName { index: 7 });
}

#[test]
fn test_pattern_matcher_uses_its_options() {
    let matcher = PatternMatcher::with_options(CompileOptions::default().with_end(true));
    assert!(matcher.match_route("/a", "/a/b").unwrap().is_none());
    assert!(matcher.match_route("/a", "/a").unwrap().is_some());
}

// ============================================================================
// Reverse Routing
// ============================================================================

#[rstest]
#[case("/users/:id", &[("id", "42")], "/users/42")]
#[case("/users/:id/:tab?", &[("id", "42")], "/users/42")]
#[case("{/:lang}?/about", &[("lang", "de")], "/de/about")]
#[case("/child1/(child2)", &[("0", "child2")], "/child1/child2")]
fn test_build_paths(#[case] pattern: &str, #[case] values: &[(&str, &str)], #[case] expected: &str) {
    let pattern = Pattern::compile(pattern).unwrap();
    assert_eq!(pattern.build(&params(values)).unwrap(), expected);
}

#[test]
fn test_build_reports_missing_parameter() {
    let pattern = Pattern::compile("/users/:id").unwrap();
    assert_eq!(
        pattern.build(&Params::new()).unwrap_err(),
        BuildError::MissingParameter { name: "id".to_string() }
    );
}
