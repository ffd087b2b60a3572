//! Tests for the CSS reference scanner

use tower_lsp::lsp_types::{Position, Range};

use super::scanner::*;

fn scan(content: &str) -> ScanResult {
    let scanner = CssScanner::new().unwrap();
    scanner.scan(content).unwrap()
}

fn slice_utf16(content: &str, range: Range) -> String {
    // Test helper that only handles single-line ranges
    assert_eq!(range.start.line, range.end.line);
    let line = content.split('\n').nth(range.start.line as usize).unwrap();
    let units: Vec<u16> = line.encode_utf16().collect();
    String::from_utf16(&units[range.start.character as usize..range.end.character as usize]).unwrap()
}

#[test]
fn test_declaration_extraction() {
    let content = ":root {\n  --color-primary: #0000ff;\n}";
    let result = scan(content);

    assert_eq!(result.declarations.len(), 1);
    let declaration = &result.declarations[0];
    assert_eq!(declaration.name, "--color-primary");
    assert_eq!(declaration.raw_value, "#0000ff");
    assert_eq!(declaration.range.start, Position { line: 1, character: 2 });
}

#[test]
fn test_declaration_span_covers_only_the_name() {
    let content = ".a { --x: 10px solid red; }";
    let result = scan(content);

    let declaration = &result.declarations[0];
    assert_eq!(slice_utf16(content, declaration.range), "--x");
    assert_eq!(declaration.raw_value, "10px solid red");
}

#[test]
fn test_regular_properties_are_not_declarations() {
    let content = ".a { color: red; margin: 0; }";
    let result = scan(content);
    assert!(result.declarations.is_empty());
    assert!(result.references.is_empty());
}

#[test]
fn test_multiple_declarations_keep_values() {
    let content = r#":root {
  --color-primary: #0000ff;
  --spacing-small: 4px;
  --font-weight: 700;
}"#;
    let result = scan(content);

    let values: Vec<(&str, &str)> = result
        .declarations
        .iter()
        .map(|d| (d.name.as_str(), d.raw_value.as_str()))
        .collect();
    assert_eq!(
        values,
        vec![
            ("--color-primary", "#0000ff"),
            ("--spacing-small", "4px"),
            ("--font-weight", "700"),
        ]
    );
}

#[test]
fn test_declaration_value_keeps_commas_attached() {
    let result = scan(":root { --font: 'My Font', sans-serif; }");
    assert_eq!(result.declarations[0].raw_value, "'My Font', sans-serif");
}

#[test]
fn test_var_call_without_fallback() {
    let content = ".button {\n  color: var(--color-primary);\n}";
    let result = scan(content);

    assert_eq!(result.references.len(), 1);
    let reference = &result.references[0];
    assert_eq!(reference.token_name, "--color-primary");
    assert_eq!(reference.fallback, None);
    assert!(reference.nested_references.is_empty());
    assert_eq!(slice_utf16(content, reference.range), "var(--color-primary)");
}

#[test]
fn test_var_call_with_fallback() {
    let content = ".button {\n  color: var(--color-primary, #000);\n}";
    let result = scan(content);

    let reference = &result.references[0];
    assert_eq!(reference.token_name, "--color-primary");
    assert_eq!(reference.fallback.as_deref(), Some("#000"));
}

#[test]
fn test_empty_fallback_differs_from_no_fallback() {
    let result = scan(".a { color: var(--a,); width: var(--b); }");

    assert_eq!(result.references.len(), 2);
    assert_eq!(result.references[0].fallback.as_deref(), Some(""));
    assert_eq!(result.references[1].fallback, None);
}

#[test]
fn test_nested_var_calls_yield_two_references() {
    let content = ".button { color: var(--a, var(--b)); }";
    let result = scan(content);

    assert_eq!(result.references.len(), 2);
    let outer = &result.references[0];
    let inner = &result.references[1];

    assert_eq!(outer.token_name, "--a");
    assert_eq!(outer.fallback.as_deref(), Some("var(--b)"));
    assert_eq!(inner.token_name, "--b");
    assert_eq!(inner.fallback, None);

    assert_eq!(outer.nested_references.len(), 1);
    assert_eq!(outer.nested_references[0], *inner);
}

#[test]
fn test_quoted_font_fallback_is_verbatim() {
    let content = ".el { font-family: var(--font, 'My Font', Sans, sans-serif); }";
    let result = scan(content);

    assert_eq!(result.references.len(), 1);
    assert_eq!(
        result.references[0].fallback.as_deref(),
        Some("'My Font', Sans, sans-serif")
    );
}

#[test]
fn test_font_stack_fallback_is_verbatim() {
    let content = ".el {\n  font-family: var(--font-family, FooFont, 'Bar Font', BazFont, QuxFont, sans-serif);\n}";
    let result = scan(content);

    let reference = &result.references[0];
    assert_eq!(reference.token_name, "--font-family");
    assert_eq!(
        reference.fallback.as_deref(),
        Some("FooFont, 'Bar Font', BazFont, QuxFont, sans-serif")
    );
}

#[test]
fn test_function_in_fallback_keeps_inner_commas() {
    let content = ".el { box-shadow: var(--shadow, 1px 2px rgba(0, 0, 0, 0.5)); }";
    let result = scan(content);

    assert_eq!(result.references.len(), 1);
    assert_eq!(result.references[0].token_name, "--shadow");
    assert_eq!(
        result.references[0].fallback.as_deref(),
        Some("1px 2px rgba(0, 0, 0, 0.5)")
    );
}

#[test]
fn test_other_functions_are_ignored() {
    let content = ".el { color: rgba(0, 0, 0, 0.5); width: calc(100% - 4px); }";
    let result = scan(content);
    assert!(result.references.is_empty());
}

#[test]
fn test_declaration_value_with_var_reference() {
    let content = ":root { --a: #fff; --b: var(--a); }";
    let result = scan(content);

    assert_eq!(result.declarations.len(), 2);
    assert_eq!(result.declarations[1].name, "--b");
    assert_eq!(result.declarations[1].raw_value, "var(--a)");
    assert_eq!(result.references.len(), 1);
    assert_eq!(result.references[0].token_name, "--a");
}

#[test]
fn test_positions_are_utf16() {
    let plain = ".button { /* ab */ color: var(--color); }";
    let emoji = ".button { /* 🎨 */ color: var(--color); }";

    let plain_start = scan(plain).references[0].range.start;
    let emoji_start = scan(emoji).references[0].range.start;

    assert_eq!(emoji_start, Position { line: 0, character: 26 });
    assert_eq!(plain_start, emoji_start);
}

#[test]
fn test_positions_after_emoji_line() {
    let content = "/* 🎨🎨 */\n.a { color: var(--x); }";
    let reference = &scan(content).references[0];
    assert_eq!(reference.range.start, Position { line: 1, character: 12 });
    assert_eq!(reference.range.end, Position { line: 1, character: 20 });
}

#[test]
fn test_empty_css() {
    let result = scan("");
    assert!(result.declarations.is_empty());
    assert!(result.references.is_empty());
}

#[test]
fn test_malformed_css_does_not_abort() {
    let scanner = CssScanner::new().unwrap();
    let result = scanner.scan("this is not valid css {{{");
    assert!(result.is_ok());
}

#[test]
fn test_partial_tree_still_yields_references() {
    let content = ".a { color: var(--ok); }\n.c { background: var(--also-ok, blue); }\n.b { color: ;; {";
    let result = scan(content);

    let names: Vec<&str> = result.references.iter().map(|r| r.token_name.as_str()).collect();
    assert!(names.contains(&"--ok"));
    assert!(names.contains(&"--also-ok"));
}

#[test]
fn test_scanner_is_reusable() {
    let scanner = CssScanner::new().unwrap();
    for i in 0..10 {
        let content = format!(".a {{ color: var(--x-{}); }}", i);
        let result = scanner.scan(&content).unwrap();
        assert_eq!(result.references[0].token_name, format!("--x-{}", i));
    }
}
