//! Tests for token code actions

use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Diagnostic, Position, Range, TextEdit,
};

use super::code_actions::*;
use super::diagnostics::TokenDiagnostics;
use crate::language::position::range_contains;
use crate::test_utils::{css_uri, registry_from_json, scan_css};
use crate::tokens::TokenRegistry;

const TOKENS: &str = r##"{
    "color": {
        "$type": "color",
        "primary": {"$value": "#FF0000"}
    },
    "border": {"$type": "border", "$value": "1px solid red"},
    "a": {"$value": "1px", "$deprecated": "Use --b instead"},
    "b": {"$value": "2px", "$type": "dimension"}
}"##;

fn registry() -> TokenRegistry {
    registry_from_json(TOKENS)
}

fn cursor(line: u32, character: u32) -> Range {
    let position = Position { line, character };
    Range {
        start: position,
        end: position,
    }
}

fn cursor_at(css: &str, needle: &str) -> Range {
    cursor(0, (css.find(needle).unwrap() + 2) as u32)
}

fn actions_for(css: &str, range: Range) -> Vec<CodeAction> {
    let scan = scan_css(css);
    let registry = registry();
    let diagnostics: Vec<Diagnostic> = TokenDiagnostics::new(false).compute(&scan, &registry);
    TokenCodeActionProvider::new()
        .code_actions(&css_uri(), &scan, &registry, range, &diagnostics)
        .into_iter()
        .filter_map(|action| match action {
            CodeActionOrCommand::CodeAction(action) => Some(action),
            CodeActionOrCommand::Command(_) => None,
        })
        .collect()
}

fn find<'a>(actions: &'a [CodeAction], title: &str) -> Option<&'a CodeAction> {
    actions.iter().find(|action| action.title == title)
}

fn edits(action: &CodeAction) -> Vec<TextEdit> {
    action
        .edit
        .as_ref()
        .and_then(|edit| edit.changes.as_ref())
        .and_then(|changes| changes.get(&css_uri()))
        .cloned()
        .unwrap_or_default()
}

fn slice(css: &str, range: Range) -> &str {
    &css[range.start.character as usize..range.end.character as usize]
}

#[test]
fn test_fix_fallback_action() {
    let css = ".x { color: var(--color-primary, blue); }";
    let actions = actions_for(css, cursor_at(css, "var("));

    let action = find(&actions, FIX_FALLBACK_TITLE).unwrap();
    assert_eq!(action.kind, Some(CodeActionKind::QUICKFIX));
    assert_eq!(action.is_preferred, Some(true));
    assert_eq!(action.diagnostics.as_ref().map(Vec::len), Some(1));

    let edits = edits(action);
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].new_text, "var(--color-primary, #FF0000)");
    assert_eq!(slice(css, edits[0].range), "var(--color-primary, blue)");
}

#[test]
fn test_add_fallback_for_color_and_dimension() {
    let css = ".x { color: var(--color-primary); }";
    let actions = actions_for(css, cursor_at(css, "var("));

    let action = find(&actions, "Add fallback value '#FF0000'").unwrap();
    assert_eq!(edits(action)[0].new_text, "var(--color-primary, #FF0000)");

    // Untyped tokens are not offered a fallback
    let css = ".x { width: var(--a); }";
    let actions = actions_for(css, cursor_at(css, "var("));
    assert!(actions.iter().all(|a| !a.title.starts_with("Add fallback")));
}

#[test]
fn test_deprecated_replacements() {
    let css = ".x { width: var(--a); }";
    let actions = actions_for(css, cursor_at(css, "var("));

    let replace = find(&actions, "Replace with '--b'").unwrap();
    assert_eq!(edits(replace)[0].new_text, "var(--b)");
    assert_eq!(replace.is_preferred, Some(true));

    let literal = find(&actions, "Replace with literal value '1px'").unwrap();
    assert_eq!(edits(literal)[0].new_text, "1px");
}

#[test]
fn test_deprecated_replacement_keeps_fallback() {
    let css = ".x { width: var(--a, 1px); }";
    let actions = actions_for(css, cursor_at(css, "var("));

    let replace = find(&actions, "Replace with '--b'").unwrap();
    assert_eq!(edits(replace)[0].new_text, "var(--b, 2px)");
}

#[test]
fn test_toggle_at_cursor() {
    let css = ".x { color: var(--color-primary, #FF0000); }";
    let actions = actions_for(css, cursor_at(css, "var("));
    let toggle = find(&actions, TOGGLE_FALLBACK_TITLE).unwrap();
    assert_eq!(toggle.kind, Some(CodeActionKind::REFACTOR_REWRITE));
    assert_eq!(edits(toggle)[0].new_text, "var(--color-primary)");

    let css = ".x { color: var(--color-primary); }";
    let actions = actions_for(css, cursor_at(css, "var("));
    let toggle = find(&actions, TOGGLE_FALLBACK_TITLE).unwrap();
    assert_eq!(edits(toggle)[0].new_text, "var(--color-primary, #FF0000)");
    assert!(find(&actions, TOGGLE_RANGE_TITLE).is_none());
}

#[test]
fn test_toggle_at_cursor_picks_innermost_call() {
    let css = ".x { width: var(--a, var(--b)); }";
    let actions = actions_for(css, cursor_at(css, "var(--b"));

    let toggle = find(&actions, TOGGLE_FALLBACK_TITLE).unwrap();
    let edits = edits(toggle);
    assert_eq!(slice(css, edits[0].range), "var(--b)");
    assert_eq!(edits[0].new_text, "var(--b, 2px)");
}

#[test]
fn test_toggle_range() {
    let css = ".x { color: var(--color-primary); width: var(--b, 2px); }";
    let range = Range {
        start: Position { line: 0, character: 0 },
        end: Position { line: 0, character: css.len() as u32 },
    };
    let actions = actions_for(css, range);

    assert!(find(&actions, TOGGLE_FALLBACK_TITLE).is_none());
    let toggle = find(&actions, TOGGLE_RANGE_TITLE).unwrap();
    let texts: Vec<String> = edits(toggle).into_iter().map(|e| e.new_text).collect();
    assert_eq!(texts, vec!["var(--color-primary, #FF0000)", "var(--b)"]);
}

#[test]
fn test_toggle_range_skips_nested_calls() {
    let css = ".x { width: var(--a, var(--b)); }";
    let range = Range {
        start: Position { line: 0, character: 0 },
        end: Position { line: 0, character: css.len() as u32 },
    };
    let actions = actions_for(css, range);

    let edits = edits(find(&actions, TOGGLE_RANGE_TITLE).unwrap());
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].new_text, "var(--a)");
}

#[test]
fn test_fix_all_offered_and_resolved() {
    let css = ".a { color: var(--color-primary, blue); width: var(--b, 5px); }";
    let actions = actions_for(css, cursor(0, 0));

    let fix_all = find(&actions, FIX_ALL_TITLE).unwrap();
    assert_eq!(fix_all.kind, Some(SOURCE_FIX_ALL));
    assert!(fix_all.edit.is_none());
    assert_eq!(FixAllData::from_action(fix_all), Some(FixAllData { uri: css_uri() }));

    let scan = scan_css(css);
    let edit = TokenCodeActionProvider::new().resolve_fix_all(&css_uri(), &scan, &registry());
    let edits = edit.changes.unwrap().remove(&css_uri()).unwrap();

    assert_eq!(edits.len(), 2);
    assert_eq!(slice(css, edits[0].range), "var(--color-primary, blue)");
    assert_eq!(edits[0].new_text, "var(--color-primary, #FF0000)");
    assert_eq!(slice(css, edits[1].range), "var(--b, 5px)");
    assert_eq!(edits[1].new_text, "var(--b, 2px)");
    assert!(!range_contains(edits[0].range, edits[1].range));
    assert!(edits[0].range.end.character <= edits[1].range.start.character);
}

#[test]
fn test_fix_all_uses_current_text() {
    let registry = registry();
    let provider = TokenCodeActionProvider::new();

    let offered = ".a { color: var(--color-primary, blue); }";
    assert!(find(&actions_for(offered, cursor(0, 0)), FIX_ALL_TITLE).is_some());

    // Document was fixed by hand before the action was resolved
    let current = ".a { color: var(--color-primary, #ff0000); }";
    let edit = provider.resolve_fix_all(&css_uri(), &scan_css(current), &registry);
    assert!(edit.changes.unwrap()[&css_uri()].is_empty());
}

#[test]
fn test_fix_all_drops_nested_edits() {
    let css = ".x { width: var(--b, var(--color-primary, #000)); }";
    let edit = TokenCodeActionProvider::new().resolve_fix_all(&css_uri(), &scan_css(css), &registry());
    let edits = edit.changes.unwrap().remove(&css_uri()).unwrap();

    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].new_text, "var(--b, 2px)");
}

#[test]
fn test_no_fix_all_without_mismatches() {
    let css = ".a { color: var(--color-primary, #ff0000); }";
    assert!(find(&actions_for(css, cursor(0, 0)), FIX_ALL_TITLE).is_none());
}

#[test]
fn test_unformattable_value_skips_fix() {
    let css = ".a { border: var(--border, none); }";
    let actions = actions_for(css, cursor_at(css, "var("));

    assert!(find(&actions, FIX_FALLBACK_TITLE).is_none());
    // Removing the fallback needs no formatting
    assert_eq!(edits(find(&actions, TOGGLE_FALLBACK_TITLE).unwrap())[0].new_text, "var(--border)");
}

#[test]
fn test_recommended_replacement() {
    assert_eq!(recommended_replacement("Use --b instead"), Some("--b".to_string()));
    assert_eq!(
        recommended_replacement("Deprecated. Replaced by color.primary."),
        Some("color.primary".to_string())
    );
    assert_eq!(recommended_replacement("Use `--x` instead"), Some("--x".to_string()));
    assert_eq!(recommended_replacement("Going away soon"), None);
}
