//! Code actions for design token references
//!
//! Quick fixes for mismatching fallbacks and deprecated tokens, toggles that
//! add or remove a fallback, and a document-wide "fix all" whose edits are
//! only computed when the client resolves it.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Diagnostic, Range, TextEdit, WorkspaceEdit,
};
use url::Url;

use crate::css::diagnostics::{
    DEPRECATED_TOKEN_CODE, INCORRECT_FALLBACK_CODE, fallback_mismatch, find_mismatches, has_code,
};
use crate::css::scanner::{Reference, ScanResult};
use crate::language::position::{range_contains, ranges_intersect};
use crate::tokens::format::format_token_value_for_css;
use crate::tokens::{Token, TokenRegistry};

pub const FIX_FALLBACK_TITLE: &str = "Fix token fallback value";
pub const FIX_ALL_TITLE: &str = "Fix all token fallback values";
pub const TOGGLE_FALLBACK_TITLE: &str = "Toggle design token fallback value";
pub const TOGGLE_RANGE_TITLE: &str = "Toggle design token fallback values (in range)";

/// Kind of the document-wide fix
pub const SOURCE_FIX_ALL: CodeActionKind = CodeActionKind::new("source.fixAll");

/// Data carried by the fix-all action until it is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixAllData {
    pub uri: Url,
}

impl FixAllData {
    /// Read the data back from an action sent to `codeAction/resolve`
    pub fn from_action(action: &CodeAction) -> Option<Self> {
        if action.title != FIX_ALL_TITLE {
            return None;
        }
        serde_json::from_value(action.data.clone()?).ok()
    }
}

fn recommendation_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"Use\s+(\S+)\s+instead").unwrap(),
            Regex::new(r"Replaced by\s+(\S+)").unwrap(),
        ]
    })
}

/// Token name suggested by a deprecation message such as "Use --b instead"
pub fn recommended_replacement(message: &str) -> Option<String> {
    recommendation_patterns().iter().find_map(|pattern| {
        let captured = pattern.captures(message)?.get(1)?.as_str();
        let name = captured.trim_end_matches(['.', ',', ';', ')']).trim_matches(['\'', '"', '`']);
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Drop edits that sit inside another edit so no two ranges overlap
fn drop_nested_edits(edits: Vec<TextEdit>) -> Vec<TextEdit> {
    edits
        .iter()
        .filter(|edit| {
            !edits
                .iter()
                .any(|other| other.range != edit.range && range_contains(other.range, edit.range))
        })
        .cloned()
        .collect()
}

fn workspace_edit(uri: &Url, edits: Vec<TextEdit>) -> WorkspaceEdit {
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);
    WorkspaceEdit {
        changes: Some(changes),
        ..Default::default()
    }
}

fn matching_diagnostics(diagnostics: &[Diagnostic], range: Range, code: &str) -> Vec<Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.range == range && has_code(d, code))
        .cloned()
        .collect()
}

/// Format a token value for insertion, logging why it cannot be used
fn formatted_value(token: &Token) -> Option<String> {
    match format_token_value_for_css(token) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Cannot use {} as a fallback value: {}", token.css_variable_name, e);
            None
        }
    }
}

fn var_with_fallback(name: &str, fallback: &str) -> String {
    format!("var({}, {})", name, fallback)
}

/// Provides code actions over scanned references
pub struct TokenCodeActionProvider {}

impl TokenCodeActionProvider {
    pub fn new() -> Self {
        Self {}
    }

    /// Actions for every reference intersecting `range`, plus fix-all when any mismatch exists
    pub fn code_actions(
        &self,
        uri: &Url,
        scan: &ScanResult,
        registry: &TokenRegistry,
        range: Range,
        diagnostics: &[Diagnostic],
    ) -> Vec<CodeActionOrCommand> {
        let mut actions = Vec::new();
        let in_range: Vec<&Reference> = scan
            .references
            .iter()
            .filter(|reference| ranges_intersect(range, reference.range))
            .collect();

        for reference in &in_range {
            let Some(token) = registry.get(&reference.token_name) else {
                continue;
            };

            if token.deprecated {
                actions.extend(self.deprecated_actions(uri, reference, token, registry, diagnostics));
            }

            if fallback_mismatch(reference, registry).is_some() {
                actions.extend(self.fix_fallback_action(uri, reference, token, diagnostics));
            } else if reference.fallback.is_none() && token.has_type(&["color", "dimension"]) {
                actions.extend(self.add_fallback_action(uri, reference, token));
            }
        }

        if range.start == range.end {
            // Calls under a cursor are nested, so the innermost one starts last
            let target = in_range
                .iter()
                .filter(|reference| registry.get(&reference.token_name).is_some())
                .max_by_key(|reference| (reference.range.start.line, reference.range.start.character));
            if let Some(reference) = target {
                if let Some(edit) = self.toggle_edit(reference, registry) {
                    actions.push(CodeActionOrCommand::CodeAction(CodeAction {
                        title: TOGGLE_FALLBACK_TITLE.to_string(),
                        kind: Some(CodeActionKind::REFACTOR_REWRITE),
                        edit: Some(workspace_edit(uri, vec![edit])),
                        ..Default::default()
                    }));
                }
            }
        } else {
            let edits: Vec<TextEdit> = in_range
                .iter()
                .filter_map(|reference| self.toggle_edit(reference, registry))
                .collect();
            let edits = drop_nested_edits(edits);
            if !edits.is_empty() {
                actions.push(CodeActionOrCommand::CodeAction(CodeAction {
                    title: TOGGLE_RANGE_TITLE.to_string(),
                    kind: Some(CodeActionKind::REFACTOR_REWRITE),
                    edit: Some(workspace_edit(uri, edits)),
                    ..Default::default()
                }));
            }
        }

        if !find_mismatches(scan, registry).is_empty() {
            match serde_json::to_value(FixAllData { uri: uri.clone() }) {
                Ok(data) => actions.push(CodeActionOrCommand::CodeAction(CodeAction {
                    title: FIX_ALL_TITLE.to_string(),
                    kind: Some(SOURCE_FIX_ALL),
                    data: Some(data),
                    ..Default::default()
                })),
                Err(e) => log::error!("Failed to serialize fix-all data: {}", e),
            }
        }

        actions
    }

    /// Edits for the fix-all action, computed from the document as it is now
    pub fn resolve_fix_all(&self, uri: &Url, scan: &ScanResult, registry: &TokenRegistry) -> WorkspaceEdit {
        let edits: Vec<TextEdit> = find_mismatches(scan, registry)
            .into_iter()
            .filter_map(|mismatch| {
                let value = formatted_value(&mismatch.token)?;
                Some(TextEdit {
                    range: mismatch.reference.range,
                    new_text: var_with_fallback(&mismatch.reference.token_name, &value),
                })
            })
            .collect();

        let edits = drop_nested_edits(edits);
        log::info!("Fix all resolved with {} edits for {}", edits.len(), uri);
        workspace_edit(uri, edits)
    }

    fn fix_fallback_action(
        &self,
        uri: &Url,
        reference: &Reference,
        token: &Token,
        diagnostics: &[Diagnostic],
    ) -> Option<CodeActionOrCommand> {
        let value = formatted_value(token)?;
        let linked = matching_diagnostics(diagnostics, reference.range, INCORRECT_FALLBACK_CODE);

        Some(CodeActionOrCommand::CodeAction(CodeAction {
            title: FIX_FALLBACK_TITLE.to_string(),
            kind: Some(CodeActionKind::QUICKFIX),
            diagnostics: (!linked.is_empty()).then_some(linked),
            edit: Some(workspace_edit(
                uri,
                vec![TextEdit {
                    range: reference.range,
                    new_text: var_with_fallback(&reference.token_name, &value),
                }],
            )),
            is_preferred: Some(true),
            ..Default::default()
        }))
    }

    fn add_fallback_action(&self, uri: &Url, reference: &Reference, token: &Token) -> Option<CodeActionOrCommand> {
        let value = formatted_value(token)?;
        Some(CodeActionOrCommand::CodeAction(CodeAction {
            title: format!("Add fallback value '{}'", value),
            kind: Some(CodeActionKind::QUICKFIX),
            edit: Some(workspace_edit(
                uri,
                vec![TextEdit {
                    range: reference.range,
                    new_text: var_with_fallback(&reference.token_name, &value),
                }],
            )),
            ..Default::default()
        }))
    }

    fn deprecated_actions(
        &self,
        uri: &Url,
        reference: &Reference,
        token: &Token,
        registry: &TokenRegistry,
        diagnostics: &[Diagnostic],
    ) -> Vec<CodeActionOrCommand> {
        let mut actions = Vec::new();
        let linked = matching_diagnostics(diagnostics, reference.range, DEPRECATED_TOKEN_CODE);

        let replacement = token
            .deprecation_message
            .as_deref()
            .and_then(recommended_replacement)
            .and_then(|name| registry.get(&name))
            .filter(|replacement| replacement.css_variable_name != token.css_variable_name);

        if let Some(replacement) = replacement {
            let name = &replacement.css_variable_name;
            let new_text = match reference.fallback {
                Some(_) => formatted_value(replacement).map(|value| var_with_fallback(name, &value)),
                None => Some(format!("var({})", name)),
            };
            if let Some(new_text) = new_text {
                actions.push(CodeActionOrCommand::CodeAction(CodeAction {
                    title: format!("Replace with '{}'", name),
                    kind: Some(CodeActionKind::QUICKFIX),
                    diagnostics: (!linked.is_empty()).then(|| linked.clone()),
                    edit: Some(workspace_edit(
                        uri,
                        vec![TextEdit {
                            range: reference.range,
                            new_text,
                        }],
                    )),
                    is_preferred: (!linked.is_empty()).then_some(true),
                    ..Default::default()
                }));
            }
        }

        if let Some(value) = formatted_value(token) {
            actions.push(CodeActionOrCommand::CodeAction(CodeAction {
                title: format!("Replace with literal value '{}'", value),
                kind: Some(CodeActionKind::QUICKFIX),
                diagnostics: (!linked.is_empty()).then_some(linked),
                edit: Some(workspace_edit(
                    uri,
                    vec![TextEdit {
                        range: reference.range,
                        new_text: value,
                    }],
                )),
                ..Default::default()
            }));
        }

        actions
    }

    /// Remove an existing fallback, or add the token's value as one
    fn toggle_edit(&self, reference: &Reference, registry: &TokenRegistry) -> Option<TextEdit> {
        let token = registry.get(&reference.token_name)?;
        let new_text = match reference.fallback {
            Some(_) => format!("var({})", reference.token_name),
            None => var_with_fallback(&reference.token_name, &formatted_value(token)?),
        };
        Some(TextEdit {
            range: reference.range,
            new_text,
        })
    }
}

impl Default for TokenCodeActionProvider {
    fn default() -> Self {
        Self::new()
    }
}
