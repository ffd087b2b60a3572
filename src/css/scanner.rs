//! CSS reference scanner
//!
//! Walks a tree-sitter-css syntax tree and collects every custom-property
//! declaration (`--name: value`) and every `var()` call, independent of any
//! token registry. Malformed CSS still yields whatever the tolerant parse tree
//! supports; a node whose coordinates cannot be mapped to the editor is dropped.

use tower_lsp::lsp_types::Range;
use tree_sitter::Node;

use crate::css::parser::{ParserPool, ScanError};
use crate::language::tree_utils::{find_child_by_kind, node_text, node_to_range};

/// A custom property declaration such as `--color-primary: #0000ff`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Property name including the `--` prefix
    pub name: String,
    /// Value text, trimmed and joined with single spaces; commas stay attached
    pub raw_value: String,
    /// Range of the property name only
    pub range: Range,
}

/// A single `var()` call
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// First argument of the call, e.g. `--color-primary`
    pub token_name: String,
    /// Everything after the first top-level comma, verbatim
    pub fallback: Option<String>,
    /// Range of the whole `var(...)` call
    pub range: Range,
    /// `var()` calls found inside the fallback
    pub nested_references: Vec<Reference>,
}

/// Declarations and references found in one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    pub declarations: Vec<Declaration>,
    /// Every `var()` call in document order, nested calls included
    pub references: Vec<Reference>,
}

/// Scans CSS text for custom properties and `var()` calls
pub struct CssScanner {
    pool: ParserPool,
}

impl CssScanner {
    /// Create a scanner with a default-sized parser pool
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self::with_pool(ParserPool::new()?))
    }

    /// Create a scanner backed by an existing pool
    pub fn with_pool(pool: ParserPool) -> Self {
        Self { pool }
    }

    /// Scan CSS content.
    ///
    /// Only a total parse failure is an error; syntax errors inside the
    /// document just limit what can be found.
    pub fn scan(&self, content: &str) -> Result<ScanResult, ScanError> {
        let tree = {
            let mut parser = self.pool.acquire()?;
            parser.parse(content)?
        };

        let root = tree.root_node();
        if root.has_error() {
            log::debug!("CSS contains syntax errors, scanning partial tree");
        }

        let mut result = ScanResult::default();
        walk(root, content, &mut result);
        Ok(result)
    }
}

fn walk(node: Node, content: &str, result: &mut ScanResult) {
    match node.kind() {
        "declaration" => {
            if let Some(declaration) = scan_declaration(node, content) {
                result.declarations.push(declaration);
            }
        }
        "call_expression" => {
            if let Some(reference) = scan_var_call(node, content) {
                result.references.push(reference);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, content, result);
    }
}

fn scan_declaration(node: Node, content: &str) -> Option<Declaration> {
    let property_node = find_child_by_kind(node, "property_name")?;
    let name = node_text(property_node, content);
    if !name.starts_with("--") {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.id() == property_node.id() {
            continue;
        }
        match child.kind() {
            ":" | ";" | "important" | "comment" | "ERROR" => continue,
            // A comma closes the preceding part, as in `'My Font', sans-serif`
            "," => {
                if let Some(last) = parts.last_mut() {
                    last.push(',');
                }
                continue;
            }
            _ => {}
        }
        let text = node_text(child, content).trim();
        if !text.is_empty() {
            parts.push(text.to_string());
        }
    }

    // Only the name is covered so hover and go-to-definition trigger on the name, never the value
    let range = match node_to_range(property_node, content) {
        Ok(range) => range,
        Err(e) => {
            log::warn!("Dropping declaration {}: {}", name, e);
            return None;
        }
    };

    Some(Declaration {
        name: name.to_string(),
        raw_value: parts.join(" "),
        range,
    })
}

fn scan_var_call(node: Node, content: &str) -> Option<Reference> {
    let function_name = find_child_by_kind(node, "function_name")?;
    if node_text(function_name, content) != "var" {
        return None;
    }
    let arguments = find_child_by_kind(node, "arguments")?;

    let mut token_node: Option<Node> = None;
    let mut fallback_nodes: Vec<Node> = Vec::new();
    let mut found_separator = false;

    let mut cursor = arguments.walk();
    for child in arguments.children(&mut cursor) {
        match child.kind() {
            "(" | ")" | "comment" => continue,
            // Only the first top-level comma separates the name from the fallback;
            // later ones belong to the fallback and are kept by slicing the source
            "," => {
                if token_node.is_some() {
                    found_separator = true;
                }
                continue;
            }
            _ => {}
        }

        if token_node.is_none() {
            token_node = Some(child);
        } else if found_separator {
            fallback_nodes.push(child);
        }
    }

    let token_name = node_text(token_node?, content).trim();
    if token_name.is_empty() {
        return None;
    }

    // `var(--a,)` has an empty fallback, which is not the same as none
    let fallback = match (fallback_nodes.first(), fallback_nodes.last()) {
        (Some(first), Some(last)) => content
            .get(first.start_byte()..last.end_byte())
            .map(|text| text.trim().to_string()),
        _ if found_separator => Some(String::new()),
        _ => None,
    };

    let mut nested_references = Vec::new();
    for fallback_node in &fallback_nodes {
        collect_var_calls(*fallback_node, content, &mut nested_references);
    }

    let range = match node_to_range(node, content) {
        Ok(range) => range,
        Err(e) => {
            log::warn!("Dropping var() reference to {}: {}", token_name, e);
            return None;
        }
    };

    Some(Reference {
        token_name: token_name.to_string(),
        fallback,
        range,
        nested_references,
    })
}

/// Collect the outermost `var()` calls below `node`; each one carries its own nested calls
fn collect_var_calls(node: Node, content: &str, references: &mut Vec<Reference>) {
    if node.kind() == "call_expression" {
        if let Some(reference) = scan_var_call(node, content) {
            references.push(reference);
            return;
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_var_calls(child, content, references);
    }
}
