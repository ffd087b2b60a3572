//! Token model

use tower_lsp::lsp_types::Location;

use crate::tokens::color::TokenValue;

/// A single design token after name derivation and alias resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Hyphen-joined path without prefix, e.g. `color-primary`
    pub name: String,
    /// Key chain from the document root with group markers removed
    pub path: Vec<String>,
    pub value: TokenValue,
    /// `$type`, inherited from enclosing groups when the token has none
    pub token_type: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    pub deprecation_message: Option<String>,
    /// Where the token is written in its source document
    pub definition: Option<Location>,
    pub prefix: Option<String>,
    /// Full custom property name, e.g. `--ds-color-primary`
    pub css_variable_name: String,
}

impl Token {
    /// Hyphen-joined name for a path
    pub fn name_for_path(path: &[String]) -> String {
        path.join("-")
    }

    /// Custom property name for a path under an optional prefix
    pub fn css_variable_for(prefix: Option<&str>, path: &[String]) -> String {
        let name = Self::name_for_path(path);
        match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => format!("--{}-{}", prefix, name),
            None => format!("--{}", name),
        }
    }

    /// CSS text for the token's value
    pub fn css_value(&self) -> String {
        self.value.to_css()
    }

    /// Whether the token's type is one of `types`, ignoring case
    pub fn has_type(&self, types: &[&str]) -> bool {
        self.token_type
            .as_deref()
            .is_some_and(|t| types.iter().any(|candidate| t.eq_ignore_ascii_case(candidate)))
    }
}
