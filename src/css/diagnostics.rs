//! Token consistency diagnostics
//!
//! Joins scanned `var()` references against the token registry. Deprecated
//! tokens produce informational hints; fallbacks that disagree with the
//! token's value are errors. References to unknown tokens are left alone.

use std::sync::Arc;

use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, DiagnosticTag, NumberOrString,
};

use crate::css::scanner::{Reference, ScanResult};
use crate::tokens::format::values_equivalent;
use crate::tokens::{Token, TokenRegistry};

/// Source name attached to every diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "design-tokens";
pub const DEPRECATED_TOKEN_CODE: &str = "deprecated-token";
pub const INCORRECT_FALLBACK_CODE: &str = "incorrect-fallback";

/// A reference whose fallback differs from its token's value
#[derive(Debug, Clone)]
pub struct FallbackMismatch<'a> {
    pub reference: &'a Reference,
    pub token: Arc<Token>,
    /// CSS text of the token's value
    pub expected: String,
}

/// Check one reference's own fallback against its token
pub fn fallback_mismatch<'a>(reference: &'a Reference, registry: &TokenRegistry) -> Option<FallbackMismatch<'a>> {
    let fallback = reference.fallback.as_deref()?;
    let token = registry.get(&reference.token_name)?;
    let expected = token.css_value();
    if values_equivalent(fallback, &expected) {
        return None;
    }

    Some(FallbackMismatch {
        reference,
        token: token.clone(),
        expected,
    })
}

/// Every mismatching reference in the document, nested references included
pub fn find_mismatches<'a>(scan: &'a ScanResult, registry: &TokenRegistry) -> Vec<FallbackMismatch<'a>> {
    scan.references
        .iter()
        .filter_map(|reference| fallback_mismatch(reference, registry))
        .collect()
}

/// Computes diagnostics for scanned documents
pub struct TokenDiagnostics {
    /// Whether the client accepts `relatedInformation`
    related_information: bool,
}

impl TokenDiagnostics {
    pub fn new(related_information: bool) -> Self {
        Self { related_information }
    }

    pub fn compute(&self, scan: &ScanResult, registry: &TokenRegistry) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for reference in &scan.references {
            let Some(token) = registry.get(&reference.token_name) else {
                continue;
            };

            if token.deprecated {
                diagnostics.push(self.deprecated_diagnostic(reference, token));
            }
            if let Some(mismatch) = fallback_mismatch(reference, registry) {
                diagnostics.push(mismatch_diagnostic(&mismatch));
            }
        }

        log::debug!("Computed {} diagnostics", diagnostics.len());
        diagnostics
    }

    fn deprecated_diagnostic(&self, reference: &Reference, token: &Token) -> Diagnostic {
        let message = match token.deprecation_message.as_deref() {
            Some(note) => format!("{} is deprecated: {}", reference.token_name, note),
            None => format!("{} is deprecated", reference.token_name),
        };

        let related_information = match (&token.definition, self.related_information) {
            (Some(location), true) => Some(vec![DiagnosticRelatedInformation {
                location: location.clone(),
                message: format!("Token {} defined here", token.css_variable_name),
            }]),
            _ => None,
        };

        Diagnostic {
            range: reference.range,
            severity: Some(DiagnosticSeverity::INFORMATION),
            code: Some(NumberOrString::String(DEPRECATED_TOKEN_CODE.to_string())),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message,
            related_information,
            tags: Some(vec![DiagnosticTag::DEPRECATED]),
            ..Default::default()
        }
    }
}

fn mismatch_diagnostic(mismatch: &FallbackMismatch) -> Diagnostic {
    Diagnostic {
        range: mismatch.reference.range,
        severity: Some(DiagnosticSeverity::ERROR),
        code: Some(NumberOrString::String(INCORRECT_FALLBACK_CODE.to_string())),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: format!(
            "Token fallback does not match expected value: {}",
            mismatch.expected
        ),
        ..Default::default()
    }
}

/// Whether `diagnostic` carries the given code
pub fn has_code(diagnostic: &Diagnostic, code: &str) -> bool {
    matches!(&diagnostic.code, Some(NumberOrString::String(c)) if c == code)
}
