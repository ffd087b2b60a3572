//! Go to definition for token references
//!
//! A cursor on a `var()` call or on a custom property name jumps to where the
//! token is written in its token document.

use tower_lsp::lsp_types::{GotoDefinitionResponse, LocationLink, Position, Range};

use crate::css::scanner::{Reference, ScanResult};
use crate::language::position::{clamp_position, range_contains_position};
use crate::tokens::TokenRegistry;

/// Resolves token definitions under the cursor
pub struct TokenDefinitionProvider {
    /// Client accepts `LocationLink` results
    link_support: bool,
}

impl TokenDefinitionProvider {
    pub fn new(link_support: bool) -> Self {
        Self { link_support }
    }

    /// Definition of the token referenced at `position`
    pub fn definition(
        &self,
        content: &str,
        scan: &ScanResult,
        registry: &TokenRegistry,
        position: Position,
    ) -> Option<GotoDefinitionResponse> {
        let position = clamp_position(content, position)?;
        let (token_name, origin) = name_at(scan, position)?;

        let token = registry.get(token_name)?;
        let Some(location) = token.definition.clone() else {
            log::debug!("Token {} has no recorded definition", token.css_variable_name);
            return None;
        };
        log::info!("Definition of {} is in {}", token_name, location.uri);

        if self.link_support {
            Some(GotoDefinitionResponse::Link(vec![LocationLink {
                origin_selection_range: Some(origin),
                target_uri: location.uri,
                target_range: location.range,
                target_selection_range: location.range,
            }]))
        } else {
            Some(GotoDefinitionResponse::Scalar(location))
        }
    }
}

/// Token name and its span under the cursor, innermost `var()` first
fn name_at(scan: &ScanResult, position: Position) -> Option<(&str, Range)> {
    // Outer calls come before the calls nested in their fallback
    if let Some(outer) = scan
        .references
        .iter()
        .find(|reference| range_contains_position(reference.range, position))
    {
        let reference = innermost_at(outer, position);
        return Some((reference.token_name.as_str(), reference.range));
    }

    scan.declarations
        .iter()
        .find(|declaration| range_contains_position(declaration.range, position))
        .map(|declaration| (declaration.name.as_str(), declaration.range))
}

fn innermost_at(reference: &Reference, position: Position) -> &Reference {
    reference
        .nested_references
        .iter()
        .find(|nested| range_contains_position(nested.range, position))
        .map_or(reference, |nested| innermost_at(nested, position))
}
