//! Color decorations for color tokens
//!
//! Every `var()` call or custom property whose token is a color gets a
//! swatch. Picking a color offers the tokens with exactly that color.

use tower_lsp::lsp_types::{Color, ColorInformation, ColorPresentation, Range, TextEdit};

use crate::css::scanner::ScanResult;
use crate::tokens::format::format_token_value_for_css;
use crate::tokens::{Rgba, Token, TokenRegistry};

fn token_color(token: &Token) -> Option<Rgba> {
    if !token.has_type(&["color"]) {
        return None;
    }
    Rgba::from_token_value(&token.value)
}

fn to_lsp(color: Rgba) -> Color {
    Color {
        red: color.red,
        green: color.green,
        blue: color.blue,
        alpha: color.alpha,
    }
}

/// Provides document colors and color presentations
pub struct TokenColorProvider {}

impl TokenColorProvider {
    pub fn new() -> Self {
        Self {}
    }

    /// Swatches for references and declarations of color tokens
    pub fn document_colors(&self, scan: &ScanResult, registry: &TokenRegistry) -> Vec<ColorInformation> {
        let references = scan
            .references
            .iter()
            .map(|reference| (reference.token_name.as_str(), reference.range));
        let declarations = scan
            .declarations
            .iter()
            .map(|declaration| (declaration.name.as_str(), declaration.range));

        references
            .chain(declarations)
            .filter_map(|(name, range)| {
                let color = token_color(registry.get(name)?)?;
                Some(ColorInformation {
                    range,
                    color: to_lsp(color),
                })
            })
            .collect()
    }

    /// Color tokens matching `color`, written the way the text at `range` is written
    pub fn color_presentations(
        &self,
        scan: &ScanResult,
        registry: &TokenRegistry,
        color: Color,
        range: Range,
    ) -> Vec<ColorPresentation> {
        let wanted = Rgba::new(color.red, color.green, color.blue, color.alpha).to_hex();
        let is_declaration = scan.declarations.iter().any(|declaration| declaration.range == range);
        let keep_fallback = scan
            .references
            .iter()
            .any(|reference| reference.range == range && reference.fallback.is_some());

        let presentations: Vec<ColorPresentation> = registry
            .iter()
            .filter(|token| token_color(token).is_some_and(|found| found.to_hex() == wanted))
            .map(|token| {
                let name = &token.css_variable_name;
                let new_text = if is_declaration {
                    name.clone()
                } else if keep_fallback {
                    match format_token_value_for_css(token) {
                        Ok(value) => format!("var({}, {})", name, value),
                        Err(_) => format!("var({})", name),
                    }
                } else {
                    format!("var({})", name)
                };
                ColorPresentation {
                    label: name.clone(),
                    text_edit: Some(TextEdit { range, new_text }),
                    additional_text_edits: None,
                }
            })
            .collect();

        log::debug!("{} color tokens match {}", presentations.len(), wanted);
        presentations
    }
}

impl Default for TokenColorProvider {
    fn default() -> Self {
        Self::new()
    }
}
