//! Formatting token values for insertion into CSS
//!
//! A token's value is only inserted as a `var()` fallback when it is plain CSS
//! text that cannot break the surrounding declaration.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::tokens::rgba::Rgba;
use crate::tokens::token::Token;

/// Why a value cannot be used as a CSS fallback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid font-weight value {0:?} (must be keyword or number)")]
    InvalidFontWeight(String),

    #[error("font-weight value {0:?} out of range (must be 1-1000)")]
    FontWeightOutOfRange(String),

    #[error("value {0:?} contains special characters and cannot be safely formatted")]
    SpecialCharacters(String),

    #[error("value {0:?} has unknown format")]
    UnknownFormat(String),

    #[error("token type {0:?} cannot be used as CSS fallback value")]
    UnsupportedType(String),

    #[error("token has no CSS value")]
    Empty,
}

/// Token types whose value is inserted as-is
const SAFE_TYPES: &[&str] = &["color", "dimension", "number", "duration", "cubicbezier"];

const FONT_WEIGHT_KEYWORDS: &[&str] = &[
    "normal", "bold", "bolder", "lighter", "inherit", "initial", "unset",
];

const GENERIC_FONT_FAMILIES: &[&str] = &[
    "serif", "sans-serif", "monospace", "cursive", "fantasy", "system-ui",
];

struct Patterns {
    number: Regex,
    dimension: Regex,
    identifier: Regex,
    font_weight: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        number: Regex::new(r"^-?\d+(\.\d+)?$").unwrap(),
        dimension: Regex::new(r"^-?\d+(\.\d+)?(px|rem|em|%|vh|vw|pt|cm|mm|in|pc|ex|ch|vmin|vmax)$")
            .unwrap(),
        identifier: Regex::new(r"^[a-zA-Z][a-zA-Z0-9-]*$").unwrap(),
        font_weight: Regex::new(r"^\d+$").unwrap(),
    })
}

fn contains_ignore_case(list: &[&str], value: &str) -> bool {
    list.iter().any(|entry| entry.eq_ignore_ascii_case(value))
}

/// Whether `value` is a CSS named color
pub fn is_named_color(value: &str) -> bool {
    Rgba::from_name(value.trim()).is_some()
}

/// Format a token's value for use as a `var()` fallback
pub fn format_token_value_for_css(token: &Token) -> Result<String, FormatError> {
    let value = token.css_value();
    if value.trim().is_empty() {
        return Err(FormatError::Empty);
    }

    let token_type = token
        .token_type
        .as_deref()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match token_type.as_str() {
        "fontweight" => format_font_weight(&value),
        "fontfamily" => Ok(format_font_family(&value)),
        "" => format_untyped(&value),
        other if SAFE_TYPES.contains(&other) => Ok(value),
        other => Err(FormatError::UnsupportedType(other.to_string())),
    }
}

fn format_font_weight(value: &str) -> Result<String, FormatError> {
    if contains_ignore_case(FONT_WEIGHT_KEYWORDS, value) {
        return Ok(value.to_string());
    }
    if !patterns().font_weight.is_match(value) {
        return Err(FormatError::InvalidFontWeight(value.to_string()));
    }
    match value.parse::<u32>() {
        Ok(weight) if (1..=1000).contains(&weight) => Ok(value.to_string()),
        _ => Err(FormatError::FontWeightOutOfRange(value.to_string())),
    }
}

/// Quote a single font family name when it needs quoting
pub fn format_font_family(value: &str) -> String {
    let value = value.trim();

    let quoted = (value.len() >= 2 && value.starts_with('"') && value.ends_with('"'))
        || (value.len() >= 2 && value.starts_with('\'') && value.ends_with('\''));
    if quoted || contains_ignore_case(GENERIC_FONT_FAMILIES, value) || value.contains(',') {
        return value.to_string();
    }

    if value.contains([' ', '\t', '\n', '"', '\'']) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("\"{}\"", escaped);
    }
    value.to_string()
}

fn format_untyped(value: &str) -> Result<String, FormatError> {
    let patterns = patterns();
    if is_named_color(value)
        || value.starts_with('#')
        || (value.contains('(') && value.contains(')'))
        || patterns.dimension.is_match(value)
        || patterns.number.is_match(value)
    {
        return Ok(value.to_string());
    }

    if value.contains([' ', '\t', '\n', '"', '\'', '(', ')', '[', ']', '{', '}']) {
        return Err(FormatError::SpecialCharacters(value.to_string()));
    }
    if patterns.identifier.is_match(value) {
        return Ok(value.to_string());
    }
    Err(FormatError::UnknownFormat(value.to_string()))
}

/// Compare two CSS values ignoring whitespace and case
pub fn values_equivalent(a: &str, b: &str) -> bool {
    fn normalize(value: &str) -> String {
        value
            .chars()
            .filter(|c| !matches!(c, ' ' | '\t' | '\n' | '\r'))
            .flat_map(char::to_lowercase)
            .collect()
    }
    normalize(a) == normalize(b)
}
