//! CSS support for design tokens
//!
//! Provides token-aware features for CSS documents using:
//! - tree-sitter-css for tolerant parsing
//! - the token registry for diagnostics, code actions, definitions and colors

pub mod code_actions;
pub mod colors;
pub mod definition;
pub mod diagnostics;
pub mod parser;
pub mod scanner;

#[cfg(test)]
mod code_actions_tests;
#[cfg(test)]
mod scanner_tests;
