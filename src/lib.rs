//! Design Tokens Language Server Library
//!
//! Scans CSS for custom properties and `var()` references, matches them against
//! design tokens loaded from DTCG documents, and reports inconsistencies with
//! diagnostics and code actions.

pub mod config;
pub mod css;
pub mod language;
pub mod logging;
pub mod server;
pub mod tokens;

#[cfg(test)]
pub mod test_utils;
