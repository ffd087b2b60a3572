//! Test utilities shared across the codebase

use url::Url;

use crate::css::scanner::{CssScanner, ScanResult};
use crate::tokens::{DocumentFormat, TokenRegistry, TokenSource};

/// URI used for CSS documents in tests
pub fn css_uri() -> Url {
    Url::parse("file:///project/styles.css").unwrap()
}

/// Build a registry from a JSON token document
pub fn registry_from_json(json: &str) -> TokenRegistry {
    let source = TokenSource::new(
        Url::parse("file:///project/tokens.json").unwrap(),
        json,
        DocumentFormat::Json,
    );
    TokenRegistry::load(&[source]).expect("test token document should load")
}

/// Scan CSS with a fresh scanner
pub fn scan_css(content: &str) -> ScanResult {
    CssScanner::new().unwrap().scan(content).unwrap()
}
