//! Design token registry
//!
//! Loads DTCG-format token documents, derives custom property names, resolves
//! `$extends` and aliases, and serializes structured colors to CSS.

pub mod color;
pub mod error;
pub mod files;
pub mod format;
pub mod loader;
pub mod registry;
pub mod rgba;
pub mod token;


pub use color::{ColorSpace, Component, StructuredColor, TokenValue};
pub use error::{TokenError, TokenResult};
pub use loader::{DocumentFormat, TokenSource};
pub use registry::{TokenRegistry, TokenStore};
pub use rgba::Rgba;
pub use token::Token;
