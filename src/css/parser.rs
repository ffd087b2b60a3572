//! CSS parser pool using tree-sitter-css
//!
//! A tree-sitter `Parser` holds mutable state while parsing, so one instance can
//! only serve one parse at a time. The pool keeps idle parsers around and hands
//! each caller exclusive ownership of one for the duration of a parse; the
//! parser goes back to the pool when the guard is dropped.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use thiserror::Error;
use tree_sitter::{Parser, Tree};

/// Default number of idle parsers kept by a pool
pub const DEFAULT_POOL_CAPACITY: usize = 4;

/// Errors produced while creating parsers or parsing CSS
#[derive(Error, Debug)]
pub enum ScanError {
    /// tree-sitter rejected the CSS grammar
    #[error("Failed to set up tree-sitter language: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// The parser produced no tree at all
    #[error("Failed to parse CSS")]
    ParseFailed,
}

/// CSS parser wrapper around tree-sitter-css
pub struct CssParser {
    parser: Parser,
}

impl CssParser {
    /// Create a new CSS parser
    pub fn new() -> Result<Self, ScanError> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_css::LANGUAGE.into())?;

        Ok(Self { parser })
    }

    /// Parse CSS content and return the syntax tree
    pub fn parse(&mut self, content: &str) -> Result<Tree, ScanError> {
        self.parser.parse(content, None).ok_or(ScanError::ParseFailed)
    }

    /// Clear any state left over from a previous, possibly interrupted, parse
    pub fn reset(&mut self) {
        self.parser.reset();
    }
}

/// Pool of reusable CSS parsers
pub struct ParserPool {
    idle: Mutex<Vec<CssParser>>,
    capacity: usize,
}

impl ParserPool {
    /// Create a pool with `capacity` pre-allocated parsers
    pub fn with_capacity(capacity: usize) -> Result<Self, ScanError> {
        let mut idle = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            idle.push(CssParser::new()?);
        }

        Ok(Self {
            idle: Mutex::new(idle),
            capacity,
        })
    }

    /// Create a pool with the default capacity
    pub fn new() -> Result<Self, ScanError> {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Check out a parser, creating a fresh one when every pooled parser is busy
    pub fn acquire(&self) -> Result<PooledParser<'_>, ScanError> {
        let pooled = match self.idle.lock() {
            Ok(mut idle) => idle.pop(),
            Err(poisoned) => poisoned.into_inner().pop(),
        };

        let mut parser = match pooled {
            Some(parser) => parser,
            None => {
                log::debug!("Parser pool exhausted, creating a new parser");
                CssParser::new()?
            }
        };
        parser.reset();

        Ok(PooledParser {
            parser: Some(parser),
            pool: self,
        })
    }

    /// Number of idle parsers currently held
    pub fn idle_count(&self) -> usize {
        match self.idle.lock() {
            Ok(idle) => idle.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn release(&self, parser: CssParser) {
        let mut idle = match self.idle.lock() {
            Ok(idle) => idle,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Parsers beyond capacity were created under load; let them go
        if idle.len() < self.capacity {
            idle.push(parser);
        }
    }
}

/// A parser checked out of a [`ParserPool`], returned on drop
pub struct PooledParser<'a> {
    parser: Option<CssParser>,
    pool: &'a ParserPool,
}

impl Deref for PooledParser<'_> {
    type Target = CssParser;

    fn deref(&self) -> &CssParser {
        self.parser.as_ref().expect("pooled parser is present until drop")
    }
}

impl DerefMut for PooledParser<'_> {
    fn deref_mut(&mut self) -> &mut CssParser {
        self.parser.as_mut().expect("pooled parser is present until drop")
    }
}

impl Drop for PooledParser<'_> {
    fn drop(&mut self) {
        if let Some(parser) = self.parser.take() {
            self.pool.release(parser);
        }
    }
}
