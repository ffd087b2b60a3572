//! Token registry and its reloadable store

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::tokens::error::TokenResult;
use crate::tokens::loader::{TokenSource, load_sources};
use crate::tokens::token::Token;

/// Immutable set of tokens with lookup by custom property name
#[derive(Debug, Default)]
pub struct TokenRegistry {
    /// Keyed by custom property name, e.g. `--ds-color-primary`
    tokens: HashMap<String, Arc<Token>>,
    /// Unprefixed names; `None` when two sources define the same name
    by_name: HashMap<String, Option<Arc<Token>>>,
    /// Custom property names in load order
    order: Vec<String>,
}

impl TokenRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every source as one token set. Any failing source fails the whole load.
    pub fn load(sources: &[TokenSource]) -> TokenResult<Self> {
        let tokens = load_sources(sources)?;
        log::info!("Loaded {} tokens from {} sources", tokens.len(), sources.len());
        Ok(Self::from_tokens(tokens))
    }

    /// Build a registry from already loaded tokens. The first token wins on duplicates.
    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut registry = Self::default();
        for token in tokens {
            if registry.tokens.contains_key(&token.css_variable_name) {
                log::warn!(
                    "Duplicate token {}, keeping the first definition",
                    token.css_variable_name
                );
                continue;
            }

            let token = Arc::new(token);
            registry
                .by_name
                .entry(token.name.clone())
                .and_modify(|existing| *existing = None)
                .or_insert_with(|| Some(token.clone()));
            registry.order.push(token.css_variable_name.clone());
            registry.tokens.insert(token.css_variable_name.clone(), token);
        }
        registry
    }

    /// Look up a token by `--css-variable`, hyphenated name or dotted path
    pub fn get(&self, name: &str) -> Option<&Arc<Token>> {
        let name = name.trim();
        if name.starts_with("--") {
            return self.tokens.get(name);
        }
        let normalized = name.replace('.', "-");
        self.by_name.get(&normalized)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in load order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Token>> {
        self.order.iter().filter_map(|name| self.tokens.get(name))
    }
}

/// Shared holder for the current registry snapshot
///
/// Readers clone the `Arc` and work on a consistent snapshot; a reload builds
/// a complete new registry before swapping it in.
#[derive(Debug, Default)]
pub struct TokenStore {
    current: RwLock<Arc<TokenRegistry>>,
}

impl TokenStore {
    pub fn new(registry: TokenRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The registry as of now
    pub fn snapshot(&self) -> Arc<TokenRegistry> {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, registry: TokenRegistry) {
        let registry = Arc::new(registry);
        match self.current.write() {
            Ok(mut current) => *current = registry,
            Err(poisoned) => *poisoned.into_inner() = registry,
        }
    }

    /// Load `sources` and swap them in. On error the previous snapshot stays.
    pub fn reload(&self, sources: &[TokenSource]) -> TokenResult<usize> {
        let registry = TokenRegistry::load(sources)?;
        let count = registry.len();
        self.replace(registry);
        Ok(count)
    }
}
