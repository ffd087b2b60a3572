//! Server configuration
//!
//! Read from `initializationOptions` or from `workspace/didChangeConfiguration`
//! settings. Both may nest the options under [`CONFIG_SECTION`].

use serde::Deserialize;
use serde_json::Value;

use crate::tokens::loader::default_group_markers;

/// Settings section name used by clients
pub const CONFIG_SECTION: &str = "designTokensLanguageServer";

/// A configured token file: either a bare path or a path with naming overrides
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TokenFileSpec {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default, rename = "groupMarkers")]
        group_markers: Option<Vec<String>>,
    },
}

impl TokenFileSpec {
    pub fn path(&self) -> &str {
        match self {
            TokenFileSpec::Path(path) => path,
            TokenFileSpec::Detailed { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default)]
    pub tokens_files: Vec<TokenFileSpec>,
    /// Prefix for every file without its own
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default = "default_group_markers")]
    pub group_markers: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tokens_files: Vec::new(),
            prefix: None,
            group_markers: default_group_markers(),
        }
    }
}

impl ServerConfig {
    /// Parse settings, looking inside [`CONFIG_SECTION`] when present.
    ///
    /// Missing or null settings give the default configuration.
    pub fn from_settings(settings: &Value) -> Result<Self, serde_json::Error> {
        let settings = settings.get(CONFIG_SECTION).unwrap_or(settings);
        if settings.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(settings.clone())
    }

    /// Prefix for a file, falling back to the global one
    pub fn prefix_for(&self, spec: &TokenFileSpec) -> Option<String> {
        let own = match spec {
            TokenFileSpec::Detailed { prefix, .. } => prefix.clone(),
            TokenFileSpec::Path(_) => None,
        };
        own.or_else(|| self.prefix.clone()).filter(|p| !p.is_empty())
    }

    /// Group markers for a file, falling back to the global ones
    pub fn group_markers_for(&self, spec: &TokenFileSpec) -> Vec<String> {
        match spec {
            TokenFileSpec::Detailed {
                group_markers: Some(markers),
                ..
            } => markers.clone(),
            _ => self.group_markers.clone(),
        }
    }
}
