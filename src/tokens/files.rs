//! Reading configured token files from disk

use std::path::{Path, PathBuf};

use url::Url;

use crate::config::ServerConfig;
use crate::tokens::error::{IoContext, TokenError, TokenResult};
use crate::tokens::loader::{DocumentFormat, TokenSource};

/// Resolve a configured path against the workspace root
pub fn resolve_path(root: Option<&Path>, path: &str) -> PathBuf {
    let path = Path::new(path);
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

/// Read one token file into a source
pub fn read_token_file(path: &Path) -> TokenResult<TokenSource> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| TokenError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let text = std::fs::read_to_string(path)
        .with_io_context(&format!("Failed to read token file {}", path.display()))?;

    let absolute = std::path::absolute(path)
        .with_io_context(&format!("Failed to resolve token file {}", path.display()))?;
    let uri = Url::from_file_path(&absolute).map_err(|_| TokenError::Io {
        message: format!("Token file path {} is not a valid file URL", absolute.display()),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid file path"),
    })?;

    Ok(TokenSource::new(uri, text, format))
}

/// Read every token file the configuration names
pub fn read_configured_sources(config: &ServerConfig, root: Option<&Path>) -> TokenResult<Vec<TokenSource>> {
    let mut sources = Vec::with_capacity(config.tokens_files.len());
    for spec in &config.tokens_files {
        let path = resolve_path(root, spec.path());
        let source = read_token_file(&path)?
            .with_prefix(config.prefix_for(spec))
            .with_group_markers(config.group_markers_for(spec));
        sources.push(source);
    }
    Ok(sources)
}

/// Whether `path` is one of the configured token files
pub fn is_configured_file(config: &ServerConfig, root: Option<&Path>, path: &Path) -> bool {
    config
        .tokens_files
        .iter()
        .map(|spec| resolve_path(root, spec.path()))
        .any(|configured| configured == path || configured.canonicalize().ok().as_deref() == Some(path))
}
