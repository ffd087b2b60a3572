//! Design Tokens Language Server Implementation
//!
//! Thin protocol layer over the scanner, the token registry and the
//! consistency engine, using tower-lsp.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use crate::config::ServerConfig;
use crate::css::code_actions::{FixAllData, SOURCE_FIX_ALL, TokenCodeActionProvider};
use crate::css::colors::TokenColorProvider;
use crate::css::definition::TokenDefinitionProvider;
use crate::css::diagnostics::TokenDiagnostics;
use crate::css::scanner::{CssScanner, ScanResult};
use crate::tokens::TokenStore;
use crate::tokens::files::{is_configured_file, read_configured_sources};

/// Design tokens language server
pub struct DesignTokensLanguageServer {
    client: Client,
    /// Mutex is needed because tower-lsp hands out `&self`; it is never held across an await
    state: Arc<Mutex<ServerState>>,
    tokens: Arc<TokenStore>,
    scanner: Option<Arc<CssScanner>>,
    code_actions: TokenCodeActionProvider,
    colors: TokenColorProvider,
}

/// Mutable server state
#[derive(Default)]
struct ServerState {
    /// Latest full text of each open document
    documents: HashMap<Url, String>,
    config: ServerConfig,
    workspace_root: Option<PathBuf>,
    related_information: bool,
    definition_links: bool,
}

impl DesignTokensLanguageServer {
    pub fn new(client: Client) -> Self {
        let scanner = match CssScanner::new() {
            Ok(scanner) => Some(Arc::new(scanner)),
            Err(e) => {
                log::error!("Failed to create CSS scanner: {}", e);
                None
            }
        };

        Self {
            client,
            state: Arc::new(Mutex::new(ServerState::default())),
            tokens: Arc::new(TokenStore::default()),
            scanner,
            code_actions: TokenCodeActionProvider::new(),
            colors: TokenColorProvider::new(),
        }
    }

    fn document_text(&self, uri: &Url) -> Option<String> {
        let state = self.state.lock().ok()?;
        state.documents.get(uri).cloned()
    }

    fn scan(&self, content: &str) -> ScanResult {
        let Some(scanner) = &self.scanner else {
            return ScanResult::default();
        };
        match scanner.scan(content) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Failed to scan CSS document: {}", e);
                ScanResult::default()
            }
        }
    }

    /// Reload every configured token file; keeps the old registry on failure
    async fn reload_tokens(&self) {
        let (config, root) = match self.state.lock() {
            Ok(state) => (state.config.clone(), state.workspace_root.clone()),
            Err(_) => {
                log::error!("[reload_tokens] Failed to acquire state lock");
                return;
            }
        };

        let result = read_configured_sources(&config, root.as_deref())
            .and_then(|sources| self.tokens.reload(&sources));

        match result {
            Ok(count) => {
                log::info!("Loaded {} design tokens", count);
                self.client
                    .log_message(MessageType::INFO, format!("Loaded {} design tokens", count))
                    .await;
            }
            Err(e) => {
                log::error!("Failed to load design tokens: {}", e);
                self.client
                    .show_message(MessageType::ERROR, format!("Failed to load design tokens: {}", e))
                    .await;
            }
        }
    }

    async fn publish_diagnostics(&self, uri: Url, content: &str, version: Option<i32>) {
        let related_information = self
            .state
            .lock()
            .map(|state| state.related_information)
            .unwrap_or(false);

        let scan = self.scan(content);
        let registry = self.tokens.snapshot();
        let diagnostics = TokenDiagnostics::new(related_information).compute(&scan, &registry);

        self.client.publish_diagnostics(uri, diagnostics, version).await;
    }

    async fn republish_all(&self) {
        let documents: Vec<(Url, String)> = match self.state.lock() {
            Ok(state) => state
                .documents
                .iter()
                .map(|(uri, text)| (uri.clone(), text.clone()))
                .collect(),
            Err(_) => return,
        };

        for (uri, text) in documents {
            self.publish_diagnostics(uri, &text, None).await;
        }
    }
}

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri)
        .or(params.root_uri.as_ref())
        .and_then(|uri| uri.to_file_path().ok())
}

fn supports_definition_links(params: &InitializeParams) -> bool {
    params
        .capabilities
        .text_document
        .as_ref()
        .and_then(|text_document| text_document.definition.as_ref())
        .and_then(|definition| definition.link_support)
        .unwrap_or(false)
}

fn supports_related_information(params: &InitializeParams) -> bool {
    params
        .capabilities
        .text_document
        .as_ref()
        .and_then(|text_document| text_document.publish_diagnostics.as_ref())
        .and_then(|publish| publish.related_information)
        .unwrap_or(false)
}

#[tower_lsp::async_trait]
impl LanguageServer for DesignTokensLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let config = match params.initialization_options.as_ref() {
            Some(options) => ServerConfig::from_settings(options).unwrap_or_else(|e| {
                log::warn!("Invalid initialization options, using defaults: {}", e);
                ServerConfig::default()
            }),
            None => ServerConfig::default(),
        };

        if let Ok(mut state) = self.state.lock() {
            state.workspace_root = workspace_root(&params);
            state.related_information = supports_related_information(&params);
            state.definition_links = supports_definition_links(&params);
            state.config = config;
            log::info!("Workspace root: {:?}", state.workspace_root);
        }

        self.reload_tokens().await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
                    code_action_kinds: Some(vec![
                        CodeActionKind::QUICKFIX,
                        CodeActionKind::REFACTOR_REWRITE,
                        SOURCE_FIX_ALL,
                    ]),
                    resolve_provider: Some(true),
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                })),
                definition_provider: Some(OneOf::Left(true)),
                color_provider: Some(ColorProviderCapability::Simple(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let watchers = ["**/*.json", "**/*.yaml", "**/*.yml"]
            .into_iter()
            .map(|pattern| FileSystemWatcher {
                glob_pattern: GlobPattern::String(pattern.to_string()),
                kind: None,
            })
            .collect();

        match serde_json::to_value(DidChangeWatchedFilesRegistrationOptions { watchers }) {
            Ok(register_options) => {
                let registration = Registration {
                    id: "design-tokens-watch".to_string(),
                    method: "workspace/didChangeWatchedFiles".to_string(),
                    register_options: Some(register_options),
                };
                if let Err(e) = self.client.register_capability(vec![registration]).await {
                    log::warn!("Client rejected file watcher registration: {}", e);
                }
            }
            Err(e) => log::error!("Failed to build file watcher registration: {}", e),
        }

        self.client
            .log_message(MessageType::INFO, "Design Tokens Language Server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let content = params.text_document.text;

        if let Ok(mut state) = self.state.lock() {
            state.documents.insert(uri.clone(), content.clone());
        }
        log::info!("Opened document: {}", uri);

        self.publish_diagnostics(uri, &content, Some(params.text_document.version))
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // Full sync: the last change holds the whole text
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        if let Ok(mut state) = self.state.lock() {
            state.documents.insert(uri.clone(), change.text.clone());
        }

        self.publish_diagnostics(uri, &change.text, Some(params.text_document.version))
            .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        if let Ok(mut state) = self.state.lock() {
            state.documents.remove(&uri);
        }
        log::info!("Closed document: {}", uri);

        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let config = match ServerConfig::from_settings(&params.settings) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring invalid configuration: {}", e);
                return;
            }
        };

        if let Ok(mut state) = self.state.lock() {
            state.config = config;
        }
        log::info!("Configuration changed, reloading tokens");

        self.reload_tokens().await;
        self.republish_all().await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let touches_tokens = match self.state.lock() {
            Ok(state) => params.changes.iter().any(|change| {
                change
                    .uri
                    .to_file_path()
                    .map(|path| is_configured_file(&state.config, state.workspace_root.as_deref(), &path))
                    .unwrap_or(false)
            }),
            Err(_) => false,
        };

        if touches_tokens {
            log::info!("Token file changed, reloading tokens");
            self.reload_tokens().await;
            self.republish_all().await;
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let Some(content) = self.document_text(&uri) else {
            return Ok(None);
        };

        let scan = self.scan(&content);
        let registry = self.tokens.snapshot();
        let actions = self.code_actions.code_actions(
            &uri,
            &scan,
            &registry,
            params.range,
            &params.context.diagnostics,
        );

        if actions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(actions))
        }
    }

    async fn code_action_resolve(&self, mut action: CodeAction) -> Result<CodeAction> {
        log::info!("Resolving code action: {}", action.title);

        let Some(data) = FixAllData::from_action(&action) else {
            return Ok(action);
        };
        let Some(content) = self.document_text(&data.uri) else {
            log::warn!("Cannot resolve fix-all for closed document {}", data.uri);
            return Ok(action);
        };

        let scan = self.scan(&content);
        let registry = self.tokens.snapshot();
        action.edit = Some(self.code_actions.resolve_fix_all(&data.uri, &scan, &registry));
        Ok(action)
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(content) = self.document_text(&uri) else {
            return Ok(None);
        };
        let link_support = self
            .state
            .lock()
            .map(|state| state.definition_links)
            .unwrap_or(false);

        let scan = self.scan(&content);
        let registry = self.tokens.snapshot();
        Ok(TokenDefinitionProvider::new(link_support).definition(&content, &scan, &registry, position))
    }

    async fn document_color(&self, params: DocumentColorParams) -> Result<Vec<ColorInformation>> {
        let Some(content) = self.document_text(&params.text_document.uri) else {
            return Ok(Vec::new());
        };

        let scan = self.scan(&content);
        let registry = self.tokens.snapshot();
        Ok(self.colors.document_colors(&scan, &registry))
    }

    async fn color_presentation(&self, params: ColorPresentationParams) -> Result<Vec<ColorPresentation>> {
        let Some(content) = self.document_text(&params.text_document.uri) else {
            return Ok(Vec::new());
        };

        let scan = self.scan(&content);
        let registry = self.tokens.snapshot();
        Ok(self
            .colors
            .color_presentations(&scan, &registry, params.color, params.range))
    }
}

/// Create and start the language server on stdio
pub async fn start_language_server() -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(DesignTokensLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
