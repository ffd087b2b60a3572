//! Token document loading
//!
//! Turns DTCG-shaped JSON or YAML documents into a flat list of [`Token`]s.
//! Groups of every document are walked first; `$extends` inheritance and
//! whole-value aliases are then resolved over the combined set, so one file
//! may refer to tokens of another. Finally every token gets its marker-free
//! path and custom property name from the document that names it.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde_json::{Map, Value};
use tower_lsp::lsp_types::{Location, Position, Range};
use url::Url;

use crate::language::position::{byte_offset_to_position, utf16_len};
use crate::tokens::color::{StructuredColor, TokenValue};
use crate::tokens::error::{TokenError, TokenResult};
use crate::tokens::token::Token;

/// Path segments that are transparent when deriving token names
pub const DEFAULT_GROUP_MARKERS: [&str; 3] = ["_", "@", "DEFAULT"];

/// Default group markers as owned strings
pub fn default_group_markers() -> Vec<String> {
    DEFAULT_GROUP_MARKERS.iter().map(|m| m.to_string()).collect()
}

/// Serialization format of a token document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

/// An already-read token document together with its naming settings
#[derive(Debug, Clone)]
pub struct TokenSource {
    pub uri: Url,
    pub text: String,
    pub format: DocumentFormat,
    pub prefix: Option<String>,
    pub group_markers: Vec<String>,
}

impl TokenSource {
    pub fn new(uri: Url, text: impl Into<String>, format: DocumentFormat) -> Self {
        Self {
            uri,
            text: text.into(),
            format,
            prefix: None,
            group_markers: default_group_markers(),
        }
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    pub fn with_group_markers(mut self, group_markers: Vec<String>) -> Self {
        self.group_markers = group_markers;
        self
    }

    fn is_group_marker(&self, key: &str) -> bool {
        self.group_markers.iter().any(|marker| marker == key)
    }
}

/// A token node before naming and value conversion
#[derive(Debug, Clone)]
struct RawToken {
    /// Index of the source that names this token
    source: usize,
    /// Full key chain, group markers included
    keys: Vec<String>,
    value: Value,
    token_type: Option<String>,
    description: Option<String>,
    deprecated: bool,
    deprecation_message: Option<String>,
    definition: Option<Location>,
}

/// A `$extends` declaration on a group
#[derive(Debug)]
struct Extends {
    source: usize,
    group: Vec<String>,
    target: Vec<String>,
}

/// Everything collected from walking all documents
#[derive(Default)]
struct Collected {
    tokens: Vec<RawToken>,
    groups: BTreeSet<Vec<String>>,
    extends: Vec<Extends>,
}

/// Load every token from a single source
pub fn load_tokens(source: &TokenSource) -> TokenResult<Vec<Token>> {
    load_sources(std::slice::from_ref(source))
}

/// Load every token from several sources as one token set
///
/// `$extends` and aliases may point into any of the sources.
pub fn load_sources(sources: &[TokenSource]) -> TokenResult<Vec<Token>> {
    let mut collected = Collected::default();
    for (index, source) in sources.iter().enumerate() {
        collect_document(index, source, &mut collected)?;
    }

    let Collected {
        tokens: mut raw_tokens,
        groups,
        extends,
    } = collected;
    apply_extends(&mut raw_tokens, &groups, &extends, sources)?;
    resolve_aliases(&mut raw_tokens, sources);

    let tokens: Vec<Token> = raw_tokens
        .into_iter()
        .map(|raw| {
            let source = &sources[raw.source];
            finish_token(raw, source)
        })
        .collect();
    Ok(tokens)
}

fn collect_document(index: usize, source: &TokenSource, collected: &mut Collected) -> TokenResult<()> {
    if source.text.trim().is_empty() {
        return Ok(());
    }

    let root = parse_document(source)?;
    let Some(root) = root.as_object() else {
        return Err(TokenError::NotAnObject {
            uri: source.uri.to_string(),
        });
    };

    let before = collected.tokens.len();
    let mut keys = Vec::new();
    collect(root, &mut keys, None, index, source, collected)?;

    log::debug!(
        "Collected {} tokens from {}",
        collected.tokens.len() - before,
        source.uri
    );
    Ok(())
}

fn parse_document(source: &TokenSource) -> TokenResult<Value> {
    match source.format {
        DocumentFormat::Json => serde_json::from_str(&source.text).map_err(|e| TokenError::Json {
            uri: source.uri.to_string(),
            source: e,
        }),
        DocumentFormat::Yaml => serde_yaml::from_str(&source.text).map_err(|e| TokenError::Yaml {
            uri: source.uri.to_string(),
            source: e,
        }),
    }
}

fn collect(
    node: &Map<String, Value>,
    keys: &mut Vec<String>,
    inherited_type: Option<&str>,
    index: usize,
    source: &TokenSource,
    collected: &mut Collected,
) -> TokenResult<()> {
    for (key, child) in node {
        if key.starts_with('$') {
            continue;
        }
        let Some(child) = child.as_object() else {
            continue;
        };

        keys.push(key.clone());

        let token_type = child
            .get("$type")
            .and_then(Value::as_str)
            .or(inherited_type);

        if let Some(target) = child.get("$extends") {
            let target_keys = target
                .as_str()
                .and_then(parse_group_reference)
                .ok_or_else(|| TokenError::InvalidExtends {
                    uri: source.uri.to_string(),
                    group: keys.join("."),
                    value: target.to_string(),
                })?;
            collected.extends.push(Extends {
                source: index,
                group: keys.clone(),
                target: target_keys,
            });
        }

        let is_token = child.contains_key("$value");
        if is_token {
            collected
                .tokens
                .push(raw_token(child, keys, token_type, index, source));
        }

        if !is_token || source.is_group_marker(key) {
            collected.groups.insert(keys.clone());
            collect(child, keys, token_type, index, source, collected)?;
        }

        keys.pop();
    }
    Ok(())
}

fn raw_token(
    node: &Map<String, Value>,
    keys: &[String],
    token_type: Option<&str>,
    index: usize,
    source: &TokenSource,
) -> RawToken {
    let (deprecated, deprecation_message) = match node.get("$deprecated") {
        Some(Value::Bool(flag)) => (*flag, None),
        Some(Value::String(message)) if message.trim().is_empty() => (true, None),
        Some(Value::String(message)) => (true, Some(message.clone())),
        _ => (false, None),
    };

    RawToken {
        source: index,
        keys: keys.to_vec(),
        value: node.get("$value").cloned().unwrap_or(Value::Null),
        token_type: token_type.map(str::to_string),
        description: node
            .get("$description")
            .and_then(Value::as_str)
            .map(str::to_string),
        deprecated,
        deprecation_message,
        definition: locate_definition(source, keys),
    }
}

/// Parse `{a.b}` or `#/a/b` into key segments
fn parse_group_reference(reference: &str) -> Option<Vec<String>> {
    let reference = reference.trim();
    let segments: Vec<String> = if let Some(pointer) = reference.strip_prefix("#/") {
        pointer.split('/').map(str::to_string).collect()
    } else if let Some(inner) = reference.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        inner.split('.').map(str::to_string).collect()
    } else {
        return None;
    };

    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

fn apply_extends(
    tokens: &mut Vec<RawToken>,
    groups: &BTreeSet<Vec<String>>,
    extends: &[Extends],
    sources: &[TokenSource],
) -> TokenResult<()> {
    if extends.is_empty() {
        return Ok(());
    }

    let parents: HashMap<&[String], &[String]> = extends
        .iter()
        .map(|e| (e.group.as_slice(), e.target.as_slice()))
        .collect();

    // Each group extends at most one other, so a cycle shows up as a revisit on the chain
    let mut depths: HashMap<&[String], usize> = HashMap::new();
    for declared in extends {
        let mut chain: Vec<&[String]> = vec![declared.group.as_slice()];
        let mut current = declared.group.as_slice();
        while let Some(&parent) = parents.get(current) {
            if let Some(start) = chain.iter().position(|seen| *seen == parent) {
                let mut cycle: Vec<String> = chain[start..].iter().map(|g| g.join(".")).collect();
                cycle.push(parent.join("."));
                return Err(TokenError::ExtendsCycle {
                    uri: sources[declared.source].uri.to_string(),
                    cycle,
                });
            }
            chain.push(parent);
            current = parent;
        }
        depths.insert(declared.group.as_slice(), chain.len() - 1);
    }

    // A parent's chain is one shorter than its child's, so shorter chains resolve first
    let mut order: Vec<&Extends> = extends.iter().collect();
    order.sort_by_key(|e| depths.get(e.group.as_slice()).copied().unwrap_or(0));

    for declared in order {
        let (child, parent) = (&declared.group, &declared.target);
        if !groups.contains(parent) {
            log::warn!(
                "Group '{}' in {} extends unknown group '{}'",
                child.join("."),
                sources[declared.source].uri,
                parent.join(".")
            );
            continue;
        }

        let existing: BTreeSet<Vec<String>> = tokens
            .iter()
            .filter(|t| t.keys.len() > child.len() && t.keys.starts_with(child))
            .map(|t| t.keys[child.len()..].to_vec())
            .collect();

        // Inherited tokens are named by the document that declares `$extends`
        let inherited: Vec<RawToken> = tokens
            .iter()
            .filter(|t| t.keys.len() > parent.len() && t.keys.starts_with(parent))
            .filter(|t| !t.keys.starts_with(child))
            .filter(|t| !existing.contains(&t.keys[parent.len()..]))
            .map(|t| {
                let mut clone = t.clone();
                clone.source = declared.source;
                clone.keys = child.iter().chain(&t.keys[parent.len()..]).cloned().collect();
                clone
            })
            .collect();

        log::debug!(
            "Group '{}' inherits {} tokens from '{}'",
            child.join("."),
            inherited.len(),
            parent.join(".")
        );
        tokens.extend(inherited);
    }
    Ok(())
}

fn marker_free_path(keys: &[String], source: &TokenSource) -> Vec<String> {
    keys.iter()
        .filter(|key| !source.is_group_marker(key))
        .cloned()
        .collect()
}

/// Target name of a whole-value alias such as `{color.base}`
fn alias_target(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    let inner = text.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains(['{', '}']) {
        return None;
    }
    Some(inner.replace('.', "-"))
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    Pending,
    Active,
    /// Finished; `false` when the value still holds unresolved alias text
    Done(bool),
}

/// Replace alias values with their targets across all sources
///
/// Unknown targets and alias cycles are logged and keep their literal text.
fn resolve_aliases(tokens: &mut [RawToken], sources: &[TokenSource]) {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (index, token) in tokens.iter().enumerate() {
        by_name
            .entry(marker_free_path(&token.keys, &sources[token.source]).join("-"))
            .or_insert(index);
    }

    let mut visits = vec![Visit::Pending; tokens.len()];
    let mut stack = Vec::new();
    for index in 0..tokens.len() {
        resolve_alias(index, tokens, &by_name, &mut visits, &mut stack, sources);
    }
}

/// Resolve one token; returns whether its value is free of alias text
fn resolve_alias(
    index: usize,
    tokens: &mut [RawToken],
    by_name: &HashMap<String, usize>,
    visits: &mut [Visit],
    stack: &mut Vec<usize>,
    sources: &[TokenSource],
) -> bool {
    match visits[index] {
        Visit::Done(resolved) => return resolved,
        Visit::Active => {
            let start = stack.iter().position(|&i| i == index).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..]
                .iter()
                .map(|&i| tokens[i].keys.join("."))
                .collect();
            cycle.push(tokens[index].keys.join("."));
            log::warn!(
                "Circular token alias in {}: {}",
                sources[tokens[index].source].uri,
                cycle.join(" -> ")
            );
            return false;
        }
        Visit::Pending => {}
    }

    let Some(target_name) = alias_target(&tokens[index].value) else {
        visits[index] = Visit::Done(true);
        return true;
    };

    let Some(&target) = by_name.get(&target_name) else {
        log::warn!(
            "Token '{}' in {} refers to unknown token {}",
            tokens[index].keys.join("."),
            sources[tokens[index].source].uri,
            tokens[index].value
        );
        visits[index] = Visit::Done(false);
        return false;
    };

    visits[index] = Visit::Active;
    stack.push(index);
    let resolved = resolve_alias(target, tokens, by_name, visits, stack, sources);
    stack.pop();

    if resolved {
        let value = tokens[target].value.clone();
        let target_type = tokens[target].token_type.clone();
        let token = &mut tokens[index];
        token.value = value;
        if token.token_type.is_none() {
            token.token_type = target_type;
        }
    }
    visits[index] = Visit::Done(resolved);
    resolved
}

fn finish_token(raw: RawToken, source: &TokenSource) -> Token {
    let path = marker_free_path(&raw.keys, source);
    let value = token_value(&raw.value, raw.token_type.as_deref());

    Token {
        name: Token::name_for_path(&path),
        css_variable_name: Token::css_variable_for(source.prefix.as_deref(), &path),
        path,
        value,
        token_type: raw.token_type,
        description: raw.description,
        deprecated: raw.deprecated,
        deprecation_message: raw.deprecation_message,
        definition: raw.definition,
        prefix: source.prefix.clone(),
    }
}

fn number_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}

fn quote_font_name(name: &str) -> String {
    if name.contains(' ') && !name.starts_with(['"', '\'']) {
        format!("\"{}\"", name)
    } else {
        name.to_string()
    }
}

/// Convert a resolved `$value` into the value model
fn token_value(value: &Value, token_type: Option<&str>) -> TokenValue {
    let token_type = token_type.map(str::to_ascii_lowercase);
    match value {
        Value::String(text) => TokenValue::Literal(text.clone()),
        Value::Number(number) => TokenValue::Literal(number.to_string()),
        Value::Bool(flag) => TokenValue::Literal(flag.to_string()),
        Value::Null => TokenValue::Literal(String::new()),
        Value::Object(object) => {
            if let Some(color) = StructuredColor::from_json(value) {
                return TokenValue::Color(color);
            }
            if let (Some(amount), Some(unit)) = (
                object.get("value").and_then(number_text),
                object.get("unit").and_then(Value::as_str),
            ) {
                return TokenValue::Literal(format!("{}{}", amount, unit));
            }
            TokenValue::Literal(value.to_string())
        }
        Value::Array(items) => match token_type.as_deref() {
            Some("cubicbezier") if items.len() == 4 && items.iter().all(Value::is_number) => {
                let points: Vec<String> = items.iter().filter_map(number_text).collect();
                TokenValue::Literal(format!("cubic-bezier({})", points.join(", ")))
            }
            Some("fontfamily") => {
                let names: Vec<String> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(quote_font_name)
                    .collect();
                TokenValue::Literal(names.join(", "))
            }
            _ => TokenValue::Literal(value.to_string()),
        },
    }
}

/// Find the key chain in the document text and return the last key's location
fn locate_definition(source: &TokenSource, keys: &[String]) -> Option<Location> {
    let mut from = 0;
    let mut found = None;
    for key in keys {
        let (offset, length) = find_key(&source.text, from, key, source.format)?;
        from = offset + length;
        found = Some((offset, length));
    }

    let (offset, length) = found?;
    let start = byte_offset_to_position(&source.text, offset).ok()?;
    let key_text = source.text.get(offset..offset + length)?;
    let end = Position {
        line: start.line,
        character: start.character + u32::try_from(utf16_len(key_text)).ok()?,
    };

    Some(Location {
        uri: source.uri.clone(),
        range: Range { start, end },
    })
}

fn followed_by_colon(text: &str, offset: usize) -> bool {
    text.get(offset..)
        .map(|rest| rest.trim_start_matches([' ', '\t']).starts_with(':'))
        .unwrap_or(false)
}

/// Byte offset and length of the next occurrence of `key` used as an object key
fn find_key(text: &str, from: usize, key: &str, format: DocumentFormat) -> Option<(usize, usize)> {
    let haystack = text.get(from..)?;
    match format {
        DocumentFormat::Json => {
            let needle = format!("\"{}\"", key);
            haystack
                .match_indices(&needle)
                .map(|(index, _)| from + index)
                .find(|&offset| followed_by_colon(text, offset + needle.len()))
                .map(|offset| (offset, needle.len()))
        }
        DocumentFormat::Yaml => {
            let candidates = [format!("\"{}\"", key), format!("'{}'", key), key.to_string()];
            candidates
                .iter()
                .filter_map(|needle| {
                    haystack
                        .match_indices(needle.as_str())
                        .map(|(index, _)| from + index)
                        .find(|&offset| {
                            let starts_line = text[..offset]
                                .chars()
                                .next_back()
                                .is_none_or(|c| c == '\n' || c == ' ' || c == '\t' || c == '{');
                            starts_line && followed_by_colon(text, offset + needle.len())
                        })
                        .map(|offset| (offset, needle.len()))
                })
                .min_by_key(|(offset, _)| *offset)
        }
    }
}
