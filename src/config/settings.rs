use crate::identifier::IdentifierRule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Style of one classification tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagStyle {
    /// Disabled tags are tracked but never painted.
    pub enabled: bool,
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl Default for TagStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            foreground: None,
            background: None,
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
        }
    }
}

pub type StyleMap = HashMap<String, TagStyle>;

/// One rule of the lexical producer: either a regex or a word list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LexicalRule {
    Pattern { tag: String, pattern: String },
    Words { tag: String, words: Vec<String> },
}

impl LexicalRule {
    pub fn tag(&self) -> &str {
        match self {
            LexicalRule::Pattern { tag, .. } | LexicalRule::Words { tag, .. } => tag,
        }
    }
}

/// One configuration layer as written in a TOML file.
///
/// Every field is optional so layers can be merged; see
/// [`super::merge_settings`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsFile {
    pub debounce_ms: Option<u64>,
    pub split_on_identifier_boundary: Option<bool>,
    pub identifier: Option<IdentifierRule>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub styles: StyleMap,
    pub lexical: Option<Vec<LexicalRule>>,
    /// Syntax producer capture name to classification tag. An empty tag
    /// filters the capture.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub captures: HashMap<String, String>,
}

/// Fully resolved engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub debounce: Duration,
    pub split_on_identifier_boundary: bool,
    pub identifier: IdentifierRule,
    pub styles: StyleMap,
    pub lexical: Vec<LexicalRule>,
    pub captures: HashMap<String, String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings::from(super::defaults::default_settings())
    }
}

impl From<SettingsFile> for EngineSettings {
    fn from(file: SettingsFile) -> Self {
        Self {
            debounce: Duration::from_millis(
                file.debounce_ms.unwrap_or(super::defaults::DEFAULT_DEBOUNCE_MS),
            ),
            split_on_identifier_boundary: file.split_on_identifier_boundary.unwrap_or(true),
            identifier: file.identifier.unwrap_or_default(),
            styles: file.styles,
            lexical: file.lexical.unwrap_or_default(),
            captures: file.captures,
        }
    }
}
