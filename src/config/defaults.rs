//! Default configuration values for irodori.
//!
//! This module provides the programmed defaults that form the lowest
//! configuration layer and are printed by `irodori config defaults`.

use super::settings::{LexicalRule, SettingsFile, StyleMap, TagStyle};
use crate::identifier::IdentifierRule;
use std::collections::HashMap;

/// Settle delay before a scheduled recomputation runs.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Returns the default settings layer.
pub fn default_settings() -> SettingsFile {
    SettingsFile {
        debounce_ms: Some(DEFAULT_DEBOUNCE_MS),
        split_on_identifier_boundary: Some(true),
        identifier: Some(IdentifierRule::default()),
        styles: default_styles(),
        lexical: Some(default_lexical_rules()),
        captures: default_capture_tags(),
    }
}

fn style(foreground: &str, bold: bool, italic: bool) -> TagStyle {
    TagStyle {
        foreground: Some(foreground.to_string()),
        bold,
        italic,
        ..TagStyle::default()
    }
}

/// Returns the default tag styles.
pub fn default_styles() -> StyleMap {
    let pairs = [
        ("keyword", style("#7f0055", true, false)),
        ("class", style("#000000", false, false)),
        ("type", style("#000000", false, false)),
        ("field", style("#0000c0", false, false)),
        ("static-field", style("#0000c0", false, true)),
        ("method", style("#000000", false, false)),
        ("function", style("#000000", false, false)),
        ("parameter", style("#000000", false, false)),
        ("local-variable", style("#000000", false, false)),
        ("number", style("#0000ff", false, false)),
        ("string", style("#2a00ff", false, false)),
        ("comment", style("#3f7f5f", false, false)),
        (
            "deprecated",
            TagStyle {
                strikethrough: true,
                ..TagStyle::default()
            },
        ),
    ];
    pairs
        .into_iter()
        .map(|(tag, style)| (tag.to_string(), style))
        .collect()
}

/// Returns the default lexical producer rules.
///
/// These cover a generic C-family surface syntax and are only meant as a
/// fallback when no syntax producer is configured.
pub fn default_lexical_rules() -> Vec<LexicalRule> {
    let words = [
        "as", "break", "class", "const", "continue", "else", "enum", "false", "fn", "for", "if",
        "impl", "import", "in", "let", "loop", "match", "mod", "mut", "new", "pub", "return",
        "static", "struct", "trait", "true", "type", "use", "var", "while",
    ];
    vec![
        LexicalRule::Pattern {
            tag: "comment".to_string(),
            pattern: r"//[^\n]*".to_string(),
        },
        LexicalRule::Pattern {
            tag: "string".to_string(),
            pattern: r#""(?:[^"\\\n]|\\.)*""#.to_string(),
        },
        LexicalRule::Pattern {
            tag: "number".to_string(),
            pattern: r"\b\d+(?:\.\d+)?\b".to_string(),
        },
        LexicalRule::Words {
            tag: "keyword".to_string(),
            words: words.iter().map(|w| w.to_string()).collect(),
        },
    ]
}

/// Returns the default tree-sitter capture to tag mapping.
pub fn default_capture_tags() -> HashMap<String, String> {
    let pairs = [
        ("keyword", "keyword"),
        ("type", "type"),
        ("type.builtin", "type"),
        ("constructor", "class"),
        ("property", "field"),
        ("variable.member", "field"),
        ("function", "function"),
        ("function.method", "method"),
        ("function.macro", "function"),
        ("variable.parameter", "parameter"),
        ("number", "number"),
        ("string", "string"),
        ("comment", "comment"),
        // Captures producing too much noise to be worth highlighting
        ("punctuation.bracket", ""),
        ("punctuation.delimiter", ""),
    ];
    pairs
        .into_iter()
        .map(|(capture, tag)| (capture.to_string(), tag.to_string()))
        .collect()
}
