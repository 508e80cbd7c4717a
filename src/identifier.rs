//! Identifier-continuation predicate used to glue range boundaries to tokens.
//!
//! When text is inserted next to or inside a highlighted token, only the part
//! of the insertion that continues the identifier belongs to the token. Which
//! characters continue an identifier depends on the language, so the rule is
//! configurable instead of being fixed to one lexical grammar.

use serde::{Deserialize, Serialize};

/// Decides whether a character continues an identifier.
pub trait IdentifierContinue: Send + Sync {
    fn is_continue(&self, c: char) -> bool;

    /// Byte length of the leading run of identifier-continuation characters.
    fn leading_run(&self, text: &str) -> usize {
        text.char_indices()
            .find(|(_, c)| !self.is_continue(*c))
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    }

    /// Byte length of the trailing run of identifier-continuation characters.
    fn trailing_run(&self, text: &str) -> usize {
        text.char_indices()
            .rev()
            .find(|(_, c)| !self.is_continue(*c))
            .map(|(i, c)| text.len() - (i + c.len_utf8()))
            .unwrap_or(text.len())
    }
}

impl<F> IdentifierContinue for F
where
    F: Fn(char) -> bool + Send + Sync,
{
    fn is_continue(&self, c: char) -> bool {
        self(c)
    }
}

/// Configurable identifier rule.
///
/// By default any Unicode alphanumeric character, `_` and `$` continue an
/// identifier. `ascii_only` restricts the alphanumeric part to ASCII and
/// `extra` lists additional continuation characters (e.g. `-` for Lisps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentifierRule {
    pub ascii_only: bool,
    pub extra: String,
}

impl Default for IdentifierRule {
    fn default() -> Self {
        Self {
            ascii_only: false,
            extra: "_$".to_string(),
        }
    }
}

impl IdentifierContinue for IdentifierRule {
    fn is_continue(&self, c: char) -> bool {
        let alphanumeric = if self.ascii_only {
            c.is_ascii_alphanumeric()
        } else {
            c.is_alphanumeric()
        };
        alphanumeric || self.extra.contains(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::all_identifier("abc", 3, 3)]
    #[case::empty("", 0, 0)]
    #[case::leading_space(" abc", 0, 3)]
    #[case::trailing_space("abc ", 3, 0)]
    #[case::both_sides("ab(cd", 2, 2)]
    #[case::underscore_and_dollar("_a$", 3, 3)]
    #[case::punctuation_only(".,;", 0, 0)]
    fn default_rule_runs(#[case] text: &str, #[case] leading: usize, #[case] trailing: usize) {
        let rule = IdentifierRule::default();
        assert_eq!(rule.leading_run(text), leading);
        assert_eq!(rule.trailing_run(text), trailing);
    }

    #[test]
    fn runs_are_measured_in_bytes() {
        let rule = IdentifierRule::default();
        // "é" is two bytes
        assert_eq!(rule.leading_run("éa b"), 3);
        assert_eq!(rule.trailing_run("a bé"), 3);
    }

    #[test]
    fn ascii_only_rejects_non_ascii_letters() {
        let rule = IdentifierRule {
            ascii_only: true,
            ..IdentifierRule::default()
        };
        assert!(rule.is_continue('a'));
        assert!(!rule.is_continue('é'));
        assert_eq!(rule.leading_run("aéb"), 1);
    }

    #[test]
    fn extra_characters_extend_the_rule() {
        let rule = IdentifierRule {
            ascii_only: false,
            extra: "-".to_string(),
        };
        assert!(rule.is_continue('-'));
        assert!(!rule.is_continue('_'));
    }

    #[test]
    fn closures_are_predicates() {
        let digits = |c: char| c.is_ascii_digit();
        assert_eq!(digits.leading_run("12a3"), 2);
        assert_eq!(digits.trailing_run("12a3"), 1);
    }
}
