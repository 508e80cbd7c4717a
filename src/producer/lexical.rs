//! Regex and word-list based producer.
//!
//! Useful when no grammar is available for a document. Rules come from the
//! `lexical` configuration section.

use super::{CandidateProducer, ProducerOutput, normalize_candidates};
use crate::cancellation::GenerationToken;
use crate::config::LexicalRule;
use crate::error::{EngineError, EngineResult};
use crate::range::{ClassificationTag, Range};
use regex::Regex;

const LOG_TARGET: &str = "irodori::producer";

#[derive(Debug)]
struct CompiledRule {
    tag: ClassificationTag,
    regex: Regex,
}

/// Produces candidates by running every rule over the whole text.
///
/// When matches of different rules overlap, the one starting first wins;
/// on a tie the longer match wins, then the earlier rule.
#[derive(Debug)]
pub struct LexicalProducer {
    rules: Vec<CompiledRule>,
}

impl LexicalProducer {
    pub fn new(rules: &[LexicalRule]) -> EngineResult<Self> {
        let rules = rules
            .iter()
            .map(compile_rule)
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Self { rules })
    }
}

fn compile_rule(rule: &LexicalRule) -> EngineResult<CompiledRule> {
    let source = match rule {
        LexicalRule::Pattern { pattern, .. } => pattern.clone(),
        LexicalRule::Words { tag, words } => {
            if words.is_empty() {
                return Err(EngineError::config(format!(
                    "word list for '{}' is empty",
                    tag
                )));
            }
            let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
            format!(r"\b(?:{})\b", alternatives.join("|"))
        }
    };
    let regex = Regex::new(&source).map_err(|err| {
        EngineError::producer(format!("invalid pattern for '{}': {}", rule.tag(), err))
    })?;
    Ok(CompiledRule {
        tag: ClassificationTag::new(rule.tag()),
        regex,
    })
}

impl CandidateProducer for LexicalProducer {
    fn compute(&self, text: &str, token: &GenerationToken) -> EngineResult<ProducerOutput> {
        let mut candidates = Vec::new();
        for rule in &self.rules {
            if !token.is_current() {
                log::debug!(target: LOG_TARGET, "lexical scan superseded");
                return Ok(ProducerOutput::Skip);
            }
            candidates.extend(
                rule.regex
                    .find_iter(text)
                    .map(|m| Range::new(m.start(), m.len(), rule.tag.clone())),
            );
        }
        Ok(ProducerOutput::Candidates(normalize_candidates(candidates)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::GenerationClock;
    use crate::config::defaults::default_lexical_rules;

    fn candidates(producer: &LexicalProducer, text: &str) -> Vec<(usize, usize, String)> {
        let clock = GenerationClock::new();
        match producer.compute(text, &clock.token()).expect("compute") {
            ProducerOutput::Candidates(ranges) => ranges
                .into_iter()
                .map(|r| (r.offset, r.length, r.tag.to_string()))
                .collect(),
            ProducerOutput::Skip => panic!("unexpected skip"),
        }
    }

    #[test]
    fn default_rules_tag_keywords_numbers_strings_and_comments() {
        let producer = LexicalProducer::new(&default_lexical_rules()).expect("defaults compile");
        let text = "let x = 42; // let it be\nlet s = \"fn\";";
        let found = candidates(&producer, text);

        assert_eq!(
            found,
            vec![
                (0, 3, "keyword".to_string()),
                (8, 2, "number".to_string()),
                (12, 12, "comment".to_string()),
                (25, 3, "keyword".to_string()),
                (33, 4, "string".to_string()),
            ]
        );
    }

    #[test]
    fn words_match_whole_words_only() {
        let producer = LexicalProducer::new(&[LexicalRule::Words {
            tag: "keyword".into(),
            words: vec!["if".into(), "a.b".into()],
        }])
        .expect("compile");
        let found = candidates(&producer, "if iffy a.b axb");
        assert_eq!(
            found,
            vec![(0, 2, "keyword".to_string()), (8, 3, "keyword".to_string())]
        );
    }

    #[test]
    fn invalid_pattern_is_a_producer_error() {
        let err = LexicalProducer::new(&[LexicalRule::Pattern {
            tag: "broken".into(),
            pattern: "(".into(),
        }])
        .expect_err("unbalanced group");
        assert!(matches!(err, EngineError::Producer { .. }));
    }

    #[test]
    fn empty_word_list_is_rejected() {
        let err = LexicalProducer::new(&[LexicalRule::Words {
            tag: "keyword".into(),
            words: Vec::new(),
        }])
        .expect_err("empty list");
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn stale_token_skips() {
        let producer = LexicalProducer::new(&default_lexical_rules()).expect("compile");
        let clock = GenerationClock::new();
        let token = clock.token();
        clock.advance();
        assert_eq!(
            producer.compute("let x = 1;", &token).expect("compute"),
            ProducerOutput::Skip
        );
    }
}
