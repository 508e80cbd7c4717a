//! Tree-sitter based producer.
//!
//! Parses the snapshot and runs a highlight query over it; capture names are
//! translated to classification tags through the `captures` configuration.

use super::{CandidateProducer, ProducerOutput, normalize_candidates};
use crate::cancellation::GenerationToken;
use crate::error::{EngineError, EngineResult};
use crate::range::{ClassificationTag, Range};
use std::collections::HashMap;
use tree_sitter::{Language, Parser, Query, QueryCursor, StreamingIterator};

const LOG_TARGET: &str = "irodori::producer";

/// How many query matches to process between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 64;

pub struct SyntaxProducer {
    language: Language,
    query: Query,
    /// Tag per capture index; `None` filters the capture.
    tags: Vec<Option<ClassificationTag>>,
    skip_on_error: bool,
}

impl SyntaxProducer {
    pub fn new(
        language: Language,
        query_source: &str,
        captures: &HashMap<String, String>,
    ) -> EngineResult<Self> {
        let query = Query::new(&language, query_source)
            .map_err(|err| EngineError::producer(format!("query compile failed: {}", err)))?;
        let tags = query
            .capture_names()
            .iter()
            .map(|name| tag_for_capture(name, captures))
            .collect();
        Ok(Self {
            language,
            query,
            tags,
            skip_on_error: true,
        })
    }

    /// Producer for Rust sources using the grammar's bundled highlight query.
    pub fn rust(captures: HashMap<String, String>) -> EngineResult<Self> {
        Self::new(
            tree_sitter_rust::LANGUAGE.into(),
            tree_sitter_rust::HIGHLIGHTS_QUERY,
            &captures,
        )
    }

    /// Whether a tree containing syntax errors yields [`ProducerOutput::Skip`].
    ///
    /// On by default: half-typed code often parses into a tree whose
    /// highlighting flickers away and back with every keystroke.
    pub fn with_skip_on_error(mut self, skip: bool) -> Self {
        self.skip_on_error = skip;
        self
    }
}

/// Resolve a capture name like `function.method.builtin`.
///
/// The most specific configured prefix wins; an empty mapping filters the
/// capture, and an unmapped capture is used as the tag verbatim.
fn tag_for_capture(name: &str, captures: &HashMap<String, String>) -> Option<ClassificationTag> {
    let mut key = name;
    loop {
        if let Some(mapped) = captures.get(key) {
            return (!mapped.is_empty()).then(|| ClassificationTag::new(mapped));
        }
        match key.rfind('.') {
            Some(dot) => key = &key[..dot],
            None => return Some(ClassificationTag::new(name)),
        }
    }
}

impl CandidateProducer for SyntaxProducer {
    fn compute(&self, text: &str, token: &GenerationToken) -> EngineResult<ProducerOutput> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|err| EngineError::producer(format!("language rejected: {}", err)))?;
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| EngineError::producer("parser returned no tree"))?;

        if self.skip_on_error && tree.root_node().has_error() {
            log::debug!(target: LOG_TARGET, "skipping recompute: tree has syntax errors");
            return Ok(ProducerOutput::Skip);
        }

        let mut candidates = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, tree.root_node(), text.as_bytes());
        let mut seen = 0usize;

        while let Some(m) = matches.next() {
            seen += 1;
            if seen % CANCEL_CHECK_INTERVAL == 0 && !token.is_current() {
                log::debug!(target: LOG_TARGET, "syntax scan superseded after {} matches", seen);
                return Ok(ProducerOutput::Skip);
            }
            for capture in m.captures {
                let Some(Some(tag)) = self.tags.get(capture.index as usize) else {
                    continue;
                };
                let node = capture.node;
                candidates.push(Range::new(
                    node.start_byte(),
                    node.end_byte() - node.start_byte(),
                    tag.clone(),
                ));
            }
        }

        Ok(ProducerOutput::Candidates(normalize_candidates(candidates)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::GenerationClock;
    use crate::config::defaults::default_capture_tags;

    fn compute(producer: &SyntaxProducer, text: &str) -> ProducerOutput {
        let clock = GenerationClock::new();
        producer.compute(text, &clock.token()).expect("compute")
    }

    fn spans(output: ProducerOutput) -> Vec<(usize, usize, String)> {
        match output {
            ProducerOutput::Candidates(ranges) => ranges
                .into_iter()
                .map(|r| (r.offset, r.length, r.tag.to_string()))
                .collect(),
            ProducerOutput::Skip => panic!("unexpected skip"),
        }
    }

    #[test]
    fn rust_function_is_highlighted() {
        let producer = SyntaxProducer::rust(default_capture_tags()).expect("query compiles");
        let found = spans(compute(&producer, "fn main() { let x = 1; }"));

        assert!(found.contains(&(0, 2, "keyword".to_string())), "{:?}", found);
        assert!(found.contains(&(3, 4, "function".to_string())), "{:?}", found);
        assert!(found.contains(&(12, 3, "keyword".to_string())), "{:?}", found);
        assert!(found.windows(2).all(|w| w[0].0 + w[0].1 <= w[1].0));
    }

    #[test]
    fn filtered_captures_are_dropped() {
        let producer = SyntaxProducer::rust(default_capture_tags()).expect("query compiles");
        let found = spans(compute(&producer, "fn main() {}"));
        assert!(
            found.iter().all(|(_, _, tag)| !tag.starts_with("punctuation")),
            "{:?}",
            found
        );
    }

    #[test]
    fn syntax_errors_skip_by_default() {
        let producer = SyntaxProducer::rust(default_capture_tags()).expect("query compiles");
        assert_eq!(compute(&producer, "fn main( {"), ProducerOutput::Skip);

        let lenient = producer.with_skip_on_error(false);
        assert!(matches!(
            compute(&lenient, "fn main( {"),
            ProducerOutput::Candidates(_)
        ));
    }

    #[test]
    fn invalid_query_is_a_producer_error() {
        let err = SyntaxProducer::new(
            tree_sitter_rust::LANGUAGE.into(),
            "(no_such_node) @x",
            &HashMap::new(),
        )
        .err()
        .expect("unknown node kind");
        assert!(matches!(err, EngineError::Producer { .. }));
    }

    #[test]
    fn capture_prefixes_resolve_to_most_specific_mapping() {
        let captures: HashMap<String, String> = [
            ("function", "function"),
            ("function.method", "method"),
            ("comment", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let tag = |name: &str| tag_for_capture(name, &captures).map(|t| t.to_string());
        assert_eq!(tag("function.method.call"), Some("method".to_string()));
        assert_eq!(tag("function.macro"), Some("function".to_string()));
        assert_eq!(tag("comment.documentation"), None);
        assert_eq!(tag("label"), Some("label".to_string()));
    }
}
