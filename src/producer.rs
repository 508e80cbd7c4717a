//! Candidate producers: anything that turns a text snapshot into an
//! offset-sorted list of highlight candidates.

pub mod lexical;
pub mod syntax;

pub use lexical::LexicalProducer;
pub use syntax::SyntaxProducer;

use crate::cancellation::GenerationToken;
use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::range::Range;

/// Result of one recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerOutput {
    /// Fresh candidates, sorted by offset.
    Candidates(Vec<Range>),
    /// Nothing worth applying: the text is not in a state the producer
    /// trusts, or the token went stale mid-computation. The live set is
    /// left alone.
    Skip,
}

/// Computes highlight candidates for a text snapshot.
///
/// Implementations run on a blocking worker thread and should poll
/// [`GenerationToken::is_current`] between units of work, returning
/// [`ProducerOutput::Skip`] once it turns false.
pub trait CandidateProducer: Send + Sync {
    fn compute(&self, text: &str, token: &GenerationToken) -> EngineResult<ProducerOutput>;
}

impl<F> CandidateProducer for F
where
    F: Fn(&str, &GenerationToken) -> EngineResult<ProducerOutput> + Send + Sync,
{
    fn compute(&self, text: &str, token: &GenerationToken) -> EngineResult<ProducerOutput> {
        self(text, token)
    }
}

/// Build the producer for `language`, falling back to the lexical rules of
/// `settings` when no language is given.
pub fn for_language(
    language: Option<&str>,
    settings: &EngineSettings,
) -> EngineResult<Box<dyn CandidateProducer>> {
    match language {
        None => Ok(Box::new(LexicalProducer::new(&settings.lexical)?)),
        Some("rust") => Ok(Box::new(SyntaxProducer::rust(settings.captures.clone())?)),
        Some(other) => Err(EngineError::config(format!(
            "no syntax producer for language '{}'",
            other
        ))),
    }
}

/// Sort candidates and drop empty or overlapping ones.
///
/// Candidates are sorted by offset (longer first on ties, otherwise stable).
/// A candidate starting inside an already accepted one is dropped, so the
/// earliest-starting token wins.
pub fn normalize_candidates(mut candidates: Vec<Range>) -> Vec<Range> {
    candidates.retain(|r| r.length > 0);
    candidates.sort_by(|a, b| a.offset.cmp(&b.offset).then(b.length.cmp(&a.length)));

    let mut accepted: Vec<Range> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match accepted.last() {
            Some(last) if candidate.offset < last.end() => {}
            _ => accepted.push(candidate),
        }
    }
    accepted
}
