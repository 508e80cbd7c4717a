pub mod cancellation;
pub mod config;
pub mod edit_transform;
pub mod engine;
pub mod error;
pub mod identifier;
pub mod presentation;
pub mod producer;
pub mod range;
pub mod range_set;
pub mod reconcile;
pub mod registry;
pub mod scheduler;

pub use cancellation::{GenerationClock, GenerationToken};
pub use config::{EngineSettings, SettingsEvent, TagStyle, load_settings};
pub use edit_transform::{EditRelation, EditSummary, apply_edit};
pub use engine::{
    AppliedReconciliation, DiscardReason, EditOutcome, HighlightEngine, Phase, ReconcileOutcome,
};
pub use error::{EngineError, EngineResult};
pub use identifier::{IdentifierContinue, IdentifierRule};
pub use presentation::{PaintUpdate, StyleInstruction, StyleTable};
pub use producer::{CandidateProducer, LexicalProducer, ProducerOutput, SyntaxProducer};
pub use range::{ClassificationTag, Edit, Range, RangeId, Region};
pub use range_set::RangeSet;
pub use reconcile::{Reconciliation, reconcile};
pub use registry::EngineRegistry;
pub use scheduler::RecomputeScheduler;
