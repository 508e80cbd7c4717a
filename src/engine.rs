//! Per-document highlighting state shared by the edit path and the
//! recompute path.
//!
//! The edit path runs synchronously on the caller's thread: every edit
//! relocates the tracked ranges and advances the document generation while
//! holding the document lock. The recompute path captures a generation with
//! [`HighlightEngine::begin_recompute`], produces candidates elsewhere and
//! hands them back through [`HighlightEngine::on_recomputed`]. The merge is
//! computed against a snapshot without the lock; the generation is checked
//! again after re-acquiring the lock, immediately before the swap, so a result
//! computed for an outdated text can never replace the live set.

use crate::cancellation::{GenerationClock, GenerationToken};
use crate::config::{EngineSettings, StyleMap};
use crate::edit_transform::{EditSummary, TransformOptions, apply_edit};
use crate::error::{EngineError, EngineResult, LockResultExt};
use crate::identifier::IdentifierRule;
use crate::presentation::{
    PaintUpdate, StyleInstruction, StyleTable, full_update, live_regions, regions_with_tag,
    styles_for_region,
};
use crate::producer::ProducerOutput;
use crate::range::{ClassificationTag, Edit, Range, Region};
use crate::range_set::RangeSet;
use crate::reconcile::reconcile;
use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex, MutexGuard};

const LOG_TARGET: &str = "irodori::engine";

/// Where the recompute path currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Computing,
    Merging,
    Presenting,
}

/// Why a recomputation result was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// An edit happened after the recomputation started.
    Stale,
    /// The document was uninstalled, or never installed.
    Uninstalled,
    /// The producer declined to produce candidates.
    Skipped,
    /// The producer failed; the error was logged.
    Failed,
}

/// Result of one edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// Generation after the edit; `None` when the document is not installed.
    pub generation: Option<u64>,
    pub summary: EditSummary,
    /// Repaint of the region the edit touched.
    pub update: Option<PaintUpdate>,
}

/// A reconciliation that replaced the live set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedReconciliation {
    pub generation: u64,
    pub added: Vec<Range>,
    pub removed: Vec<Range>,
    /// `None` when the candidates matched the live set exactly.
    pub update: Option<PaintUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied(AppliedReconciliation),
    Discarded(DiscardReason),
}

impl ReconcileOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ReconcileOutcome::Applied(_))
    }
}

#[derive(Debug)]
struct DocumentState {
    ranges: RangeSet,
    phase: Phase,
    /// Generation of the newest recomputation handed out.
    pending: Option<u64>,
    installed: bool,
}

impl DocumentState {
    /// Leave the phase of the work for `generation`: idle, or computing if a
    /// newer recomputation was requested meanwhile.
    fn settle(&mut self, generation: u64) {
        if self.pending.is_none_or(|pending| pending <= generation) {
            self.phase = Phase::Idle;
            self.pending = None;
        } else {
            self.phase = Phase::Computing;
        }
    }
}

/// Highlighting state of one document.
pub struct HighlightEngine {
    state: Mutex<DocumentState>,
    clock: GenerationClock,
    identifier: IdentifierRule,
    split_on_identifier_boundary: bool,
    styles: ArcSwap<StyleTable>,
}

impl std::fmt::Debug for HighlightEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightEngine")
            .field("generation", &self.clock.current())
            .field("identifier", &self.identifier)
            .field("split_on_identifier_boundary", &self.split_on_identifier_boundary)
            .finish_non_exhaustive()
    }
}

impl Default for HighlightEngine {
    fn default() -> Self {
        Self::new(&EngineSettings::default())
    }
}

impl HighlightEngine {
    /// Create an engine; it ignores edits and results until installed.
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            state: Mutex::new(DocumentState {
                ranges: RangeSet::new(),
                phase: Phase::Idle,
                pending: None,
                installed: false,
            }),
            clock: GenerationClock::new(),
            identifier: settings.identifier.clone(),
            split_on_identifier_boundary: settings.split_on_identifier_boundary,
            styles: ArcSwap::from_pointee(StyleTable::new(&settings.styles)),
        }
    }

    fn lock_state(&self, context: &str) -> MutexGuard<'_, DocumentState> {
        self.state.lock().recover(context)
    }

    fn options(&self) -> TransformOptions<'_> {
        TransformOptions {
            identifier: &self.identifier,
            split_on_identifier_boundary: self.split_on_identifier_boundary,
        }
    }

    /// Start tracking with an empty range set.
    ///
    /// Fails once the engine has been uninstalled; attach a new engine
    /// instead.
    pub fn install(&self) -> EngineResult<()> {
        if self.clock.is_uninstalled() {
            return Err(EngineError::detached("engine was uninstalled"));
        }
        let mut state = self.lock_state("HighlightEngine::install");
        state.ranges.clear();
        state.phase = Phase::Idle;
        state.pending = None;
        state.installed = true;
        Ok(())
    }

    /// Stop tracking for good.
    ///
    /// Every pending recomputation is cancelled and late results are dropped.
    /// Returns an invalidation of every highlighted region so the host can
    /// repaint them plain.
    pub fn uninstall(&self) -> PaintUpdate {
        // The clock only moves to the sentinel under the lock, so an edit
        // holding it never advances an uninstalled clock.
        let mut state = self.lock_state("HighlightEngine::uninstall");
        self.clock.uninstall();
        let regions = live_regions(&state.ranges);
        state.ranges.clear();
        state.phase = Phase::Idle;
        state.pending = None;
        state.installed = false;
        log::debug!(target: LOG_TARGET, "uninstalled; invalidating {} regions", regions.len());
        PaintUpdate::Invalidate { regions }
    }

    pub fn is_installed(&self) -> bool {
        self.lock_state("HighlightEngine::is_installed").installed
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.clock.current()
    }

    /// Whether no edit or uninstall happened since `generation`.
    pub fn is_current(&self, generation: u64) -> bool {
        self.clock.token_for(generation).is_current()
    }

    pub fn phase(&self) -> Phase {
        self.lock_state("HighlightEngine::phase").phase
    }

    /// Token for the current generation, without entering [`Phase::Computing`].
    pub fn current_token(&self) -> GenerationToken {
        self.clock.token()
    }

    /// Capture the generation a recomputation is about to run against.
    pub fn begin_recompute(&self) -> GenerationToken {
        let mut state = self.lock_state("HighlightEngine::begin_recompute");
        let token = self.clock.token();
        if state.installed {
            state.phase = Phase::Computing;
            state.pending = Some(token.generation());
        }
        token
    }

    /// Give up on a recomputation that was superseded before it produced
    /// anything.
    pub fn abandon_recompute(&self, generation: u64) {
        let mut state = self.lock_state("HighlightEngine::abandon_recompute");
        state.settle(generation);
    }

    /// Apply one edit to the tracked ranges.
    pub fn on_edit(&self, edit: &Edit) -> EditOutcome {
        let mut state = self.lock_state("HighlightEngine::on_edit");
        if !state.installed {
            return EditOutcome::default();
        }
        // Advanced under the lock so a concurrent swap-in sees either the
        // old ranges with the old generation or neither.
        let generation = self.clock.advance();
        let summary = apply_edit(&mut state.ranges, edit, self.options());
        let update = summary.damaged.map(|region| PaintUpdate::Styles {
            region,
            instructions: styles_for_region(&state.ranges, region, &self.styles.load()),
        });
        EditOutcome {
            generation,
            summary,
            update,
        }
    }

    /// Merge freshly computed candidates, if `generation` is still current.
    ///
    /// When the merge changed anything the engine stays in
    /// [`Phase::Presenting`] until the host reports the paint update done
    /// through [`HighlightEngine::finish_presenting`].
    pub fn on_recomputed(&self, candidates: Vec<Range>, generation: u64) -> ReconcileOutcome {
        let token = self.clock.token_for(generation);

        let snapshot = {
            let mut state = self.lock_state("HighlightEngine::on_recomputed");
            if let Err(reason) = check_current(&state, &token) {
                return self.discard(&mut state, generation, reason);
            }
            state.phase = Phase::Merging;
            state.ranges.clone()
        };

        let result = reconcile(&snapshot, candidates);
        drop(snapshot);

        let mut state = self.lock_state("HighlightEngine::on_recomputed");
        if let Err(reason) = check_current(&state, &token) {
            return self.discard(&mut state, generation, reason);
        }
        let damaged = result.damaged_region();
        state.ranges = result.merged;

        let update = damaged.map(|region| PaintUpdate::Styles {
            region,
            instructions: styles_for_region(&state.ranges, region, &self.styles.load()),
        });
        if update.is_some() {
            state.phase = Phase::Presenting;
        } else {
            state.settle(generation);
        }

        log::debug!(
            target: LOG_TARGET,
            "applied generation {}: +{} -{}",
            generation,
            result.added.len(),
            result.removed.len()
        );
        ReconcileOutcome::Applied(AppliedReconciliation {
            generation,
            added: result.added,
            removed: result.removed,
            update,
        })
    }

    /// Route a producer result: candidates are merged, skips and failures
    /// leave the live set untouched.
    pub fn on_producer_output(
        &self,
        output: EngineResult<ProducerOutput>,
        generation: u64,
    ) -> ReconcileOutcome {
        match output {
            Ok(ProducerOutput::Candidates(candidates)) => self.on_recomputed(candidates, generation),
            Ok(ProducerOutput::Skip) => {
                let mut state = self.lock_state("HighlightEngine::on_producer_output");
                self.discard(&mut state, generation, DiscardReason::Skipped)
            }
            Err(err) => {
                log::warn!(
                    target: LOG_TARGET,
                    "recompute for generation {} failed: {}",
                    generation,
                    err
                );
                let mut state = self.lock_state("HighlightEngine::on_producer_output");
                self.discard(&mut state, generation, DiscardReason::Failed)
            }
        }
    }

    /// End the presentation of the update applied for `generation`.
    ///
    /// Returns false when an edit or uninstall happened after the merge; the
    /// update's offsets no longer match the text and it should be dropped.
    pub fn finish_presenting(&self, generation: u64) -> bool {
        let mut state = self.lock_state("HighlightEngine::finish_presenting");
        if state.phase == Phase::Presenting {
            state.settle(generation);
        }
        state.installed && self.is_current(generation)
    }

    fn discard(
        &self,
        state: &mut DocumentState,
        generation: u64,
        reason: DiscardReason,
    ) -> ReconcileOutcome {
        log::trace!(target: LOG_TARGET, "discarding recompute result: {:?}", reason);
        state.settle(generation);
        ReconcileOutcome::Discarded(reason)
    }

    /// Live ranges sharing at least one byte with `region`.
    pub fn snapshot_overlapping(&self, region: Region) -> Vec<Range> {
        self.lock_state("HighlightEngine::snapshot_overlapping")
            .ranges
            .overlapping(region)
    }

    /// Every live range, in offset order.
    pub fn snapshot(&self) -> Vec<Range> {
        self.lock_state("HighlightEngine::snapshot").ranges.to_vec()
    }

    /// Style instructions for the ranges fully inside `region`.
    pub fn present(&self, region: Region) -> Vec<StyleInstruction> {
        let state = self.lock_state("HighlightEngine::present");
        styles_for_region(&state.ranges, region, &self.styles.load())
    }

    /// Paint update for a cold render of the whole document.
    pub fn full_presentation(&self) -> Option<PaintUpdate> {
        let state = self.lock_state("HighlightEngine::full_presentation");
        full_update(&state.ranges, &self.styles.load())
    }

    /// Regions to repaint after the style of `tag` changed.
    pub fn restyle(&self, tag: &ClassificationTag) -> Vec<Region> {
        let state = self.lock_state("HighlightEngine::restyle");
        regions_with_tag(&state.ranges, tag)
    }

    /// Replace the style table without touching the range set.
    pub fn set_styles(&self, styles: &StyleMap) {
        self.styles.store(Arc::new(StyleTable::new(styles)));
    }
}

fn check_current(state: &DocumentState, token: &GenerationToken) -> Result<(), DiscardReason> {
    if !state.installed || token.is_detached() {
        Err(DiscardReason::Uninstalled)
    } else if !token.is_current() {
        Err(DiscardReason::Stale)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TagStyle;

    fn installed_engine() -> HighlightEngine {
        let engine = HighlightEngine::default();
        engine.install().expect("fresh engine installs");
        engine
    }

    fn seed(engine: &HighlightEngine, ranges: Vec<Range>) {
        let token = engine.begin_recompute();
        assert!(
            engine
                .on_recomputed(ranges, token.generation())
                .is_applied()
        );
    }

    fn spans(ranges: &[Range]) -> Vec<(usize, usize, &str)> {
        ranges
            .iter()
            .map(|r| (r.offset, r.length, r.tag.as_str()))
            .collect()
    }

    #[test]
    fn edits_move_ranges_and_advance_generation() {
        let engine = installed_engine();
        seed(&engine, vec![Range::new(10, 5, "field")]);
        let before = engine.generation();

        let outcome = engine.on_edit(&Edit::insert(12, "abc"));
        assert_eq!(outcome.generation, Some(before + 1));
        assert_eq!(spans(&engine.snapshot()), vec![(10, 8, "field")]);
        assert_eq!(outcome.summary.included, 1);
        assert!(matches!(outcome.update, Some(PaintUpdate::Styles { .. })));
    }

    #[test]
    fn stale_result_is_discarded() {
        let engine = installed_engine();
        seed(&engine, vec![Range::new(0, 3, "keyword")]);

        let token = engine.begin_recompute();
        assert_eq!(engine.phase(), Phase::Computing);
        engine.on_edit(&Edit::insert(0, "  "));

        let outcome = engine.on_recomputed(vec![Range::new(0, 3, "keyword")], token.generation());
        assert_eq!(outcome, ReconcileOutcome::Discarded(DiscardReason::Stale));
        assert_eq!(spans(&engine.snapshot()), vec![(2, 3, "keyword")]);
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn unchanged_ranges_keep_identity() {
        let engine = installed_engine();
        seed(
            &engine,
            vec![Range::new(0, 5, "class"), Range::new(10, 3, "field")],
        );
        let ids: Vec<_> = engine.snapshot().iter().map(Range::id).collect();

        let token = engine.begin_recompute();
        let outcome = engine.on_recomputed(
            vec![
                Range::new(0, 5, "class"),
                Range::new(10, 3, "field"),
                Range::new(20, 2, "keyword"),
            ],
            token.generation(),
        );

        let ReconcileOutcome::Applied(applied) = outcome else {
            panic!("current result should apply");
        };
        assert_eq!(spans(&applied.added), vec![(20, 2, "keyword")]);
        assert!(applied.removed.is_empty());
        assert_eq!(
            applied.update,
            Some(PaintUpdate::Styles {
                region: Region::new(20, 2),
                instructions: engine.present(Region::new(20, 2)),
            })
        );
        let after: Vec<_> = engine.snapshot().iter().map(Range::id).collect();
        assert_eq!(&after[..2], &ids[..]);
    }

    #[test]
    fn identical_candidates_produce_no_paint() {
        let engine = installed_engine();
        seed(&engine, vec![Range::new(1, 2, "number")]);
        let token = engine.begin_recompute();
        let outcome = engine.on_recomputed(vec![Range::new(1, 2, "number")], token.generation());
        let ReconcileOutcome::Applied(applied) = outcome else {
            panic!("current result should apply");
        };
        assert_eq!(applied.update, None);
    }

    #[test]
    fn uninstall_invalidates_and_blocks_late_results() {
        let engine = installed_engine();
        seed(
            &engine,
            vec![Range::new(0, 3, "keyword"), Range::new(5, 2, "number")],
        );
        let token = engine.begin_recompute();

        assert_eq!(
            engine.uninstall(),
            PaintUpdate::Invalidate {
                regions: vec![Region::new(0, 3), Region::new(5, 2)]
            }
        );
        assert!(engine.snapshot().is_empty());
        assert!(token.is_detached());

        let late = engine.on_recomputed(vec![Range::new(0, 3, "keyword")], token.generation());
        assert_eq!(late, ReconcileOutcome::Discarded(DiscardReason::Uninstalled));
        assert_eq!(engine.on_edit(&Edit::insert(0, "x")), EditOutcome::default());
        assert!(engine.snapshot().is_empty());
        assert!(matches!(engine.install(), Err(EngineError::Detached { .. })));
    }

    #[test]
    fn results_before_install_are_dropped() {
        let engine = HighlightEngine::default();
        let token = engine.begin_recompute();
        assert_eq!(
            engine.on_recomputed(vec![Range::new(0, 1, "a")], token.generation()),
            ReconcileOutcome::Discarded(DiscardReason::Uninstalled)
        );
    }

    #[test]
    fn skipped_and_failed_outputs_leave_state_alone() {
        let engine = installed_engine();
        seed(&engine, vec![Range::new(0, 3, "keyword")]);

        let token = engine.begin_recompute();
        assert_eq!(
            engine.on_producer_output(Ok(ProducerOutput::Skip), token.generation()),
            ReconcileOutcome::Discarded(DiscardReason::Skipped)
        );
        assert_eq!(
            engine.on_producer_output(
                Err(EngineError::producer("parse failed")),
                token.generation()
            ),
            ReconcileOutcome::Discarded(DiscardReason::Failed)
        );
        assert_eq!(spans(&engine.snapshot()), vec![(0, 3, "keyword")]);
    }

    #[test]
    fn snapshot_overlapping_includes_partial_ranges() {
        let engine = installed_engine();
        seed(
            &engine,
            vec![
                Range::new(0, 4, "a"),
                Range::new(6, 4, "b"),
                Range::new(12, 2, "c"),
            ],
        );
        let overlapping = engine.snapshot_overlapping(Region::new(2, 6));
        assert_eq!(spans(&overlapping), vec![(0, 4, "a"), (6, 4, "b")]);
        // Presentation only paints what is fully inside.
        assert!(engine.present(Region::new(2, 6)).is_empty());
    }

    #[test]
    fn restyle_reports_regions_and_respects_disabled_tags() {
        let engine = installed_engine();
        seed(
            &engine,
            vec![Range::new(0, 3, "field"), Range::new(5, 3, "keyword")],
        );
        assert_eq!(
            engine.restyle(&ClassificationTag::new("field")),
            vec![Region::new(0, 3)]
        );

        let mut styles = StyleMap::new();
        styles.insert(
            "field".to_string(),
            TagStyle {
                enabled: false,
                ..TagStyle::default()
            },
        );
        engine.set_styles(&styles);
        let painted = engine.present(Region::new(0, 10));
        assert_eq!(painted.len(), 1);
        assert_eq!(painted[0].tag.as_str(), "keyword");
    }

    #[test]
    fn phases_follow_the_recompute_path() {
        let engine = installed_engine();
        assert_eq!(engine.phase(), Phase::Idle);

        let token = engine.begin_recompute();
        assert_eq!(engine.phase(), Phase::Computing);
        let outcome = engine.on_recomputed(vec![Range::new(0, 2, "number")], token.generation());
        assert!(outcome.is_applied());
        assert_eq!(engine.phase(), Phase::Presenting);

        assert!(engine.finish_presenting(token.generation()));
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn edit_during_presenting_marks_update_stale() {
        let engine = installed_engine();
        let token = engine.begin_recompute();
        engine.on_recomputed(vec![Range::new(0, 2, "number")], token.generation());

        engine.on_edit(&Edit::insert(0, " "));
        assert!(!engine.finish_presenting(token.generation()));
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn abandoned_recompute_returns_to_idle() {
        let engine = installed_engine();
        let token = engine.begin_recompute();
        engine.on_edit(&Edit::insert(0, "x"));

        engine.abandon_recompute(token.generation());
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn abandoning_older_request_keeps_newer_one_computing() {
        let engine = installed_engine();
        let older = engine.begin_recompute();
        engine.on_edit(&Edit::insert(0, "x"));
        let newer = engine.begin_recompute();

        engine.abandon_recompute(older.generation());
        assert_eq!(engine.phase(), Phase::Computing);
        engine.abandon_recompute(newer.generation());
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn edits_racing_uninstall_never_panic() {
        let engine = Arc::new(installed_engine());
        let editor = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    engine.on_edit(&Edit::insert(0, "x"));
                }
            })
        };
        engine.uninstall();
        editor.join().expect("editor thread must not panic");
        assert!(!engine.is_installed());
        assert_eq!(engine.generation(), crate::cancellation::UNINSTALLED);
    }

    #[test]
    fn splitting_can_be_disabled() {
        let settings = EngineSettings {
            split_on_identifier_boundary: false,
            ..EngineSettings::default()
        };
        let engine = HighlightEngine::new(&settings);
        engine.install().expect("install");
        seed(&engine, vec![Range::new(0, 6, "field")]);

        engine.on_edit(&Edit::insert(3, " "));
        assert_eq!(spans(&engine.snapshot()), vec![(0, 7, "field")]);
    }
}
