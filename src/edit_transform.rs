//! Relocating highlighted ranges across a single text edit.
//!
//! Every live range is classified against the removed interval
//! `[edit.offset, edit.offset + removed_length)` and moved, resized, split or
//! deleted so that it keeps covering the same token. Insertions touching a
//! range boundary only extend the range by the part of the inserted text that
//! continues an identifier; this keeps highlighting glued to tokens while a
//! user types next to them.

use crate::identifier::IdentifierContinue;
use crate::range::{Edit, Range, Region};
use crate::range_set::RangeSet;

const LOG_TARGET: &str = "irodori::edit";

/// How a range relates to an edit, evaluated in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditRelation {
    /// Range starts at or after the removed interval; it shifts by the delta.
    Succeeding,
    /// Range ends at or before the edit; it is unchanged.
    Preceding,
    /// The removed interval lies inside the range.
    Included,
    /// Edit starts inside the range and removes past its end.
    OverlapsTrailingEdge,
    /// Edit starts before the range and removes into it.
    OverlapsLeadingEdge,
    /// The removed interval swallows the range.
    Consumed,
}

/// Result of transforming one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformed {
    /// The range was updated in place (possibly to the same values).
    Kept,
    /// The range was cut in two; the right half must be tracked separately.
    Split(Range),
    /// The range was tombstoned.
    Deleted,
}

/// Options controlling the transform.
#[derive(Clone, Copy)]
pub struct TransformOptions<'a> {
    pub identifier: &'a dyn IdentifierContinue,
    /// Split ranges around inserted non-identifier text instead of growing them.
    pub split_on_identifier_boundary: bool,
}

/// Classify `range` against `edit`.
pub fn classify(edit: &Edit, range: &Range) -> EditRelation {
    let edit_end = edit.end();
    let range_end = range.end();

    if range.offset >= edit_end {
        EditRelation::Succeeding
    } else if range_end <= edit.offset {
        EditRelation::Preceding
    } else if range.offset <= edit.offset && range_end >= edit_end {
        EditRelation::Included
    } else if range.offset <= edit.offset {
        EditRelation::OverlapsTrailingEdge
    } else if range_end >= edit_end {
        EditRelation::OverlapsLeadingEdge
    } else {
        EditRelation::Consumed
    }
}

/// Transform one range in place.
pub fn transform_range(edit: &Edit, range: &mut Range, options: TransformOptions<'_>) -> Transformed {
    let relation = classify(edit, range);
    transform_with_relation(edit, range, relation, options)
}

fn transform_with_relation(
    edit: &Edit,
    range: &mut Range,
    relation: EditRelation,
    options: TransformOptions<'_>,
) -> Transformed {
    let inserted = edit.inserted_length();
    let removed = edit.removed_length;

    match relation {
        EditRelation::Succeeding => {
            // range.offset >= edit.end() >= removed
            range.offset = range.offset - removed + inserted;
            Transformed::Kept
        }
        EditRelation::Preceding => Transformed::Kept,
        EditRelation::Included => transform_included(edit, range, options),
        EditRelation::OverlapsTrailingEdge => {
            let included = options.identifier.leading_run(&edit.text);
            range.length = edit.offset - range.offset + included;
            Transformed::Kept
        }
        EditRelation::OverlapsLeadingEdge => {
            let kept_insert = options.identifier.trailing_run(&edit.text);
            let excluded = inserted - kept_insert;
            let removed_from_range = edit.end() - range.offset;
            let length = range.length - removed_from_range + kept_insert;
            range.update(edit.offset + excluded, length);
            Transformed::Kept
        }
        EditRelation::Consumed => {
            range.delete_at(edit.offset);
            Transformed::Deleted
        }
    }
}

fn transform_included(edit: &Edit, range: &mut Range, options: TransformOptions<'_>) -> Transformed {
    let inserted = edit.inserted_length();
    // range contains the removed interval, so length >= removed
    let grown = range.length - edit.removed_length + inserted;

    let included = options.identifier.leading_run(&edit.text);
    if included == inserted || !options.split_on_identifier_boundary {
        range.length = grown;
        return Transformed::Kept;
    }

    let left_length = edit.offset - range.offset + included;
    let excluded = inserted - options.identifier.trailing_run(&edit.text);
    let right_offset = edit.offset + excluded;
    let right_end = range.offset + grown;
    let right_length = right_end - right_offset;

    if right_length == 0 {
        range.length = left_length;
        Transformed::Kept
    } else if left_length == 0 {
        range.update(right_offset, right_length);
        Transformed::Kept
    } else {
        range.length = left_length;
        Transformed::Split(Range::new(right_offset, right_length, range.tag.clone()))
    }
}

/// Summary of one edit pass over a range set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSummary {
    pub succeeding: usize,
    pub preceding: usize,
    pub included: usize,
    pub overlapped: usize,
    /// Ranges created by splitting, already inserted into the set.
    pub split: Vec<Range>,
    /// Ranges the edit consumed, already removed from the set.
    pub deleted: Vec<Range>,
    /// Post-edit region whose styling changed, if any range was touched.
    pub damaged: Option<Region>,
}

impl EditSummary {
    fn record(&mut self, relation: EditRelation) {
        match relation {
            EditRelation::Succeeding => self.succeeding += 1,
            EditRelation::Preceding => self.preceding += 1,
            EditRelation::Included => self.included += 1,
            EditRelation::OverlapsTrailingEdge | EditRelation::OverlapsLeadingEdge => {
                self.overlapped += 1
            }
            EditRelation::Consumed => {}
        }
    }

    fn damage(&mut self, region: Region) {
        self.damaged = Some(match self.damaged {
            Some(existing) => existing.union(&region),
            None => region,
        });
    }
}

/// Apply `edit` to every live range of `set`.
///
/// Consumed ranges are tombstoned during the pass and compacted at its end;
/// split-off halves are inserted in order. The set stays sorted.
pub fn apply_edit(set: &mut RangeSet, edit: &Edit, options: TransformOptions<'_>) -> EditSummary {
    let mut summary = EditSummary::default();
    let mut splits = Vec::new();

    for range in set.entries_mut().iter_mut().filter(|r| r.is_live()) {
        let relation = classify(edit, range);
        summary.record(relation);
        match relation {
            EditRelation::Preceding => continue,
            EditRelation::Succeeding => {
                // Shifted ranges keep their text, so they add no damage.
                transform_with_relation(edit, range, relation, options);
                continue;
            }
            _ => {}
        }

        let before = range.region();
        match transform_with_relation(edit, range, relation, options) {
            Transformed::Kept => {}
            Transformed::Split(right) => splits.push(right),
            Transformed::Deleted => {}
        }
        // Old extent in post-edit coordinates starts no later than it did.
        summary.damage(Region::from_bounds(
            before.offset.min(range.offset),
            range.end().max(edit.offset + edit.inserted_length()),
        ));
    }

    // Ranges that started exactly at the edit may now be out of order with
    // each other when one moved past the inserted separator.
    set.settle_ties();
    for right in splits {
        summary.damage(right.region());
        set.insert_sorted(right.clone());
        summary.split.push(right);
    }
    summary.deleted = set.compact();
    set.ensure_sorted();

    log::trace!(
        target: LOG_TARGET,
        "edit at {} (-{} +{}): {} shifted, {} resized, {} split, {} deleted",
        edit.offset,
        edit.removed_length,
        edit.inserted_length(),
        summary.succeeding,
        summary.included + summary.overlapped,
        summary.split.len(),
        summary.deleted.len()
    );
    summary
}
