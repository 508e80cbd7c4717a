//! Diffing a freshly computed candidate list against the live ranges.
//!
//! Both inputs are sorted by offset and walked once. Within a group of equal
//! offsets every candidate is paired with at most one live range that has the
//! same `(offset, length, tag)`; paired live ranges survive with their
//! identity, so the host only repaints what actually changed.

use crate::range::{Range, Region};
use crate::range_set::RangeSet;

const LOG_TARGET: &str = "irodori::reconcile";

/// Output of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// New authoritative range set.
    pub merged: RangeSet,
    /// Candidates that had no live counterpart.
    pub added: Vec<Range>,
    /// Live ranges that no candidate matched.
    pub removed: Vec<Range>,
}

impl Reconciliation {
    /// True when the pass changed nothing.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Smallest region covering every added and removed range.
    pub fn damaged_region(&self) -> Option<Region> {
        damaged_region(&self.added, &self.removed)
    }
}

/// Smallest region covering `added` and `removed`, if it is non-empty.
pub fn damaged_region(added: &[Range], removed: &[Range]) -> Option<Region> {
    let mut bounds: Option<(usize, usize)> = None;
    for range in added.iter().chain(removed) {
        bounds = Some(match bounds {
            Some((start, end)) => (start.min(range.offset), end.max(range.end())),
            None => (range.offset, range.end()),
        });
    }
    bounds
        .filter(|(start, end)| start < end)
        .map(|(start, end)| Region::from_bounds(start, end))
}

/// Merge `candidates` into `old`.
///
/// `candidates` must be sorted by offset; unsorted input panics in debug
/// builds and is re-sorted in release builds. Zero-length candidates are
/// dropped. Tombstoned entries of `old` are discarded without being reported.
pub fn reconcile(old: &RangeSet, mut candidates: Vec<Range>) -> Reconciliation {
    if !candidates.windows(2).all(|w| w[0].offset <= w[1].offset) {
        debug_assert!(false, "candidate ranges must be sorted by offset");
        log::warn!(target: LOG_TARGET, "Re-sorting {} unsorted candidates", candidates.len());
        candidates.sort_by_key(|r| r.offset);
    }
    candidates.retain(|r| r.length > 0);

    let old: Vec<&Range> = old.iter().collect();
    let mut merged = Vec::with_capacity(candidates.len());
    let mut added = Vec::new();
    let mut removed = Vec::new();

    let (mut i, mut j) = (0, 0);
    while i < old.len() || j < candidates.len() {
        let old_offset = old.get(i).map(|r| r.offset);
        let new_offset = candidates.get(j).map(|r| r.offset);

        match (old_offset, new_offset) {
            (Some(o), Some(n)) if o == n => {
                let old_end = group_end(&old, i, o, |r| r.offset);
                let new_end = group_end(&candidates, j, n, |r| r.offset);
                merge_group(
                    &old[i..old_end],
                    &candidates[j..new_end],
                    &mut merged,
                    &mut added,
                    &mut removed,
                );
                i = old_end;
                j = new_end;
            }
            (Some(o), Some(n)) if o < n => {
                removed.push(old[i].clone());
                i += 1;
            }
            (Some(_), None) => {
                removed.push(old[i].clone());
                i += 1;
            }
            (_, Some(_)) => {
                let candidate = candidates[j].clone();
                merged.push(candidate.clone());
                added.push(candidate);
                j += 1;
            }
            (None, None) => break,
        }
    }

    log::debug!(
        target: LOG_TARGET,
        "reconciled {} live against {} candidates: +{} -{}",
        old.len(),
        candidates.len(),
        added.len(),
        removed.len()
    );

    Reconciliation {
        merged: RangeSet::from_sorted(merged),
        added,
        removed,
    }
}

fn group_end<T>(items: &[T], start: usize, offset: usize, key: impl Fn(&T) -> usize) -> usize {
    start
        + items[start..]
            .iter()
            .take_while(|&item| key(item) == offset)
            .count()
}

/// Pair one equal-offset group, consuming each match exactly once.
fn merge_group(
    old: &[&Range],
    candidates: &[Range],
    merged: &mut Vec<Range>,
    added: &mut Vec<Range>,
    removed: &mut Vec<Range>,
) {
    let mut consumed = vec![false; old.len()];

    for candidate in candidates {
        let matched = (0..old.len()).find(|&k| {
            !consumed[k] && old[k].is_equal(candidate.offset, candidate.length, &candidate.tag)
        });
        match matched {
            Some(k) => {
                consumed[k] = true;
                merged.push(old[k].clone());
            }
            None => {
                merged.push(candidate.clone());
                added.push(candidate.clone());
            }
        }
    }

    removed.extend(
        old.iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|(live, _)| (*live).clone()),
    );
}
