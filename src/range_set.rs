//! Offset-sorted collection of highlighted ranges.
//!
//! The set is the single mutable resource shared by the edit path and the
//! recompute path. It stays sorted ascending by offset at all times; ranges at
//! equal offsets keep their insertion order.

use crate::range::{Range, Region};

const LOG_TARGET: &str = "irodori::range_set";

#[derive(Debug, Clone, Default)]
pub struct RangeSet {
    ranges: Vec<Range>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from ranges that may be out of order.
    pub fn from_unsorted(mut ranges: Vec<Range>) -> Self {
        ranges.sort_by_key(|r| r.offset);
        Self { ranges }
    }

    /// Build a set from ranges the caller guarantees are sorted.
    ///
    /// Unsorted input is a programming error: it panics in debug builds and
    /// is repaired by re-sorting in release builds.
    pub fn from_sorted(ranges: Vec<Range>) -> Self {
        let mut set = Self { ranges };
        set.ensure_sorted();
        set
    }

    /// Number of stored entries, tombstones included.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of live entries.
    pub fn live_len(&self) -> usize {
        self.ranges.iter().filter(|r| r.is_live()).count()
    }

    pub fn get(&self, index: usize) -> Option<&Range> {
        self.ranges.get(index)
    }

    /// Every stored entry in order, tombstones included.
    pub fn entries(&self) -> &[Range] {
        &self.ranges
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Range] {
        &mut self.ranges
    }

    /// Live ranges in offset order.
    pub fn iter(&self) -> impl Iterator<Item = &Range> {
        self.ranges.iter().filter(|r| r.is_live())
    }

    /// Clone of the live ranges.
    pub fn to_vec(&self) -> Vec<Range> {
        self.iter().cloned().collect()
    }

    /// First index whose offset is `>= offset`.
    pub fn index_at_or_after(&self, offset: usize) -> usize {
        self.ranges.partition_point(|r| r.offset < offset)
    }

    /// First index whose offset is `> offset`.
    pub fn index_after(&self, offset: usize) -> usize {
        self.ranges.partition_point(|r| r.offset <= offset)
    }

    /// Insert keeping the set sorted; returns the insertion index.
    pub fn insert_sorted(&mut self, range: Range) -> usize {
        let index = self.index_after(range.offset);
        self.ranges.insert(index, range);
        index
    }

    pub fn remove_at(&mut self, index: usize) -> Range {
        self.ranges.remove(index)
    }

    /// Tombstone the entry at `index` without moving storage.
    pub fn mark_deleted(&mut self, index: usize) {
        if let Some(range) = self.ranges.get_mut(index) {
            range.deleted = true;
        }
    }

    /// Physically drop every tombstone, returning them in order.
    pub fn compact(&mut self) -> Vec<Range> {
        if self.ranges.iter().all(Range::is_live) {
            return Vec::new();
        }
        let (live, deleted): (Vec<Range>, Vec<Range>) =
            self.ranges.drain(..).partition(Range::is_live);
        self.ranges = live;
        deleted
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Live ranges lying entirely within `region`, in offset order.
    pub fn contained_in(&self, region: Region) -> impl Iterator<Item = &Range> {
        let start = self.index_at_or_after(region.offset);
        self.ranges[start..]
            .iter()
            .take_while(move |r| r.offset < region.end())
            .filter(move |r| r.is_live() && region.contains(r))
    }

    /// Live ranges sharing at least one byte with `region`, in offset order.
    pub fn overlapping(&self, region: Region) -> Vec<Range> {
        // Ranges starting before the region may still reach into it.
        let mut start = self.index_at_or_after(region.offset);
        while start > 0 && self.ranges[start - 1].end() > region.offset {
            start -= 1;
        }
        self.ranges[start..]
            .iter()
            .take_while(|r| r.offset < region.end())
            .filter(|r| r.is_live() && region.intersects(r))
            .cloned()
            .collect()
    }

    pub fn is_sorted(&self) -> bool {
        self.ranges.windows(2).all(|w| w[0].offset <= w[1].offset)
    }

    /// Stable re-sort after an edit moved ranges that shared an offset.
    pub(crate) fn settle_ties(&mut self) {
        if !self.is_sorted() {
            self.ranges.sort_by_key(|r| r.offset);
        }
    }

    /// Check the ordering invariant, repairing it in release builds.
    pub fn ensure_sorted(&mut self) {
        if self.is_sorted() {
            return;
        }
        debug_assert!(false, "range set lost its offset ordering");
        log::warn!(
            target: LOG_TARGET,
            "Range set lost its offset ordering; re-sorting {} entries",
            self.ranges.len()
        );
        self.ranges.sort_by_key(|r| r.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(usize, usize, &str)]) -> RangeSet {
        RangeSet::from_sorted(
            entries
                .iter()
                .map(|(o, l, t)| Range::new(*o, *l, *t))
                .collect(),
        )
    }

    #[test]
    fn binary_searches_on_offsets() {
        let set = set(&[(0, 2, "a"), (5, 2, "b"), (5, 1, "c"), (9, 3, "d")]);

        assert_eq!(set.index_at_or_after(0), 0);
        assert_eq!(set.index_at_or_after(1), 1);
        assert_eq!(set.index_at_or_after(5), 1);
        assert_eq!(set.index_after(5), 3);
        assert_eq!(set.index_at_or_after(10), 4);
        assert_eq!(set.index_after(100), 4);
        assert_eq!(RangeSet::new().index_at_or_after(3), 0);
    }

    #[test]
    fn insert_sorted_keeps_order_and_ties_in_insertion_order() {
        let mut set = set(&[(0, 2, "a"), (10, 2, "b")]);
        let first = Range::new(5, 1, "x");
        let second = Range::new(5, 1, "y");
        let (first_id, second_id) = (first.id(), second.id());

        assert_eq!(set.insert_sorted(first), 1);
        assert_eq!(set.insert_sorted(second), 2);
        assert_eq!(set.insert_sorted(Range::new(20, 1, "z")), 4);

        assert!(set.is_sorted());
        assert_eq!(set.get(1).map(Range::id), Some(first_id));
        assert_eq!(set.get(2).map(Range::id), Some(second_id));
    }

    #[test]
    fn tombstones_are_invisible_and_compacted() {
        let mut set = set(&[(0, 2, "a"), (5, 2, "b"), (9, 3, "c")]);
        set.mark_deleted(1);

        assert_eq!(set.len(), 3);
        assert_eq!(set.live_len(), 2);
        assert_eq!(set.to_vec(), vec![Range::new(0, 2, "a"), Range::new(9, 3, "c")]);
        assert_eq!(set.contained_in(Region::new(0, 20)).count(), 2);

        let dropped = set.compact();
        assert_eq!(dropped, vec![Range::new(5, 2, "b")]);
        assert_eq!(set.len(), 2);
        assert!(set.compact().is_empty());
    }

    #[test]
    fn remove_at_returns_entry() {
        let mut set = set(&[(0, 2, "a"), (5, 2, "b")]);
        assert_eq!(set.remove_at(0), Range::new(0, 2, "a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn contained_in_skips_ranges_crossing_the_region_edges() {
        let set = set(&[(0, 4, "a"), (5, 2, "b"), (8, 2, "c"), (9, 4, "d")]);
        let inside: Vec<_> = set.contained_in(Region::new(2, 9)).cloned().collect();
        assert_eq!(inside, vec![Range::new(5, 2, "b"), Range::new(8, 2, "c")]);
    }

    #[test]
    fn overlapping_includes_ranges_reaching_into_region() {
        let set = set(&[(0, 4, "a"), (5, 2, "b"), (9, 4, "d"), (20, 1, "e")]);
        let hits = set.overlapping(Region::new(2, 8));
        assert_eq!(
            hits,
            vec![Range::new(0, 4, "a"), Range::new(5, 2, "b"), Range::new(9, 4, "d")]
        );
        assert!(set.overlapping(Region::new(14, 3)).is_empty());
    }

    #[test]
    fn from_unsorted_sorts() {
        let set = RangeSet::from_unsorted(vec![Range::new(9, 1, "b"), Range::new(1, 1, "a")]);
        assert!(set.is_sorted());
        assert_eq!(set.get(0).map(|r| r.offset), Some(1));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "offset ordering")]
    fn from_sorted_rejects_unsorted_input_in_debug() {
        let _ = RangeSet::from_sorted(vec![Range::new(9, 1, "b"), Range::new(1, 1, "a")]);
    }
}
