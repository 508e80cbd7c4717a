//! Core value types: highlighted ranges, edits and regions.
//!
//! All offsets and lengths are UTF-8 byte offsets into the document text.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing range identity
static NEXT_RANGE_ID: AtomicU64 = AtomicU64::new(1);

fn next_range_id() -> RangeId {
    RangeId(NEXT_RANGE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Identity of one tracked range.
///
/// Two ranges may be semantically equal (same offset, length and tag) while
/// having different identities. Reconciliation keeps the identity of ranges
/// that survive unchanged so the host can skip repainting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RangeId(u64);

impl RangeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Highlight category of a range, e.g. "class-name", "field" or "keyword".
///
/// Cloning is cheap; tags are shared between every range of a category.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassificationTag(Arc<str>);

impl ClassificationTag {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClassificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for ClassificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ClassificationTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassificationTag {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl AsRef<str> for ClassificationTag {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for ClassificationTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ClassificationTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// One highlighted token.
///
/// Equality compares `(offset, length, tag)` only; identity lives in
/// [`Range::id`].
#[derive(Debug, Clone, Serialize)]
pub struct Range {
    pub offset: usize,
    pub length: usize,
    pub tag: ClassificationTag,
    /// Tombstone flag. Deleted ranges are invisible to lookups and painting.
    #[serde(skip)]
    pub deleted: bool,
    id: RangeId,
}

impl Range {
    /// Create a live range with a fresh identity.
    pub fn new(offset: usize, length: usize, tag: impl Into<ClassificationTag>) -> Self {
        Self {
            offset,
            length,
            tag: tag.into(),
            deleted: false,
            id: next_range_id(),
        }
    }

    pub fn id(&self) -> RangeId {
        self.id
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn is_live(&self) -> bool {
        !self.deleted
    }

    /// Whether this live range covers exactly `(offset, length, tag)`.
    pub fn is_equal(&self, offset: usize, length: usize, tag: &ClassificationTag) -> bool {
        !self.deleted && self.offset == offset && self.length == length && &self.tag == tag
    }

    pub fn region(&self) -> Region {
        Region::new(self.offset, self.length)
    }

    /// Move and resize in place, keeping identity.
    pub(crate) fn update(&mut self, offset: usize, length: usize) {
        self.offset = offset;
        self.length = length;
    }

    /// Tombstone at `offset` with zero length.
    pub(crate) fn delete_at(&mut self, offset: usize) {
        self.deleted = true;
        self.update(offset, 0);
    }
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.length == other.length && self.tag == other.tag
    }
}

impl Eq for Range {}

/// One atomic buffer mutation: replace `removed_length` bytes at `offset`
/// with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    pub offset: usize,
    #[serde(default)]
    pub removed_length: usize,
    #[serde(default)]
    pub text: String,
}

impl Edit {
    pub fn new(offset: usize, removed_length: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            removed_length,
            text: text.into(),
        }
    }

    /// Pure insertion at `offset`.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, 0, text)
    }

    /// Pure deletion of `length` bytes at `offset`.
    pub fn delete(offset: usize, length: usize) -> Self {
        Self::new(offset, length, String::new())
    }

    /// Exclusive end of the removed interval, in pre-edit coordinates.
    pub fn end(&self) -> usize {
        self.offset + self.removed_length
    }

    pub fn inserted_length(&self) -> usize {
        self.text.len()
    }

    /// Net change in document length.
    pub fn delta(&self) -> isize {
        self.inserted_length() as isize - self.removed_length as isize
    }

    /// Region occupied by the inserted text, in post-edit coordinates.
    pub fn inserted_region(&self) -> Region {
        Region::new(self.offset, self.inserted_length())
    }

    /// Apply this edit to a text buffer.
    ///
    /// Returns `None` if the edit is out of bounds or splits a UTF-8 sequence.
    pub fn apply_to(&self, text: &str) -> Option<String> {
        let end = self.end();
        if end > text.len() || !text.is_char_boundary(self.offset) || !text.is_char_boundary(end)
        {
            return None;
        }
        let mut out = String::with_capacity(text.len() - self.removed_length + self.text.len());
        out.push_str(&text[..self.offset]);
        out.push_str(&self.text);
        out.push_str(&text[end..]);
        Some(out)
    }
}

/// A half-open interval `[offset, offset + length)` of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    pub offset: usize,
    pub length: usize,
}

impl Region {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Region spanning `[start, end)`. `end` before `start` yields an empty region.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self::new(start, end.saturating_sub(start))
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `range` lies entirely within this region.
    pub fn contains(&self, range: &Range) -> bool {
        self.offset <= range.offset && range.end() <= self.end()
    }

    /// Whether `range` shares at least one byte with this region.
    ///
    /// Zero-length ranges intersect when they sit inside the region.
    pub fn intersects(&self, range: &Range) -> bool {
        if range.length == 0 {
            return self.offset <= range.offset && range.offset < self.end();
        }
        range.offset < self.end() && self.offset < range.end()
    }

    /// Smallest region covering both.
    pub fn union(&self, other: &Region) -> Region {
        Region::from_bounds(self.offset.min(other.offset), self.end().max(other.end()))
    }
}
