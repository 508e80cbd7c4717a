//! Turning tracked ranges into paint instructions for the host.

use crate::config::{StyleMap, TagStyle};
use crate::range::{ClassificationTag, Range, Region};
use crate::range_set::RangeSet;
use serde::Serialize;
use std::collections::HashMap;

/// Resolved styles keyed by classification tag.
///
/// Tags without an entry are painted with [`TagStyle::default`].
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    styles: HashMap<ClassificationTag, TagStyle>,
}

impl StyleTable {
    pub fn new(styles: &StyleMap) -> Self {
        Self {
            styles: styles
                .iter()
                .map(|(tag, style)| (ClassificationTag::new(tag), style.clone()))
                .collect(),
        }
    }

    /// Style to paint `tag` with, or `None` when the tag is disabled.
    pub fn style_for(&self, tag: &ClassificationTag) -> Option<TagStyle> {
        match self.styles.get(tag) {
            Some(style) if !style.enabled => None,
            Some(style) => Some(style.clone()),
            None => Some(TagStyle::default()),
        }
    }

    pub fn is_enabled(&self, tag: &ClassificationTag) -> bool {
        self.styles.get(tag).is_none_or(|style| style.enabled)
    }
}

/// Paint one range with one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleInstruction {
    pub offset: usize,
    pub length: usize,
    pub tag: ClassificationTag,
    pub style: TagStyle,
}

/// What the host has to do to bring its display up to date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaintUpdate {
    /// Clear styling in `region` and paint `instructions` into it.
    Styles {
        region: Region,
        instructions: Vec<StyleInstruction>,
    },
    /// Repaint these regions without highlighting.
    Invalidate { regions: Vec<Region> },
}

impl PaintUpdate {
    pub fn is_empty(&self) -> bool {
        match self {
            PaintUpdate::Styles {
                region,
                instructions,
            } => region.is_empty() && instructions.is_empty(),
            PaintUpdate::Invalidate { regions } => regions.is_empty(),
        }
    }
}

/// Style instructions for every live range lying entirely inside `region`.
///
/// Ranges that only partially overlap the region are skipped; the host
/// repaints them when their own region is damaged.
pub fn styles_for_region(
    set: &RangeSet,
    region: Region,
    styles: &StyleTable,
) -> Vec<StyleInstruction> {
    set.contained_in(region)
        .filter_map(|range| instruction(range, styles))
        .collect()
}

/// Style instructions for every live range.
pub fn styles_for_all(set: &RangeSet, styles: &StyleTable) -> Vec<StyleInstruction> {
    set.iter()
        .filter_map(|range| instruction(range, styles))
        .collect()
}

fn instruction(range: &Range, styles: &StyleTable) -> Option<StyleInstruction> {
    if range.length == 0 {
        return None;
    }
    styles.style_for(&range.tag).map(|style| StyleInstruction {
        offset: range.offset,
        length: range.length,
        tag: range.tag.clone(),
        style,
    })
}

/// Regions of every live range tagged `tag`.
pub fn regions_with_tag(set: &RangeSet, tag: &ClassificationTag) -> Vec<Region> {
    set.iter()
        .filter(|range| &range.tag == tag)
        .map(Range::region)
        .collect()
}

/// Regions of every live range; used to unpaint a document.
pub fn live_regions(set: &RangeSet) -> Vec<Region> {
    set.iter().map(Range::region).collect()
}

/// Paint update covering the smallest region spanning `set`.
pub fn full_update(set: &RangeSet, styles: &StyleTable) -> Option<PaintUpdate> {
    let mut live = set.iter();
    let first = live.next()?;
    let end = set.iter().map(Range::end).max().unwrap_or(first.end());
    Some(PaintUpdate::Styles {
        region: Region::from_bounds(first.offset, end),
        instructions: styles_for_all(set, styles),
    })
}
