//! Blocks and block groups.

use serde::Serialize;
use smol_str::SmolStr;
use tapestry_dom::NodeId;

use crate::entity::Entity;
use crate::format::Format;
use crate::list::ListLevel;
use crate::segment::{Segment, SegmentKind};
use crate::table::Table;

/// A top-level content unit inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "blockType")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Divider(Divider),
    Entity(Entity),
    BlockGroup(BlockGroup),
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Block::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&BlockGroup> {
        match self {
            Block::BlockGroup(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut BlockGroup> {
        match self {
            Block::BlockGroup(g) => Some(g),
            _ => None,
        }
    }

    pub fn format(&self) -> &Format {
        match self {
            Block::Paragraph(p) => &p.format,
            Block::Table(t) => &t.format,
            Block::Divider(d) => &d.format,
            Block::Entity(e) => &e.format,
            Block::BlockGroup(g) => &g.format,
        }
    }

    pub fn format_mut(&mut self) -> &mut Format {
        match self {
            Block::Paragraph(p) => &mut p.format,
            Block::Table(t) => &mut t.format,
            Block::Divider(d) => &mut d.format,
            Block::Entity(e) => &mut e.format,
            Block::BlockGroup(g) => &mut g.format,
        }
    }

    /// The DOM node this block was last rendered into, if any.
    ///
    /// Entities report their wrapper, which they own rather than cache.
    pub fn cached_element(&self) -> Option<NodeId> {
        match self {
            Block::Paragraph(p) => p.cached_element,
            Block::Table(t) => t.cached_element,
            Block::Divider(d) => d.cached_element,
            Block::Entity(e) => Some(e.wrapper),
            Block::BlockGroup(g) => g.cached_element,
        }
    }

    /// Drop this block's back-reference. Entities keep their wrapper.
    pub fn clear_cached_element(&mut self) {
        match self {
            Block::Paragraph(p) => p.cached_element = None,
            Block::Table(t) => {
                t.cached_element = None;
                for row in &mut t.rows {
                    row.cached_element = None;
                }
            }
            Block::Divider(d) => d.cached_element = None,
            Block::Entity(_) => {}
            Block::BlockGroup(g) => g.cached_element = None,
        }
    }
}

/// Wrapper tag a paragraph renders with, such as `p` or `h1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphDecorator {
    pub tag: SmolStr,
    pub format: Format,
}

/// A run of segments.
///
/// Implicit paragraphs hold inline content that had no block wrapper in the
/// source; they render without one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub segments: Vec<Segment>,
    pub format: Format,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_format: Option<Format>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decorator: Option<ParagraphDecorator>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_implicit: bool,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

impl Paragraph {
    pub fn new(is_implicit: bool, format: Format) -> Self {
        Self {
            is_implicit,
            format,
            ..Default::default()
        }
    }

    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }

    /// Plain text of the text segments.
    pub fn text(&self) -> String {
        self.segments.iter().filter_map(Segment::as_text).collect()
    }

    pub fn has_selection(&self) -> bool {
        self.segments.iter().any(|s| s.is_selected)
    }

    pub fn has_general_segment(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s.kind, SegmentKind::General { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Divider {
    pub tag: SmolStr,
    pub format: Format,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_selected: bool,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

impl Divider {
    pub fn new(tag: &str, format: Format) -> Self {
        Self {
            tag: SmolStr::new(tag),
            format,
            is_selected: false,
            cached_element: None,
        }
    }
}

/// Per-item list data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    /// Nesting chain, outermost list first.
    pub levels: Vec<ListLevel>,
    /// Carries the item's segment format even when it has no segments.
    pub format_holder: Segment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "blockGroupType")]
pub enum GroupKind {
    FormatContainer {
        tag: SmolStr,
    },
    ListItem(ListItem),
    /// Unrecognized block element, kept as a shallow clone.
    General {
        #[serde(skip)]
        element: NodeId,
    },
}

/// A block that owns child blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockGroup {
    #[serde(flatten)]
    pub kind: GroupKind,
    pub blocks: Vec<Block>,
    pub format: Format,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

impl BlockGroup {
    pub fn format_container(tag: &str, format: Format) -> Self {
        Self {
            kind: GroupKind::FormatContainer {
                tag: SmolStr::new(tag),
            },
            blocks: Vec::new(),
            format,
            cached_element: None,
        }
    }

    /// New list item. Levels are cloned so later edits to the source stack do
    /// not leak into the item.
    pub fn list_item(levels: &[ListLevel], segment_format: Format) -> Self {
        let mut format_holder = Segment::selection_marker(segment_format);
        format_holder.is_selected = false;
        Self {
            kind: GroupKind::ListItem(ListItem {
                levels: levels
                    .iter()
                    .map(|level| ListLevel {
                        cached_element: None,
                        ..level.clone()
                    })
                    .collect(),
                format_holder,
            }),
            blocks: Vec::new(),
            format: Format::default(),
            cached_element: None,
        }
    }

    pub fn general(element: NodeId, format: Format) -> Self {
        Self {
            kind: GroupKind::General { element },
            blocks: Vec::new(),
            format,
            cached_element: None,
        }
    }

    pub fn as_list_item(&self) -> Option<&ListItem> {
        match &self.kind {
            GroupKind::ListItem(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_list_item_mut(&mut self) -> Option<&mut ListItem> {
        match &mut self.kind {
            GroupKind::ListItem(item) => Some(item),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ListType;

    #[test]
    fn test_list_item_clones_levels_without_cache() {
        let mut level = ListLevel::new(ListType::Ordered, Format::default());
        level.cached_element = None;
        let item = BlockGroup::list_item(&[level.clone()], Format::default());
        let list = item.as_list_item().unwrap();
        assert_eq!(list.levels, vec![level]);
        assert!(!list.format_holder.is_selected);
        assert!(list.format_holder.is_marker());
    }

    #[test]
    fn test_paragraph_text() {
        let p = Paragraph::new(false, Format::default()).with_segments(vec![
            Segment::text("a", Format::default()),
            Segment::selection_marker(Format::default()),
            Segment::text("b", Format::default()),
        ]);
        assert_eq!(p.text(), "ab");
        assert!(p.has_selection());
    }

    #[test]
    fn test_block_serializes_with_tag() {
        let block = Block::Paragraph(Paragraph::new(true, Format::default()));
        assert_eq!(
            serde_json::to_string(&block).unwrap(),
            r#"{"blockType":"Paragraph","segments":[],"format":{},"isImplicit":true}"#
        );
    }
}
