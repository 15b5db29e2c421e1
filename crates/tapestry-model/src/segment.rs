//! Inline content: segments and their decorators.

use std::collections::BTreeMap;

use serde::Serialize;
use tapestry_dom::NodeId;

use crate::block::Block;
use crate::entity::Entity;
use crate::format::Format;

/// `data-*` attributes keyed without the `data-` prefix.
pub type Dataset = BTreeMap<String, String>;

/// Hyperlink decorator shared by the segments of one anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Link {
    pub format: Format,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dataset: Dataset,
}

/// Inline code decorator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Code {
    pub format: Format,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dataset: Dataset,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_selected_as_image_selection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "segmentType")]
pub enum SegmentKind {
    Text {
        text: String,
    },
    Image(Image),
    Br,
    SelectionMarker,
    Entity(Entity),
    /// Unrecognized inline element, kept as a shallow clone plus parsed children.
    General {
        #[serde(skip)]
        element: NodeId,
        blocks: Vec<Block>,
    },
}

/// One inline unit inside a paragraph.
///
/// `cached_element` is the text node, `img` or wrapper a segment was last
/// rendered into or parsed from. It only serves selection lookup; paragraphs
/// own reuse decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(flatten)]
    pub kind: SegmentKind,
    pub format: Format,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Code>,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

impl Segment {
    fn with_kind(kind: SegmentKind, format: Format) -> Self {
        Self {
            kind,
            format,
            is_selected: false,
            link: None,
            code: None,
            cached_element: None,
        }
    }

    pub fn text(text: impl Into<String>, format: Format) -> Self {
        Self::with_kind(SegmentKind::Text { text: text.into() }, format)
    }

    pub fn br(format: Format) -> Self {
        Self::with_kind(SegmentKind::Br, format)
    }

    /// Selection markers are always selected.
    pub fn selection_marker(format: Format) -> Self {
        let mut marker = Self::with_kind(SegmentKind::SelectionMarker, format);
        marker.is_selected = true;
        marker
    }

    pub fn image(src: impl Into<String>, format: Format) -> Self {
        Self::with_kind(
            SegmentKind::Image(Image {
                src: src.into(),
                ..Default::default()
            }),
            format,
        )
    }

    pub fn entity(entity: Entity) -> Self {
        let format = entity.format.clone();
        Self::with_kind(SegmentKind::Entity(entity), format)
    }

    pub fn general(element: NodeId, format: Format) -> Self {
        Self::with_kind(
            SegmentKind::General {
                element,
                blocks: Vec::new(),
            },
            format,
        )
    }

    pub fn with_link(mut self, link: Option<Link>) -> Self {
        self.link = link;
        self
    }

    pub fn with_code(mut self, code: Option<Code>) -> Self {
        self.code = code;
        self
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.kind, SegmentKind::SelectionMarker)
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut String> {
        match &mut self.kind {
            SegmentKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match &self.kind {
            SegmentKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut Image> {
        match &mut self.kind {
            SegmentKind::Image(image) => Some(image),
            _ => None,
        }
    }

    /// True when two segments may share one run of text.
    pub fn same_decoration(&self, other: &Segment) -> bool {
        self.format == other.format && self.link == other.link && self.code == other.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_is_selected() {
        let marker = Segment::selection_marker(Format::default());
        assert!(marker.is_selected);
        assert!(marker.is_marker());
    }

    #[test]
    fn test_segment_serializes_flat() {
        let segment = Segment::text("hi", Format::default());
        assert_eq!(
            serde_json::to_string(&segment).unwrap(),
            r#"{"segmentType":"Text","text":"hi","format":{}}"#
        );
    }

    #[test]
    fn test_same_decoration_compares_link() {
        let plain = Segment::text("a", Format::default());
        let linked = Segment::text("b", Format::default()).with_link(Some(Link::default()));
        assert!(!plain.same_decoration(&linked));
        assert!(plain.same_decoration(&Segment::text("c", Format::default())));
    }
}
