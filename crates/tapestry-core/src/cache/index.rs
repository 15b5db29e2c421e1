//! DOM node to model location lookup.

use std::collections::HashMap;

use tapestry_dom::NodeId;
use tapestry_model::path::visit_blocks;
use tapestry_model::{Block, ContentModelDocument, ModelPath, Segment, SegmentKind, SegmentPath};

/// Maps rendered DOM nodes back to the model nodes they render.
///
/// Segment paths index the model as it is once its selection is cleared:
/// markers do not count, and text runs split from one text node count once.
/// Reconciliation clears the selection before it looks anything up, so the
/// index stays valid across any number of selection moves.
///
/// Entries are hints. Every lookup is checked against the model and the live
/// tree before it is trusted.
#[derive(Debug, Clone, Default)]
pub struct DomIndex {
    /// Text nodes and the segments holding their text, in order.
    pub text_nodes: HashMap<NodeId, Vec<SegmentPath>>,
    /// `br`, `img` and entity wrappers.
    pub segments: HashMap<NodeId, SegmentPath>,
    pub paragraphs: HashMap<NodeId, ModelPath>,
    pub tables: HashMap<NodeId, ModelPath>,
}

impl DomIndex {
    pub fn build(model: &ContentModelDocument) -> Self {
        let mut index = Self::default();
        visit_blocks(model, |path, block| match block {
            Block::Paragraph(paragraph) => {
                if let Some(element) = paragraph.cached_element {
                    index.paragraphs.insert(element, path.clone());
                }
                index.add_segments(path, &paragraph.segments);
            }
            Block::Table(table) => {
                if let Some(element) = table.cached_element {
                    index.tables.insert(element, path.clone());
                }
            }
            _ => {}
        });
        tracing::trace!(
            target: "tapestry::cache",
            text_nodes = index.text_nodes.len(),
            segments = index.segments.len(),
            paragraphs = index.paragraphs.len(),
            tables = index.tables.len(),
            "indexed model"
        );
        index
    }

    fn add_segments(&mut self, paragraph: &ModelPath, segments: &[Segment]) {
        let mut last_kept: Option<&Segment> = None;
        let mut position = 0;
        for segment in segments {
            if segment.is_marker() {
                continue;
            }
            if last_kept.is_some_and(|last| merges_into(last, segment)) {
                continue;
            }
            last_kept = Some(segment);
            if let Some(node) = segment.cached_element {
                let path = SegmentPath::new(paragraph.clone(), position);
                match segment.kind {
                    SegmentKind::Text { .. } => self.text_nodes.entry(node).or_default().push(path),
                    SegmentKind::Br | SegmentKind::Image(_) | SegmentKind::Entity(_) => {
                        self.segments.insert(node, path);
                    }
                    SegmentKind::SelectionMarker | SegmentKind::General { .. } => {}
                }
            }
            position += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text_nodes.is_empty() && self.segments.is_empty() && self.paragraphs.is_empty() && self.tables.is_empty()
    }
}

/// `segment` is the tail of a text run that clearing the selection joins
/// back onto `last`.
fn merges_into(last: &Segment, segment: &Segment) -> bool {
    last.cached_element.is_some()
        && last.cached_element == segment.cached_element
        && last.same_decoration(segment)
        && last.as_text().is_some()
        && segment.as_text().is_some()
}

#[cfg(test)]
mod tests {
    use tapestry_dom::Dom;
    use tapestry_model::selection::clear_selection;
    use tapestry_model::{Format, Paragraph, PathStep};

    use super::*;

    fn text(node: NodeId, value: &str) -> Segment {
        let mut segment = Segment::text(value, Format::default());
        segment.cached_element = Some(node);
        segment
    }

    #[test]
    fn test_split_runs_index_like_cleared_model() {
        let mut dom = Dom::new();
        let hello = dom.create_text("hello");
        let world = dom.create_text("world");
        let br = dom.create_element("br");
        let mut br_segment = Segment::br(Format::default());
        br_segment.cached_element = Some(br);
        let segments = vec![
            text(hello, "he"),
            Segment::selection_marker(Format::default()),
            text(hello, "llo"),
            br_segment,
            text(world, "world"),
        ];
        let mut model = ContentModelDocument::with_blocks(vec![Block::Paragraph(
            Paragraph::new(false, Format::default()).with_segments(segments),
        )]);

        let index = DomIndex::build(&model);
        let paragraph = vec![PathStep::Block(0)];
        assert_eq!(index.text_nodes[&hello], vec![SegmentPath::new(paragraph.clone(), 0)]);
        assert_eq!(index.segments[&br], SegmentPath::new(paragraph.clone(), 1));
        assert_eq!(index.text_nodes[&world], vec![SegmentPath::new(paragraph.clone(), 2)]);

        clear_selection(&mut model);
        let cleared = model.blocks[0].as_paragraph().unwrap();
        assert_eq!(cleared.segments[0].as_text(), Some("hello"));
        assert_eq!(cleared.segments[2].as_text(), Some("world"));
    }

    #[test]
    fn test_differently_formatted_runs_stay_apart() {
        let mut dom = Dom::new();
        let node = dom.create_text("ab");
        let mut bold = text(node, "b");
        bold.format.font_weight = Some("bold".into());
        let model = ContentModelDocument::with_blocks(vec![Block::Paragraph(
            Paragraph::new(true, Format::default()).with_segments(vec![text(node, "a"), bold]),
        )]);
        let index = DomIndex::build(&model);
        assert_eq!(index.text_nodes[&node].len(), 2);
        assert!(index.paragraphs.is_empty());
    }
}
