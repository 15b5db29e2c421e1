//! Plain text extraction.

use tapestry_dom::Dom;

use crate::block::{Block, GroupKind};
use crate::document::ContentModelDocument;
use crate::segment::SegmentKind;

/// Separator between paragraphs, and the text of a line break.
pub const LINE_SEPARATOR: &str = "\r\n";

/// Plain text of a model.
///
/// Blocks are separated by `\r\n`, table cells by tabs. Entities contribute
/// the text of their wrapper; images contribute nothing.
pub fn content_model_to_text(model: &ContentModelDocument, dom: &Dom) -> String {
    let mut lines = Vec::new();
    blocks_to_text(&model.blocks, dom, &mut lines);
    lines.join(LINE_SEPARATOR)
}

fn blocks_to_text(blocks: &[Block], dom: &Dom, lines: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                let mut line = String::new();
                for segment in &paragraph.segments {
                    match &segment.kind {
                        SegmentKind::Text { text } => line.push_str(text),
                        SegmentKind::Br => line.push_str(LINE_SEPARATOR),
                        SegmentKind::Entity(entity) => line.push_str(&dom.text_content(entity.wrapper)),
                        SegmentKind::General { blocks, .. } => {
                            let mut inner = Vec::new();
                            blocks_to_text(blocks, dom, &mut inner);
                            line.push_str(&inner.join(LINE_SEPARATOR));
                        }
                        SegmentKind::Image(_) | SegmentKind::SelectionMarker => {}
                    }
                }
                lines.push(line);
            }
            Block::Table(table) => {
                for row in &table.rows {
                    let cells: Vec<String> = row
                        .cells
                        .iter()
                        .filter(|cell| !cell.is_placeholder())
                        .map(|cell| {
                            let mut inner = Vec::new();
                            blocks_to_text(&cell.blocks, dom, &mut inner);
                            inner.join(" ")
                        })
                        .collect();
                    lines.push(cells.join("\t"));
                }
            }
            Block::Divider(_) => lines.push(String::new()),
            Block::Entity(entity) => lines.push(dom.text_content(entity.wrapper)),
            Block::BlockGroup(group) => match &group.kind {
                GroupKind::General { element } if group.blocks.is_empty() => {
                    lines.push(dom.text_content(*element))
                }
                _ => blocks_to_text(&group.blocks, dom, lines),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Paragraph;
    use crate::entity::{Entity, EntityInfo};
    use crate::format::Format;
    use crate::segment::Segment;
    use crate::table::{Table, TableCell};

    fn para(text: &str) -> Block {
        Block::Paragraph(
            Paragraph::new(false, Format::default()).with_segments(vec![Segment::text(text, Format::default())]),
        )
    }

    #[test]
    fn test_text_of_mixed_model() {
        let mut dom = Dom::new();
        let wrapper = dom.create_element("span");
        let inner = dom.create_text("@bob");
        dom.append_child(wrapper, inner).unwrap();

        let mut table = Table::new(1, Format::default());
        let mut a = TableCell::default();
        a.blocks.push(para("x"));
        let mut b = TableCell::default();
        b.blocks.push(para("y"));
        table.rows[0].cells = vec![a, TableCell::new(true, false, false, Format::default()), b];

        let mut mention = Paragraph::new(false, Format::default());
        mention.segments.push(Segment::text("hi ", Format::default()));
        mention.segments.push(Segment::entity(Entity::new(
            wrapper,
            EntityInfo::default(),
            Format::default(),
        )));
        mention.segments.push(Segment::image("a.png", Format::default()));

        let model = ContentModelDocument::with_blocks(vec![
            para("first"),
            Block::Table(table),
            Block::Paragraph(mention),
        ]);
        insta::assert_debug_snapshot!(content_model_to_text(&model, &dom), @r#""first\r\nx\ty\r\nhi @bob""#);
    }
}
