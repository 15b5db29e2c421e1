//! Clean-up pass over a freshly parsed model.

use tapestry_model::{Block, ContentModelDocument, Format, Paragraph, Segment, SegmentKind};

const NBSP: char = '\u{a0}';

pub(crate) fn normalize(doc: &mut ContentModelDocument) {
    normalize_group(&mut doc.blocks);
}

fn normalize_group(blocks: &mut Vec<Block>) {
    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(paragraph) => normalize_paragraph(paragraph),
            Block::BlockGroup(group) => normalize_group(&mut group.blocks),
            Block::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                    normalize_group(&mut cell.blocks);
                }
            }
            Block::Divider(_) | Block::Entity(_) => {}
        }
    }
    if blocks.len() > 1 {
        blocks.retain(|block| !matches!(block, Block::Paragraph(p) if p.is_implicit && p.segments.is_empty()));
    }
}

fn normalize_paragraph(paragraph: &mut Paragraph) {
    for segment in &mut paragraph.segments {
        if let SegmentKind::General { blocks, .. } = &mut segment.kind {
            normalize_group(blocks);
        }
    }

    let preserves_space = paragraph
        .format
        .white_space
        .as_deref()
        .is_some_and(|ws| ws.starts_with("pre"));
    // A trailing space before the block boundary would be dropped by the
    // next parse, so it is pinned as a non-breaking space.
    if let Some(text) = paragraph
        .segments
        .iter_mut()
        .rev()
        .find(|s| !s.is_marker())
        .and_then(Segment::as_text_mut)
        .filter(|_| !preserves_space)
    {
        if text.ends_with(' ') {
            text.pop();
            text.push(NBSP);
        }
    }

    let has_selected_content = paragraph.segments.iter().any(|s| s.is_selected && !s.is_marker());
    if has_selected_content {
        paragraph.segments.retain(|s| !s.is_marker());
    }

    let only_markers = !paragraph.segments.is_empty() && paragraph.segments.iter().all(Segment::is_marker);
    if only_markers && !paragraph.is_implicit {
        let format = paragraph
            .segments
            .last()
            .map(|marker| marker.format.clone())
            .unwrap_or_else(Format::default);
        paragraph.segments.push(Segment::br(format));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Segment {
        Segment::text(value, Format::default())
    }

    #[test]
    fn test_trailing_space_becomes_nbsp() {
        let mut paragraph = Paragraph::new(false, Format::default())
            .with_segments(vec![text("a "), Segment::selection_marker(Format::default())]);
        normalize_paragraph(&mut paragraph);
        assert_eq!(paragraph.segments[0].as_text(), Some("a\u{a0}"));
    }

    #[test]
    fn test_marker_only_paragraph_gets_br() {
        let mut paragraph =
            Paragraph::new(false, Format::default()).with_segments(vec![Segment::selection_marker(Format::default())]);
        normalize_paragraph(&mut paragraph);
        assert_eq!(paragraph.segments.len(), 2);
        assert_eq!(paragraph.segments[1].kind, SegmentKind::Br);
    }

    #[test]
    fn test_markers_dropped_next_to_selected_content() {
        let mut selected = text("b");
        selected.is_selected = true;
        let mut paragraph = Paragraph::new(false, Format::default()).with_segments(vec![
            text("a"),
            Segment::selection_marker(Format::default()),
            selected,
            Segment::selection_marker(Format::default()),
        ]);
        normalize_paragraph(&mut paragraph);
        assert_eq!(paragraph.segments.len(), 2);
        assert!(paragraph.segments.iter().all(|s| !s.is_marker()));
    }

    #[test]
    fn test_lone_empty_implicit_paragraph_is_kept() {
        let mut blocks = vec![Block::Paragraph(Paragraph::new(true, Format::default()))];
        normalize_group(&mut blocks);
        assert_eq!(blocks.len(), 1);

        blocks.push(Block::Paragraph(Paragraph::new(false, Format::default())));
        normalize_group(&mut blocks);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].as_paragraph().unwrap().is_implicit);
    }
}
