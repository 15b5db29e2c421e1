//! Selection as it is mirrored onto the model.
//!
//! A range lives in `is_selected` flags on segments and blocks; a collapsed
//! caret is a selected [`SegmentKind::SelectionMarker`]. Image selections also
//! set `is_selected_as_image_selection`, table selections flag cells.

use crate::block::Block;
use crate::document::ContentModelDocument;
use crate::format::Format;
use crate::path::{ModelPath, PathStep, SegmentPath, block_at, block_at_mut, paragraph_paths, visit_blocks, visit_blocks_mut};
use crate::segment::{Segment, SegmentKind};

/// A boundary inside a paragraph: `offset` chars into segment `index`.
///
/// `offset` only means something for text segments; for everything else the
/// point sits before the segment. `index == segments.len()` is the end.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BoundaryPoint {
    pub paragraph: ModelPath,
    pub index: usize,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(paragraph: ModelPath, index: usize, offset: usize) -> Self {
        Self {
            paragraph,
            index,
            offset,
        }
    }
}

/// Where a selection lands in a model, one variant per selection shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedItem {
    /// Selected segments of one paragraph.
    Segments {
        paragraph: ModelPath,
        indexes: Vec<usize>,
    },
    /// A table with at least one selected cell.
    Table(ModelPath),
    /// A selected divider or block entity.
    Block(ModelPath),
}

/// Drop every selection flag and marker.
///
/// Adjacent text runs that were split only to carry a selection are merged
/// back when they still back the same text node.
pub fn clear_selection(doc: &mut ContentModelDocument) {
    doc.has_reverted_range_selection = false;
    visit_blocks_mut(doc, |_, block| match block {
        Block::Paragraph(paragraph) => {
            let had_markers = paragraph.segments.iter().any(Segment::is_marker);
            let marker_format = paragraph
                .segments
                .iter()
                .find(|s| s.is_marker())
                .map(|s| s.format.clone());
            paragraph.segments.retain(|s| !s.is_marker());
            for segment in &mut paragraph.segments {
                segment.is_selected = false;
                if let Some(image) = segment.as_image_mut() {
                    image.is_selected_as_image_selection = false;
                }
                if let SegmentKind::Entity(entity) = &mut segment.kind {
                    entity.is_selected = false;
                }
            }
            merge_split_text(&mut paragraph.segments);
            if had_markers && paragraph.segments.is_empty() {
                paragraph
                    .segments
                    .push(Segment::br(marker_format.unwrap_or_default()));
                paragraph.cached_element = None;
            }
        }
        Block::Table(table) => {
            for row in &mut table.rows {
                for cell in &mut row.cells {
                    cell.is_selected = false;
                }
            }
        }
        Block::Divider(divider) => divider.is_selected = false,
        Block::Entity(entity) => entity.is_selected = false,
        Block::BlockGroup(group) => {
            if let Some(item) = group.as_list_item_mut() {
                item.format_holder.is_selected = false;
            }
        }
    });
}

fn merge_split_text(segments: &mut Vec<Segment>) {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments.drain(..) {
        if let Some(last) = merged.last_mut() {
            let same_node = last.cached_element.is_some() && last.cached_element == segment.cached_element;
            if same_node && last.same_decoration(&segment) {
                if let (Some(text), Some(more)) = (last.as_text_mut(), segment.as_text()) {
                    text.push_str(more);
                    continue;
                }
            }
        }
        merged.push(segment);
    }
    *segments = merged;
}

/// Split the text segment at `index` after `offset` chars.
///
/// Returns the index of the first segment after the split point. Both halves
/// keep the original `cached_element`.
pub fn split_text_at(segments: &mut Vec<Segment>, index: usize, offset: usize) -> usize {
    let Some(segment) = segments.get(index) else {
        return segments.len();
    };
    let Some(text) = segment.as_text() else {
        return index;
    };
    let len = text.chars().count();
    if offset == 0 {
        return index;
    }
    if offset >= len {
        return index + 1;
    }
    let byte = text
        .char_indices()
        .nth(offset)
        .map(|(b, _)| b)
        .unwrap_or(text.len());
    let mut tail = segment.clone();
    if let Some(tail_text) = tail.as_text_mut() {
        *tail_text = tail_text[byte..].to_string();
    }
    if let Some(head_text) = segments[index].as_text_mut() {
        head_text.truncate(byte);
    }
    segments.insert(index + 1, tail);
    index + 1
}

/// Mirror a range onto the model. Clears any previous selection first.
///
/// Boundaries must index the model as [`clear_selection`] leaves it, which is
/// a no-op on a model without selection.
///
/// A collapsed range becomes a selection marker carrying the format of the
/// segment before it. Returns `false` when a boundary does not name a
/// paragraph.
pub fn select_range(
    doc: &mut ContentModelDocument,
    start: &BoundaryPoint,
    end: &BoundaryPoint,
    is_reverted: bool,
) -> bool {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    if block_at(doc, &start.paragraph).and_then(Block::as_paragraph).is_none()
        || block_at(doc, &end.paragraph).and_then(Block::as_paragraph).is_none()
    {
        return false;
    }
    clear_selection(doc);

    if start == end {
        let Some(paragraph) = block_at_mut(doc, &start.paragraph).and_then(Block::as_paragraph_mut) else {
            return false;
        };
        let at = split_text_at(&mut paragraph.segments, start.index, start.offset);
        let format = at
            .checked_sub(1)
            .and_then(|i| paragraph.segments.get(i))
            .or_else(|| paragraph.segments.get(at))
            .map(|s| s.format.clone())
            .unwrap_or_default();
        let mut marker = Segment::selection_marker(format);
        if let Some(neighbor) = at.checked_sub(1).and_then(|i| paragraph.segments.get(i)) {
            marker.link = neighbor.link.clone();
            marker.code = neighbor.code.clone();
        }
        paragraph.segments.insert(at.min(paragraph.segments.len()), marker);
        return true;
    }

    // Split the end first so start indexes stay valid within one paragraph.
    let end_at = {
        let Some(paragraph) = block_at_mut(doc, &end.paragraph).and_then(Block::as_paragraph_mut) else {
            return false;
        };
        split_text_at(&mut paragraph.segments, end.index, end.offset)
    };
    let (start_at, end_at) = {
        let Some(paragraph) = block_at_mut(doc, &start.paragraph).and_then(Block::as_paragraph_mut) else {
            return false;
        };
        let before = paragraph.segments.len();
        let start_at = split_text_at(&mut paragraph.segments, start.index, start.offset);
        let shifted = start.paragraph == end.paragraph && paragraph.segments.len() > before;
        (start_at, if shifted { end_at + 1 } else { end_at })
    };

    let first = SegmentPath::new(start.paragraph.clone(), start_at);
    let last = SegmentPath::new(end.paragraph.clone(), end_at);
    flag_between(doc, &first, &last);
    // A range that covers no segment of a boundary paragraph, such as one
    // ending at the very start of the next line, still needs an anchor there.
    anchor_if_unselected(doc, &end.paragraph, end_at);
    if start.paragraph != end.paragraph {
        anchor_if_unselected(doc, &start.paragraph, start_at);
    }
    doc.has_reverted_range_selection = is_reverted;
    true
}

fn anchor_if_unselected(doc: &mut ContentModelDocument, paragraph: &[PathStep], at: usize) {
    let Some(paragraph) = block_at_mut(doc, paragraph).and_then(Block::as_paragraph_mut) else {
        return;
    };
    if paragraph.has_selection() {
        return;
    }
    let format = at
        .checked_sub(1)
        .and_then(|i| paragraph.segments.get(i))
        .or_else(|| paragraph.segments.get(at))
        .map(|s| s.format.clone())
        .unwrap_or_default();
    let at = at.min(paragraph.segments.len());
    paragraph.segments.insert(at, Segment::selection_marker(format));
}

/// Flag every segment in `[first, last)` and every divider or entity whose
/// position falls between the two paragraphs.
fn flag_between(doc: &mut ContentModelDocument, first: &SegmentPath, last: &SegmentPath) {
    visit_blocks_mut(doc, |path, block| match block {
        Block::Paragraph(paragraph) => {
            for (index, segment) in paragraph.segments.iter_mut().enumerate() {
                let here = SegmentPath::new(path.clone(), index);
                if &here >= first && &here < last {
                    segment.is_selected = true;
                }
            }
        }
        Block::Divider(divider) => {
            divider.is_selected = path > &first.paragraph && path < &last.paragraph;
        }
        Block::Entity(entity) => {
            entity.is_selected = path > &first.paragraph && path < &last.paragraph;
        }
        _ => {}
    });
}

/// Select every segment from `first` through `last`, both inclusive.
///
/// Other flags are cleared. Markers outside the range are removed, and so are
/// markers inside it once real content is selected. Text runs are left split.
pub fn set_selection(doc: &mut ContentModelDocument, first: &SegmentPath, last: &SegmentPath) {
    let (first, last) = if first <= last { (first, last) } else { (last, first) };
    let mut has_content = false;
    visit_blocks_mut(doc, |path, block| match block {
        Block::Paragraph(paragraph) => {
            for (index, segment) in paragraph.segments.iter_mut().enumerate() {
                let here = SegmentPath::new(path.clone(), index);
                segment.is_selected = &here >= first && &here <= last;
                has_content |= segment.is_selected && !segment.is_marker();
            }
        }
        Block::Table(table) => table.select_cells(None),
        Block::Divider(divider) => {
            divider.is_selected = path > &first.paragraph && path < &last.paragraph;
        }
        Block::Entity(entity) => {
            entity.is_selected = path > &first.paragraph && path < &last.paragraph;
        }
        Block::BlockGroup(_) => {}
    });
    visit_blocks_mut(doc, |_, block| {
        if let Block::Paragraph(paragraph) = block {
            let before = paragraph.segments.len();
            paragraph
                .segments
                .retain(|s| !s.is_marker() || (s.is_selected && !has_content));
            if before != paragraph.segments.len() && paragraph.segments.is_empty() {
                paragraph.segments.push(Segment::br(Format::default()));
            }
        }
    });
    doc.has_reverted_range_selection = false;
}

/// Put the caret right after the segment at `path`, or before it when
/// `before` is set.
pub fn set_caret_at_segment(doc: &mut ContentModelDocument, path: &SegmentPath, before: bool) -> bool {
    let Some(segment) = crate::path::segment_at(doc, path) else {
        return false;
    };
    let (index, offset) = match (before, segment.as_text()) {
        (true, _) => (path.index, 0),
        (false, Some(text)) => (path.index, text.chars().count()),
        (false, None) => (path.index + 1, 0),
    };
    let point = BoundaryPoint::new(path.paragraph.clone(), index, offset);
    select_range(doc, &point, &point, false)
}

/// Select the image segment at `path`.
pub fn select_image(doc: &mut ContentModelDocument, path: &SegmentPath) -> bool {
    if crate::path::segment_at(doc, path)
        .and_then(Segment::as_image)
        .is_none()
    {
        return false;
    }
    clear_selection(doc);
    let Some(segment) = crate::path::segment_at_mut(doc, path) else {
        return false;
    };
    segment.is_selected = true;
    if let Some(image) = segment.as_image_mut() {
        image.is_selected_as_image_selection = true;
    }
    true
}

/// Select cells of the table at `path` inside an inclusive grid rectangle.
pub fn select_table_cells(
    doc: &mut ContentModelDocument,
    path: &[PathStep],
    rect: crate::table::CellRect,
) -> bool {
    if block_at(doc, path).and_then(Block::as_table).is_none() {
        return false;
    }
    clear_selection(doc);
    let Some(table) = block_at_mut(doc, path).and_then(Block::as_table_mut) else {
        return false;
    };
    table.select_cells(Some(rect));
    true
}

/// Every selected location, in document order.
///
/// Segments inside selected table cells are reported through the table only.
pub fn collect_selections(doc: &ContentModelDocument) -> Vec<SelectedItem> {
    let mut items = Vec::new();
    let mut selected_tables: Vec<ModelPath> = Vec::new();
    visit_blocks(doc, |path, block| {
        if selected_tables.iter().any(|table| path.starts_with(table) && path.len() > table.len()) {
            return;
        }
        match block {
            Block::Paragraph(paragraph) => {
                let indexes: Vec<usize> = paragraph
                    .segments
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.is_selected)
                    .map(|(i, _)| i)
                    .collect();
                if !indexes.is_empty() {
                    items.push(SelectedItem::Segments {
                        paragraph: path.clone(),
                        indexes,
                    });
                }
            }
            Block::Table(table) if table.selected_cells().is_some() => {
                selected_tables.push(path.clone());
                items.push(SelectedItem::Table(path.clone()));
            }
            Block::Divider(divider) if divider.is_selected => {
                items.push(SelectedItem::Block(path.clone()))
            }
            Block::Entity(entity) if entity.is_selected => items.push(SelectedItem::Block(path.clone())),
            _ => {}
        }
    });
    items
}

/// Paths of the selected segments, markers included.
pub fn selected_segment_paths(doc: &ContentModelDocument) -> Vec<SegmentPath> {
    collect_selections(doc)
        .into_iter()
        .flat_map(|item| match item {
            SelectedItem::Segments { paragraph, indexes } => indexes
                .into_iter()
                .map(|i| SegmentPath::new(paragraph.clone(), i))
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        })
        .collect()
}

/// The selected segments in document order.
pub fn selected_segments(doc: &ContentModelDocument) -> Vec<&Segment> {
    selected_segment_paths(doc)
        .iter()
        .filter_map(|path| crate::path::segment_at(doc, path))
        .collect()
}

/// Paragraphs holding at least one selected segment.
pub fn selected_paragraphs(doc: &ContentModelDocument) -> Vec<ModelPath> {
    collect_selections(doc)
        .into_iter()
        .filter_map(|item| match item {
            SelectedItem::Segments { paragraph, .. } => Some(paragraph),
            _ => None,
        })
        .collect()
}

/// The selection is a single caret.
pub fn is_collapsed(doc: &ContentModelDocument) -> bool {
    let segments = selected_segments(doc);
    segments.len() == 1 && segments[0].is_marker()
}

/// Format at the caret or at the start of the selection.
pub fn pending_format(doc: &ContentModelDocument) -> Option<Format> {
    selected_segments(doc).first().map(|s| s.format.clone())
}

/// Path of the first paragraph in the document, creating none.
pub fn first_paragraph(doc: &ContentModelDocument) -> Option<ModelPath> {
    paragraph_paths(doc).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Paragraph;
    use tapestry_dom::Dom;

    fn paragraph(texts: &[&str]) -> Block {
        Block::Paragraph(
            Paragraph::new(false, Format::default()).with_segments(
                texts
                    .iter()
                    .map(|t| Segment::text(*t, Format::default()))
                    .collect(),
            ),
        )
    }

    fn texts(doc: &ContentModelDocument, block: usize) -> Vec<(String, bool)> {
        doc.blocks[block]
            .as_paragraph()
            .unwrap()
            .segments
            .iter()
            .map(|s| {
                let text = match &s.kind {
                    SegmentKind::Text { text } => text.clone(),
                    SegmentKind::SelectionMarker => "|".to_string(),
                    SegmentKind::Br => "<br>".to_string(),
                    _ => "?".to_string(),
                };
                (text, s.is_selected)
            })
            .collect()
    }

    #[test]
    fn test_collapsed_range_inserts_marker() {
        let mut doc = ContentModelDocument::with_blocks(vec![paragraph(&["hello"])]);
        let point = BoundaryPoint::new(vec![PathStep::Block(0)], 0, 2);
        assert!(select_range(&mut doc, &point, &point, false));
        assert_eq!(
            texts(&doc, 0),
            vec![("he".into(), false), ("|".into(), true), ("llo".into(), false)]
        );
        assert!(is_collapsed(&doc));
    }

    #[test]
    fn test_range_within_one_text() {
        let mut doc = ContentModelDocument::with_blocks(vec![paragraph(&["abcdef"])]);
        let start = BoundaryPoint::new(vec![PathStep::Block(0)], 0, 1);
        let end = BoundaryPoint::new(vec![PathStep::Block(0)], 0, 4);
        assert!(select_range(&mut doc, &end, &start, true));
        assert_eq!(
            texts(&doc, 0),
            vec![("a".into(), false), ("bcd".into(), true), ("ef".into(), false)]
        );
        assert!(doc.has_reverted_range_selection);
    }

    #[test]
    fn test_range_across_paragraphs() {
        let mut doc = ContentModelDocument::with_blocks(vec![paragraph(&["ab"]), paragraph(&["cd"])]);
        let start = BoundaryPoint::new(vec![PathStep::Block(0)], 0, 1);
        let end = BoundaryPoint::new(vec![PathStep::Block(1)], 0, 1);
        select_range(&mut doc, &start, &end, false);
        assert_eq!(texts(&doc, 0), vec![("a".into(), false), ("b".into(), true)]);
        assert_eq!(texts(&doc, 1), vec![("c".into(), true), ("d".into(), false)]);
        assert_eq!(selected_paragraphs(&doc).len(), 2);
    }

    #[test]
    fn test_range_ending_at_line_start_keeps_anchor() {
        let mut doc = ContentModelDocument::with_blocks(vec![paragraph(&["ab"]), paragraph(&["cd"])]);
        let start = BoundaryPoint::new(vec![PathStep::Block(0)], 0, 1);
        let end = BoundaryPoint::new(vec![PathStep::Block(1)], 0, 0);
        select_range(&mut doc, &start, &end, false);
        assert_eq!(texts(&doc, 0), vec![("a".into(), false), ("b".into(), true)]);
        assert_eq!(
            texts(&doc, 1),
            vec![("|".into(), true), ("cd".into(), false)]
        );
        assert!(!is_collapsed(&doc));
    }

    #[test]
    fn test_clear_merges_halves_of_one_node() {
        let mut dom = Dom::new();
        let node = dom.create_text("hello");
        let mut doc = ContentModelDocument::with_blocks(vec![paragraph(&["hello"])]);
        doc.blocks[0].as_paragraph_mut().unwrap().segments[0].cached_element = Some(node);
        let point = BoundaryPoint::new(vec![PathStep::Block(0)], 0, 3);
        select_range(&mut doc, &point, &point, false);
        clear_selection(&mut doc);
        assert_eq!(texts(&doc, 0), vec![("hello".into(), false)]);
    }

    #[test]
    fn test_clear_marker_only_paragraph_keeps_br() {
        let mut doc = ContentModelDocument::with_blocks(vec![Block::Paragraph(
            Paragraph::new(false, Format::default())
                .with_segments(vec![Segment::selection_marker(Format::default())]),
        )]);
        clear_selection(&mut doc);
        assert_eq!(texts(&doc, 0), vec![("<br>".into(), false)]);
    }
}
