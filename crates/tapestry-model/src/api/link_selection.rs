//! Growing a selection to cover a link or a word.

use crate::block::Block;
use crate::document::ContentModelDocument;
use crate::path::{SegmentPath, block_at_mut};
use crate::segment::Segment;
use crate::selection::{selected_segment_paths, selected_segments, set_selection, split_text_at};

/// Display text and target of the link under the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSelection {
    /// Concatenated text of the selected segments.
    pub text: String,
    /// `href` of the first selected segment, when it is a link.
    pub url: Option<String>,
    /// The model selection was changed.
    pub changed: bool,
}

fn href(segment: &Segment) -> Option<&str> {
    segment.link.as_ref()?.format.href.as_deref()
}

fn is_word_char(c: char) -> bool {
    !(c.is_whitespace() || c.is_ascii_punctuation() || c == '\u{a0}')
}

/// Make the selection cover the whole link it touches, or the word around a
/// collapsed caret when there is no link.
pub fn adjust_link_selection(model: &mut ContentModelDocument) -> LinkSelection {
    let mut changed = expand_to_link(model);

    let segments = selected_segments(model);
    if segments.len() == 1 && segments[0].is_marker() {
        if let Some(path) = selected_segment_paths(model).into_iter().next() {
            changed |= expand_to_word(model, &path);
        }
    }

    let segments = selected_segments(model);
    LinkSelection {
        text: segments.iter().filter_map(|s| s.as_text()).collect(),
        url: segments.first().and_then(|s| href(s)).map(str::to_string),
        changed,
    }
}

fn expand_to_link(model: &mut ContentModelDocument) -> bool {
    let paths = selected_segment_paths(model);
    let (Some(first), Some(last)) = (paths.first().cloned(), paths.last().cloned()) else {
        return false;
    };
    let mut new_first = first.clone();
    let mut new_last = last.clone();

    if let Some(Block::Paragraph(paragraph)) = crate::path::block_at(model, &first.paragraph) {
        if let Some(target) = paragraph.segments.get(first.index).and_then(href) {
            while new_first.index > 0
                && paragraph
                    .segments
                    .get(new_first.index - 1)
                    .and_then(href)
                    .is_some_and(|h| h == target)
            {
                new_first.index -= 1;
            }
        }
    }
    if let Some(Block::Paragraph(paragraph)) = crate::path::block_at(model, &last.paragraph) {
        if let Some(target) = paragraph.segments.get(last.index).and_then(href) {
            while paragraph
                .segments
                .get(new_last.index + 1)
                .and_then(href)
                .is_some_and(|h| h == target)
            {
                new_last.index += 1;
            }
        }
    }

    if new_first == first && new_last == last {
        return false;
    }
    set_selection(model, &new_first, &new_last);
    true
}

/// Boundaries of the word around the marker at `marker`, as
/// `(index, char offset)` pairs.
fn word_bounds(segments: &[Segment], marker: usize) -> Option<((usize, usize), (usize, usize))> {
    let mut start = (marker, 0);
    for index in (0..marker).rev() {
        let Some(text) = segments[index].as_text() else {
            break;
        };
        let len = text.chars().count();
        let taken = text.chars().rev().take_while(|c| is_word_char(*c)).count();
        if taken == 0 {
            break;
        }
        start = (index, len - taken);
        if taken < len {
            break;
        }
    }

    let mut end = None;
    for (index, segment) in segments.iter().enumerate().skip(marker + 1) {
        let Some(text) = segment.as_text() else {
            break;
        };
        let taken = text.chars().take_while(|c| is_word_char(*c)).count();
        if taken == 0 {
            break;
        }
        end = Some((index, taken));
        if taken < text.chars().count() {
            break;
        }
    }

    match (start.0 < marker, end) {
        (false, None) => None,
        (_, Some(end)) => Some((start, end)),
        (true, None) => Some((start, (marker, 0))),
    }
}

fn expand_to_word(model: &mut ContentModelDocument, marker_path: &SegmentPath) -> bool {
    let Some(Block::Paragraph(paragraph)) = block_at_mut(model, &marker_path.paragraph) else {
        return false;
    };
    let marker = marker_path.index;
    let Some((start, end)) = word_bounds(&paragraph.segments, marker) else {
        return false;
    };

    let mut last = if end.0 == marker {
        marker
    } else {
        split_text_at(&mut paragraph.segments, end.0, end.1) - 1
    };
    let before = paragraph.segments.len();
    let first = split_text_at(&mut paragraph.segments, start.0, start.1);
    if paragraph.segments.len() > before {
        last += 1;
    }

    let paragraph_path = marker_path.paragraph.clone();
    set_selection(
        model,
        &SegmentPath::new(paragraph_path.clone(), first),
        &SegmentPath::new(paragraph_path, last),
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Paragraph;
    use crate::format::Format;
    use crate::path::PathStep;
    use crate::segment::Link;
    use crate::selection::{BoundaryPoint, select_range};

    fn link(href: &str) -> Option<Link> {
        Some(Link {
            format: Format {
                href: Some(href.into()),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[test]
    fn test_caret_in_link_selects_whole_link() {
        let mut model = ContentModelDocument::with_blocks(vec![Block::Paragraph(
            Paragraph::new(false, Format::default()).with_segments(vec![
                Segment::text("see ", Format::default()),
                Segment::text("the ", Format::default()).with_link(link("https://a.example")),
                Segment::text("docs", Format::default()).with_link(link("https://a.example")),
                Segment::text(" now", Format::default()),
            ]),
        )]);
        let point = BoundaryPoint::new(vec![PathStep::Block(0)], 2, 2);
        select_range(&mut model, &point, &point, false);

        let result = adjust_link_selection(&mut model);
        assert!(result.changed);
        assert_eq!(result.text, "the docs");
        assert_eq!(result.url.as_deref(), Some("https://a.example"));
    }

    #[test]
    fn test_caret_in_word_selects_word() {
        let mut model = ContentModelDocument::with_blocks(vec![Block::Paragraph(
            Paragraph::new(false, Format::default())
                .with_segments(vec![Segment::text("hello brave world", Format::default())]),
        )]);
        let point = BoundaryPoint::new(vec![PathStep::Block(0)], 0, 8);
        select_range(&mut model, &point, &point, false);

        let result = adjust_link_selection(&mut model);
        assert!(result.changed);
        assert_eq!(result.text, "brave");
        assert_eq!(result.url, None);
    }

    #[test]
    fn test_caret_between_spaces_changes_nothing() {
        let mut model = ContentModelDocument::with_blocks(vec![Block::Paragraph(
            Paragraph::new(false, Format::default())
                .with_segments(vec![Segment::text("a  b", Format::default())]),
        )]);
        let point = BoundaryPoint::new(vec![PathStep::Block(0)], 0, 2);
        select_range(&mut model, &point, &point, false);
        let result = adjust_link_selection(&mut model);
        assert!(!result.changed);
        assert_eq!(result.text, "");
    }
}
