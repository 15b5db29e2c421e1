//! DOM to content model conversion.
//!
//! A recursive descent over the children of a root element. Each element is
//! dispatched to an [`ElementProcessor`]: predicate overrides first, then the
//! entity convention, then per-tag overrides, then the default processor for
//! its tag. Processors run format parsers for their node kind and recurse,
//! threading the inherited segment and block formats, the open link and code
//! decorators, list numbering state and the selection hint through
//! [`DomToModelContext`].
//!
//! When the walk crosses a boundary of the hinted range it adds a selection
//! marker at that exact point; everything visited between the two boundaries
//! is flagged as selected. Image and table hints select the matching segment
//! or cells.

mod context;
mod list;
mod normalize;
mod processors;
mod table;

pub use context::{DomToModelContext, DomToModelOption, ElementPredicate, ElementProcessor, ListContext, SelectionState};
pub use list::{list_item_processor, list_processor};
pub use processors::{
    DELIMITER_AFTER, DELIMITER_BEFORE, add_segment, block_processor, br_processor, code_processor, container_processor,
    delimiter_processor, divider_processor, entity_processor, general_processor, image_processor, inline_processor,
    is_block_tag, link_processor, process_children, process_element, process_text,
};
pub use table::table_processor;
pub(crate) use processors::{is_folded_space, preserves_whitespace};
pub(crate) use table::{span, table_rows};

use tapestry_dom::{Dom, DomSelection, NodeId};
use tapestry_model::ContentModelDocument;
use web_time::Instant;

/// Parse the children of `root` into a new document.
///
/// Never fails: markup it does not understand degrades to general blocks and
/// segments.
pub fn dom_to_content_model(dom: &mut Dom, root: NodeId, context: &mut DomToModelContext) -> ContentModelDocument {
    let started = Instant::now();
    context.selection.is_in_selection = false;
    context.block_closed = false;

    let mut blocks = Vec::new();
    process_children(&mut blocks, dom, root, context);
    let mut doc = ContentModelDocument::with_blocks(blocks);
    normalize::normalize(&mut doc);
    doc.has_reverted_range_selection = matches!(
        context.selection.hint,
        Some(DomSelection::Range { is_reverted: true, .. })
    );

    tracing::debug!(
        target: "tapestry::dom_to_model",
        blocks = doc.blocks.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "parsed content model"
    );
    doc
}

#[cfg(test)]
mod tests {
    use tapestry_dom::{DomPosition, DomRange};
    use tapestry_model::{Block, ListType, SegmentKind, TextAlign};

    use super::*;

    fn parse(html: &str) -> ContentModelDocument {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, html).unwrap();
        dom_to_content_model(&mut dom, root, &mut DomToModelContext::with_defaults())
    }

    fn texts(doc: &ContentModelDocument) -> Vec<String> {
        doc.blocks
            .iter()
            .filter_map(Block::as_paragraph)
            .map(|p| p.text())
            .collect()
    }

    #[test]
    fn test_inline_formats_flow_into_segments() {
        let doc = parse(r#"<div style="text-align: center">a<b>b<i>c</i></b></div>"#);
        assert_eq!(doc.blocks.len(), 1);
        let paragraph = doc.blocks[0].as_paragraph().unwrap();
        assert_eq!(paragraph.format.text_align, Some(TextAlign::Center));
        let segments = &paragraph.segments;
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].format.font_weight, None);
        assert!(segments[1].format.is_bold());
        assert!(segments[2].format.is_bold());
        assert_eq!(segments[2].format.italic, Some(true));
    }

    #[test]
    fn test_whitespace_between_blocks_is_dropped() {
        let doc = parse("<div>a</div>\n  <div>  b  c </div>");
        assert_eq!(texts(&doc), vec!["a", "b c\u{a0}"]);
    }

    #[test]
    fn test_heading_becomes_decorator() {
        let doc = parse("<h2>Title</h2><p>body</p>");
        let heading = doc.blocks[0].as_paragraph().unwrap();
        let decorator = heading.decorator.as_ref().unwrap();
        assert_eq!(decorator.tag, "h2");
        assert!(decorator.format.is_bold());
        assert_eq!(decorator.format.font_size.as_deref(), Some("1.5em"));
        assert_eq!(doc.blocks[1].as_paragraph().unwrap().decorator.as_ref().unwrap().tag, "p");
    }

    #[test]
    fn test_caret_in_text_adds_marker() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, "<div>hello</div>").unwrap();
        let text = dom.first_child(dom.first_child(root).unwrap()).unwrap();
        let caret = DomSelection::range(DomRange::caret(DomPosition::new(text, 2)));
        let mut context = DomToModelContext::with_defaults().with_selection(Some(caret));
        let doc = dom_to_content_model(&mut dom, root, &mut context);

        let segments = &doc.blocks[0].as_paragraph().unwrap().segments;
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].as_text(), Some("he"));
        assert!(segments[1].is_marker());
        assert_eq!(segments[2].as_text(), Some("llo"));
        assert!(!segments[0].is_selected && !segments[2].is_selected);
        assert_eq!(segments[0].cached_element, Some(text));
    }

    #[test]
    fn test_expanded_range_flags_segments() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, "<div>abc<b>def</b>ghi</div>").unwrap();
        let block = dom.first_child(root).unwrap();
        let first = dom.first_child(block).unwrap();
        let last = dom.last_child(block).unwrap();
        let range = DomRange::new(DomPosition::new(first, 1), DomPosition::new(last, 2));
        let mut context = DomToModelContext::with_defaults().with_selection(Some(DomSelection::Range {
            range,
            is_reverted: true,
        }));
        let doc = dom_to_content_model(&mut dom, root, &mut context);

        assert!(doc.has_reverted_range_selection);
        let selected: Vec<&str> = doc.blocks[0]
            .as_paragraph()
            .unwrap()
            .segments
            .iter()
            .filter(|s| s.is_selected)
            .filter_map(|s| s.as_text())
            .collect();
        assert_eq!(selected, vec!["bc", "def", "gh"]);
    }

    #[test]
    fn test_image_hint_selects_image() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, r#"<div>x<img src="a.png" alt="A" data-key="1"></div>"#).unwrap();
        let image = dom.query_tag(root, "img")[0];
        let mut context = DomToModelContext::with_defaults().with_selection(Some(DomSelection::Image { image }));
        let doc = dom_to_content_model(&mut dom, root, &mut context);

        let segment = &doc.blocks[0].as_paragraph().unwrap().segments[1];
        let parsed = segment.as_image().unwrap();
        assert!(segment.is_selected);
        assert!(parsed.is_selected_as_image_selection);
        assert_eq!(parsed.src, "a.png");
        assert_eq!(parsed.alt.as_deref(), Some("A"));
        assert_eq!(parsed.dataset.get("key").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_nested_list_items_are_flattened() {
        let doc = parse("<ol><li>a<ul><li>b</li></ul></li><li>c</li></ol>");
        let depths: Vec<(usize, ListType)> = doc
            .blocks
            .iter()
            .filter_map(|b| b.as_group()?.as_list_item())
            .map(|item| (item.levels.len(), item.levels.last().unwrap().list_type))
            .collect();
        assert_eq!(
            depths,
            vec![(1, ListType::Ordered), (2, ListType::Unordered), (1, ListType::Ordered)]
        );
    }

    #[test]
    fn test_blockquote_is_container() {
        let doc = parse(r#"<blockquote style="margin-left: 40px"><div>q</div></blockquote>"#);
        let group = doc.blocks[0].as_group().unwrap();
        assert_eq!(group.format.margin_left.as_deref(), Some("40px"));
        assert_eq!(group.blocks.len(), 1);
    }

    #[test]
    fn test_unknown_inline_element_is_general_segment() {
        let doc = parse("<div>a<custom-tag>b</custom-tag></div>");
        let segments = &doc.blocks[0].as_paragraph().unwrap().segments;
        let SegmentKind::General { blocks, .. } = &segments[1].kind else {
            panic!("expected general segment");
        };
        assert_eq!(blocks[0].as_paragraph().unwrap().text(), "b");
    }

    #[test]
    fn test_empty_only_child_becomes_implicit() {
        let doc = parse("<div></div>");
        assert_eq!(doc.blocks.len(), 1);
        assert!(doc.blocks[0].as_paragraph().unwrap().is_implicit);

        let doc = parse("<div></div><div>x</div>");
        assert_eq!(texts(&doc), vec!["x"]);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(
            root,
            r#"<h1>T</h1><div style="color: red">a <b>b</b></div><ol start="3"><li>x</li></ol><table><tr><td colspan="2">c</td></tr></table>"#,
        )
        .unwrap();
        let first = dom_to_content_model(&mut dom, root, &mut DomToModelContext::with_defaults());
        let second = dom_to_content_model(&mut dom, root, &mut DomToModelContext::with_defaults());
        assert_eq!(first, second);
    }
}
