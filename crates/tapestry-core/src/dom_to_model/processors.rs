//! Default element processors and the child walk that threads selection.

use smol_str::SmolStr;
use tapestry_dom::{Dom, DomPosition, DomSelection, NodeId, NodeType};
use tapestry_model::{
    Block, BlockGroup, Code, Dataset, Divider, ENTITY_CLASS, Entity, EntityInfo, Format, Link, Paragraph,
    ParagraphDecorator, Segment, SegmentKind,
};

use super::context::{DomToModelContext, ElementProcessor};
use super::{list, table};
use crate::format::FormatCategory;

/// Class of the zero-width span rendered before a read-only inline entity.
pub const DELIMITER_BEFORE: &str = "entityDelimiterBefore";
/// Class of the zero-width span rendered after a read-only inline entity.
pub const DELIMITER_AFTER: &str = "entityDelimiterAfter";

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "head", "meta", "link", "title", "template", "noscript",
];

const BLOCK_TAGS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "center", "article", "section", "header",
    "footer", "main", "nav", "aside", "address", "figure", "figcaption", "dd", "dt", "dl", "blockquote",
];

const INLINE_TAGS: &[&str] = &[
    "span", "b", "strong", "i", "em", "u", "s", "strike", "del", "ins", "sup", "sub", "font", "small",
    "big", "label", "abbr", "cite", "q", "mark", "var", "kbd", "samp", "tt", "time", "bdi", "bdo",
];

/// Paragraph tags that survive as a decorator instead of a plain wrapper.
const DECORATOR_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "pre"];

/// Tags that always break the flow of inline content.
pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
        || matches!(tag, "ol" | "ul" | "li" | "table" | "hr" | "tr" | "td" | "th" | "tbody" | "thead" | "tfoot")
}

pub(crate) fn is_block_element(dom: &Dom, element: NodeId) -> bool {
    match dom.style_property(element, "display").as_deref().map(str::trim) {
        Some("block" | "flex" | "grid" | "list-item" | "table") => true,
        Some(_) => false,
        None => dom.tag(element).is_some_and(is_block_tag),
    }
}

fn default_processor(tag: &str) -> ElementProcessor {
    match tag {
        "blockquote" => container_processor,
        "a" => link_processor,
        "code" => code_processor,
        "br" => br_processor,
        "img" => image_processor,
        "hr" => divider_processor,
        "table" => table::table_processor,
        "ol" | "ul" => list::list_processor,
        "li" => list::list_item_processor,
        tag if BLOCK_TAGS.contains(&tag) => block_processor,
        tag if INLINE_TAGS.contains(&tag) => inline_processor,
        tag if SKIPPED_TAGS.contains(&tag) => skip_processor,
        _ => general_processor,
    }
}

// === Walk ===

/// Process every child of `parent`, checking selection boundaries between them.
pub fn process_children(group: &mut Vec<Block>, dom: &mut Dom, parent: NodeId, context: &mut DomToModelContext) {
    let children = dom.children(parent).to_vec();
    for (index, child) in children.iter().enumerate() {
        check_boundary(group, DomPosition::new(parent, index), context);
        match dom.node_type(*child) {
            Some(NodeType::Element) => process_element(group, dom, *child, context),
            Some(NodeType::Text) => process_text(group, dom, *child, context),
            _ => {}
        }
    }
    check_boundary(group, DomPosition::new(parent, children.len()), context);
}

/// Dispatch one element: predicate overrides, entities, tag overrides, then
/// the default processor for the tag.
pub fn process_element(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let predicated = context
        .predicate_processors
        .iter()
        .find(|(predicate, _)| predicate(dom, element))
        .map(|(_, processor)| *processor);
    if let Some(processor) = predicated {
        processor(group, dom, element, context);
        return;
    }
    if context.skip_hidden && dom.style_property(element, "display").as_deref().map(str::trim) == Some("none") {
        return;
    }
    if dom.has_class(element, ENTITY_CLASS) {
        entity_processor(group, dom, element, context);
        return;
    }
    if dom.has_class(element, DELIMITER_BEFORE) || dom.has_class(element, DELIMITER_AFTER) {
        delimiter_processor(group, dom, element, context);
        return;
    }
    let tag = SmolStr::new(dom.tag(element).unwrap_or_default());
    let processor = context
        .processors
        .get(&tag)
        .copied()
        .unwrap_or_else(|| default_processor(&tag));
    processor(group, dom, element, context);
}

// === Selection ===

fn check_boundary(group: &mut Vec<Block>, position: DomPosition, context: &mut DomToModelContext) {
    let at_start = context.selection.range_start() == Some(position);
    let at_end = context.selection.range_end() == Some(position);
    mark_boundary(group, at_start, at_end, context);
}

/// Enter and/or leave the selected range here, adding markers.
///
/// A collapsed range produces a single marker.
pub(crate) fn mark_boundary(group: &mut Vec<Block>, at_start: bool, at_end: bool, context: &mut DomToModelContext) {
    if at_start {
        context.selection.is_in_selection = true;
        add_marker(group, context);
    }
    if at_end {
        if !at_start {
            add_marker(group, context);
        }
        context.selection.is_in_selection = false;
    }
}

fn add_marker(group: &mut Vec<Block>, context: &mut DomToModelContext) {
    let marker = Segment::selection_marker(context.segment_format.clone())
        .with_link(context.link.clone())
        .with_code(context.code.clone());
    add_segment(group, marker, context);
}

/// Boundaries of the range hint that fall anywhere inside `element`.
fn boundaries_inside(dom: &Dom, element: NodeId, context: &DomToModelContext) -> (bool, bool) {
    let inside = |position: Option<DomPosition>| position.is_some_and(|p| dom.contains(element, p.node));
    (
        inside(context.selection.range_start()),
        inside(context.selection.range_end()),
    )
}

// === Segments ===

/// Append `segment` to the open paragraph of `group`, opening an implicit one
/// when the last block is closed or is not a paragraph.
pub fn add_segment(group: &mut Vec<Block>, mut segment: Segment, context: &mut DomToModelContext) {
    if !segment.is_marker() {
        segment.is_selected = context.selection.is_in_selection;
    }
    if !context.block_closed {
        if let Some(Block::Paragraph(paragraph)) = group.last_mut() {
            paragraph.segments.push(segment);
            return;
        }
    }
    let paragraph = Paragraph::new(true, context.block_format.clone()).with_segments(vec![segment]);
    group.push(Block::Paragraph(paragraph));
    context.block_closed = false;
}

pub(crate) fn is_folded_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}')
}

/// Block formats under which text keeps its whitespace as written.
pub(crate) fn preserves_whitespace(block_format: &Format) -> bool {
    block_format
        .white_space
        .as_deref()
        .is_some_and(|ws| ws.starts_with("pre") || ws == "break-spaces")
}

/// Collapse runs of HTML whitespace into one space.
fn fold_whitespace(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if is_folded_space(c) {
            if !in_space {
                folded.push(' ');
            }
            in_space = true;
        } else {
            folded.push(c);
            in_space = false;
        }
    }
    folded
}

/// True when text added now starts a visual line, so a leading space would
/// not render.
fn at_line_start(group: &[Block], context: &DomToModelContext) -> bool {
    if context.block_closed {
        return true;
    }
    let Some(Block::Paragraph(paragraph)) = group.last() else {
        return true;
    };
    match paragraph.segments.iter().rev().find(|s| !s.is_marker()) {
        None => true,
        Some(segment) => match &segment.kind {
            SegmentKind::Br => true,
            SegmentKind::Text { text } => text.ends_with(' '),
            _ => false,
        },
    }
}

fn add_text(group: &mut Vec<Block>, text: &str, node: NodeId, context: &mut DomToModelContext) {
    let preserve = preserves_whitespace(&context.block_format);
    let mut text = if preserve {
        text.to_string()
    } else {
        fold_whitespace(text)
    };
    if !preserve && text.starts_with(' ') && at_line_start(group, context) {
        text.remove(0);
    }
    if text.is_empty() {
        return;
    }
    let mut segment = Segment::text(text, context.segment_format.clone())
        .with_link(context.link.clone())
        .with_code(context.code.clone());
    segment.cached_element = context.cache(node);
    add_segment(group, segment, context);
}

/// Text node, split wherever a selection boundary falls inside it.
pub fn process_text(group: &mut Vec<Block>, dom: &mut Dom, node: NodeId, context: &mut DomToModelContext) {
    let Some(text) = dom.text(node).map(str::to_owned) else {
        return;
    };
    let offset_in = |position: Option<DomPosition>| position.filter(|p| p.node == node).map(|p| p.offset);
    let start = offset_in(context.selection.range_start());
    let end = offset_in(context.selection.range_end());
    if start.is_none() && end.is_none() {
        add_text(group, &text, node, context);
        return;
    }

    let mut cuts: Vec<usize> = start.into_iter().chain(end).collect();
    cuts.sort_unstable();
    cuts.dedup();
    let chars: Vec<char> = text.chars().collect();
    let mut from = 0;
    for cut in cuts {
        let at = cut.clamp(from, chars.len());
        let piece: String = chars[from..at].iter().collect();
        add_text(group, &piece, node, context);
        mark_boundary(group, start == Some(cut), end == Some(cut), context);
        from = at;
    }
    let tail: String = chars[from..].iter().collect();
    add_text(group, &tail, node, context);
}

// === Default processors ===

fn skip_processor(_: &mut Vec<Block>, _: &mut Dom, _: NodeId, _: &mut DomToModelContext) {}

/// `data-*` attributes of `element`, minus the ones format keys own.
pub(crate) fn dataset(dom: &Dom, element: NodeId) -> Dataset {
    const OWNED: &[&str] = &["ogsc", "ogsb", "image-state", "undeletable"];
    dom.element(element)
        .map(|data| {
            data.attributes()
                .filter_map(|(name, value)| {
                    let key = name.strip_prefix("data-")?;
                    (!OWNED.contains(&key)).then(|| (key.to_string(), value.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Run `body` with a modified segment format, restoring it afterwards.
pub(crate) fn with_segment_format(
    context: &mut DomToModelContext,
    format: Format,
    body: impl FnOnce(&mut DomToModelContext),
) {
    let saved = std::mem::replace(&mut context.segment_format, format);
    body(context);
    context.segment_format = saved;
}

/// Inline formatting element: parse the segment keys and recurse.
pub fn inline_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let mut format = context.segment_format.clone();
    context.parse(FormatCategory::Segment, &mut format, dom, element);
    with_segment_format(context, format, |context| {
        process_children(group, dom, element, context)
    });
}

/// Keys of a block format that flow down into implicit paragraphs.
fn inheritable_block_format(format: &Format) -> Format {
    Format {
        direction: format.direction,
        text_align: format.text_align,
        line_height: format.line_height.clone(),
        white_space: format.white_space.clone(),
        ..Default::default()
    }
}

fn has_block_children(dom: &Dom, element: NodeId) -> bool {
    dom.children(element)
        .iter()
        .any(|child| dom.is_element(*child) && is_block_element(dom, *child))
}

/// Block element: emits a wrapper paragraph holding the element's inline
/// content, or a format container when its box format would otherwise be
/// lost on child blocks.
pub fn block_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let tag = dom.tag(element).unwrap_or("div").to_string();
    let own_format = context.parse_new(FormatCategory::Block, dom, element);
    let is_decorator = DECORATOR_TAGS.contains(&tag.as_str());

    if !is_decorator
        && own_format.len() > inheritable_block_format(&own_format).len()
        && has_block_children(dom, element)
    {
        container_processor(group, dom, element, context);
        return;
    }

    let mut block_format = context.block_format.clone();
    block_format.overlay(&own_format);
    let inheritable = inheritable_block_format(&block_format);

    let mut segment_format = context.segment_format.clone();
    context.parse(FormatCategory::SegmentOnBlock, &mut segment_format, dom, element);

    let mut paragraph = Paragraph::new(false, block_format);
    if is_decorator {
        paragraph.decorator = Some(ParagraphDecorator {
            tag: SmolStr::new(&tag),
            format: context.parse_new(FormatCategory::SegmentOnBlock, dom, element),
        });
    }
    paragraph.cached_element = context.cache(element);
    group.push(Block::Paragraph(paragraph));
    let wrapper = group.len() - 1;

    let saved_block = std::mem::replace(&mut context.block_format, inheritable);
    context.block_closed = false;
    with_segment_format(context, segment_format, |context| {
        process_children(group, dom, element, context)
    });
    context.block_format = saved_block;
    context.block_closed = true;

    let produced_blocks = group.len() > wrapper + 1;
    let is_only_child = dom.parent(element).is_some_and(|parent| dom.child_count(parent) == 1);
    let (is_empty, is_plain) = match group.get_mut(wrapper) {
        Some(Block::Paragraph(paragraph)) => {
            if produced_blocks {
                // The element also holds the blocks after the wrapper, so it
                // cannot back the wrapper alone.
                paragraph.cached_element = None;
            }
            (
                paragraph.segments.is_empty(),
                own_format.is_empty() && paragraph.decorator.is_none(),
            )
        }
        _ => return,
    };
    if !is_empty {
        return;
    }
    if produced_blocks || (is_plain && !is_only_child) {
        group.remove(wrapper);
    } else if is_plain {
        if let Some(Block::Paragraph(paragraph)) = group.get_mut(wrapper) {
            paragraph.is_implicit = true;
        }
    }
}

/// Wrapper whose own box format is kept as a [`BlockGroup`].
pub fn container_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let tag = dom.tag(element).unwrap_or("div").to_string();
    let mut format = context.parse_new(FormatCategory::Container, dom, element);
    let block_format = context.parse_new(FormatCategory::Block, dom, element);
    let inheritable = inheritable_block_format(&block_format);
    format.overlay(&inheritable);

    let mut container = BlockGroup::format_container(&tag, format);
    container.cached_element = context.cache(element);

    let mut segment_format = context.segment_format.clone();
    context.parse(FormatCategory::SegmentOnBlock, &mut segment_format, dom, element);
    let mut child_block_format = context.block_format.clone();
    child_block_format.overlay(&inheritable);
    let saved_block = std::mem::replace(&mut context.block_format, child_block_format);
    context.block_closed = false;
    with_segment_format(context, segment_format, |context| {
        process_children(&mut container.blocks, dom, element, context)
    });
    context.block_format = saved_block;

    group.push(Block::BlockGroup(container));
    context.block_closed = true;
}

/// Anchor. Without a safe `href` or a `name` it is plain inline formatting.
pub fn link_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let link_format = context.parse_new(FormatCategory::Link, dom, element);
    if link_format.href.is_none() && link_format.name.is_none() {
        inline_processor(group, dom, element, context);
        return;
    }
    let link = Link {
        format: link_format,
        dataset: dataset(dom, element),
    };
    let mut format = context.segment_format.clone();
    context.parse(FormatCategory::SegmentUnderLink, &mut format, dom, element);
    let saved = context.link.replace(link);
    with_segment_format(context, format, |context| {
        process_children(group, dom, element, context)
    });
    context.link = saved;
}

pub fn code_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let code = Code {
        format: context.parse_new(FormatCategory::Code, dom, element),
    };
    let saved = context.code.replace(code);
    process_children(group, dom, element, context);
    context.code = saved;
}

pub fn br_processor(group: &mut Vec<Block>, _: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let mut segment = Segment::br(context.segment_format.clone())
        .with_link(context.link.clone())
        .with_code(context.code.clone());
    segment.cached_element = context.cache(element);
    add_segment(group, segment, context);
}

pub fn image_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let mut format = context.segment_format.clone();
    context.parse(FormatCategory::Image, &mut format, dom, element);
    let src = dom.attribute(element, "src").unwrap_or_default().to_string();
    let mut segment = Segment::image(src, format)
        .with_link(context.link.clone())
        .with_code(context.code.clone());
    if let Some(image) = segment.as_image_mut() {
        image.alt = dom.attribute(element, "alt").map(str::to_owned);
        image.title = dom.attribute(element, "title").map(str::to_owned);
        image.dataset = dataset(dom, element);
    }
    segment.cached_element = context.cache(element);
    let selected_as_image = matches!(context.selection.hint, Some(DomSelection::Image { image }) if image == element);
    add_segment(group, segment, context);

    if selected_as_image {
        if let Some(Block::Paragraph(paragraph)) = group.last_mut() {
            if let Some(segment) = paragraph.segments.last_mut() {
                segment.is_selected = true;
                if let Some(image) = segment.as_image_mut() {
                    image.is_selected_as_image_selection = true;
                }
            }
        }
    }
}

pub fn divider_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let tag = dom.tag(element).unwrap_or("hr").to_string();
    let mut divider = Divider::new(&tag, context.parse_new(FormatCategory::Divider, dom, element));
    divider.is_selected = context.selection.is_in_selection;
    divider.cached_element = context.cache(element);
    group.push(Block::Divider(divider));
    context.block_closed = true;
}

/// Unknown element, kept as a shallow clone with parsed children.
pub fn general_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let clone = match dom.clone_node(element, false) {
        Ok(clone) => clone,
        Err(error) => {
            tracing::debug!(target: "tapestry::dom_to_model", %error, "general element could not be cloned");
            return;
        }
    };
    let format = context.parse_new(FormatCategory::General, dom, element);

    if is_block_element(dom, element) {
        let mut general = BlockGroup::general(clone, format);
        general.cached_element = context.cache(element);
        context.block_closed = false;
        process_children(&mut general.blocks, dom, element, context);
        group.push(Block::BlockGroup(general));
        context.block_closed = true;
        return;
    }

    let mut blocks = Vec::new();
    let saved_closed = std::mem::replace(&mut context.block_closed, false);
    process_children(&mut blocks, dom, element, context);
    context.block_closed = saved_closed;

    let mut segment = Segment::general(clone, context.segment_format.clone())
        .with_link(context.link.clone());
    segment.format.overlay(&format);
    if let SegmentKind::General { blocks: children, .. } = &mut segment.kind {
        *children = blocks;
    }
    segment.cached_element = context.cache(element);
    add_segment(group, segment, context);
}

/// Read-only embedded content, kept as the live wrapper element.
///
/// A range boundary inside the entity moves before it (start) or after it
/// (end); a caret inside lands before it.
pub fn entity_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let info = EntityInfo::from_classes(dom.classes(element)).unwrap_or(EntityInfo {
        is_fake_entity: true,
        ..Default::default()
    });
    let (start_inside, end_inside) = boundaries_inside(dom, element, context);
    let collapsed_inside = start_inside
        && end_inside
        && context.selection.range_start() == context.selection.range_end();
    if collapsed_inside {
        mark_boundary(group, true, true, context);
    } else if start_inside {
        mark_boundary(group, true, false, context);
    }

    if is_block_element(dom, element) {
        let mut entity = Entity::new(element, info, context.parse_new(FormatCategory::Block, dom, element));
        entity.is_selected = context.selection.is_in_selection;
        group.push(Block::Entity(entity));
        context.block_closed = true;
    } else {
        let entity = Entity::new(element, info, context.segment_format.clone());
        let mut segment = Segment::entity(entity).with_link(context.link.clone());
        segment.cached_element = context.cache(element);
        add_segment(group, segment, context);
    }

    if end_inside && !collapsed_inside {
        mark_boundary(group, false, true, context);
    }
}

/// Zero-width delimiter around an inline entity. Contributes nothing but
/// the selection boundaries inside it.
pub fn delimiter_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let (start_inside, end_inside) = boundaries_inside(dom, element, context);
    mark_boundary(group, start_inside, end_inside, context);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_whitespace() {
        assert_eq!(fold_whitespace("a \n\t b"), "a b");
        assert_eq!(fold_whitespace("\n\n"), " ");
        assert_eq!(fold_whitespace("x"), "x");
    }

    #[test]
    fn test_block_tags() {
        assert!(is_block_tag("h3"));
        assert!(is_block_tag("table"));
        assert!(!is_block_tag("span"));
        assert!(!is_block_tag("custom-element"));
    }

    #[test]
    fn test_display_overrides_tag() {
        let mut dom = Dom::new();
        let nodes = dom.parse_fragment(r#"<span style="display: block"></span><div style="display: inline"></div>"#);
        assert!(is_block_element(&dom, nodes[0]));
        assert!(!is_block_element(&dom, nodes[1]));
    }
}
