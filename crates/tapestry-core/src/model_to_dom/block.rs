//! Block handlers and the reference-node walk that reuses cached elements.

use tapestry_dom::{Dom, NodeId};
use tapestry_model::{Block, BlockGroup, Divider, Entity, Format, GroupKind, Paragraph, SegmentKind};

use super::context::ModelToDomContext;
use super::segment::apply_entity_markup;
use crate::format::{FormatCategory, FormatKey, implicit_format};

/// Block keys a format container carries for the paragraphs inside it.
const INHERITED_BLOCK_KEYS: &[FormatKey] = &[
    FormatKey::Direction,
    FormatKey::TextAlign,
    FormatKey::LineHeight,
    FormatKey::WhiteSpace,
];

/// Put `element` at `reference` in `parent` and return the next reference.
///
/// Siblings between `reference` and an element already in place have no
/// counterpart at this position of the model and are detached.
pub fn reuse_cached_element(dom: &mut Dom, parent: NodeId, element: NodeId, reference: Option<NodeId>) -> Option<NodeId> {
    let in_place = dom.parent(element) == Some(parent)
        && match reference {
            Some(reference) => dom.index_in_parent(element) >= dom.index_in_parent(reference),
            None => false,
        };
    if in_place {
        let mut current = reference;
        while let Some(node) = current {
            if node == element {
                return dom.next_sibling(element);
            }
            current = dom.next_sibling(node);
            dom.detach(node);
        }
    }
    insert(dom, parent, element, reference);
    reference
}

pub(crate) fn insert(dom: &mut Dom, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
    if let Err(error) = dom.insert_before(parent, node, reference) {
        tracing::debug!(target: "tapestry::model_to_dom", %error, "insert failed");
    }
}

/// Render `blocks` as the children of `parent`, reusing what is already
/// there and detaching whatever is left over.
pub fn handle_block_group_children(dom: &mut Dom, blocks: &mut [Block], parent: NodeId, context: &mut ModelToDomContext) {
    let saved_list = std::mem::take(&mut context.list);
    let handler = context.handlers.block;
    let mut reference = dom.first_child(parent);
    for block in blocks.iter_mut() {
        reference = handler(dom, block, parent, reference, context);
    }
    while let Some(node) = reference {
        reference = dom.next_sibling(node);
        dom.detach(node);
    }
    context.list = saved_list;
}

/// Dispatch one block to the handler of its kind. Anything but a list item
/// closes the open lists; numbering keeps running.
pub fn handle_block(
    dom: &mut Dom,
    block: &mut Block,
    parent: NodeId,
    reference: Option<NodeId>,
    context: &mut ModelToDomContext,
) -> Option<NodeId> {
    let is_list_item = matches!(block, Block::BlockGroup(group) if group.as_list_item().is_some());
    if !is_list_item {
        context.list.nodes.clear();
    }
    let handlers = context.handlers;
    match block {
        Block::Paragraph(paragraph) => (handlers.paragraph)(dom, paragraph, parent, reference, context),
        Block::Table(table) => (handlers.table)(dom, table, parent, reference, context),
        Block::Divider(divider) => (handlers.divider)(dom, divider, parent, reference, context),
        Block::Entity(entity) => (handlers.entity_block)(dom, entity, parent, reference, context),
        Block::BlockGroup(group) => match group.kind {
            GroupKind::FormatContainer { .. } => (handlers.format_container)(dom, group, parent, reference, context),
            GroupKind::ListItem(_) => (handlers.list_item)(dom, group, parent, reference, context),
            GroupKind::General { .. } => (handlers.general)(dom, group, parent, reference, context),
        },
    }
}

/// A paragraph can stand in for itself when nothing inside it needs a
/// fresh render.
fn is_reusable(dom: &Dom, paragraph: &Paragraph, context: &ModelToDomContext) -> Option<NodeId> {
    let element = context.cached(dom, paragraph.cached_element)?;
    let needs_render = paragraph.has_selection()
        || paragraph.has_general_segment()
        || paragraph
            .segments
            .iter()
            .any(|segment| matches!(segment.kind, SegmentKind::Entity(_)));
    (!needs_render).then_some(element)
}

/// Whether the paragraph renders its own element. Implicit paragraphs with
/// nothing to show for themselves put their segments straight into the parent.
fn needs_wrapper(paragraph: &Paragraph) -> bool {
    !paragraph.is_implicit
        || paragraph.decorator.is_some()
        || (!paragraph.format.is_empty() && paragraph.segments.iter().any(|s| !s.is_marker()))
}

pub fn handle_paragraph(
    dom: &mut Dom,
    paragraph: &mut Paragraph,
    parent: NodeId,
    reference: Option<NodeId>,
    context: &mut ModelToDomContext,
) -> Option<NodeId> {
    if let Some(element) = is_reusable(dom, paragraph, context) {
        context.stats.reused += 1;
        return reuse_cached_element(dom, parent, element, reference);
    }

    let tag = paragraph.decorator.as_ref().map(|d| d.tag.as_str()).unwrap_or("div").to_string();
    let element = dom.create_element(&tag);
    insert(dom, parent, element, reference);
    let wrapped = needs_wrapper(paragraph);

    let mut segment_implicit = context.implicit_segment_format.clone();
    if wrapped {
        let implicit = implicit_format(&tag);
        context.apply(FormatCategory::Block, &paragraph.format, dom, element, &implicit);
        if let Some(decorator) = &paragraph.decorator {
            context.apply(FormatCategory::SegmentOnBlock, &decorator.format, dom, element, &implicit);
            segment_implicit = implicit;
            segment_implicit.overlay(&decorator.format);
        }
        context.node_created(dom, element);
    }

    let saved = std::mem::replace(&mut context.implicit_segment_format, segment_implicit);
    let handler = context.handlers.segment;
    for segment in &mut paragraph.segments {
        handler(dom, segment, element, context);
    }
    context.implicit_segment_format = saved;

    // Segments may have pulled `reference` itself inside `element`.
    let next = dom.next_sibling(element);
    if wrapped {
        paragraph.cached_element = context.allow_cache_element.then_some(element);
    } else {
        context.selection.remap_start_of(dom, element);
        if let Err(error) = dom.unwrap(element) {
            tracing::debug!(target: "tapestry::model_to_dom", %error, "implicit paragraph unwrap failed");
        }
        paragraph.cached_element = None;
    }
    next
}

pub fn handle_divider(
    dom: &mut Dom,
    divider: &mut Divider,
    parent: NodeId,
    reference: Option<NodeId>,
    context: &mut ModelToDomContext,
) -> Option<NodeId> {
    if let Some(element) = context.cached(dom, divider.cached_element) {
        context.stats.reused += 1;
        return reuse_cached_element(dom, parent, element, reference);
    }
    let element = dom.create_element(&divider.tag);
    insert(dom, parent, element, reference);
    context.apply(FormatCategory::Divider, &divider.format, dom, element, &Format::default());
    divider.cached_element = context.allow_cache_element.then_some(element);
    context.node_created(dom, element);
    reference
}

/// The live wrapper itself is the rendering.
pub fn handle_entity_block(
    dom: &mut Dom,
    entity: &mut Entity,
    parent: NodeId,
    reference: Option<NodeId>,
    context: &mut ModelToDomContext,
) -> Option<NodeId> {
    if !dom.is_alive(entity.wrapper) {
        tracing::debug!(target: "tapestry::model_to_dom", "entity wrapper is gone");
        return reference;
    }
    apply_entity_markup(dom, entity);
    context.stats.reused += 1;
    reuse_cached_element(dom, parent, entity.wrapper, reference)
}

pub fn handle_format_container(
    dom: &mut Dom,
    group: &mut BlockGroup,
    parent: NodeId,
    reference: Option<NodeId>,
    context: &mut ModelToDomContext,
) -> Option<NodeId> {
    let (element, next) = match context.cached(dom, group.cached_element) {
        Some(element) => {
            context.stats.reused += 1;
            (element, reuse_cached_element(dom, parent, element, reference))
        }
        None => {
            let tag = match &group.kind {
                GroupKind::FormatContainer { tag } => tag.to_string(),
                _ => "div".to_string(),
            };
            let element = dom.create_element(&tag);
            insert(dom, parent, element, reference);
            let implicit = implicit_format(&tag);
            context.apply(FormatCategory::Container, &group.format, dom, element, &implicit);
            context.apply_keys(INHERITED_BLOCK_KEYS, &group.format, dom, element, &implicit);
            group.cached_element = context.allow_cache_element.then_some(element);
            context.node_created(dom, element);
            (element, reference)
        }
    };
    let handler = context.handlers.block_group_children;
    handler(dom, &mut group.blocks, element, context);
    next
}

/// Unknown block element, rendered through its clone.
pub fn handle_general(
    dom: &mut Dom,
    group: &mut BlockGroup,
    parent: NodeId,
    reference: Option<NodeId>,
    context: &mut ModelToDomContext,
) -> Option<NodeId> {
    let GroupKind::General { element } = group.kind else {
        return reference;
    };
    let element = if dom.is_alive(element) {
        element
    } else {
        let replacement = dom.create_element("div");
        group.kind = GroupKind::General { element: replacement };
        context.node_created(dom, replacement);
        replacement
    };
    let next = reuse_cached_element(dom, parent, element, reference);
    group.cached_element = context.allow_cache_element.then_some(element);
    let handler = context.handlers.block_group_children;
    handler(dom, &mut group.blocks, element, context);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuse_detaches_skipped_siblings() {
        let mut dom = Dom::new();
        let parent = dom.create_element("div");
        dom.set_inner_html(parent, "<p>a</p><p>b</p><p>c</p>").unwrap();
        let first = dom.child_at(parent, 0).unwrap();
        let third = dom.child_at(parent, 2).unwrap();

        let next = reuse_cached_element(&mut dom, parent, third, Some(first));
        assert_eq!(next, None);
        assert_eq!(dom.inner_html(parent), "<p>c</p>");
        assert!(dom.is_alive(first));
    }

    #[test]
    fn test_reuse_moves_element_from_elsewhere() {
        let mut dom = Dom::new();
        let parent = dom.create_element("div");
        let other = dom.create_element("div");
        dom.set_inner_html(parent, "<p>a</p>").unwrap();
        dom.set_inner_html(other, "<p>b</p>").unwrap();
        let a = dom.first_child(parent).unwrap();
        let b = dom.first_child(other).unwrap();

        let next = reuse_cached_element(&mut dom, parent, b, Some(a));
        assert_eq!(next, Some(a));
        assert_eq!(dom.inner_html(parent), "<p>b</p><p>a</p>");
        assert_eq!(dom.child_count(other), 0);
    }

    #[test]
    fn test_implicit_paragraph_needs_no_wrapper() {
        let mut paragraph = Paragraph::new(true, Format::default());
        assert!(!needs_wrapper(&paragraph));
        paragraph.format.text_align = Some(tapestry_model::TextAlign::Center);
        assert!(!needs_wrapper(&paragraph));
        paragraph
            .segments
            .push(tapestry_model::Segment::text("x", Format::default()));
        assert!(needs_wrapper(&paragraph));
    }
}
