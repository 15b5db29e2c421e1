//! List items back into nested `ol`/`ul` markup.
//!
//! The open list elements of the current run of items sit in
//! [`ListRenderState::nodes`]. An item reuses the prefix of that stack whose
//! levels match its own and opens new list elements for the rest. Numbers
//! are re-derived on every render, so an `ol` interrupted by other blocks
//! continues from the last rendered number unless its level overrides it.
//!
//! [`ListRenderState::nodes`]: super::context::ListRenderState::nodes

use tapestry_dom::{Dom, NodeId};
use tapestry_model::{BlockGroup, Format, ListLevel, ListType};

use super::block::{insert, reuse_cached_element};
use super::context::ModelToDomContext;
use super::segment::set_dataset;
use crate::format::FormatCategory;

/// Same list element, ignoring where numbering starts.
fn same_thread(a: &ListLevel, b: &ListLevel) -> bool {
    let strip = |level: &ListLevel| Format {
        start_number_override: None,
        ..level.format.clone()
    };
    a.list_type == b.list_type && a.dataset == b.dataset && strip(a) == strip(b)
}

/// A list element left by an earlier render that `level` can take over.
fn claim_cached(dom: &mut Dom, level: &ListLevel, context: &mut ModelToDomContext) -> Option<NodeId> {
    let element = context
        .cached(dom, level.cached_element)
        .filter(|element| dom.is_tag(*element, level.list_type.tag()))?;
    if !context.used_list_elements.insert(element) {
        return None;
    }
    dom.take_children(element);
    for name in ["style", "start"] {
        if let Err(error) = dom.remove_attribute(element, name) {
            tracing::debug!(target: "tapestry::model_to_dom", %error, name, "list attribute reset failed");
        }
    }
    context.stats.reused += 1;
    Some(element)
}

/// Open list elements down to the depth of `levels` and return the innermost.
///
/// Every level gets the element it rendered into as its `cached_element`.
pub fn handle_list(
    dom: &mut Dom,
    levels: &mut [ListLevel],
    parent: NodeId,
    reference: Option<NodeId>,
    context: &mut ModelToDomContext,
) -> Option<NodeId> {
    let open = &context.list.nodes;
    let kept = levels
        .iter()
        .zip(open.iter())
        .take_while(|(level, (node_level, _))| {
            level.format.start_number_override.is_none() && same_thread(level, node_level)
        })
        .count();
    context.list.nodes.truncate(kept);

    for level in &mut levels[kept..] {
        let depth = context.list.nodes.len();
        let cached = claim_cached(dom, level, context);
        let element = cached.unwrap_or_else(|| dom.create_element(level.list_type.tag()));
        context.apply(FormatCategory::ListLevel, &level.format, dom, element, &Format::default());
        set_dataset(dom, element, &level.dataset);

        if context.list.thread_counts.len() <= depth {
            context.list.thread_counts.resize(depth + 1, None);
        }
        context.list.thread_counts.truncate(depth + 1);
        if level.list_type == ListType::Ordered {
            let start = level
                .format
                .start_number_override
                .unwrap_or_else(|| context.list.thread_counts[depth].map_or(1, |count| count + 1));
            if start != 1 {
                if let Err(error) = dom.set_attribute(element, "start", start.to_string()) {
                    tracing::debug!(target: "tapestry::model_to_dom", %error, "list start write failed");
                }
            }
            context.list.thread_counts[depth] = Some(start.saturating_sub(1));
        }

        match (context.list.nodes.last(), cached) {
            (Some((_, outer)), _) => insert(dom, *outer, element, None),
            (None, Some(_)) => {
                reuse_cached_element(dom, parent, element, reference);
            }
            (None, None) => insert(dom, parent, element, reference),
        }
        if cached.is_none() {
            context.node_created(dom, element);
        }
        context.list.nodes.push((level.clone(), element));
    }

    let allow_cache_element = context.allow_cache_element;
    for (level, (_, element)) in levels.iter_mut().zip(context.list.nodes.iter()) {
        level.cached_element = allow_cache_element.then_some(*element);
    }

    tracing::trace!(
        target: "tapestry::model_to_dom",
        kept,
        depth = levels.len(),
        "list levels"
    );
    context.list.nodes.last().map(|(_, element)| *element)
}

pub fn handle_list_item(
    dom: &mut Dom,
    group: &mut BlockGroup,
    parent: NodeId,
    reference: Option<NodeId>,
    context: &mut ModelToDomContext,
) -> Option<NodeId> {
    let Some(item) = group.as_list_item() else {
        return reference;
    };
    let mut levels = item.levels.clone();
    let holder_format = item.format_holder.format.clone();
    let Some(depth) = levels.len().checked_sub(1) else {
        tracing::debug!(target: "tapestry::model_to_dom", "list item without levels");
        return reference;
    };

    let list_handler = context.handlers.list;
    let list = list_handler(dom, &mut levels, parent, reference, context);
    let levels = match group.as_list_item_mut() {
        Some(item) => {
            item.levels = levels;
            &item.levels
        }
        None => return reference,
    };
    let Some(list) = list else {
        return reference;
    };
    let ordered = levels[depth].list_type == ListType::Ordered;

    let li = match context.cached(dom, group.cached_element) {
        Some(li) => {
            context.stats.reused += 1;
            li
        }
        None => {
            let li = dom.create_element("li");
            context.apply(FormatCategory::ListItemElement, &group.format, dom, li, &Format::default());
            context.apply(FormatCategory::SegmentOnBlock, &holder_format, dom, li, &Format::default());
            context.node_created(dom, li);
            li
        }
    };
    insert(dom, list, li, None);
    group.cached_element = context.allow_cache_element.then_some(li);

    if ordered {
        if let Some(count) = context.list.thread_counts.get_mut(depth) {
            *count = Some(count.map_or(1, |count| count + 1));
        }
    }
    context.list.thread_counts.truncate(depth + 1);

    let handler = context.handlers.block_group_children;
    handler(dom, &mut group.blocks, li, context);

    // The reference may have been a reused `li` or list element, so the next
    // block goes after the outermost list.
    match context.list.nodes.first() {
        Some((_, top)) if dom.parent(*top) == Some(parent) => dom.next_sibling(*top),
        _ => reference,
    }
}
