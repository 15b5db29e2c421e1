//! List markup.
//!
//! Items are flattened: every `li` becomes a list item group in the group
//! that holds the outermost list, in document order, with the chain of
//! enclosing list levels attached. Numbering is threaded per depth through
//! [`ListContext::thread_counts`] so an `ol` interrupted by unrelated
//! wrappers keeps counting instead of restarting at 1.
//!
//! [`ListContext::thread_counts`]: super::context::ListContext::thread_counts

use tapestry_dom::{Dom, NodeId};
use tapestry_model::{Block, BlockGroup, GroupKind, ListLevel, ListType};

use super::context::DomToModelContext;
use super::processors::{block_processor, dataset, process_children, with_segment_format};
use crate::format::FormatCategory;

/// True when the last meaningful block of `group` is a list item, so a new
/// top-level list continues its thread. Empty paragraphs are skipped because
/// wrapper elements leave them behind while they are still open.
fn continues_list(group: &[Block]) -> bool {
    group
        .iter()
        .rev()
        .find(|block| !matches!(block, Block::Paragraph(p) if p.segments.is_empty()))
        .is_some_and(|block| matches!(block, Block::BlockGroup(g) if g.as_list_item().is_some()))
}

fn parse_start(dom: &Dom, element: NodeId) -> Option<u32> {
    dom.attribute(element, "start")?.trim().parse().ok()
}

/// `ol`/`ul`: pushes a level and decides whether numbering continues.
pub fn list_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let Some(list_type) = dom.tag(element).and_then(ListType::from_tag) else {
        return;
    };
    let depth = context.list.levels.len();
    if depth == 0 && !continues_list(group) {
        context.list.thread_counts.clear();
    }
    if context.list.thread_counts.len() <= depth {
        context.list.thread_counts.resize(depth + 1, None);
    }

    let mut level = ListLevel::new(list_type, context.parse_new(FormatCategory::ListLevel, dom, element));
    level.dataset = dataset(dom, element);
    level.cached_element = context.cache(element);

    if list_type == ListType::Ordered {
        let next = context.list.thread_counts[depth].map(|count| count + 1);
        let restart = match (next, parse_start(dom, element)) {
            (Some(next), Some(start)) if start != next => Some(start),
            (Some(_), _) => None,
            (None, start) => Some(start.unwrap_or(1)),
        };
        if let Some(start) = restart {
            level.format.start_number_override = Some(start);
            context.list.thread_counts[depth] = Some(start.saturating_sub(1));
        }
        tracing::trace!(
            target: "tapestry::dom_to_model",
            depth,
            restart = ?restart,
            "ordered list"
        );
    }

    context.list.levels.push(level);
    context.block_closed = true;
    process_children(group, dom, element, context);
    context.list.levels.pop();
    context.block_closed = true;
}

/// `li`: one list item group plus any items nested inside it, moved after it.
pub fn list_item_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let Some(depth) = context.list.levels.len().checked_sub(1) else {
        block_processor(group, dom, element, context);
        return;
    };
    if context.list.levels[depth].list_type == ListType::Ordered {
        let count = context.list.thread_counts.get(depth).copied().flatten().unwrap_or(0);
        if context.list.thread_counts.len() <= depth {
            context.list.thread_counts.resize(depth + 1, None);
        }
        context.list.thread_counts[depth] = Some(count + 1);
    }
    context.list.thread_counts.truncate(depth + 1);

    let mut segment_format = context.segment_format.clone();
    context.parse(FormatCategory::SegmentOnBlock, &mut segment_format, dom, element);

    let mut item = BlockGroup::list_item(&context.list.levels, segment_format.clone());
    item.format = context.parse_new(FormatCategory::ListItemElement, dom, element);
    item.cached_element = context.cache(element);
    // Only the first item of a restarted list carries the override.
    context.list.levels[depth].format.start_number_override = None;

    context.block_closed = false;
    with_segment_format(context, segment_format, |context| {
        process_children(&mut item.blocks, dom, element, context)
    });

    let (nested, own): (Vec<Block>, Vec<Block>) = std::mem::take(&mut item.blocks)
        .into_iter()
        .partition(|block| matches!(block, Block::BlockGroup(BlockGroup { kind: GroupKind::ListItem(_), .. })));
    item.blocks = own;
    group.push(Block::BlockGroup(item));
    group.extend(nested);
    context.block_closed = true;
}

#[cfg(test)]
mod tests {
    use tapestry_model::{Format, Paragraph};

    use super::*;

    #[test]
    fn test_continues_past_empty_wrapper_paragraph() {
        let item = Block::BlockGroup(BlockGroup::list_item(
            &[ListLevel::new(ListType::Ordered, Format::default())],
            Format::default(),
        ));
        let empty = Block::Paragraph(Paragraph::new(false, Format::default()));
        assert!(continues_list(&[item.clone(), empty]));
        assert!(!continues_list(&[]));

        let text = Block::Paragraph(
            Paragraph::new(true, Format::default())
                .with_segments(vec![tapestry_model::Segment::text("x", Format::default())]),
        );
        assert!(!continues_list(&[item, text]));
    }
}
