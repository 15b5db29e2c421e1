//! Content model to DOM conversion.
//!
//! Blocks render into their parent through a reference-node walk: each
//! handler places its element before the current reference and hands back
//! the reference for the next block. Cached elements already in place are
//! kept, elements found elsewhere are moved, and nodes with no model
//! counterpart are detached at the end of each group. Every handler can be
//! replaced through [`ModelHandlers`].
//!
//! The model's selection comes back as a [`DomSelection`] for the caller to
//! apply: a table selection wins over an image selection, which wins over the
//! range covered by selected segments and markers.

mod block;
mod context;
mod list;
mod segment;
mod table;

pub use block::{
    handle_block, handle_block_group_children, handle_divider, handle_entity_block, handle_format_container,
    handle_general, handle_paragraph, reuse_cached_element,
};
pub use context::{
    BlockGroupChildrenHandler, BlockHandler, ListHandler, ListRenderState, ModelHandlers, ModelToDomContext,
    ModelToDomOption, NodeCreatedCallback, RenderSelection, RenderStats, SegmentDecoratorHandler, SegmentHandler,
};
pub use list::{handle_list, handle_list_item};
pub use segment::{
    handle_br, handle_entity_segment, handle_general_segment, handle_image, handle_segment, handle_segment_decorator,
    handle_text,
};
pub use table::handle_table;

use tapestry_dom::{Dom, DomSelection, NodeId};
use tapestry_model::ContentModelDocument;
use web_time::Instant;

/// Render `model` as the children of `container`.
///
/// Records the rendered nodes in the model's `cached_element` fields and
/// returns the selection the model describes, if any.
pub fn content_model_to_dom(
    dom: &mut Dom,
    container: NodeId,
    model: &mut ContentModelDocument,
    context: &mut ModelToDomContext,
) -> Option<DomSelection> {
    let started = Instant::now();
    context.reset_render_state();

    let handler = context.handlers.block_group_children;
    handler(dom, &mut model.blocks, container, context);
    let selection = context
        .selection
        .resolve(dom, model.has_reverted_range_selection);

    tracing::debug!(
        target: "tapestry::model_to_dom",
        created = context.stats.created,
        reused = context.stats.reused,
        has_selection = selection.is_some(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "rendered content model"
    );
    selection
}
