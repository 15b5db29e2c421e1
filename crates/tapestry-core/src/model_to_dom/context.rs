//! Settings, handler table and per-render state for model to DOM conversion.

use std::collections::HashSet;
use std::rc::Rc;

use tapestry_dom::{Dom, DomPosition, DomRange, DomSelection, NodeId};
use tapestry_model::{
    Block, BlockGroup, CellRect, Divider, Entity, Format, ListLevel, Paragraph, Segment, Table,
};

use super::{block, list, segment, table};
use crate::dom_to_model::is_block_tag;
use crate::format::{
    DarkColorHandler, ElementMut, FormatApplier, FormatAppliers, FormatCategory, FormatContext, FormatKey,
    LuminanceDarkColorHandler,
};

/// Renders a sequence of blocks as the children of `parent`.
pub type BlockGroupChildrenHandler = fn(&mut Dom, &mut [Block], NodeId, &mut ModelToDomContext);

/// Renders one block before `reference` and returns the reference for the
/// next sibling.
pub type BlockHandler<T> = fn(&mut Dom, &mut T, NodeId, Option<NodeId>, &mut ModelToDomContext) -> Option<NodeId>;

/// Returns the list element an item of the given levels belongs in,
/// creating list elements as needed.
pub type ListHandler = fn(&mut Dom, &mut [ListLevel], NodeId, Option<NodeId>, &mut ModelToDomContext) -> Option<NodeId>;

/// Appends the nodes of one segment to a paragraph element.
pub type SegmentHandler = fn(&mut Dom, &mut Segment, NodeId, &mut ModelToDomContext);

/// Wraps the content of a segment carrier in `code`/`a` elements.
pub type SegmentDecoratorHandler = fn(&mut Dom, &Segment, NodeId, &mut ModelToDomContext);

/// Called with every element created for a block or segment.
pub type NodeCreatedCallback = fn(&mut Dom, NodeId);

/// One render handler per model node kind.
#[derive(Clone, Copy)]
pub struct ModelHandlers {
    pub block_group_children: BlockGroupChildrenHandler,
    pub block: BlockHandler<Block>,
    pub paragraph: BlockHandler<Paragraph>,
    pub table: BlockHandler<Table>,
    pub divider: BlockHandler<Divider>,
    pub entity_block: BlockHandler<Entity>,
    pub format_container: BlockHandler<BlockGroup>,
    pub list_item: BlockHandler<BlockGroup>,
    pub list: ListHandler,
    pub general: BlockHandler<BlockGroup>,
    pub segment: SegmentHandler,
    pub text: SegmentHandler,
    pub br: SegmentHandler,
    pub image: SegmentHandler,
    pub entity_segment: SegmentHandler,
    pub general_segment: SegmentHandler,
    pub segment_decorator: SegmentDecoratorHandler,
}

impl Default for ModelHandlers {
    fn default() -> Self {
        Self {
            block_group_children: block::handle_block_group_children,
            block: block::handle_block,
            paragraph: block::handle_paragraph,
            table: table::handle_table,
            divider: block::handle_divider,
            entity_block: block::handle_entity_block,
            format_container: block::handle_format_container,
            list_item: list::handle_list_item,
            list: list::handle_list,
            general: block::handle_general,
            segment: segment::handle_segment,
            text: segment::handle_text,
            br: segment::handle_br,
            image: segment::handle_image,
            entity_segment: segment::handle_entity_segment,
            general_segment: segment::handle_general_segment,
            segment_decorator: segment::handle_segment_decorator,
        }
    }
}

/// Caller customization of model to DOM conversion.
#[derive(Clone, Default)]
pub struct ModelToDomOption {
    /// Per-key applier replacements. `None` disables a key.
    pub format_applier_override: Vec<(FormatKey, Option<FormatApplier>)>,
    pub handlers: ModelHandlers,
    pub on_node_created: Option<NodeCreatedCallback>,
}

/// Open list elements, outermost first, and numbering per depth.
#[derive(Debug, Clone, Default)]
pub struct ListRenderState {
    pub nodes: Vec<(ListLevel, NodeId)>,
    /// Last number rendered per depth.
    pub thread_counts: Vec<Option<u32>>,
}

/// A selection boundary relative to nodes that may still move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectionPoint {
    After(NodeId),
    StartOf(NodeId),
}

/// Selection collected while rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderSelection {
    pub(crate) start: Option<SelectionPoint>,
    pub(crate) end: Option<SelectionPoint>,
    pub image: Option<NodeId>,
    pub table: Option<(NodeId, CellRect)>,
}

impl RenderSelection {
    pub(crate) fn record(&mut self, start: SelectionPoint, end: SelectionPoint) {
        if self.start.is_none() {
            self.start = Some(start);
        }
        self.end = Some(end);
    }

    /// Points at the start of `from` now sit where `from` was.
    pub(crate) fn remap_start_of(&mut self, dom: &Dom, from: NodeId) {
        let replacement = match dom.previous_sibling(from) {
            Some(previous) => Some(SelectionPoint::After(previous)),
            None => dom.parent(from).map(SelectionPoint::StartOf),
        };
        let Some(replacement) = replacement else {
            return;
        };
        for point in [&mut self.start, &mut self.end].into_iter().flatten() {
            if *point == SelectionPoint::StartOf(from) {
                *point = replacement;
            }
        }
    }

    /// Table, then image, then range.
    pub(crate) fn resolve(&self, dom: &Dom, is_reverted: bool) -> Option<DomSelection> {
        if let Some((table, rect)) = self.table {
            return Some(DomSelection::Table {
                table,
                first_column: rect.first_column,
                first_row: rect.first_row,
                last_column: rect.last_column,
                last_row: rect.last_row,
            });
        }
        if let Some(image) = self.image {
            return Some(DomSelection::Image { image });
        }
        let start = resolve_point(dom, self.start?)?;
        let end = resolve_point(dom, self.end?)?;
        Some(DomSelection::Range {
            range: DomRange::new(start, end),
            is_reverted,
        })
    }
}

/// Last text node inside `node` through inline wrappers, if it ends in one.
/// Entities and block elements are opaque.
fn trailing_text(dom: &Dom, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        if dom.is_text(current) {
            return Some(current);
        }
        if dom.has_class(current, tapestry_model::ENTITY_CLASS) || dom.tag(current).is_some_and(is_block_tag) {
            return None;
        }
        current = dom.last_child(current)?;
    }
}

fn resolve_point(dom: &Dom, point: SelectionPoint) -> Option<DomPosition> {
    match point {
        SelectionPoint::StartOf(container) => dom.is_alive(container).then(|| DomPosition::new(container, 0)),
        SelectionPoint::After(node) => {
            if let Some(text) = trailing_text(dom, node) {
                return Some(DomPosition::new(text, dom.node_length(text)));
            }
            let parent = dom.parent(node)?;
            Some(DomPosition::new(parent, dom.index_in_parent(node)? + 1))
        }
    }
}

/// Node counts of one render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub created: usize,
    pub reused: usize,
}

/// Handler table, environment and state of one render.
pub struct ModelToDomContext {
    pub appliers: FormatAppliers,
    pub handlers: ModelHandlers,
    pub is_dark_mode: bool,
    pub dark_color_handler: Rc<dyn DarkColorHandler>,
    /// Reuse and record `cached_element`.
    pub allow_cache_element: bool,
    /// Bracket read-only inline entities with zero-width delimiters.
    pub add_delimiter_for_entity: bool,
    pub on_node_created: Option<NodeCreatedCallback>,

    /// Format segment appliers treat as already shown by the enclosing
    /// element.
    pub implicit_segment_format: Format,
    pub list: ListRenderState,
    pub selection: RenderSelection,
    pub stats: RenderStats,
    /// Text nodes claimed in this render. A text node split across several
    /// segments backs only the first.
    pub(crate) used_text_nodes: HashSet<NodeId>,
    /// List elements already holding a level in this render.
    pub(crate) used_list_elements: HashSet<NodeId>,
}

impl ModelToDomContext {
    pub fn new(option: &ModelToDomOption, is_dark_mode: bool, dark_color_handler: Rc<dyn DarkColorHandler>) -> Self {
        let mut appliers = FormatAppliers::default();
        for (key, applier) in &option.format_applier_override {
            appliers.set(*key, *applier);
        }
        Self {
            appliers,
            handlers: option.handlers,
            is_dark_mode,
            dark_color_handler,
            allow_cache_element: true,
            add_delimiter_for_entity: true,
            on_node_created: option.on_node_created,
            implicit_segment_format: Format::default(),
            list: ListRenderState::default(),
            selection: RenderSelection::default(),
            stats: RenderStats::default(),
            used_text_nodes: HashSet::new(),
            used_list_elements: HashSet::new(),
        }
    }

    /// Light-mode context with default handlers.
    pub fn with_defaults() -> Self {
        Self::new(&ModelToDomOption::default(), false, Rc::new(LuminanceDarkColorHandler))
    }

    pub(crate) fn reset_render_state(&mut self) {
        self.implicit_segment_format = Format::default();
        self.list = ListRenderState::default();
        self.selection = RenderSelection::default();
        self.stats = RenderStats::default();
        self.used_text_nodes.clear();
        self.used_list_elements.clear();
    }

    /// Run the appliers of `category` on `element`, skipping what `implicit`
    /// already shows.
    pub fn apply(&self, category: FormatCategory, format: &Format, dom: &mut Dom, element: NodeId, implicit: &Format) {
        let context =
            FormatContext::new(self.is_dark_mode, self.dark_color_handler.as_ref()).with_implicit_format(implicit);
        self.appliers.apply(category, format, ElementMut::new(dom, element), &context);
    }

    /// Run only `keys`, for node kinds that mix categories.
    pub fn apply_keys(&self, keys: &[FormatKey], format: &Format, dom: &mut Dom, element: NodeId, implicit: &Format) {
        let context =
            FormatContext::new(self.is_dark_mode, self.dark_color_handler.as_ref()).with_implicit_format(implicit);
        let mut target = ElementMut::new(dom, element);
        self.appliers.apply_keys(keys, format, &mut target, &context);
        target.commit();
    }

    /// Segment keys on a carrier, so element-based keys wrap its content.
    pub(crate) fn apply_segment(&self, format: &Format, dom: &mut Dom, carrier: NodeId) {
        let context = FormatContext::new(self.is_dark_mode, self.dark_color_handler.as_ref())
            .with_implicit_format(&self.implicit_segment_format);
        self.appliers.apply(
            FormatCategory::Segment,
            format,
            ElementMut::segment_carrier(dom, carrier),
            &context,
        );
    }

    pub(crate) fn cached(&self, dom: &Dom, element: Option<NodeId>) -> Option<NodeId> {
        element.filter(|node| self.allow_cache_element && dom.is_alive(*node))
    }

    pub(crate) fn node_created(&mut self, dom: &mut Dom, node: NodeId) {
        self.stats.created += 1;
        if let Some(callback) = self.on_node_created {
            callback(dom, node);
        }
    }
}
