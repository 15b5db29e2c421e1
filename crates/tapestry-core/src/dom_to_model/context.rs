//! Settings and traversal state for DOM to model conversion.

use std::collections::HashMap;
use std::rc::Rc;

use smol_str::SmolStr;
use tapestry_dom::{Dom, DomPosition, DomSelection, NodeId};
use tapestry_model::{Block, Code, Format, Link, ListLevel};

use crate::format::{
    DarkColorHandler, FormatCategory, FormatContext, FormatKey, FormatParser, FormatParsers,
    LuminanceDarkColorHandler, parse_format,
};

/// Converts one element into model content appended to `group`.
pub type ElementProcessor = fn(&mut Vec<Block>, &mut Dom, NodeId, &mut DomToModelContext);

/// Decides whether a predicate-gated processor takes an element.
pub type ElementPredicate = fn(&Dom, NodeId) -> bool;

/// Caller customization of DOM to model conversion.
#[derive(Clone, Default)]
pub struct DomToModelOption {
    /// Processors replacing the default for a tag.
    pub processor_override: Vec<(SmolStr, ElementProcessor)>,
    /// Processors tried before tag dispatch, first match wins.
    pub predicate_processors: Vec<(ElementPredicate, ElementProcessor)>,
    /// Per-key parser replacements. `None` disables a key.
    pub format_parser_override: Vec<(FormatKey, Option<FormatParser>)>,
    /// Parsers run after the keyed parsers of a category.
    pub additional_format_parsers: Vec<(FormatCategory, FormatParser)>,
    /// Drop elements styled `display: none`.
    pub skip_hidden: bool,
}

/// Thread state of the list markup seen so far.
#[derive(Debug, Clone, Default)]
pub struct ListContext {
    /// Open list levels, outermost first.
    pub levels: Vec<ListLevel>,
    /// Last number used per depth. `None` when no ordered list runs at that depth.
    pub thread_counts: Vec<Option<u32>>,
}

/// Where the traversal stands relative to the selection hint.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub hint: Option<DomSelection>,
    /// Between the range start and end.
    pub is_in_selection: bool,
}

impl SelectionState {
    pub fn range_start(&self) -> Option<DomPosition> {
        match self.hint {
            Some(DomSelection::Range { range, .. }) => Some(range.start),
            _ => None,
        }
    }

    pub fn range_end(&self) -> Option<DomPosition> {
        match self.hint {
            Some(DomSelection::Range { range, .. }) => Some(range.end),
            _ => None,
        }
    }
}

/// Everything a processor needs: the handler tables, the environment and the
/// formats inherited from the elements above the current one.
pub struct DomToModelContext {
    pub parsers: FormatParsers,
    pub processors: HashMap<SmolStr, ElementProcessor>,
    pub predicate_processors: Vec<(ElementPredicate, ElementProcessor)>,
    pub is_dark_mode: bool,
    pub dark_color_handler: Rc<dyn DarkColorHandler>,
    pub skip_hidden: bool,
    /// Record `cached_element` on the nodes produced.
    pub allow_cache_element: bool,

    /// Segment format inherited by text under the current element.
    pub segment_format: Format,
    /// Block format for implicit paragraphs created under the current element.
    pub block_format: Format,
    pub link: Option<Link>,
    pub code: Option<Code>,
    pub list: ListContext,
    pub selection: SelectionState,
    /// The last paragraph of the current group takes no more segments.
    pub(crate) block_closed: bool,
}

impl DomToModelContext {
    pub fn new(option: &DomToModelOption, is_dark_mode: bool, dark_color_handler: Rc<dyn DarkColorHandler>) -> Self {
        let mut parsers = FormatParsers::default();
        for (key, parser) in &option.format_parser_override {
            parsers.set(*key, *parser);
        }
        for (category, parser) in &option.additional_format_parsers {
            parsers.add(*category, *parser);
        }
        Self {
            parsers,
            processors: option.processor_override.iter().cloned().collect(),
            predicate_processors: option.predicate_processors.clone(),
            is_dark_mode,
            dark_color_handler,
            skip_hidden: option.skip_hidden,
            allow_cache_element: true,
            segment_format: Format::default(),
            block_format: Format::default(),
            link: None,
            code: None,
            list: ListContext::default(),
            selection: SelectionState::default(),
            block_closed: false,
        }
    }

    /// Light-mode context with default handlers.
    pub fn with_defaults() -> Self {
        Self::new(&DomToModelOption::default(), false, Rc::new(LuminanceDarkColorHandler))
    }

    pub fn with_selection(mut self, selection: Option<DomSelection>) -> Self {
        self.selection = SelectionState {
            hint: selection,
            is_in_selection: false,
        };
        self
    }

    /// Run the parsers of `category` for `element` on top of `format`.
    pub fn parse(&self, category: FormatCategory, format: &mut Format, dom: &Dom, element: NodeId) {
        let context = FormatContext::new(self.is_dark_mode, self.dark_color_handler.as_ref());
        parse_format(&self.parsers, category, format, dom, element, &context);
    }

    /// Fresh format holding only what `category` finds on `element`.
    pub fn parse_new(&self, category: FormatCategory, dom: &Dom, element: NodeId) -> Format {
        let mut format = Format::default();
        self.parse(category, &mut format, dom, element);
        format
    }

    pub(crate) fn cache(&self, element: NodeId) -> Option<NodeId> {
        self.allow_cache_element.then_some(element)
    }
}
