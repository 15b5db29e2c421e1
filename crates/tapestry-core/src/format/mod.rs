//! Format handler registry.
//!
//! Every [`FormatKey`] owns one parse/apply pair. A parser reads inline style,
//! attributes and the tag's default style into the fields of a [`Format`] it
//! owns; an applier writes those fields back onto an element. Which keys run
//! for a node is decided by its [`FormatCategory`], a plain composition table.
//!
//! Callers customize behavior per key through [`FormatParsers`] and
//! [`FormatAppliers`]: a key can be replaced, disabled (`None`), or extended
//! with additional per-category parsers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tapestry_dom::{Dom, NodeId, StyleDeclaration};
use tapestry_model::Format;

mod categories;
pub mod dark;
pub mod default_style;
mod handlers;

pub use categories::FormatCategory;
pub use dark::{DarkColorHandler, LuminanceDarkColorHandler};
pub use default_style::{DefaultStyle, default_style, implicit_format};

/// Attribute keys with a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormatKey {
    Aria,
    BackgroundColor,
    Bold,
    Border,
    BorderBox,
    BoxShadow,
    Direction,
    Display,
    Float,
    FontFamily,
    FontSize,
    HtmlAlign,
    Id,
    ImageState,
    Italic,
    LetterSpacing,
    LineHeight,
    Link,
    ListStyle,
    Margin,
    Padding,
    Size,
    Strike,
    SuperOrSubScript,
    TableLayout,
    TableSpacing,
    TextAlign,
    TextColor,
    /// Text color of a table cell, inherited by its segments. Rendering is
    /// left to the cell.
    TextColorOnTableCell,
    TextIndent,
    UndeletableLink,
    Underline,
    VerticalAlign,
    WhiteSpace,
    WordBreak,
}

impl FormatKey {
    pub const ALL: [FormatKey; 35] = [
        FormatKey::Aria,
        FormatKey::BackgroundColor,
        FormatKey::Bold,
        FormatKey::Border,
        FormatKey::BorderBox,
        FormatKey::BoxShadow,
        FormatKey::Direction,
        FormatKey::Display,
        FormatKey::Float,
        FormatKey::FontFamily,
        FormatKey::FontSize,
        FormatKey::HtmlAlign,
        FormatKey::Id,
        FormatKey::ImageState,
        FormatKey::Italic,
        FormatKey::LetterSpacing,
        FormatKey::LineHeight,
        FormatKey::Link,
        FormatKey::ListStyle,
        FormatKey::Margin,
        FormatKey::Padding,
        FormatKey::Size,
        FormatKey::Strike,
        FormatKey::SuperOrSubScript,
        FormatKey::TableLayout,
        FormatKey::TableSpacing,
        FormatKey::TextAlign,
        FormatKey::TextColor,
        FormatKey::TextColorOnTableCell,
        FormatKey::TextIndent,
        FormatKey::UndeletableLink,
        FormatKey::Underline,
        FormatKey::VerticalAlign,
        FormatKey::WhiteSpace,
        FormatKey::WordBreak,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// The built-in parse/apply pair for this key.
    pub fn handler(self) -> FormatHandler {
        handlers::default_handler(self)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Reads the keys a handler owns from `element` into the format record.
pub type FormatParser = fn(&mut Format, &ElementRef<'_>, &FormatContext<'_>, &DefaultStyle);

/// Writes the keys a handler owns from the format record onto `element`.
pub type FormatApplier = fn(&Format, &mut ElementMut<'_>, &FormatContext<'_>);

/// Parse/apply pair for one key.
#[derive(Clone, Copy)]
pub struct FormatHandler {
    pub parse: FormatParser,
    pub apply: FormatApplier,
}

/// Shared state handed to every parser and applier.
#[derive(Clone, Copy)]
pub struct FormatContext<'a> {
    pub is_dark_mode: bool,
    pub dark_color_handler: &'a dyn DarkColorHandler,
    /// What the element already shows without inline style, such as bold for
    /// `h1`. Appliers skip values that match it.
    pub implicit_format: &'a Format,
}

impl<'a> FormatContext<'a> {
    pub fn new(is_dark_mode: bool, dark_color_handler: &'a dyn DarkColorHandler) -> Self {
        Self {
            is_dark_mode,
            dark_color_handler,
            implicit_format: empty_format(),
        }
    }

    pub fn with_implicit_format(self, implicit_format: &'a Format) -> Self {
        Self {
            implicit_format,
            ..self
        }
    }
}

fn empty_format() -> &'static Format {
    static EMPTY: std::sync::LazyLock<Format> = std::sync::LazyLock::new(Format::default);
    &EMPTY
}

// === Element views ===

/// Read-only view of an element for parsers.
///
/// The inline style is parsed once per view.
pub struct ElementRef<'a> {
    pub dom: &'a Dom,
    pub node: NodeId,
    style: StyleDeclaration,
}

impl<'a> ElementRef<'a> {
    pub fn new(dom: &'a Dom, node: NodeId) -> Self {
        Self {
            dom,
            node,
            style: dom.style(node),
        }
    }

    /// Lowercase tag, empty for non-elements.
    pub fn tag(&self) -> &'a str {
        self.dom.tag(self.node).unwrap_or("")
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.dom.attribute(self.node, name)
    }

    /// Inline style property, ignoring the tag's default style.
    pub fn style(&self, name: &str) -> Option<&str> {
        self.style.get(name)
    }

    /// Inline style property, falling back to the tag's default style.
    pub fn style_or_default<'s>(&'s self, name: &str, default: &DefaultStyle) -> Option<&'s str> {
        self.style
            .get(name)
            .or_else(|| default_style::lookup(default, name))
    }
}

/// Writable view of an element for appliers.
///
/// Style writes are buffered and flushed by [`ElementMut::commit`] so a node
/// running a whole category only rewrites its `style` attribute once.
pub struct ElementMut<'a> {
    pub dom: &'a mut Dom,
    pub node: NodeId,
    style: StyleDeclaration,
    style_changed: bool,
    segment_carrier: bool,
}

impl<'a> ElementMut<'a> {
    pub fn new(dom: &'a mut Dom, node: NodeId) -> Self {
        let style = dom.style(node);
        Self {
            dom,
            node,
            style,
            style_changed: false,
            segment_carrier: false,
        }
    }

    /// View of the element holding a segment's content. Element-based keys
    /// wrap that content in formatting tags instead of writing style.
    pub fn segment_carrier(dom: &'a mut Dom, node: NodeId) -> Self {
        let mut element = Self::new(dom, node);
        element.segment_carrier = true;
        element
    }

    pub fn is_segment_carrier(&self) -> bool {
        self.segment_carrier
    }

    pub fn tag(&self) -> &str {
        self.dom.tag(self.node).unwrap_or("")
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        self.style.get(name)
    }

    pub fn set_style(&mut self, name: &str, value: &str) {
        self.style.set(name, value);
        self.style_changed = true;
    }

    pub fn remove_style(&mut self, name: &str) {
        if self.style.remove(name).is_some() {
            self.style_changed = true;
        }
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if let Err(error) = self.dom.set_attribute(self.node, name, value) {
            tracing::debug!(target: "tapestry::format", %error, name, "attribute write failed");
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        if let Err(error) = self.dom.remove_attribute(self.node, name) {
            tracing::debug!(target: "tapestry::format", %error, name, "attribute removal failed");
        }
    }

    /// Wrap the current children in a new `tag` element.
    ///
    /// The first wrap ends up innermost. Only meaningful on segment carriers.
    pub fn wrap_content(&mut self, tag: &str) {
        if let Err(error) = self.dom.wrap_children(self.node, tag) {
            tracing::debug!(target: "tapestry::format", %error, tag, "content wrap failed");
        }
    }

    /// Flush buffered style writes.
    pub fn commit(self) {
        if !self.style_changed {
            return;
        }
        if let Err(error) = self.dom.set_style(self.node, &self.style) {
            tracing::debug!(target: "tapestry::format", %error, "style write failed");
        }
    }
}

// === Handler tables ===

/// Parser per key plus extra parsers per category.
#[derive(Clone)]
pub struct FormatParsers {
    table: [Option<FormatParser>; FormatKey::COUNT],
    additional: HashMap<FormatCategory, Vec<FormatParser>>,
}

impl Default for FormatParsers {
    fn default() -> Self {
        let mut table: [Option<FormatParser>; FormatKey::COUNT] = [None; FormatKey::COUNT];
        for key in FormatKey::ALL {
            table[key.slot()] = Some(key.handler().parse);
        }
        Self {
            table,
            additional: HashMap::new(),
        }
    }
}

impl FormatParsers {
    /// Replace the parser for `key`. `None` disables the key.
    pub fn set(&mut self, key: FormatKey, parser: Option<FormatParser>) {
        self.table[key.slot()] = parser;
    }

    /// Run `parser` after the keyed parsers of `category`.
    pub fn add(&mut self, category: FormatCategory, parser: FormatParser) {
        self.additional.entry(category).or_default().push(parser);
    }

    pub fn get(&self, key: FormatKey) -> Option<FormatParser> {
        self.table[key.slot()]
    }

    /// Run every parser of `category` over `element` into `format`.
    pub fn parse(
        &self,
        category: FormatCategory,
        format: &mut Format,
        element: &ElementRef<'_>,
        context: &FormatContext<'_>,
        default: &DefaultStyle,
    ) {
        for key in category.keys() {
            if let Some(parser) = self.get(*key) {
                parser(format, element, context, default);
            }
        }
        if let Some(extra) = self.additional.get(&category) {
            for parser in extra {
                parser(format, element, context, default);
            }
        }
    }
}

/// Applier per key.
#[derive(Clone)]
pub struct FormatAppliers {
    table: [Option<FormatApplier>; FormatKey::COUNT],
}

impl Default for FormatAppliers {
    fn default() -> Self {
        let mut table: [Option<FormatApplier>; FormatKey::COUNT] = [None; FormatKey::COUNT];
        for key in FormatKey::ALL {
            table[key.slot()] = Some(key.handler().apply);
        }
        Self { table }
    }
}

impl FormatAppliers {
    /// Replace the applier for `key`. `None` disables the key.
    pub fn set(&mut self, key: FormatKey, applier: Option<FormatApplier>) {
        self.table[key.slot()] = applier;
    }

    pub fn get(&self, key: FormatKey) -> Option<FormatApplier> {
        self.table[key.slot()]
    }

    /// Run every applier of `category` and flush the style.
    pub fn apply(
        &self,
        category: FormatCategory,
        format: &Format,
        mut element: ElementMut<'_>,
        context: &FormatContext<'_>,
    ) {
        self.apply_keys(category.keys(), format, &mut element, context);
        element.commit();
    }

    /// Run the appliers of `keys` without flushing.
    pub fn apply_keys(
        &self,
        keys: &[FormatKey],
        format: &Format,
        element: &mut ElementMut<'_>,
        context: &FormatContext<'_>,
    ) {
        for key in keys {
            if let Some(applier) = self.get(*key) {
                applier(format, element, context);
            }
        }
    }
}

/// Parse `category` for `node` with the node's own default style.
pub fn parse_format(
    parsers: &FormatParsers,
    category: FormatCategory,
    format: &mut Format,
    dom: &Dom,
    node: NodeId,
    context: &FormatContext<'_>,
) {
    let element = ElementRef::new(dom, node);
    let default = default_style(element.tag());
    parsers.parse(category, format, &element, context, default);
}
