//! Built-in parse/apply pairs.

use tapestry_dom::normalize_color;

use super::{ElementMut, ElementRef, FormatContext, FormatHandler, FormatKey};

/// Handler for a key stored verbatim in one CSS property.
macro_rules! style_handler {
    ($parse:ident, $apply:ident, $field:ident, $property:literal) => {
        pub(super) fn $parse(
            format: &mut tapestry_model::Format,
            element: &$crate::format::ElementRef<'_>,
            _: &$crate::format::FormatContext<'_>,
            default: &$crate::format::DefaultStyle,
        ) {
            if let Some(value) = element.style_or_default($property, default) {
                format.$field = Some(value.trim().into());
            }
        }

        pub(super) fn $apply(
            format: &tapestry_model::Format,
            element: &mut $crate::format::ElementMut<'_>,
            context: &$crate::format::FormatContext<'_>,
        ) {
            if let Some(value) = format.$field.as_deref() {
                if context.implicit_format.$field.as_deref() != Some(value) {
                    element.set_style($property, value);
                }
            }
        }
    };
}

mod block;
mod common;
mod list;
mod segment;
mod table;

pub(super) fn default_handler(key: FormatKey) -> FormatHandler {
    match key {
        FormatKey::Aria => pair(common::parse_aria, common::apply_aria),
        FormatKey::BackgroundColor => pair(common::parse_background_color, common::apply_background_color),
        FormatKey::Bold => pair(segment::parse_bold, segment::apply_bold),
        FormatKey::Border => pair(common::parse_border, common::apply_border),
        FormatKey::BorderBox => pair(common::parse_border_box, common::apply_border_box),
        FormatKey::BoxShadow => pair(common::parse_box_shadow, common::apply_box_shadow),
        FormatKey::Direction => pair(block::parse_direction, block::apply_direction),
        FormatKey::Display => pair(common::parse_display, common::apply_display),
        FormatKey::Float => pair(common::parse_float, common::apply_float),
        FormatKey::FontFamily => pair(segment::parse_font_family, segment::apply_font_family),
        FormatKey::FontSize => pair(segment::parse_font_size, segment::apply_font_size),
        FormatKey::HtmlAlign => pair(block::parse_html_align, block::apply_html_align),
        FormatKey::Id => pair(common::parse_id, common::apply_id),
        FormatKey::ImageState => pair(common::parse_image_state, common::apply_image_state),
        FormatKey::Italic => pair(segment::parse_italic, segment::apply_italic),
        FormatKey::LetterSpacing => pair(segment::parse_letter_spacing, segment::apply_letter_spacing),
        FormatKey::LineHeight => pair(block::parse_line_height, block::apply_line_height),
        FormatKey::Link => pair(segment::parse_link, segment::apply_link),
        FormatKey::ListStyle => pair(list::parse_list_style, list::apply_list_style),
        FormatKey::Margin => pair(common::parse_margin, common::apply_margin),
        FormatKey::Padding => pair(common::parse_padding, common::apply_padding),
        FormatKey::Size => pair(common::parse_size, common::apply_size),
        FormatKey::Strike => pair(segment::parse_strike, segment::apply_strike),
        FormatKey::SuperOrSubScript => pair(segment::parse_super_or_sub, segment::apply_super_or_sub),
        FormatKey::TableLayout => pair(table::parse_table_layout, table::apply_table_layout),
        FormatKey::TableSpacing => pair(table::parse_table_spacing, table::apply_table_spacing),
        FormatKey::TextAlign => pair(block::parse_text_align, block::apply_text_align),
        FormatKey::TextColor => pair(segment::parse_text_color, segment::apply_text_color),
        FormatKey::TextColorOnTableCell => pair(segment::parse_text_color_on_table_cell, segment::apply_nothing),
        FormatKey::TextIndent => pair(block::parse_text_indent, block::apply_text_indent),
        FormatKey::UndeletableLink => pair(segment::parse_undeletable_link, segment::apply_undeletable_link),
        FormatKey::Underline => pair(segment::parse_underline, segment::apply_underline),
        FormatKey::VerticalAlign => pair(common::parse_vertical_align, common::apply_vertical_align),
        FormatKey::WhiteSpace => pair(block::parse_white_space, block::apply_white_space),
        FormatKey::WordBreak => pair(common::parse_word_break, common::apply_word_break),
    }
}

fn pair(parse: super::FormatParser, apply: super::FormatApplier) -> FormatHandler {
    FormatHandler { parse, apply }
}

// === Shared helpers ===

/// Which of the two color properties a handler owns.
#[derive(Clone, Copy)]
pub(super) enum ColorProperty {
    Text,
    Background,
}

impl ColorProperty {
    fn css(self) -> &'static str {
        match self {
            ColorProperty::Text => "color",
            ColorProperty::Background => "background-color",
        }
    }

    /// Attribute keeping the light-mode original in dark mode.
    pub(super) fn original_attribute(self) -> &'static str {
        match self {
            ColorProperty::Text => "data-ogsc",
            ColorProperty::Background => "data-ogsb",
        }
    }
}

/// Light-mode color of `element`, canonicalized.
pub(super) fn read_color(
    element: &ElementRef<'_>,
    property: ColorProperty,
    context: &FormatContext<'_>,
    default: &super::DefaultStyle,
) -> Option<String> {
    if context.is_dark_mode {
        if let Some(original) = element.attribute(property.original_attribute()) {
            return Some(normalize_color(original));
        }
    }
    let value = element.style_or_default(property.css(), default).or_else(|| match property {
        ColorProperty::Text => element.attribute("color"),
        ColorProperty::Background => element.attribute("bgcolor"),
    })?;
    let value = value.trim();
    (!value.is_empty()).then(|| normalize_color(value))
}

/// Write a light-mode color, transformed when rendering in dark mode.
pub(super) fn write_color(
    element: &mut ElementMut<'_>,
    property: ColorProperty,
    color: &str,
    context: &FormatContext<'_>,
) {
    if context.is_dark_mode {
        let dark = context.dark_color_handler.to_dark(color);
        element.set_style(property.css(), &dark);
        element.set_attribute(property.original_attribute(), color);
    } else {
        element.set_style(property.css(), color);
    }
}

/// Split a CSS box shorthand into top, right, bottom and left.
pub(super) fn expand_box(value: &str) -> Option<[&str; 4]> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        &[all] => Some([all; 4]),
        &[vertical, horizontal] => Some([vertical, horizontal, vertical, horizontal]),
        &[top, horizontal, bottom] => Some([top, horizontal, bottom, horizontal]),
        &[top, right, bottom, left] => Some([top, right, bottom, left]),
        _ => None,
    }
}
