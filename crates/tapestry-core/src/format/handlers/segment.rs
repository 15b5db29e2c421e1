//! Inline keys.
//!
//! Element-based keys wrap a segment carrier's content in formatting tags so
//! the output stays readable by other editors; on any other element they fall
//! back to style.

use tapestry_model::Format;
use tapestry_model::api::xss::check_xss;

use super::{ColorProperty, read_color, write_color};
use crate::format::{DefaultStyle, ElementMut, ElementRef, FormatContext};

style_handler!(parse_font_family, apply_font_family, font_family, "font-family");
style_handler!(parse_font_size, apply_font_size, font_size, "font-size");
style_handler!(parse_letter_spacing, apply_letter_spacing, letter_spacing, "letter-spacing");

fn wrap_or_style(element: &mut ElementMut<'_>, tag: &str, property: &str, value: &str) {
    if element.is_segment_carrier() {
        element.wrap_content(tag);
    } else {
        element.set_style(property, value);
    }
}

pub(super) fn parse_bold(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    if let Some(weight) = element.style_or_default("font-weight", default) {
        format.font_weight = Some(weight.trim().to_ascii_lowercase().into());
    }
}

pub(super) fn apply_bold(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
    let Some(weight) = format.font_weight.as_deref() else {
        return;
    };
    let implicit_bold = context.implicit_format.is_bold();
    if format.is_bold() && !implicit_bold {
        wrap_or_style(element, "b", "font-weight", "bold");
    } else if !format.is_bold() && (implicit_bold || weight != "normal") {
        element.set_style("font-weight", weight);
    }
}

pub(super) fn parse_italic(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    if let Some(style) = element.style_or_default("font-style", default) {
        let style = style.trim();
        format.italic = Some(style == "italic" || style == "oblique");
    }
}

pub(super) fn apply_italic(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
    let implicit = context.implicit_format.italic == Some(true);
    match format.italic {
        Some(true) if !implicit => wrap_or_style(element, "i", "font-style", "italic"),
        Some(false) if implicit => element.set_style("font-style", "normal"),
        _ => {}
    }
}

fn decoration<'e>(element: &'e ElementRef<'_>, default: &DefaultStyle) -> Option<&'e str> {
    element
        .style("text-decoration-line")
        .or_else(|| element.style_or_default("text-decoration", default))
}

pub(super) fn parse_underline(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    match decoration(element, default) {
        Some(value) if value.contains("underline") => format.underline = Some(true),
        Some("none") => format.underline = Some(false),
        _ => {}
    }
}

pub(super) fn apply_underline(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
    let implicit = context.implicit_format.underline == Some(true);
    match format.underline {
        Some(true) if !implicit => wrap_or_style(element, "u", "text-decoration", "underline"),
        Some(false) if implicit => element.set_style("text-decoration", "none"),
        _ => {}
    }
}

pub(super) fn parse_strike(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    match decoration(element, default) {
        Some(value) if value.contains("line-through") => format.strike = Some(true),
        Some("none") => format.strike = Some(false),
        _ => {}
    }
}

pub(super) fn apply_strike(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
    let implicit = context.implicit_format.strike == Some(true);
    match format.strike {
        Some(true) if !implicit => wrap_or_style(element, "s", "text-decoration", "line-through"),
        Some(false) if implicit => element.set_style("text-decoration", "none"),
        _ => {}
    }
}

/// Nested `sup`/`sub` append to the inherited sequence.
pub(super) fn parse_super_or_sub(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    let Some(value) = element.style_or_default("vertical-align", default) else {
        return;
    };
    let value = value.trim();
    if value != "super" && value != "sub" {
        return;
    }
    let sequence = match format.super_or_sub_script_sequence.as_deref() {
        Some(existing) if !existing.is_empty() => format!("{existing} {value}"),
        _ => value.to_string(),
    };
    format.super_or_sub_script_sequence = Some(sequence.into());
}

pub(super) fn apply_super_or_sub(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
    let Some(sequence) = format.super_or_sub_script_sequence.as_deref() else {
        return;
    };
    if context.implicit_format.super_or_sub_script_sequence.as_deref() == Some(sequence) {
        return;
    }
    if element.is_segment_carrier() {
        // Outermost first in the sequence, and the first wrap ends up innermost.
        for value in sequence.split_whitespace().rev() {
            match value {
                "super" => element.wrap_content("sup"),
                "sub" => element.wrap_content("sub"),
                _ => {}
            }
        }
    } else if let Some(last) = sequence.split_whitespace().last() {
        element.set_style("vertical-align", last);
    }
}

pub(super) fn parse_text_color(format: &mut Format, element: &ElementRef<'_>, context: &FormatContext<'_>, default: &DefaultStyle) {
    if let Some(color) = read_color(element, ColorProperty::Text, context, default) {
        format.text_color = Some(color);
    }
}

pub(super) fn apply_text_color(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
    if let Some(color) = &format.text_color {
        if context.implicit_format.text_color.as_ref() != Some(color) {
            write_color(element, ColorProperty::Text, color, context);
        }
    }
}

pub(super) fn parse_text_color_on_table_cell(
    format: &mut Format,
    element: &ElementRef<'_>,
    context: &FormatContext<'_>,
    default: &DefaultStyle,
) {
    if matches!(element.tag(), "td" | "th") {
        parse_text_color(format, element, context, default);
    }
}

pub(super) fn apply_nothing(_: &Format, _: &mut ElementMut<'_>, _: &FormatContext<'_>) {}

pub(super) fn parse_undeletable_link(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, _: &DefaultStyle) {
    if element.attribute("data-undeletable") == Some("true") {
        format.undeletable_link = Some(true);
    }
}

pub(super) fn apply_undeletable_link(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if format.undeletable_link == Some(true) {
        element.set_attribute("data-undeletable", "true");
    }
}

/// Anchor attributes. Script links are dropped.
pub(super) fn parse_link(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, _: &DefaultStyle) {
    if element.tag() != "a" {
        return;
    }
    if let Some(href) = element.attribute("href") {
        let safe = check_xss(href.trim());
        if !safe.is_empty() {
            format.href = Some(safe);
        }
    }
    let owned = [
        ("target", &mut format.target),
        ("title", &mut format.anchor_title),
        ("rel", &mut format.rel),
        ("id", &mut format.anchor_id),
        ("class", &mut format.anchor_class),
        ("name", &mut format.name),
    ];
    for (name, slot) in owned {
        if let Some(value) = element.attribute(name).filter(|v| !v.is_empty()) {
            *slot = Some(value.to_string());
        }
    }
}

pub(super) fn apply_link(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if element.tag() != "a" {
        return;
    }
    if let Some(href) = &format.href {
        let safe = check_xss(href);
        if !safe.is_empty() {
            element.set_attribute("href", &safe);
        }
    }
    let owned = [
        ("target", &format.target),
        ("title", &format.anchor_title),
        ("rel", &format.rel),
        ("id", &format.anchor_id),
        ("class", &format.anchor_class),
        ("name", &format.name),
    ];
    for (name, value) in owned {
        if let Some(value) = value {
            element.set_attribute(name, value);
        }
    }
}
