//! List style keys.

use tapestry_model::Format;

use crate::format::{DefaultStyle, ElementMut, ElementRef, FormatContext};

pub(super) fn parse_list_style(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    if let Some(kind) = element.style_or_default("list-style-type", default) {
        format.list_style_type = Some(kind.trim().to_string());
    }
    if let Some(position) = element.style_or_default("list-style-position", default) {
        format.list_style_position = Some(position.trim().into());
    }
}

pub(super) fn apply_list_style(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if let Some(kind) = &format.list_style_type {
        element.set_style("list-style-type", kind);
    }
    if let Some(position) = &format.list_style_position {
        element.set_style("list-style-position", position);
    }
}
