//! Keys shared by blocks, tables and images.

use tapestry_model::Format;

use super::{ColorProperty, expand_box, read_color, write_color};
use crate::format::{DefaultStyle, ElementMut, ElementRef, FormatContext};

style_handler!(parse_box_shadow, apply_box_shadow, box_shadow, "box-shadow");
style_handler!(parse_display, apply_display, display, "display");
style_handler!(parse_float, apply_float, float, "float");
style_handler!(parse_word_break, apply_word_break, word_break, "word-break");

pub(super) fn parse_aria(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, _: &DefaultStyle) {
    if let Some(value) = element.attribute("aria-describedby") {
        format.aria_describedby = Some(value.to_string());
    }
    if let Some(value) = element.attribute("title") {
        format.title = Some(value.to_string());
    }
}

pub(super) fn apply_aria(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if let Some(value) = &format.aria_describedby {
        element.set_attribute("aria-describedby", value);
    }
    if let Some(value) = &format.title {
        element.set_attribute("title", value);
    }
}

pub(super) fn parse_background_color(
    format: &mut Format,
    element: &ElementRef<'_>,
    context: &FormatContext<'_>,
    default: &DefaultStyle,
) {
    if let Some(color) = read_color(element, ColorProperty::Background, context, default) {
        format.background_color = Some(color);
    }
}

pub(super) fn apply_background_color(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
    if let Some(color) = &format.background_color {
        if context.implicit_format.background_color.as_ref() != Some(color) {
            write_color(element, ColorProperty::Background, color, context);
        }
    }
}

const BORDER_SIDES: [&str; 4] = ["border-top", "border-right", "border-bottom", "border-left"];

pub(super) fn parse_border(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    let shorthand = element.style_or_default("border", default);
    let [top, right, bottom, left] = BORDER_SIDES.map(|side| {
        element
            .style_or_default(side, default)
            .or(shorthand)
            .map(|value| value.trim().to_string())
    });
    format.border_top = top.or(format.border_top.take());
    format.border_right = right.or(format.border_right.take());
    format.border_bottom = bottom.or(format.border_bottom.take());
    format.border_left = left.or(format.border_left.take());
    if let Some(radius) = element.style_or_default("border-radius", default) {
        format.border_radius = Some(radius.trim().into());
    }
}

pub(super) fn apply_border(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    let sides = [
        &format.border_top,
        &format.border_right,
        &format.border_bottom,
        &format.border_left,
    ];
    match sides {
        [Some(top), Some(right), Some(bottom), Some(left)]
            if top == right && right == bottom && bottom == left =>
        {
            element.set_style("border", top);
        }
        _ => {
            for (name, value) in BORDER_SIDES.iter().zip(sides) {
                if let Some(value) = value {
                    element.set_style(name, value);
                }
            }
        }
    }
    if let Some(radius) = &format.border_radius {
        element.set_style("border-radius", radius);
    }
}

pub(super) fn parse_border_box(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, _: &DefaultStyle) {
    if element.style("box-sizing") == Some("border-box") {
        format.use_border_box = Some(true);
    }
}

pub(super) fn apply_border_box(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if format.use_border_box == Some(true) {
        element.set_style("box-sizing", "border-box");
    }
}

pub(super) fn parse_id(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, _: &DefaultStyle) {
    if let Some(id) = element.attribute("id").filter(|id| !id.is_empty()) {
        format.id = Some(id.to_string());
    }
}

pub(super) fn apply_id(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if let Some(id) = &format.id {
        element.set_attribute("id", id);
    }
}

pub(super) fn parse_image_state(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, _: &DefaultStyle) {
    if let Some(state) = element.attribute("data-image-state") {
        format.image_state = Some(state.into());
    }
}

pub(super) fn apply_image_state(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if let Some(state) = &format.image_state {
        element.set_attribute("data-image-state", state);
    }
}

macro_rules! box_handler {
    ($parse:ident, $apply:ident, $property:literal, [$top:ident, $right:ident, $bottom:ident, $left:ident]) => {
        pub(super) fn $parse(
            format: &mut Format,
            element: &ElementRef<'_>,
            _: &FormatContext<'_>,
            default: &DefaultStyle,
        ) {
            if let Some([top, right, bottom, left]) =
                element.style_or_default($property, default).and_then(expand_box)
            {
                format.$top = Some(top.into());
                format.$right = Some(right.into());
                format.$bottom = Some(bottom.into());
                format.$left = Some(left.into());
            }
            let longhands = [
                (concat!($property, "-top"), &mut format.$top),
                (concat!($property, "-right"), &mut format.$right),
                (concat!($property, "-bottom"), &mut format.$bottom),
                (concat!($property, "-left"), &mut format.$left),
            ];
            for (name, slot) in longhands {
                if let Some(value) = element.style_or_default(name, default) {
                    *slot = Some(value.trim().into());
                }
            }
        }

        pub(super) fn $apply(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
            let sides = [
                (concat!($property, "-top"), &format.$top, &context.implicit_format.$top),
                (concat!($property, "-right"), &format.$right, &context.implicit_format.$right),
                (concat!($property, "-bottom"), &format.$bottom, &context.implicit_format.$bottom),
                (concat!($property, "-left"), &format.$left, &context.implicit_format.$left),
            ];
            for (name, value, implicit) in sides {
                if let Some(value) = value {
                    if implicit.as_ref() != Some(value) {
                        element.set_style(name, value);
                    }
                }
            }
        }
    };
}

box_handler!(parse_margin, apply_margin, "margin", [margin_top, margin_right, margin_bottom, margin_left]);
box_handler!(parse_padding, apply_padding, "padding", [padding_top, padding_right, padding_bottom, padding_left]);

/// `width`/`height` attributes given as bare numbers are pixels.
fn attribute_length(element: &ElementRef<'_>, name: &str) -> Option<String> {
    let value = element.attribute(name)?.trim();
    if value.is_empty() {
        None
    } else if value.chars().all(|c| c.is_ascii_digit() || c == '.') {
        Some(format!("{value}px"))
    } else {
        Some(value.to_string())
    }
}

pub(super) fn parse_size(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    let width = element
        .style_or_default("width", default)
        .map(|v| v.trim().to_string())
        .or_else(|| attribute_length(element, "width"));
    let height = element
        .style_or_default("height", default)
        .map(|v| v.trim().to_string())
        .or_else(|| attribute_length(element, "height"));
    if let Some(width) = width {
        format.width = Some(width.into());
    }
    if let Some(height) = height {
        format.height = Some(height.into());
    }
    let limits = [
        ("max-width", &mut format.max_width),
        ("max-height", &mut format.max_height),
        ("min-width", &mut format.min_width),
        ("min-height", &mut format.min_height),
    ];
    for (name, slot) in limits {
        if let Some(value) = element.style_or_default(name, default) {
            *slot = Some(value.trim().into());
        }
    }
}

pub(super) fn apply_size(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    let sizes = [
        ("width", &format.width),
        ("height", &format.height),
        ("max-width", &format.max_width),
        ("max-height", &format.max_height),
        ("min-width", &format.min_width),
        ("min-height", &format.min_height),
    ];
    for (name, value) in sizes {
        if let Some(value) = value {
            element.set_style(name, value);
        }
    }
}

pub(super) fn parse_vertical_align(
    format: &mut Format,
    element: &ElementRef<'_>,
    _: &FormatContext<'_>,
    default: &DefaultStyle,
) {
    let value = element
        .style_or_default("vertical-align", default)
        .or_else(|| element.attribute("valign"));
    if let Some(value) = value {
        format.vertical_align = Some(value.trim().to_ascii_lowercase().into());
    }
}

pub(super) fn apply_vertical_align(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if let Some(value) = &format.vertical_align {
        element.set_style("vertical-align", value);
    }
}

#[cfg(test)]
mod tests {
    use tapestry_dom::Dom;

    use crate::format::{FormatAppliers, FormatCategory, FormatParsers, LuminanceDarkColorHandler, parse_format};

    use super::*;

    fn parse(html: &str, category: FormatCategory) -> Format {
        let mut dom = Dom::new();
        let node = dom.parse_fragment(html)[0];
        let handler = LuminanceDarkColorHandler;
        let mut format = Format::default();
        parse_format(
            &FormatParsers::default(),
            category,
            &mut format,
            &dom,
            node,
            &FormatContext::new(false, &handler),
        );
        format
    }

    #[test]
    fn test_border_shorthand_and_override() {
        let format = parse(
            r#"<div style="border: 1px solid #000000; border-left: 2px dashed red">x</div>"#,
            FormatCategory::TableCell,
        );
        assert_eq!(format.border_top.as_deref(), Some("1px solid #000000"));
        assert_eq!(format.border_left.as_deref(), Some("2px dashed red"));

        let mut dom = Dom::new();
        let td = dom.create_element("td");
        let handler = LuminanceDarkColorHandler;
        FormatAppliers::default().apply(
            FormatCategory::TableCellBorder,
            &Format {
                use_border_box: Some(true),
                ..Default::default()
            },
            ElementMut::new(&mut dom, td),
            &FormatContext::new(false, &handler),
        );
        assert_eq!(dom.outer_html(td), r#"<td style="box-sizing: border-box;"></td>"#);
    }

    #[test]
    fn test_uniform_border_collapses_to_shorthand() {
        let format = Format {
            border_top: Some("1px solid".into()),
            border_right: Some("1px solid".into()),
            border_bottom: Some("1px solid".into()),
            border_left: Some("1px solid".into()),
            ..Default::default()
        };
        let mut dom = Dom::new();
        let div = dom.create_element("div");
        let handler = LuminanceDarkColorHandler;
        let mut element = ElementMut::new(&mut dom, div);
        apply_border(&format, &mut element, &FormatContext::new(false, &handler));
        element.commit();
        assert_eq!(dom.style_property(div, "border").as_deref(), Some("1px solid"));
    }

    #[test]
    fn test_size_attributes_become_pixels() {
        let format = parse(r#"<img width="120" height="10%">"#, FormatCategory::Image);
        assert_eq!(format.width.as_deref(), Some("120px"));
        assert_eq!(format.height.as_deref(), Some("10%"));
    }

    #[test]
    fn test_padding_longhand_overrides_shorthand() {
        let format = parse(
            r#"<div style="padding: 1px 2px; padding-left: 5px">x</div>"#,
            FormatCategory::Block,
        );
        assert_eq!(format.padding_top.as_deref(), Some("1px"));
        assert_eq!(format.padding_right.as_deref(), Some("2px"));
        assert_eq!(format.padding_left.as_deref(), Some("5px"));
    }
}
