//! Paragraph-level keys.

use tapestry_model::{Direction, Format, TextAlign};

use crate::format::{DefaultStyle, ElementMut, ElementRef, FormatContext};

style_handler!(parse_line_height, apply_line_height, line_height, "line-height");
style_handler!(parse_text_indent, apply_text_indent, text_indent, "text-indent");
style_handler!(parse_white_space, apply_white_space, white_space, "white-space");

pub(super) fn parse_direction(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    let value = element
        .style_or_default("direction", default)
        .or_else(|| element.attribute("dir"));
    if let Some(direction) = value.and_then(Direction::from_css) {
        format.direction = Some(direction);
    }
}

pub(super) fn apply_direction(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
    if let Some(direction) = format.direction {
        if context.implicit_format.direction != Some(direction) {
            element.set_style("direction", direction.as_str());
        }
    }
}

pub(super) fn parse_text_align(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    let is_rtl = format.is_rtl();
    if let Some(align) = element
        .style_or_default("text-align", default)
        .and_then(|value| TextAlign::from_css(value, is_rtl))
    {
        format.text_align = Some(align);
    }
}

pub(super) fn apply_text_align(format: &Format, element: &mut ElementMut<'_>, context: &FormatContext<'_>) {
    if let Some(align) = format.text_align {
        if context.implicit_format.text_align != Some(align) {
            element.set_style("text-align", align.to_css(format.is_rtl()));
        }
    }
}

pub(super) fn parse_html_align(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, _: &DefaultStyle) {
    let is_rtl = format.is_rtl();
    if let Some(align) = element
        .attribute("align")
        .and_then(|value| TextAlign::from_css(value, is_rtl))
    {
        format.html_align = Some(align);
    }
}

pub(super) fn apply_html_align(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if let Some(align) = format.html_align {
        element.set_attribute("align", align.to_css(format.is_rtl()));
    }
}

#[cfg(test)]
mod tests {
    use tapestry_dom::Dom;

    use crate::format::{FormatAppliers, FormatCategory, FormatParsers, LuminanceDarkColorHandler, parse_format};

    use super::*;

    #[test]
    fn test_rtl_flips_alignment() {
        let mut dom = Dom::new();
        let node = dom.parse_fragment(r#"<div dir="rtl" style="text-align: left">x</div>"#)[0];
        let handler = LuminanceDarkColorHandler;
        let context = FormatContext::new(false, &handler);
        let mut format = Format::default();
        parse_format(&FormatParsers::default(), FormatCategory::Block, &mut format, &dom, node, &context);
        assert_eq!(format.direction, Some(Direction::Rtl));
        assert_eq!(format.text_align, Some(TextAlign::End));

        let out = dom.create_element("div");
        FormatAppliers::default().apply(FormatCategory::Block, &format, ElementMut::new(&mut dom, out), &context);
        assert_eq!(
            dom.outer_html(out),
            r#"<div style="direction: rtl; text-align: left;"></div>"#
        );
    }

    #[test]
    fn test_implicit_alignment_not_repeated() {
        let mut dom = Dom::new();
        let out = dom.create_element("center");
        let handler = LuminanceDarkColorHandler;
        let implicit = crate::format::implicit_format("center");
        let context = FormatContext::new(false, &handler).with_implicit_format(&implicit);
        let format = Format {
            text_align: Some(TextAlign::Center),
            ..Default::default()
        };
        FormatAppliers::default().apply(FormatCategory::Block, &format, ElementMut::new(&mut dom, out), &context);
        assert_eq!(dom.outer_html(out), "<center></center>");
    }
}
