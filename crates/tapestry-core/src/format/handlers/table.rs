//! Table-only keys.

use tapestry_model::Format;

use crate::format::{DefaultStyle, ElementMut, ElementRef, FormatContext};

style_handler!(parse_table_layout, apply_table_layout, table_layout, "table-layout");

pub(super) fn parse_table_spacing(format: &mut Format, element: &ElementRef<'_>, _: &FormatContext<'_>, default: &DefaultStyle) {
    match element.style_or_default("border-collapse", default).map(str::trim) {
        Some("collapse") => format.border_collapse = Some(true),
        Some("separate") => format.border_separate = Some(true),
        _ => {}
    }
    if let Some(spacing) = element.style_or_default("border-spacing", default) {
        format.border_spacing = Some(spacing.trim().into());
    }
}

pub(super) fn apply_table_spacing(format: &Format, element: &mut ElementMut<'_>, _: &FormatContext<'_>) {
    if format.border_collapse == Some(true) {
        element.set_style("border-collapse", "collapse");
    } else if format.border_separate == Some(true) {
        element.set_style("border-collapse", "separate");
    }
    if let Some(spacing) = &format.border_spacing {
        element.set_style("border-spacing", spacing);
    }
}

#[cfg(test)]
mod tests {
    use tapestry_dom::Dom;

    use crate::format::{FormatCategory, FormatParsers, LuminanceDarkColorHandler, parse_format};

    use super::*;

    #[test]
    fn test_collapse_wins_over_separate() {
        let mut dom = Dom::new();
        let table = dom.create_element("table");
        dom.set_style_property(table, "border-collapse", "collapse").unwrap();
        let handler = LuminanceDarkColorHandler;
        let mut format = Format::default();
        parse_format(
            &FormatParsers::default(),
            FormatCategory::TableBorder,
            &mut format,
            &dom,
            table,
            &FormatContext::new(false, &handler),
        );
        assert_eq!(format.border_collapse, Some(true));
        assert_eq!(format.border_separate, None);
    }
}
