//! Styles elements show without any inline style.

use tapestry_model::{Format, TextAlign};

/// CSS property/value pairs implied by a tag.
pub type DefaultStyle = [(&'static str, &'static str)];

const BOLD: &DefaultStyle = &[("font-weight", "bold")];
const ITALIC: &DefaultStyle = &[("font-style", "italic")];
const UNDERLINE: &DefaultStyle = &[("text-decoration", "underline")];
const STRIKE: &DefaultStyle = &[("text-decoration", "line-through")];
const MONOSPACE: &DefaultStyle = &[("font-family", "monospace")];

/// Default style for `tag`. Empty for tags without one.
pub fn default_style(tag: &str) -> &'static DefaultStyle {
    match tag {
        "b" | "strong" => BOLD,
        "i" | "em" => ITALIC,
        "u" | "a" => UNDERLINE,
        "s" | "strike" | "del" => STRIKE,
        "sup" => &[("vertical-align", "super")],
        "sub" => &[("vertical-align", "sub")],
        "h1" => &[("font-weight", "bold"), ("font-size", "2em")],
        "h2" => &[("font-weight", "bold"), ("font-size", "1.5em")],
        "h3" => &[("font-weight", "bold"), ("font-size", "1.17em")],
        "h4" => &[("font-weight", "bold"), ("font-size", "1em")],
        "h5" => &[("font-weight", "bold"), ("font-size", "0.83em")],
        "h6" => &[("font-weight", "bold"), ("font-size", "0.67em")],
        "pre" => &[("white-space", "pre"), ("font-family", "monospace")],
        "center" => &[("text-align", "center")],
        "code" => MONOSPACE,
        "th" => &[("font-weight", "bold")],
        _ => &[],
    }
}

pub(crate) fn lookup(style: &DefaultStyle, name: &str) -> Option<&'static str> {
    style
        .iter()
        .find(|(property, _)| *property == name)
        .map(|(_, value)| *value)
}

/// Format a freshly created `tag` element already shows.
///
/// Appliers compare against it so a heading does not get a redundant
/// `font-weight: bold` and a link does not get an extra `u`.
pub fn implicit_format(tag: &str) -> Format {
    let style = default_style(tag);
    let mut format = Format::default();
    for (name, value) in style {
        match *name {
            "font-weight" => format.font_weight = Some((*value).into()),
            "font-style" => format.italic = Some(true),
            "text-decoration" if *value == "underline" => format.underline = Some(true),
            "text-decoration" => format.strike = Some(true),
            "font-size" => format.font_size = Some((*value).into()),
            "font-family" => format.font_family = Some((*value).into()),
            "white-space" => format.white_space = Some((*value).into()),
            "text-align" => format.text_align = TextAlign::from_css(value, false),
            "vertical-align" => format.super_or_sub_script_sequence = Some((*value).into()),
            _ => {}
        }
    }
    format
}
