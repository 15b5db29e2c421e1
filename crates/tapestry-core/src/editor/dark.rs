//! Switching already rendered content between light and dark colors.

use tapestry_dom::{Dom, NodeId, normalize_color, parse_color};

use crate::format::DarkColorHandler;

const BORDER_SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

#[derive(Clone, Copy)]
enum ColorKind {
    Text,
    Background,
}

impl ColorKind {
    fn css(self) -> &'static str {
        match self {
            ColorKind::Text => "color",
            ColorKind::Background => "background-color",
        }
    }

    fn legacy_attribute(self) -> &'static str {
        match self {
            ColorKind::Text => "color",
            ColorKind::Background => "bgcolor",
        }
    }

    fn original_attribute(self) -> &'static str {
        match self {
            ColorKind::Text => "data-ogsc",
            ColorKind::Background => "data-ogsb",
        }
    }
}

/// Convert the inline colors of every element below `root`.
///
/// Going to dark mode, each text and background color is replaced by its
/// dark counterpart and the original is kept in `data-ogsc`/`data-ogsb`.
/// Going back, the originals are restored and the attributes removed. A
/// background whose dark color would match the text drawn on it keeps its
/// light value. Border colors of table cells are converted too.
pub fn transform_color(dom: &mut Dom, root: NodeId, to_dark_mode: bool, handler: &dyn DarkColorHandler) {
    let mut stack: Vec<(NodeId, Option<String>)> =
        dom.children(root).iter().rev().map(|child| (*child, None)).collect();
    let mut transformed = 0usize;

    while let Some((node, parent_text)) = stack.pop() {
        let text_color = if dom.is_element(node) {
            transformed += 1;
            transform_element(dom, node, to_dark_mode, handler, parent_text)
        } else {
            parent_text
        };
        stack.extend(
            dom.children(node)
                .iter()
                .rev()
                .map(|child| (*child, text_color.clone())),
        );
    }
    tracing::debug!(target: "tapestry::editor", to_dark_mode, elements = transformed, "transformed colors");
}

/// Returns the light text color in effect inside `element`.
fn transform_element(
    dom: &mut Dom,
    element: NodeId,
    to_dark_mode: bool,
    handler: &dyn DarkColorHandler,
    parent_text: Option<String>,
) -> Option<String> {
    let text = light_color(dom, element, ColorKind::Text, to_dark_mode, handler);
    let background = light_color(dom, element, ColorKind::Background, to_dark_mode, handler);
    let comparing = text.clone().or(parent_text);

    if let Some(text) = &text {
        write_color(dom, element, ColorKind::Text, text, to_dark_mode, handler);
    }
    if let Some(background) = &background {
        let readable = !to_dark_mode
            || comparing
                .as_deref()
                .is_none_or(|text| handler.to_dark(text) != handler.to_dark(background));
        if readable {
            write_color(dom, element, ColorKind::Background, background, to_dark_mode, handler);
        } else {
            write_style(dom, element, ColorKind::Background.css(), background);
            write_attribute(dom, element, ColorKind::Background.original_attribute(), background);
        }
    }
    if matches!(dom.tag(element), Some("td" | "th")) {
        transform_borders(dom, element, to_dark_mode, handler);
    }
    comparing
}

/// The light-mode value of one color property, if the element sets it.
fn light_color(
    dom: &Dom,
    element: NodeId,
    kind: ColorKind,
    to_dark_mode: bool,
    handler: &dyn DarkColorHandler,
) -> Option<String> {
    if !to_dark_mode {
        if let Some(original) = dom.attribute(element, kind.original_attribute()) {
            return Some(normalize_color(original));
        }
    }
    let value = dom
        .style_property(element, kind.css())
        .or_else(|| dom.attribute(element, kind.legacy_attribute()).map(str::to_owned))?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(if to_dark_mode {
        normalize_color(value)
    } else {
        handler.to_light(value)
    })
}

fn write_color(
    dom: &mut Dom,
    element: NodeId,
    kind: ColorKind,
    light: &str,
    to_dark_mode: bool,
    handler: &dyn DarkColorHandler,
) {
    if dom.has_attribute(element, kind.legacy_attribute()) {
        if let Err(error) = dom.remove_attribute(element, kind.legacy_attribute()) {
            tracing::debug!(target: "tapestry::editor", %error, "legacy color attribute kept");
        }
    }
    if to_dark_mode {
        write_style(dom, element, kind.css(), &handler.to_dark(light));
        write_attribute(dom, element, kind.original_attribute(), light);
    } else {
        write_style(dom, element, kind.css(), light);
        if let Err(error) = dom.remove_attribute(element, kind.original_attribute()) {
            tracing::debug!(target: "tapestry::editor", %error, "original color attribute kept");
        }
    }
}

fn write_style(dom: &mut Dom, element: NodeId, name: &str, value: &str) {
    if let Err(error) = dom.set_style_property(element, name, value) {
        tracing::debug!(target: "tapestry::editor", %error, name, "color not written");
    }
}

fn write_attribute(dom: &mut Dom, element: NodeId, name: &str, value: &str) {
    if let Err(error) = dom.set_attribute(element, name, value) {
        tracing::debug!(target: "tapestry::editor", %error, name, "color not recorded");
    }
}

fn transform_borders(dom: &mut Dom, cell: NodeId, to_dark_mode: bool, handler: &dyn DarkColorHandler) {
    let convert = |value: &str| {
        if to_dark_mode {
            handler.to_dark(value)
        } else {
            handler.to_light(value)
        }
    };
    for side in BORDER_SIDES {
        for property in [format!("border-{side}-color"), format!("border-{side}")] {
            let Some(value) = dom.style_property(cell, &property) else {
                continue;
            };
            let converted = map_color_tokens(&value, &convert);
            if converted != value {
                write_style(dom, cell, &property, &converted);
            }
        }
    }
}

/// Apply `convert` to every color token of a CSS value such as
/// `1px solid rgb(0, 0, 0)`.
fn map_color_tokens(value: &str, convert: &dyn Fn(&str) -> String) -> String {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
        .into_iter()
        .map(|token| {
            if parse_color(&token).is_some() {
                convert(&token)
            } else {
                token
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
