//! Image borders.

use crate::block::Block;
use crate::document::ContentModelDocument;
use crate::format::Format;
use crate::path::mutate_block;
use crate::selection::{SelectedItem, collect_selections};

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

/// Parts of a CSS border shorthand. A `None` part is left as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Border {
    pub width: Option<String>,
    pub style: Option<String>,
    pub color: Option<String>,
}

impl Border {
    /// Split a shorthand such as `2px solid red`.
    pub fn parse(value: &str) -> Self {
        let mut border = Border::default();
        for part in split_outside_parens(value) {
            let lower = part.to_ascii_lowercase();
            if BORDER_STYLES.contains(&lower.as_str()) {
                border.style = Some(lower);
            } else if part.starts_with(|c: char| c.is_ascii_digit() || c == '.')
                || matches!(lower.as_str(), "thin" | "medium" | "thick")
            {
                border.width = Some(part.to_string());
            } else {
                border.color = Some(part.to_string());
            }
        }
        border
    }

    pub fn to_css(&self) -> String {
        [&self.width, &self.style, &self.color]
            .into_iter()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn split_outside_parens(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    parts.push(&value[s..i]);
                }
                continue;
            }
            _ => {}
        }
        start.get_or_insert(i);
    }
    if let Some(s) = start {
        parts.push(&value[s..]);
    }
    parts
}

/// Apply `border` to one image format.
///
/// `None` removes every side. Partial borders are merged over the current top
/// border. `border_radius` replaces the radius when given.
pub fn apply_image_border_format(format: &mut Format, border: Option<&Border>, border_radius: Option<&str>) {
    match border {
        None => {
            format.border_top = None;
            format.border_right = None;
            format.border_bottom = None;
            format.border_left = None;
        }
        Some(border) => {
            let mut merged = format
                .border_top
                .as_deref()
                .map(Border::parse)
                .unwrap_or_default();
            if border.width.is_some() {
                merged.width = border.width.clone();
            }
            if border.style.is_some() {
                merged.style = border.style.clone();
            }
            if border.color.is_some() {
                merged.color = border.color.clone();
            }
            let css = merged.to_css();
            let side = (!css.is_empty()).then_some(css);
            format.border_top = side.clone();
            format.border_right = side.clone();
            format.border_bottom = side.clone();
            format.border_left = side;
        }
    }
    if let Some(radius) = border_radius {
        format.border_radius = (!radius.is_empty()).then(|| radius.into());
    }
}

/// Apply a border to every selected image. Returns whether any image changed.
pub fn set_image_border(
    model: &mut ContentModelDocument,
    border: Option<&Border>,
    border_radius: Option<&str>,
) -> bool {
    let mut changed = false;
    for item in collect_selections(model) {
        let SelectedItem::Segments { paragraph, indexes } = item else {
            continue;
        };
        let Some(Block::Paragraph(block)) = mutate_block(model, &paragraph) else {
            continue;
        };
        for index in indexes {
            let Some(segment) = block.segments.get_mut(index) else {
                continue;
            };
            if segment.as_image().is_none() {
                continue;
            }
            apply_image_border_format(&mut segment.format, border, border_radius);
            segment.cached_element = None;
            changed = true;
        }
    }
    changed
}
