//! Sparse format records.
//!
//! A [`Format`] is a flat record of optional attributes. `None` means
//! "inherit / unspecified"; nothing here carries a baked-in default. Which
//! fields a node uses is decided by the format category its handlers run for,
//! not by the type.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Logical horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Start,
    Center,
    End,
    Justify,
}

impl TextAlign {
    /// Map a CSS `text-align` or HTML `align` value to a logical alignment.
    pub fn from_css(value: &str, is_rtl: bool) -> Option<Self> {
        let (left, right) = if is_rtl {
            (TextAlign::End, TextAlign::Start)
        } else {
            (TextAlign::Start, TextAlign::End)
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(left),
            "right" => Some(right),
            "start" => Some(TextAlign::Start),
            "end" => Some(TextAlign::End),
            "center" | "middle" | "-webkit-center" => Some(TextAlign::Center),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }

    /// Physical CSS value for this alignment.
    pub fn to_css(self, is_rtl: bool) -> &'static str {
        match (self, is_rtl) {
            (TextAlign::Start, false) | (TextAlign::End, true) => "left",
            (TextAlign::End, false) | (TextAlign::Start, true) => "right",
            (TextAlign::Center, _) => "center",
            (TextAlign::Justify, _) => "justify",
        }
    }
}

/// Writing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ltr" => Some(Direction::Ltr),
            "rtl" => Some(Direction::Rtl),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

macro_rules! define_format {
    ($( $(#[$meta:meta])* $field:ident : $ty:ty ),* $(,)?) => {
        /// Sparse attribute record shared by every node kind.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct Format {
            $(
                $(#[$meta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl Format {
            /// Copy every field that is set on `other` over this record.
            pub fn overlay(&mut self, other: &Format) {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field.clone();
                    }
                )*
            }

            /// True when no field is set.
            pub fn is_empty(&self) -> bool {
                true $( && self.$field.is_none() )*
            }

            /// Number of fields that are set.
            pub fn len(&self) -> usize {
                0 $( + usize::from(self.$field.is_some()) )*
            }
        }
    };
}

define_format! {
    // aria
    aria_describedby: String,
    title: String,

    background_color: String,
    /// `font-weight` value; `bold`, `normal` or a numeric weight.
    font_weight: SmolStr,

    // border
    border_top: String,
    border_right: String,
    border_bottom: String,
    border_left: String,
    border_radius: SmolStr,
    /// `box-sizing: border-box`.
    use_border_box: bool,
    box_shadow: String,

    direction: Direction,
    display: SmolStr,
    float: SmolStr,
    font_family: String,
    font_size: SmolStr,
    /// HTML `align` attribute, kept apart from CSS `text-align`.
    html_align: TextAlign,
    id: String,
    image_state: SmolStr,
    italic: bool,
    letter_spacing: SmolStr,
    line_height: SmolStr,

    // link
    href: String,
    target: String,
    anchor_title: String,
    rel: String,
    anchor_id: String,
    anchor_class: String,
    name: String,

    // list threads
    start_number_override: u32,
    display_for_dummy_item: SmolStr,

    // list style
    list_style_type: String,
    list_style_position: SmolStr,

    // margin
    margin_top: SmolStr,
    margin_right: SmolStr,
    margin_bottom: SmolStr,
    margin_left: SmolStr,

    // padding
    padding_top: SmolStr,
    padding_right: SmolStr,
    padding_bottom: SmolStr,
    padding_left: SmolStr,

    // size
    width: SmolStr,
    height: SmolStr,
    max_width: SmolStr,
    max_height: SmolStr,
    min_width: SmolStr,
    min_height: SmolStr,

    strike: bool,
    /// Space separated `super`/`sub` sequence, outermost first.
    super_or_sub_script_sequence: SmolStr,
    table_layout: SmolStr,

    // table spacing
    border_collapse: bool,
    border_separate: bool,
    border_spacing: SmolStr,

    text_align: TextAlign,
    text_color: String,
    text_indent: SmolStr,
    undeletable_link: bool,
    underline: bool,
    vertical_align: SmolStr,
    white_space: SmolStr,
    word_break: SmolStr,
}

impl Format {
    pub fn is_rtl(&self) -> bool {
        self.direction == Some(Direction::Rtl)
    }

    pub fn is_bold(&self) -> bool {
        matches!(self.font_weight.as_deref(), Some("bold" | "bolder" | "600" | "700" | "800" | "900"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_only_copies_set_fields() {
        let mut base = Format {
            text_color: Some("#ff0000".into()),
            font_size: Some("10px".into()),
            ..Default::default()
        };
        let top = Format {
            font_size: Some("12px".into()),
            italic: Some(true),
            ..Default::default()
        };
        base.overlay(&top);
        assert_eq!(base.text_color.as_deref(), Some("#ff0000"));
        assert_eq!(base.font_size.as_deref(), Some("12px"));
        assert_eq!(base.italic, Some(true));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_empty_format_serializes_to_empty_object() {
        assert!(Format::default().is_empty());
        assert_eq!(serde_json::to_string(&Format::default()).unwrap(), "{}");
        let format = Format {
            text_align: Some(TextAlign::Center),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&format).unwrap(),
            r#"{"textAlign":"center"}"#
        );
    }

    #[test]
    fn test_text_align_maps_through_direction() {
        assert_eq!(TextAlign::from_css("left", false), Some(TextAlign::Start));
        assert_eq!(TextAlign::from_css("left", true), Some(TextAlign::End));
        assert_eq!(TextAlign::Start.to_css(true), "right");
        assert_eq!(TextAlign::Center.to_css(true), "center");
        assert_eq!(TextAlign::from_css("bogus", false), None);
    }
}
