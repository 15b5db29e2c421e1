//! Which keys run for which node kind.

use serde::{Deserialize, Serialize};

use super::FormatKey;
use super::FormatKey::*;

/// Named key subsets, one per kind of node or node part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormatCategory {
    Block,
    ListItemElement,
    ListLevel,
    StyleBasedSegment,
    ElementBasedSegment,
    Segment,
    /// Segment format a block element passes down to its content.
    SegmentOnBlock,
    SegmentOnTableCell,
    TableCell,
    TableRow,
    TableColumn,
    Table,
    TableBorder,
    TableCellBorder,
    Image,
    Link,
    SegmentUnderLink,
    Code,
    Divider,
    Container,
    General,
}

const BLOCK: &[FormatKey] = &[
    BackgroundColor,
    Direction,
    TextAlign,
    HtmlAlign,
    LineHeight,
    Margin,
    Padding,
    Border,
    TextIndent,
    WhiteSpace,
];

const LIST_ITEM_ELEMENT: &[FormatKey] = &[
    Direction,
    TextAlign,
    LineHeight,
    WhiteSpace,
    Margin,
    ListStyle,
];

const LIST_LEVEL: &[FormatKey] = &[
    Direction,
    TextAlign,
    Margin,
    Padding,
    ListStyle,
    BackgroundColor,
];

const STYLE_BASED_SEGMENT: &[FormatKey] = &[
    LetterSpacing,
    FontFamily,
    FontSize,
    TextColor,
    BackgroundColor,
    LineHeight,
];

const ELEMENT_BASED_SEGMENT: &[FormatKey] = &[Strike, Underline, SuperOrSubScript, Italic, Bold];

const SEGMENT: &[FormatKey] = &[
    LetterSpacing,
    FontFamily,
    FontSize,
    TextColor,
    BackgroundColor,
    LineHeight,
    Strike,
    Underline,
    SuperOrSubScript,
    Italic,
    Bold,
];

const SEGMENT_ON_BLOCK: &[FormatKey] = &[
    LetterSpacing,
    FontFamily,
    FontSize,
    Strike,
    Underline,
    SuperOrSubScript,
    Italic,
    Bold,
    TextColor,
];

const SEGMENT_ON_TABLE_CELL: &[FormatKey] = &[
    LetterSpacing,
    FontFamily,
    FontSize,
    Strike,
    Underline,
    SuperOrSubScript,
    Italic,
    Bold,
    TextColorOnTableCell,
];

const TABLE_CELL: &[FormatKey] = &[
    TextAlign,
    Border,
    BackgroundColor,
    Padding,
    VerticalAlign,
    WordBreak,
    TextColor,
    HtmlAlign,
    Size,
];

const TABLE: &[FormatKey] = &[
    Direction,
    Aria,
    Id,
    Border,
    BackgroundColor,
    Display,
    HtmlAlign,
    Margin,
    Size,
    TableLayout,
    TextColor,
];

const IMAGE: &[FormatKey] = &[
    Id,
    Size,
    Margin,
    Padding,
    BorderBox,
    Border,
    BoxShadow,
    Display,
    Float,
    VerticalAlign,
    ImageState,
];

const LINK: &[FormatKey] = &[
    Link,
    TextColor,
    Underline,
    Display,
    Margin,
    Padding,
    BackgroundColor,
    Border,
    Size,
    TextAlign,
    UndeletableLink,
];

const DIVIDER: &[FormatKey] = &[
    Direction,
    TextAlign,
    LineHeight,
    WhiteSpace,
    BackgroundColor,
    Margin,
    Padding,
    Border,
    Display,
    Size,
    HtmlAlign,
];

const CONTAINER: &[FormatKey] = &[
    BackgroundColor,
    Margin,
    Padding,
    Border,
    HtmlAlign,
    Size,
    Display,
    Id,
];

impl FormatCategory {
    pub const ALL: [FormatCategory; 21] = [
        FormatCategory::Block,
        FormatCategory::ListItemElement,
        FormatCategory::ListLevel,
        FormatCategory::StyleBasedSegment,
        FormatCategory::ElementBasedSegment,
        FormatCategory::Segment,
        FormatCategory::SegmentOnBlock,
        FormatCategory::SegmentOnTableCell,
        FormatCategory::TableCell,
        FormatCategory::TableRow,
        FormatCategory::TableColumn,
        FormatCategory::Table,
        FormatCategory::TableBorder,
        FormatCategory::TableCellBorder,
        FormatCategory::Image,
        FormatCategory::Link,
        FormatCategory::SegmentUnderLink,
        FormatCategory::Code,
        FormatCategory::Divider,
        FormatCategory::Container,
        FormatCategory::General,
    ];

    /// Keys of this category, in the order their handlers run.
    ///
    /// Direction always runs before alignment so `left`/`right` map to the
    /// right logical side.
    pub fn keys(self) -> &'static [FormatKey] {
        match self {
            FormatCategory::Block => BLOCK,
            FormatCategory::ListItemElement => LIST_ITEM_ELEMENT,
            FormatCategory::ListLevel => LIST_LEVEL,
            FormatCategory::StyleBasedSegment => STYLE_BASED_SEGMENT,
            FormatCategory::ElementBasedSegment => ELEMENT_BASED_SEGMENT,
            FormatCategory::Segment => SEGMENT,
            FormatCategory::SegmentOnBlock => SEGMENT_ON_BLOCK,
            FormatCategory::SegmentOnTableCell => SEGMENT_ON_TABLE_CELL,
            FormatCategory::TableCell => TABLE_CELL,
            FormatCategory::TableRow => &[BackgroundColor],
            FormatCategory::TableColumn => &[Size],
            FormatCategory::Table => TABLE,
            FormatCategory::TableBorder => &[BorderBox, TableSpacing],
            FormatCategory::TableCellBorder => &[BorderBox],
            FormatCategory::Image => IMAGE,
            FormatCategory::Link => LINK,
            FormatCategory::SegmentUnderLink => &[TextColor],
            FormatCategory::Code => &[FontFamily, Display],
            FormatCategory::Divider => DIVIDER,
            FormatCategory::Container => CONTAINER,
            FormatCategory::General => &[TextColor, BackgroundColor],
        }
    }
}
