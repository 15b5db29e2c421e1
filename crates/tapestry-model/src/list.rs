//! List levels.

use serde::Serialize;
use tapestry_dom::NodeId;

use crate::format::Format;
use crate::segment::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ListType {
    #[serde(rename = "OL")]
    Ordered,
    #[serde(rename = "UL")]
    Unordered,
}

impl ListType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "ol" => Some(ListType::Ordered),
            "ul" => Some(ListType::Unordered),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ListType::Ordered => "ol",
            ListType::Unordered => "ul",
        }
    }
}

/// Format of one nesting depth of a list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLevel {
    pub list_type: ListType,
    pub format: Format,
    #[serde(skip_serializing_if = "Dataset::is_empty")]
    pub dataset: Dataset,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

impl ListLevel {
    pub fn new(list_type: ListType, format: Format) -> Self {
        Self {
            list_type,
            format,
            dataset: Dataset::new(),
            cached_element: None,
        }
    }

    /// Levels are the same list when type, format and dataset agree.
    pub fn same_list(&self, other: &ListLevel) -> bool {
        self.list_type == other.list_type
            && self.format == other.format
            && self.dataset == other.dataset
    }
}
