//! The root of a content model.

use serde::Serialize;

use crate::block::Block;
use crate::format::Format;

/// Root block group of a content model.
///
/// The document has no cached element of its own: it always renders into the
/// container it is handed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentModelDocument {
    pub blocks: Vec<Block>,
    pub format: Format,
    /// The selection this model was parsed with ran backwards.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub has_reverted_range_selection: bool,
}

impl ContentModelDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
