//! Positions, ranges and the selection shapes the editor works with.

use crate::node::NodeId;

/// A boundary point in the tree.
///
/// For element containers `offset` is a child index. For text containers it
/// is a char offset into the text (Unicode scalar values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomPosition {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPosition {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A start/end pair of boundary points, start not after end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomRange {
    pub start: DomPosition,
    pub end: DomPosition,
}

impl DomRange {
    pub fn new(start: DomPosition, end: DomPosition) -> Self {
        Self { start, end }
    }

    /// A collapsed range at one position.
    pub fn caret(position: DomPosition) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Selection as the editor sees it.
///
/// Exactly one of these shapes is authoritative at a time. Table coordinates
/// are grid coordinates, so merged cells count once per covered slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomSelection {
    Range {
        range: DomRange,
        is_reverted: bool,
    },
    Image {
        image: NodeId,
    },
    Table {
        table: NodeId,
        first_column: usize,
        first_row: usize,
        last_column: usize,
        last_row: usize,
    },
}

impl DomSelection {
    pub fn range(range: DomRange) -> Self {
        DomSelection::Range {
            range,
            is_reverted: false,
        }
    }

    pub fn is_collapsed_range(&self) -> bool {
        matches!(self, DomSelection::Range { range, .. } if range.collapsed())
    }
}

/// Selection state owned by the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSelection {
    pub range: DomRange,
    pub is_reverted: bool,
}

/// Notifications the host queues for whoever listens on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomNotification {
    /// The host selection was written.
    SelectionChange,
}
