//! Content model for tapestry.
//!
//! A document is a tree of blocks. Paragraphs hold inline segments; tables,
//! list items and containers hold further blocks. Every node carries a sparse
//! [`Format`] and may remember the DOM node it was last rendered into as a
//! non-owning [`NodeId`](tapestry_dom::NodeId) handle.
//!
//! Nodes have no parent pointers. Code that needs ancestors addresses nodes
//! with a [`ModelPath`] and goes through [`path::mutate_block`] to invalidate
//! the cached elements above a change.

pub mod api;
pub mod block;
pub mod clone;
pub mod document;
pub mod entity;
pub mod format;
pub mod list;
pub mod path;
pub mod segment;
pub mod selection;
pub mod table;

pub use block::{Block, BlockGroup, Divider, GroupKind, ListItem, Paragraph, ParagraphDecorator};
pub use clone::{CachedElementMode, clone_model, clone_model_disconnected};
pub use document::ContentModelDocument;
pub use entity::{ENTITY_CLASS, Entity, EntityInfo};
pub use format::{Direction, Format, TextAlign};
pub use list::{ListLevel, ListType};
pub use path::{ModelPath, PathStep, SegmentPath};
pub use segment::{Code, Dataset, Image, Link, Segment, SegmentKind};
pub use selection::{BoundaryPoint, SelectedItem};
pub use table::{CellRect, Table, TableCell, TableRow};
