//! Retained host tree for the tapestry editor.
//!
//! This crate provides the DOM-like tree the content model is rendered into
//! and parsed from. It stands in for a browser document: nodes live in an
//! arena and are addressed by generational handles, so a model can keep
//! non-owning back-references that are re-validated on every use.
//!
//! # Architecture
//!
//! - `tree`: node arena, tree mutation and navigation, attributes and inline style
//! - `html`: deterministic serializer and html5ever fragment parsing
//! - `selection`: boundary points, ranges, host selection and [`DomSelection`]
//! - `style`: inline style declaration parsing
//! - `color`: CSS color parsing and canonical forms

pub mod color;
pub mod error;
pub mod html;
pub mod node;
pub mod selection;
pub mod style;
pub mod tree;

pub use color::{normalize_color, parse_color, rgba_u32_to_css, rgba_u32_to_hex};
pub use error::DomError;
pub use html::is_void_element;
pub use node::{ElementData, NodeData, NodeId, NodeType};
pub use selection::{DomNotification, DomPosition, DomRange, DomSelection, HostSelection};
pub use style::StyleDeclaration;
pub use tree::{Ancestors, Dom};
