//! Error types for host tree operations.

use miette::Diagnostic;
use thiserror::Error;

use crate::node::NodeId;

/// Errors that can occur while mutating the host tree.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DomError {
    /// The handle points at a disposed node.
    #[error("node {0} is no longer alive")]
    #[diagnostic(code(tapestry::dom::stale_node))]
    StaleNode(NodeId),

    /// The operation needs an element but got a text or comment node.
    #[error("node {0} is not an element")]
    #[diagnostic(code(tapestry::dom::not_an_element))]
    NotAnElement(NodeId),

    /// The node is not a child of the given parent.
    #[error("node {child} is not a child of {parent}")]
    #[diagnostic(code(tapestry::dom::not_a_child))]
    NotAChild { parent: NodeId, child: NodeId },

    /// Inserting the node would make it an ancestor of itself.
    #[error("cannot insert {node} under its own descendant {parent}")]
    #[diagnostic(code(tapestry::dom::hierarchy_request))]
    HierarchyRequest { parent: NodeId, node: NodeId },
}
