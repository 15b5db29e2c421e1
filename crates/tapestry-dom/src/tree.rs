//! The arena-backed host tree.
//!
//! [`Dom`] owns every node. Parents own their children in order; handles are
//! plain [`NodeId`]s validated on every access. Detached nodes stay alive until
//! [`Dom::dispose`] is called, the same way a browser keeps a removed node
//! around while something still references it.

use std::cmp::Ordering;

use crate::error::DomError;
use crate::node::{ElementData, NodeData, NodeId, NodeType};
use crate::selection::{DomNotification, DomPosition, DomRange, HostSelection};
use crate::style::StyleDeclaration;

#[derive(Debug)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<NodeEntry>,
}

/// A retained document tree plus the host selection and focus state.
#[derive(Debug, Default)]
pub struct Dom {
    slots: Vec<Slot>,
    free: Vec<u32>,
    selection: Option<HostSelection>,
    focused: bool,
    notifications: Vec<DomNotification>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    // === Allocation ===

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let entry = NodeEntry {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    fn entry(&self, id: NodeId) -> Option<&NodeEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    fn try_entry(&self, id: NodeId) -> Result<&NodeEntry, DomError> {
        self.entry(id).ok_or(DomError::StaleNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match self.entry_mut(id) {
            Some(NodeEntry {
                data: NodeData::Element(element),
                ..
            }) => Ok(element),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::StaleNode(id)),
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    /// Detach and free a node and its whole subtree.
    ///
    /// Handles to freed nodes become stale.
    pub fn dispose(&mut self, id: NodeId) {
        if self.entry(id).is_none() {
            return;
        }
        self.detach(id);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(entry) = slot.entry.take() {
                pending.extend(entry.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
    }

    // === Node inspection ===

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.entry(id).map(|entry| &entry.data)
    }

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.data(id).map(NodeData::node_type)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text(_)))
    }

    /// Lowercase tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::tag)
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        match self.entry_mut(id) {
            Some(NodeEntry {
                data: NodeData::Text(existing),
                ..
            }) => {
                *existing = text.into();
                Ok(())
            }
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::StaleNode(id)),
        }
    }

    /// Boundary length of a node: chars for text, child count otherwise.
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.entry(id) {
            Some(NodeEntry {
                data: NodeData::Text(text),
                ..
            }) => text.chars().count(),
            Some(NodeEntry {
                data: NodeData::Comment(_),
                ..
            }) => 0,
            Some(entry) => entry.children.len(),
            None => 0,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.entry(id) {
            Some(NodeEntry {
                data: NodeData::Text(text),
                ..
            }) => out.push_str(text),
            Some(entry) => {
                for child in &entry.children {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    // === Navigation ===

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).and_then(|entry| entry.parent)
    }

    /// Children in order. Stale handles have no children.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.child_at(parent, index + 1)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).and_then(|i| self.child_at(parent, i))
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            next: self.parent(id),
        }
    }

    /// Inclusive containment check.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.is_alive(ancestor) || !self.is_alive(node) {
            return false;
        }
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// True when `node` is `root` or attached somewhere below it.
    pub fn is_connected_to(&self, node: NodeId, root: NodeId) -> bool {
        self.contains(root, node)
    }

    /// Descendants of `root` in document order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Nearest inclusive ancestor with the given tag, not looking past `root`.
    pub fn find_closest_ancestor(&self, node: NodeId, tag: &str, root: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.is_tag(id, tag) {
                return Some(id);
            }
            if id == root {
                return None;
            }
            current = self.parent(id);
        }
        None
    }

    /// Elements under `root` with the given tag, in document order.
    pub fn query_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.is_tag(*id, tag))
            .collect()
    }

    /// Element with the given `id` attribute, `root` included.
    pub fn element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        std::iter::once(root)
            .chain(self.descendants(root))
            .find(|node| self.attribute(*node, "id") == Some(id))
    }

    // === Mutation ===

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `node` under `parent` before `reference`, or at the end when
    /// `reference` is `None`. An attached node is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.try_entry(parent).is_ok_and(|e| matches!(e.data, NodeData::Element(_))) {
            self.try_entry(parent)?;
            return Err(DomError::NotAnElement(parent));
        }
        self.try_entry(node)?;
        if self.contains(node, parent) {
            return Err(DomError::HierarchyRequest { parent, node });
        }
        let reference = if reference == Some(node) {
            self.next_sibling(node)
        } else {
            reference
        };
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        self.detach(node);

        let index = match reference {
            Some(reference) => self
                .children(parent)
                .iter()
                .position(|child| *child == reference)
                .unwrap_or(self.child_count(parent)),
            None => self.child_count(parent),
        };
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.insert(index, node);
        }
        if let Some(entry) = self.entry_mut(node) {
            entry.parent = Some(parent);
        }
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(())
    }

    /// Remove a node from its parent, keeping it alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.retain(|child| *child != id);
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = None;
        }
    }

    /// Detach every child of `id`, returning them in order.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = match self.entry_mut(id) {
            Some(entry) => std::mem::take(&mut entry.children),
            None => return Vec::new(),
        };
        for child in &children {
            if let Some(entry) = self.entry_mut(*child) {
                entry.parent = None;
            }
        }
        children
    }

    /// Move all children of `from` under `to`, before `reference`.
    pub fn move_children(
        &mut self,
        from: NodeId,
        to: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        for child in self.take_children(from) {
            self.insert_before(to, child, reference)?;
        }
        Ok(())
    }

    /// Put `node` inside a new `tag` element that takes its place.
    pub fn wrap(&mut self, node: NodeId, tag: &str) -> Result<NodeId, DomError> {
        self.try_entry(node)?;
        let wrapper = self.create_element(tag);
        if let Some(parent) = self.parent(node) {
            self.insert_before(parent, wrapper, Some(node))?;
        }
        self.append_child(wrapper, node)?;
        Ok(wrapper)
    }

    /// Wrap every child of `element` in a new `tag` element.
    pub fn wrap_children(&mut self, element: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let wrapper = self.create_element(tag);
        self.move_children(element, wrapper, None)?;
        self.append_child(element, wrapper)?;
        Ok(wrapper)
    }

    /// Replace `element` with its children.
    pub fn unwrap(&mut self, element: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.parent(element) else {
            return Ok(());
        };
        for child in self.take_children(element) {
            self.insert_before(parent, child, Some(element))?;
        }
        self.detach(element);
        Ok(())
    }

    /// Put `replacement` where `node` is and detach `node`.
    pub fn replace_with(&mut self, node: NodeId, replacement: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        if node == replacement {
            return Ok(());
        }
        self.insert_before(parent, replacement, Some(node))?;
        self.detach(node);
        Ok(())
    }

    /// Copy a node, and its subtree when `deep`. The copy is detached.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let data = self.try_entry(id)?.data.clone();
        let copy = self.alloc(data);
        if deep {
            let children = self.children(id).to_vec();
            for child in children {
                let child_copy = self.clone_node(child, true)?;
                self.append_child(copy, child_copy)?;
            }
        }
        Ok(copy)
    }

    // === Attributes ===

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attribute(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        self.element_mut(id)?.set_attribute(name, value.into());
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.element_mut(id)?.remove_attribute(name))
    }

    /// Class names of an element.
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|class| class.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let value = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", value)
    }

    // === Inline style ===

    /// Parsed inline style of an element. Empty for non-elements.
    pub fn style(&self, id: NodeId) -> StyleDeclaration {
        self.attribute(id, "style")
            .map(StyleDeclaration::parse)
            .unwrap_or_default()
    }

    pub fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        self.style(id).get(name).map(str::to_string)
    }

    pub fn set_style(&mut self, id: NodeId, style: &StyleDeclaration) -> Result<(), DomError> {
        if style.is_empty() {
            self.remove_attribute(id, "style")?;
            Ok(())
        } else {
            self.set_attribute(id, "style", style.to_css_text())
        }
    }

    /// Set one inline style property. An empty value removes it.
    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut style = self.style(id);
        style.set(name, value);
        self.set_style(id, &style)
    }

    pub fn remove_style_property(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        let mut style = self.style(id);
        if style.remove(name).is_some() {
            self.set_style(id, &style)?;
        }
        Ok(())
    }

    // === Positions ===

    fn path_from_root(&self, node: NodeId) -> (NodeId, Vec<usize>) {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_in_parent(current).unwrap_or(0));
            current = parent;
        }
        path.reverse();
        (current, path)
    }

    /// Document-order comparison of two boundary points.
    ///
    /// `None` when the points live in different trees.
    pub fn compare_positions(&self, a: DomPosition, b: DomPosition) -> Option<Ordering> {
        let (root_a, mut key_a) = self.path_from_root(a.node);
        let (root_b, mut key_b) = self.path_from_root(b.node);
        if root_a != root_b {
            return None;
        }
        key_a.push(a.offset);
        key_b.push(b.offset);
        Some(key_a.cmp(&key_b))
    }

    // === Host selection and focus ===

    pub fn selection(&self) -> Option<&HostSelection> {
        self.selection.as_ref()
    }

    pub fn set_selection_range(&mut self, range: DomRange, is_reverted: bool) {
        self.selection = Some(HostSelection { range, is_reverted });
        self.notifications.push(DomNotification::SelectionChange);
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.notifications.push(DomNotification::SelectionChange);
        }
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Drain queued notifications in the order they happened.
    pub fn take_notifications(&mut self) -> Vec<DomNotification> {
        std::mem::take(&mut self.notifications)
    }

    /// Number of live nodes, attached or not.
    pub fn live_node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }
}

/// Iterator over strict ancestors of a node.
pub struct Ancestors<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.parent(current);
        Some(current)
    }
}
