//! HTML serialization and fragment parsing.
//!
//! Serialization is deterministic: attributes in insertion order, text escaped
//! the way `innerHTML` escapes it. Parsing runs the html5ever tree builder in
//! fragment mode and builds straight into the arena, so implied `tbody`,
//! auto-closed paragraphs and misnested formatting come out as a browser
//! would produce them.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, ExpandedName, LocalName, Namespace, ParseOpts, QualName, parse_fragment};

use crate::error::DomError;
use crate::node::{NodeData, NodeId};
use crate::tree::Dom;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

fn html_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

impl Dom {
    /// Serialize the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, &mut out);
        }
        out
    }

    /// Serialize a node including itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) => escape_text(text, out),
            Some(NodeData::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeData::Element(element)) => {
                out.push('<');
                out.push_str(element.tag());
                for (name, value) in element.attributes() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attribute(value, out);
                    out.push('"');
                }
                out.push('>');
                if is_void_element(element.tag()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(element.tag());
                out.push('>');
            }
            None => {}
        }
    }

    /// Parse an HTML fragment into detached top-level nodes, as if it were
    /// the content of a `body`.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        self.parse_fragment_in("body", html)
    }

    /// Parse an HTML fragment the way `innerHTML` does on an element named
    /// `context`, so `<tr>` parses inside a `tbody` but not inside a `div`.
    pub fn parse_fragment_in(&mut self, context: &str, html: &str) -> Vec<NodeId> {
        let sink = FragmentSink::new(self);
        parse_fragment(sink, ParseOpts::default(), html_name(context), Vec::new()).one(html)
    }

    /// Replace the children of `id` with the parsed fragment.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<(), DomError> {
        let Some(context) = self.tag(id).map(str::to_owned) else {
            return Err(if self.is_alive(id) {
                DomError::NotAnElement(id)
            } else {
                DomError::StaleNode(id)
            });
        };
        for child in self.take_children(id) {
            self.dispose(child);
        }
        for node in self.parse_fragment_in(&context, html) {
            self.append_child(id, node)?;
        }
        Ok(())
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// Tree builder target writing into a [`Dom`].
///
/// html5ever parses a fragment under a synthetic `html` root attached to a
/// document; both are stand-ins here and are freed when parsing ends, along
/// with anything the tree builder created and then dropped.
struct FragmentSink<'d> {
    dom: &'d mut Dom,
    document: NodeId,
    /// Names as the tree builder gave them, for its scope checks.
    names: HashMap<NodeId, QualName>,
    unnamed: QualName,
    created: Vec<NodeId>,
}

impl<'d> FragmentSink<'d> {
    fn new(dom: &'d mut Dom) -> Self {
        let document = dom.create_element("div");
        Self {
            dom,
            document,
            names: HashMap::new(),
            unnamed: html_name("div"),
            created: Vec::new(),
        }
    }

    fn set_attribute(&mut self, element: NodeId, attribute: Attribute) {
        if let Err(error) = self
            .dom
            .set_attribute(element, &attribute.name.local, attribute.value.to_string())
        {
            tracing::warn!(target: "tapestry::html", %error, "parse_fragment: failed to set attribute");
        }
    }

    /// Insert `child` under `parent` before `reference`. Text joins a text
    /// node it would land next to.
    fn attach(&mut self, parent: NodeId, child: NodeOrText<NodeId>, reference: Option<NodeId>) {
        let node = match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => {
                let previous = match reference {
                    Some(reference) => self.dom.previous_sibling(reference),
                    None => self.dom.last_child(parent),
                };
                if let Some(previous) = previous.filter(|node| self.dom.is_text(*node)) {
                    let joined = format!("{}{}", self.dom.text(previous).unwrap_or_default(), &*text);
                    if let Err(error) = self.dom.set_text(previous, joined) {
                        tracing::warn!(target: "tapestry::html", %error, "parse_fragment: failed to join text");
                    }
                    return;
                }
                let node = self.dom.create_text(text.to_string());
                self.created.push(node);
                node
            }
        };
        if let Err(error) = self.dom.insert_before(parent, node, reference) {
            tracing::warn!(target: "tapestry::html", %error, "parse_fragment: failed to attach node");
        }
    }
}

impl TreeSink for FragmentSink<'_> {
    type Handle = NodeId;
    type Output = Vec<NodeId>;

    fn finish(self) -> Vec<NodeId> {
        let FragmentSink {
            dom, document, created, ..
        } = self;
        let nodes = match dom.first_child(document) {
            Some(root) => dom.take_children(root),
            None => Vec::new(),
        };
        dom.dispose(document);
        let kept: HashSet<NodeId> = nodes.iter().copied().collect();
        for node in created {
            if dom.is_alive(node) && dom.parent(node).is_none() && !kept.contains(&node) {
                dom.dispose(node);
            }
        }
        nodes
    }

    fn parse_error(&mut self, msg: Cow<'static, str>) {
        tracing::trace!(target: "tapestry::html", %msg, "html parse error");
    }

    fn get_document(&mut self) -> NodeId {
        self.document
    }

    fn elem_name<'a>(&'a self, target: &'a NodeId) -> ExpandedName<'a> {
        self.names.get(target).unwrap_or(&self.unnamed).expanded()
    }

    fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>, _flags: ElementFlags) -> NodeId {
        let element = self.dom.create_element(&name.local);
        for attribute in attrs {
            self.set_attribute(element, attribute);
        }
        self.names.insert(element, name);
        self.created.push(element);
        element
    }

    fn create_comment(&mut self, text: StrTendril) -> NodeId {
        let comment = self.dom.create_comment(text.to_string());
        self.created.push(comment);
        comment
    }

    fn create_pi(&mut self, _target: StrTendril, data: StrTendril) -> NodeId {
        self.create_comment(data)
    }

    fn append(&mut self, parent: &NodeId, child: NodeOrText<NodeId>) {
        self.attach(*parent, child, None);
    }

    fn append_based_on_parent_node(&mut self, element: &NodeId, prev_element: &NodeId, child: NodeOrText<NodeId>) {
        if self.dom.parent(*element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(&mut self, _name: StrTendril, _public_id: StrTendril, _system_id: StrTendril) {}

    fn get_template_contents(&mut self, target: &NodeId) -> NodeId {
        *target
    }

    fn same_node(&self, x: &NodeId, y: &NodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&mut self, _mode: QuirksMode) {}

    fn append_before_sibling(&mut self, sibling: &NodeId, new_node: NodeOrText<NodeId>) {
        if let Some(parent) = self.dom.parent(*sibling) {
            self.attach(parent, new_node, Some(*sibling));
        }
    }

    fn add_attrs_if_missing(&mut self, target: &NodeId, attrs: Vec<Attribute>) {
        for attribute in attrs {
            if !self.dom.has_attribute(*target, &attribute.name.local) {
                self.set_attribute(*target, attribute);
            }
        }
    }

    fn remove_from_parent(&mut self, target: &NodeId) {
        self.dom.detach(*target);
    }

    fn reparent_children(&mut self, node: &NodeId, new_parent: &NodeId) {
        if let Err(error) = self.dom.move_children(*node, *new_parent, None) {
            tracing::warn!(target: "tapestry::html", %error, "parse_fragment: failed to reparent children");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(html: &str) -> String {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, html).unwrap();
        dom.inner_html(root)
    }

    #[test]
    fn test_roundtrip_simple_markup() {
        let html = r#"<div style="color: red;">a<b>b</b><br>c</div>"#;
        assert_eq!(roundtrip(html), html);
    }

    #[test]
    fn test_entities_and_nbsp() {
        insta::assert_snapshot!(roundtrip("a&amp;b&nbsp;&#65;&lt;&eacute;"), @"a&amp;b&nbsp;A&lt;é");
    }

    #[test]
    fn test_unquoted_and_boolean_attributes() {
        assert_eq!(
            roundtrip("<span data-n=2 hidden>x</span>"),
            r#"<span data-n="2" hidden="">x</span>"#
        );
    }

    #[test]
    fn test_mismatched_end_tag_closes_to_match() {
        assert_eq!(
            roundtrip("<div><span>a</div>b"),
            "<div><span>a</span></div>b"
        );
    }

    #[test]
    fn test_stray_end_tag_ignored() {
        assert_eq!(roundtrip("a</span>b"), "ab");
    }

    #[test]
    fn test_table_rows_get_an_implied_tbody() {
        insta::assert_snapshot!(
            roundtrip("<table><tr><td>a</td></tr></table>"),
            @"<table><tbody><tr><td>a</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_block_closes_open_paragraph() {
        assert_eq!(roundtrip("<p>a<div>b</div>"), "<p>a</p><div>b</div>");
    }

    #[test]
    fn test_misnested_formatting_is_repaired() {
        assert_eq!(roundtrip("<b>1<i>2</b>3</i>"), "<b>1<i>2</i></b><i>3</i>");
    }

    #[test]
    fn test_cells_parse_in_row_context() {
        let mut dom = Dom::new();
        let row = dom.create_element("tr");
        dom.set_inner_html(row, "<td>a</td><td>b</td>").unwrap();
        assert_eq!(dom.inner_html(row), "<td>a</td><td>b</td>");

        let div = dom.create_element("div");
        dom.set_inner_html(div, "<td>a</td>").unwrap();
        assert_eq!(dom.inner_html(div), "a");
    }

    #[test]
    fn test_parser_scaffolding_is_freed() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, "<table><tr><td>a</td></tr></table>x").unwrap();
        assert_eq!(dom.live_node_count(), dom.descendants(root).len() + 1);
    }

    #[test]
    fn test_comment_and_lone_angle() {
        assert_eq!(roundtrip("<!--x-->1 < 2"), "<!--x-->1 &lt; 2");
    }

    #[test]
    fn test_self_closing_and_void() {
        assert_eq!(
            roundtrip(r#"<img src="a.png"/><hr>x"#),
            r#"<img src="a.png"><hr>x"#
        );
    }
}
