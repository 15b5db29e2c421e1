//! Selected content as standalone HTML and plain text.

use tapestry_dom::{Dom, NodeId};
use tapestry_model::api::{content_model_to_text, trim_model_for_selection};
use tapestry_model::clone_model_disconnected;

use super::EditorCore;
use crate::cache::EditorEvent;
use crate::model_to_dom::content_model_to_dom;

/// What a copy or cut puts on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentForCopy {
    /// Detached `div` holding the rendered selection. The caller owns it.
    pub html_root: NodeId,
    pub text: String,
}

fn wrap_table(dom: &mut Dom, node: NodeId) {
    if dom.is_tag(node, "table") {
        if let Err(error) = dom.wrap(node, "div") {
            tracing::debug!(target: "tapestry::editor", %error, "table not wrapped for copy");
        }
    }
}

impl EditorCore {
    /// Render the selected content outside the editor.
    ///
    /// `None` when nothing is selected.
    pub fn get_content_for_copy(&mut self, dom: &mut Dom) -> Option<ContentForCopy> {
        let selection = self.get_dom_selection(dom)?;
        if selection.is_collapsed_range() {
            return None;
        }
        if self.cache.selection != Some(selection) {
            self.handle_event(dom, EditorEvent::SelectionChanged);
        }

        self.get_or_create_model(dom);
        let model = self.cache.model.as_ref()?;
        let mut copy = clone_model_disconnected(model, dom);
        trim_model_for_selection(&mut copy, &selection);
        if copy.is_empty() {
            return None;
        }

        let html_root = dom.create_element("div");
        let mut context = self.model_to_dom_context();
        context.allow_cache_element = false;
        context.add_delimiter_for_entity = false;
        context.on_node_created = Some(wrap_table);
        content_model_to_dom(dom, html_root, &mut copy, &mut context);

        for node in dom.descendants(html_root) {
            if dom.has_attribute(node, "contenteditable") {
                if let Err(error) = dom.remove_attribute(node, "contenteditable") {
                    tracing::debug!(target: "tapestry::editor", %error, "contenteditable not removed");
                }
            }
        }

        let text = content_model_to_text(&copy, dom);
        tracing::debug!(target: "tapestry::editor", chars = text.chars().count(), "prepared content for copy");
        Some(ContentForCopy { html_root, text })
    }
}

#[cfg(test)]
mod tests {
    use tapestry_dom::{DomPosition, DomRange, DomSelection};

    use super::*;
    use crate::editor::{EditorOptions, Environment};

    fn editor(html: &str) -> (Dom, EditorCore) {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, html).unwrap();
        dom.set_focus(true);
        (dom, EditorCore::new(root, EditorOptions::default(), Environment::default()))
    }

    #[test]
    fn test_collapsed_selection_copies_nothing() {
        let (mut dom, mut editor) = editor("<div>hello</div>");
        let text = dom.first_child(dom.first_child(editor.root()).unwrap()).unwrap();
        dom.set_selection_range(DomRange::caret(DomPosition::new(text, 2)), false);
        assert_eq!(editor.get_content_for_copy(&mut dom), None);
    }

    #[test]
    fn test_copy_range() {
        let (mut dom, mut editor) = editor("<div>hello world</div><div>second</div>");
        let text = dom.first_child(dom.first_child(editor.root()).unwrap()).unwrap();
        dom.set_selection_range(DomRange::new(DomPosition::new(text, 6), DomPosition::new(text, 11)), false);

        let copied = editor.get_content_for_copy(&mut dom).unwrap();
        assert_eq!(copied.text, "world");
        assert!(!dom.is_connected_to(copied.html_root, editor.root()));
        assert_eq!(dom.text_content(copied.html_root), "world");
    }

    #[test]
    fn test_copied_table_is_wrapped() {
        let (mut dom, mut editor) = editor("<table><tr><td>a</td><td>b</td></tr></table>");
        let table = dom.first_child(editor.root()).unwrap();
        editor
            .set_dom_selection(
                &mut dom,
                Some(DomSelection::Table {
                    table,
                    first_column: 1,
                    first_row: 0,
                    last_column: 1,
                    last_row: 0,
                }),
            )
            .unwrap();

        let copied = editor.get_content_for_copy(&mut dom).unwrap();
        let wrapper = dom.first_child(copied.html_root).unwrap();
        assert_eq!(dom.tag(wrapper), Some("div"));
        assert!(dom.is_tag(dom.first_child(wrapper).unwrap(), "table"));
        assert_eq!(copied.text, "b");
    }
}
