//! Shadow edit: a throwaway preview rendered over the live content.

use tapestry_dom::{Dom, NodeId};
use tapestry_model::{CachedElementMode, ContentModelDocument, clone_model, clone_model_disconnected};

use super::EditorCore;
use crate::cache::{CacheState, DomIndex};

/// What a shadow edit puts back when it is cancelled.
#[derive(Debug)]
pub(super) struct ShadowEdit {
    cache: CacheState,
    children: Vec<NodeId>,
}

/// How a model copy relates to the rendered DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCopyMode {
    /// Keeps `cached_element`, so the copy still describes the live nodes.
    Connected,
    /// Owns clones of entity and general elements and no back-references.
    Disconnected,
}

impl EditorCore {
    /// Swap the editor content for a rendering of a copy of the model.
    ///
    /// Until [`exit_shadow_edit`](Self::exit_shadow_edit), the copy is the
    /// cached model and invalidation is suppressed, so preview features can
    /// format it freely.
    pub fn enter_shadow_edit(&mut self, dom: &mut Dom) {
        if self.shadow.is_some() {
            return;
        }
        self.get_or_create_model(dom);
        let saved = std::mem::take(&mut self.cache);
        let Some(model) = saved.model.as_ref() else {
            self.cache = saved;
            return;
        };
        let mut preview = clone_model_disconnected(model, dom);

        let children = dom.take_children(self.root);
        self.is_writing = true;
        let mut context = self.model_to_dom_context();
        let selection = crate::model_to_dom::content_model_to_dom(dom, self.root, &mut preview, &mut context);
        dom.take_notifications();
        self.is_writing = false;

        tracing::debug!(target: "tapestry::editor", saved_nodes = children.len(), "entered shadow edit");
        self.cache = CacheState {
            index: self.options.cache_model.then(|| DomIndex::build(&preview)),
            model: Some(preview),
            selection,
        };
        self.shadow = Some(ShadowEdit { cache: saved, children });
    }

    /// Leave shadow edit. With `commit` the preview stays as the editor
    /// content, otherwise the saved content and model come back unchanged.
    pub fn exit_shadow_edit(&mut self, dom: &mut Dom, commit: bool) {
        let Some(shadow) = self.shadow.take() else {
            return;
        };
        if commit {
            for node in shadow.children {
                dom.dispose(node);
            }
            tracing::debug!(target: "tapestry::editor", "committed shadow edit");
            return;
        }

        for node in dom.take_children(self.root) {
            dom.dispose(node);
        }
        self.is_writing = true;
        for node in shadow.children {
            if let Err(error) = dom.append_child(self.root, node) {
                tracing::debug!(target: "tapestry::editor", %error, "saved node not restored");
            }
        }
        let selection = shadow.cache.selection;
        self.cache = shadow.cache;
        if let Err(error) = self.apply_dom_selection(dom, selection) {
            tracing::debug!(target: "tapestry::editor", %error, "saved selection not restored");
        }
        dom.take_notifications();
        self.is_writing = false;
        tracing::debug!(target: "tapestry::editor", "cancelled shadow edit");
    }

    /// A copy of the current model.
    pub fn get_content_model_copy(&mut self, dom: &mut Dom, mode: ModelCopyMode) -> ContentModelDocument {
        self.get_or_create_model(dom);
        match (mode, self.cache.model.as_ref()) {
            (_, None) => ContentModelDocument::new(),
            (ModelCopyMode::Connected, Some(model)) => clone_model(model, CachedElementMode::Keep),
            (ModelCopyMode::Disconnected, Some(model)) => clone_model_disconnected(model, dom),
        }
    }
}

#[cfg(test)]
mod tests {
    use tapestry_model::path::visit_blocks;

    use super::*;
    use crate::editor::{EditorOptions, Environment};

    fn editor(html: &str) -> (Dom, EditorCore) {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, html).unwrap();
        (dom, EditorCore::new(root, EditorOptions::default(), Environment::default()))
    }

    fn has_cached_elements(model: &ContentModelDocument) -> bool {
        let mut found = false;
        visit_blocks(model, |_, block| {
            if block.cached_element().is_some() {
                found = true;
            }
            if let Some(paragraph) = block.as_paragraph() {
                found |= paragraph.segments.iter().any(|segment| segment.cached_element.is_some());
            }
        });
        found
    }

    #[test]
    fn test_cancelled_shadow_edit_restores_content() {
        let (mut dom, mut editor) = editor("<div>hello <b>world</b></div><div><br></div>");
        let before_model = editor.get_content_model_copy(&mut dom, ModelCopyMode::Connected);
        let before_html = dom.inner_html(editor.root());
        let before_children = dom.children(editor.root()).to_vec();

        editor.enter_shadow_edit(&mut dom);
        assert!(editor.is_in_shadow_edit());
        assert!(editor.format_content_model(&mut dom, "preview", |model| {
            model.blocks.truncate(1);
            true
        }));
        assert_ne!(dom.inner_html(editor.root()), before_html);
        editor.invalidate();
        assert!(editor.get_state().has_model());

        editor.exit_shadow_edit(&mut dom, false);
        assert!(!editor.is_in_shadow_edit());
        assert_eq!(dom.inner_html(editor.root()), before_html);
        assert_eq!(dom.children(editor.root()), before_children.as_slice());
        assert_eq!(editor.get_state().model.as_ref(), Some(&before_model));
    }

    #[test]
    fn test_committed_shadow_edit_keeps_preview() {
        let (mut dom, mut editor) = editor("<div>one</div><div>two</div>");
        editor.enter_shadow_edit(&mut dom);
        editor.format_content_model(&mut dom, "preview", |model| {
            model.blocks.pop();
            true
        });
        let preview_html = dom.inner_html(editor.root());
        editor.exit_shadow_edit(&mut dom, true);
        assert_eq!(dom.inner_html(editor.root()), preview_html);
        assert_eq!(editor.get_state().model.as_ref().map(|model| model.blocks.len()), Some(1));
    }

    #[test]
    fn test_model_copy_modes() {
        let (mut dom, mut editor) = editor("<div>text</div>");
        let connected = editor.get_content_model_copy(&mut dom, ModelCopyMode::Connected);
        let disconnected = editor.get_content_model_copy(&mut dom, ModelCopyMode::Disconnected);
        assert!(has_cached_elements(&connected));
        assert!(!has_cached_elements(&disconnected));
        let paragraph = disconnected.blocks[0].as_paragraph().unwrap();
        assert_eq!(paragraph.segments[0].as_text(), Some("text"));
    }
}
