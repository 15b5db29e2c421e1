//! Per-editor core: the cache slot, conversion settings and the APIs the
//! editing-command layer reads the model through.
//!
//! The host owns the [`Dom`]; [`EditorCore`] only remembers which node is the
//! editor root and borrows the tree for each call. Everything runs to
//! completion inside the call that triggered it. Selection notifications the
//! editor causes while writing are discarded rather than fed back into the
//! cache.

mod copy;
mod dark;
mod options;
mod selection;
mod shadow;

pub use copy::ContentForCopy;
pub use dark::transform_color;
pub use options::{EditorOptions, Environment};
pub use selection::{
    DOM_SELECTION_STYLE_KEY, HIDE_CURSOR_STYLE_KEY, HIDE_SELECTION_STYLE_KEY, TableGrid, ensure_unique_id,
};
pub use shadow::ModelCopyMode;

use std::collections::BTreeMap;
use std::rc::Rc;

use smol_str::SmolStr;
use tapestry_dom::{Dom, DomNotification, DomSelection, NodeId};
use tapestry_model::ContentModelDocument;

use crate::cache::{
    CacheAction, CacheState, ChangeSource, ContentChangedEvent, DomIndex, EditorEvent, InvalidateReason,
    reconcile_selection, transition,
};
use crate::dom_to_model::{DomToModelContext, DomToModelOption, dom_to_content_model};
use crate::format::{DarkColorHandler, LuminanceDarkColorHandler};
use crate::model_to_dom::{ModelToDomContext, ModelToDomOption, content_model_to_dom};

/// One editor instance.
pub struct EditorCore {
    root: NodeId,
    options: EditorOptions,
    environment: Environment,
    dom_to_model_option: DomToModelOption,
    model_to_dom_option: ModelToDomOption,
    dark_color_handler: Rc<dyn DarkColorHandler>,

    cache: CacheState,
    /// Image and table selections. The host selection can only hold ranges.
    selection_override: Option<DomSelection>,
    /// CSS rules keyed by purpose, for the host to install.
    styles: BTreeMap<SmolStr, String>,
    /// Table selection rule set aside while the selection is hidden.
    hidden_table_rule: Option<String>,
    shadow: Option<shadow::ShadowEdit>,
    /// A render is in progress; events it causes are dropped.
    is_writing: bool,
}

impl EditorCore {
    pub fn new(root: NodeId, options: EditorOptions, environment: Environment) -> Self {
        Self {
            root,
            options,
            environment,
            dom_to_model_option: DomToModelOption::default(),
            model_to_dom_option: ModelToDomOption::default(),
            dark_color_handler: Rc::new(LuminanceDarkColorHandler),
            cache: CacheState::default(),
            selection_override: None,
            styles: BTreeMap::new(),
            hidden_table_rule: None,
            shadow: None,
            is_writing: false,
        }
    }

    pub fn with_dom_to_model_option(mut self, option: DomToModelOption) -> Self {
        self.dom_to_model_option = option;
        self
    }

    pub fn with_model_to_dom_option(mut self, option: ModelToDomOption) -> Self {
        self.model_to_dom_option = option;
        self
    }

    pub fn with_dark_color_handler(mut self, handler: Rc<dyn DarkColorHandler>) -> Self {
        self.dark_color_handler = handler;
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn dark_color_handler(&self) -> &dyn DarkColorHandler {
        self.dark_color_handler.as_ref()
    }

    pub fn is_in_shadow_edit(&self) -> bool {
        self.shadow.is_some()
    }

    /// Editor style rules, keyed by purpose.
    pub fn editor_styles(&self) -> &BTreeMap<SmolStr, String> {
        &self.styles
    }

    pub fn editor_style(&self, key: &str) -> Option<&str> {
        self.styles.get(key).map(String::as_str)
    }

    // === Conversion contexts ===

    pub fn dom_to_model_context(&self, selection: Option<DomSelection>) -> DomToModelContext {
        let mut context = DomToModelContext::new(
            &self.dom_to_model_option,
            self.environment.is_dark_mode,
            self.dark_color_handler.clone(),
        )
        .with_selection(selection);
        context.allow_cache_element = self.options.allow_cache_element;
        context
    }

    pub fn model_to_dom_context(&self) -> ModelToDomContext {
        let mut context = ModelToDomContext::new(
            &self.model_to_dom_option,
            self.environment.is_dark_mode,
            self.dark_color_handler.clone(),
        );
        context.allow_cache_element = self.options.allow_cache_element;
        context.add_delimiter_for_entity = self.options.add_delimiter_for_entity;
        context
    }

    // === Cache ===

    /// The current selection: an image or table selection the editor set, or
    /// else the host range when it lies inside the editor.
    pub fn get_dom_selection(&self, dom: &Dom) -> Option<DomSelection> {
        if let Some(selection) = self.selection_override {
            let target = match selection {
                DomSelection::Image { image } => Some(image),
                DomSelection::Table { table, .. } => Some(table),
                DomSelection::Range { .. } => None,
            };
            if target.is_some_and(|node| dom.is_connected_to(node, self.root)) {
                return Some(selection);
            }
        }
        let host = dom.selection()?;
        let inside = dom.is_connected_to(host.range.start.node, self.root)
            && dom.is_connected_to(host.range.end.node, self.root);
        inside.then_some(DomSelection::Range {
            range: host.range,
            is_reverted: host.is_reverted,
        })
    }

    /// The cached model, parsing the editor content first when there is none.
    pub fn get_or_create_model(&mut self, dom: &mut Dom) -> &mut ContentModelDocument {
        if self.cache.model.is_none() {
            let selection = self.get_dom_selection(dom);
            let mut context = self.dom_to_model_context(selection);
            let model = dom_to_content_model(dom, self.root, &mut context);
            tracing::debug!(
                target: "tapestry::cache",
                has_selection = selection.is_some(),
                "created content model"
            );
            self.store(model, selection);
        }
        self.cache.model.get_or_insert_with(ContentModelDocument::new)
    }

    /// Drop the cached model. Ignored during a shadow edit.
    pub fn invalidate(&mut self) {
        self.invalidate_for(InvalidateReason::Requested);
    }

    pub fn get_state(&self) -> &CacheState {
        &self.cache
    }

    fn invalidate_for(&mut self, reason: InvalidateReason) {
        if self.shadow.is_some() {
            tracing::trace!(target: "tapestry::cache", ?reason, "invalidation suppressed in shadow edit");
            return;
        }
        if self.cache.has_model() {
            tracing::debug!(target: "tapestry::cache", ?reason, "invalidated content model");
        }
        self.cache.clear();
    }

    fn store(&mut self, model: ContentModelDocument, selection: Option<DomSelection>) {
        self.cache.index = self.options.cache_model.then(|| DomIndex::build(&model));
        self.cache.model = Some(model);
        self.cache.selection = selection;
    }

    /// Feed one host event to the cache and report what it did.
    pub fn handle_event(&mut self, dom: &mut Dom, event: EditorEvent) -> CacheAction {
        if self.is_writing {
            tracing::trace!(target: "tapestry::cache", event = event.name(), "event during write dropped");
            return CacheAction::Keep;
        }
        let action = transition(&self.cache, &event, self.options.cache_model);
        tracing::trace!(target: "tapestry::cache", event = event.name(), ?action, "cache event");

        match action {
            CacheAction::Keep => {}
            CacheAction::Invalidate(reason) => self.invalidate_for(reason),
            CacheAction::Adopt => {
                if let EditorEvent::ContentChanged(ContentChangedEvent {
                    source,
                    model: Some(model),
                    selection,
                }) = event
                {
                    tracing::debug!(target: "tapestry::cache", source = source.as_str(), "adopted content model");
                    self.store(*model, selection);
                }
            }
            CacheAction::Reconcile { forced } => self.reconcile(dom, forced),
        }
        action
    }

    fn reconcile(&mut self, dom: &Dom, forced: bool) {
        let selection = self.get_dom_selection(dom);
        if !forced && selection == self.cache.selection {
            return;
        }
        let Some(selection) = selection else {
            self.invalidate_for(InvalidateReason::ReconcileFailed);
            return;
        };
        let (Some(model), Some(index)) = (self.cache.model.as_mut(), self.cache.index.as_ref()) else {
            self.invalidate_for(InvalidateReason::ReconcileFailed);
            return;
        };
        match reconcile_selection(dom, self.root, model, index, &selection) {
            Ok(()) => {
                tracing::trace!(target: "tapestry::cache", forced, "reconciled selection");
                self.cache.selection = Some(selection);
            }
            Err(error) => {
                tracing::debug!(target: "tapestry::cache", %error, forced, "reconcile failed");
                self.invalidate_for(InvalidateReason::ReconcileFailed);
            }
        }
    }

    /// Turn queued host notifications into cache events. Selection changes
    /// count only while the editor has focus.
    pub fn pump_notifications(&mut self, dom: &mut Dom) -> usize {
        let mut handled = 0;
        for notification in dom.take_notifications() {
            match notification {
                DomNotification::SelectionChange if dom.has_focus() => {
                    self.handle_event(dom, EditorEvent::NativeSelectionChanged);
                    handled += 1;
                }
                DomNotification::SelectionChange => {}
            }
        }
        handled
    }

    // === Writing ===

    /// Render `model` into the editor root. Notifications the render causes
    /// are discarded.
    fn render(&mut self, dom: &mut Dom, model: &mut ContentModelDocument) -> Option<DomSelection> {
        self.is_writing = true;
        let mut context = self.model_to_dom_context();
        let selection = content_model_to_dom(dom, self.root, model, &mut context);
        if let Err(error) = self.apply_dom_selection(dom, selection) {
            tracing::debug!(target: "tapestry::editor", %error, "rendered selection not applied");
        }
        let discarded = dom.take_notifications().len();
        self.is_writing = false;
        tracing::trace!(target: "tapestry::editor", discarded, "render notifications dropped");
        selection
    }

    /// Read the model, let `callback` change it, and write it back.
    ///
    /// `callback` returns whether it changed anything. When it returns
    /// `false` nothing is rendered and it must have left the model alone.
    pub fn format_content_model(
        &mut self,
        dom: &mut Dom,
        api_name: &str,
        callback: impl FnOnce(&mut ContentModelDocument) -> bool,
    ) -> bool {
        self.get_or_create_model(dom);
        let Some(mut model) = self.cache.model.take() else {
            return false;
        };
        if !callback(&mut model) {
            self.cache.model = Some(model);
            tracing::debug!(target: "tapestry::editor", api_name, changed = false, "format content model");
            return false;
        }

        let selection = self.render(dom, &mut model);
        self.handle_event(
            dom,
            EditorEvent::ContentChanged(ContentChangedEvent::new(ChangeSource::Format).with_model(model, selection)),
        );
        tracing::debug!(target: "tapestry::editor", api_name, changed = true, "format content model");
        true
    }
}
