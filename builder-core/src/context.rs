//! Editor context - the single owner of all editing state.
//!
//! `EditorContext` holds the registry handle, the document, its history,
//! the selection and the canvas controller. Every mutating operation goes
//! through here so that it is validated first, recorded in history exactly
//! once on success, and refused while a page load is pending.

use std::sync::Arc;

use crate::canvas::{
    CanvasController, CanvasEvent, DropDecision, DropIndicator, DropOutcome, DropTarget,
    EventOutcome, HoverTarget,
};
use crate::history::History;
use crate::selection::{NodeRender, PanelView, Selection};
use crate::serializer;
use crate::{Document, EditorError, EditorResult, Element, ElementId, Settings, WidgetRegistry};

/// What the editor did in response to a canvas event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResponse {
    /// Nothing happened.
    Ignored,
    /// Drop feedback to show.
    Indicator(DropIndicator),
    /// The drag was cancelled.
    Cancelled,
    /// A drop was carried out.
    Dropped(DropOutcome),
    /// Undo or redo ran; `true` if the document changed.
    History(bool),
    /// The selected element was deleted.
    Deleted(ElementId),
    /// The selection changed; the panel to show, if any.
    Selected(Option<PanelView>),
}

/// Editing session state for one page.
#[derive(Debug, Clone)]
pub struct EditorContext {
    registry: Arc<WidgetRegistry>,
    document: Document,
    history: History,
    selection: Selection,
    canvas: CanvasController,
    pending: Option<String>,
    revision: u64,
}

impl EditorContext {
    /// Create an editor with an empty document.
    #[must_use]
    pub fn new(registry: Arc<WidgetRegistry>) -> Self {
        Self::with_document(registry, Document::new())
    }

    /// Create an editor for an existing document.
    #[must_use]
    pub fn with_document(registry: Arc<WidgetRegistry>, document: Document) -> Self {
        Self {
            registry,
            history: History::new(document.clone()),
            document,
            selection: Selection::default(),
            canvas: CanvasController::new(),
            pending: None,
            revision: 0,
        }
    }

    /// Replace the history with one of a different capacity.
    #[must_use]
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history = History::with_cap(self.document.clone(), cap);
        self
    }

    /// Shared widget registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<WidgetRegistry> {
        &self.registry
    }

    /// Current document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Undo/redo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Canvas controller state.
    #[must_use]
    pub fn canvas(&self) -> &CanvasController {
        &self.canvas
    }

    /// Selected element, if any.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selection.get()
    }

    /// Counter bumped whenever the document changes.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Find an element by ID.
    #[must_use]
    pub fn find(&self, id: ElementId) -> Option<&Element> {
        self.document.get(id)
    }

    // ------------------------------------------------------------------
    // Pending-operation guard
    // ------------------------------------------------------------------

    /// Mark an operation (e.g. `load`) as in flight. Mutations fail with
    /// [`EditorError::Busy`] until [`EditorContext::finish_pending`].
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Busy`] if another operation is already pending.
    pub fn begin_pending(&mut self, kind: impl Into<String>) -> EditorResult<()> {
        self.ensure_idle()?;
        let kind = kind.into();
        tracing::debug!(%kind, "operation pending");
        self.pending = Some(kind);
        Ok(())
    }

    /// Clear the pending operation.
    pub fn finish_pending(&mut self) {
        if let Some(kind) = self.pending.take() {
            tracing::debug!(%kind, "operation finished");
        }
    }

    /// Operation currently pending, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    fn ensure_idle(&self) -> EditorResult<()> {
        match &self.pending {
            Some(kind) => Err(EditorError::Busy(kind.clone())),
            None => Ok(()),
        }
    }

    fn commit(&mut self, label: String) {
        tracing::debug!(%label, revision = self.revision + 1, "document changed");
        self.history.record(self.document.clone(), label);
        self.revision += 1;
    }

    // ------------------------------------------------------------------
    // Tree operations
    // ------------------------------------------------------------------

    /// Create (but do not insert) an element of `kind`, with `settings`
    /// laid over the widget's defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownWidget`] if `kind` is not registered.
    pub fn create_node(&self, kind: &str, settings: Option<&Settings>) -> EditorResult<Element> {
        let definition = self.registry.get(kind)?;
        let settings = settings.map_or_else(|| definition.defaults.clone(), |s| definition.resolve(s));
        Ok(Element::new(kind, settings))
    }

    /// Insert an element under `parent` (or at the root). Returns the index used.
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`], [`EditorError::InvalidParent`],
    /// [`EditorError::UnknownWidget`] or [`EditorError::DuplicateId`]; the
    /// document is unchanged on error.
    pub fn insert_node(
        &mut self,
        parent: Option<ElementId>,
        element: Element,
        index: usize,
    ) -> EditorResult<usize> {
        self.ensure_idle()?;
        let label = format!("add {}", element.kind);
        let index = self.document.insert(parent, element, index, &self.registry)?;
        self.commit(label);
        Ok(index)
    }

    /// Create an element with default settings and insert it.
    ///
    /// # Errors
    ///
    /// Any error of [`EditorContext::create_node`] or [`EditorContext::insert_node`].
    pub fn add_widget(
        &mut self,
        kind: &str,
        parent: Option<ElementId>,
        index: usize,
    ) -> EditorResult<ElementId> {
        let element = self.create_node(kind, None)?;
        let id = element.id;
        self.insert_node(parent, element, index)?;
        Ok(id)
    }

    /// Remove an element and its subtree. Clears the selection if it was
    /// inside the removed subtree.
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`] or [`EditorError::NotFound`].
    pub fn remove_node(&mut self, id: ElementId) -> EditorResult<Element> {
        self.ensure_idle()?;
        let removed = self.document.remove(id)?;
        self.forget_missing();
        self.commit(format!("remove {}", removed.kind));
        Ok(removed)
    }

    /// Move an element. Atomic: on error nothing changes.
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`], [`EditorError::NotFound`],
    /// [`EditorError::InvalidParent`] or [`EditorError::CycleDetected`].
    pub fn move_node(
        &mut self,
        id: ElementId,
        new_parent: Option<ElementId>,
        index: usize,
    ) -> EditorResult<usize> {
        self.ensure_idle()?;
        let index = self
            .document
            .move_element(id, new_parent, index, &self.registry)?;
        self.commit("move".to_string());
        Ok(index)
    }

    /// Shallow-merge `patch` into an element's settings.
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`] or [`EditorError::NotFound`].
    pub fn update_settings(&mut self, id: ElementId, patch: &Settings) -> EditorResult<()> {
        self.ensure_idle()?;
        self.document.update_settings(id, patch)?;
        let keys: Vec<&str> = patch.iter().map(|(k, _)| k).collect();
        self.commit(format!("edit {}", keys.join(", ")));
        Ok(())
    }

    /// Deep-copy an element with fresh IDs and insert it right after the original.
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`] or [`EditorError::NotFound`].
    pub fn duplicate_node(&mut self, id: ElementId) -> EditorResult<ElementId> {
        self.ensure_idle()?;
        let original = self
            .document
            .get(id)
            .ok_or_else(|| EditorError::NotFound(id.to_string()))?;
        let copy = original.with_fresh_ids();
        let copy_id = copy.id;
        let label = format!("duplicate {}", copy.kind);

        let parent = self.document.parent_of(id)?;
        let siblings = match parent {
            None => self.document.elements(),
            Some(parent_id) => self
                .document
                .get(parent_id)
                .map_or(&[][..], |p| p.children.as_slice()),
        };
        let position = siblings.iter().position(|e| e.id == id).unwrap_or(siblings.len());

        self.document
            .insert(parent, copy, position + 1, &self.registry)?;
        self.commit(label);
        Ok(copy_id)
    }

    // ------------------------------------------------------------------
    // Selection & properties panel
    // ------------------------------------------------------------------

    /// Select an element (or clear with `None`). Returns the panel to show.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NotFound`] for a missing element; the selection
    /// is left as it was.
    pub fn select_node(&mut self, id: Option<ElementId>) -> EditorResult<Option<PanelView>> {
        let Some(id) = id else {
            self.selection.clear();
            return Ok(None);
        };
        if !self.document.contains(id) {
            return Err(EditorError::NotFound(id.to_string()));
        }
        self.selection.set(Some(id));
        Ok(self.panel())
    }

    /// Panel for the current selection.
    #[must_use]
    pub fn panel(&self) -> Option<PanelView> {
        let element = self.document.get(self.selection.get()?)?;
        let definition = self.registry.get(&element.kind).ok()?;
        Some(PanelView::build(element, definition))
    }

    /// Apply a panel edit and return the re-rendered node only.
    ///
    /// # Errors
    ///
    /// Any error of [`EditorContext::update_settings`].
    pub fn apply_changes(&mut self, id: ElementId, patch: &Settings) -> EditorResult<NodeRender> {
        self.update_settings(id, patch)?;
        self.render_node(id)
    }

    /// Render a single element subtree.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NotFound`] if the element does not exist.
    pub fn render_node(&self, id: ElementId) -> EditorResult<NodeRender> {
        let element = self
            .document
            .get(id)
            .ok_or_else(|| EditorError::NotFound(id.to_string()))?;
        Ok(NodeRender {
            element_id: id,
            markup: serializer::render_element(element, &self.registry),
        })
    }

    fn forget_missing(&mut self) {
        if let Some(id) = self.selection.get() {
            if !self.document.contains(id) {
                self.selection.clear();
            }
        }
        if let Some(id) = self.canvas.open_container() {
            if !self.document.contains(id) {
                self.canvas.set_open_container(None);
            }
        }
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    fn restore(&mut self, document: Document) {
        self.document = document;
        self.revision += 1;
        self.forget_missing();
    }

    /// Undo the last mutation. Returns `false` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Busy`] while an operation is pending.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.ensure_idle()?;
        let Some(document) = self.history.undo().cloned() else {
            return Ok(false);
        };
        tracing::debug!(index = self.history.current_index(), "undo");
        self.restore(document);
        Ok(true)
    }

    /// Redo the last undone mutation. Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Busy`] while an operation is pending.
    pub fn redo(&mut self) -> EditorResult<bool> {
        self.ensure_idle()?;
        let Some(document) = self.history.redo().cloned() else {
            return Ok(false);
        };
        tracing::debug!(index = self.history.current_index(), "redo");
        self.restore(document);
        Ok(true)
    }

    /// Jump to a history entry.
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`] or [`EditorError::HistoryOutOfRange`].
    pub fn go_to_history(&mut self, index: usize) -> EditorResult<()> {
        self.ensure_idle()?;
        let document = self.history.go_to(index)?.clone();
        self.restore(document);
        Ok(())
    }

    /// Name the current state.
    pub fn mark_checkpoint(&mut self, label: impl Into<String>) {
        self.history.mark_checkpoint(label);
    }

    /// Restore a checkpoint. The restore is itself recorded, so it can be undone.
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`] or [`EditorError::CheckpointNotFound`].
    pub fn restore_checkpoint(&mut self, label: &str) -> EditorResult<()> {
        self.ensure_idle()?;
        let document = self.history.checkpoint(label)?.clone();
        self.document = document;
        self.forget_missing();
        self.commit(format!("restore {label}"));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Serialize the document to page markup.
    #[must_use]
    pub fn serialize(&self) -> String {
        serializer::serialize(&self.document, &self.registry)
    }

    /// Replace the whole document (page load). History restarts from it and
    /// the selection is cleared.
    pub fn replace_document(&mut self, document: Document) {
        tracing::debug!(elements = document.element_count(), "document replaced");
        self.history.reset(document.clone());
        self.document = document;
        self.selection.clear();
        self.canvas = CanvasController::new();
        self.revision += 1;
    }

    /// Parse page markup and load it as the document.
    ///
    /// # Errors
    ///
    /// Returns a deserialization error; the current document is kept.
    pub fn load_markup(&mut self, markup: &str) -> EditorResult<()> {
        let document = serializer::deserialize(markup, &self.registry)?;
        self.replace_document(document);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Canvas
    // ------------------------------------------------------------------

    /// Start dragging a palette item. Returns whether a gesture started.
    pub fn begin_drag(&mut self, payload: &str) -> bool {
        self.canvas.begin_drag(payload, &self.registry)
    }

    /// Update the drag hover target.
    pub fn drag_over(&mut self, target: HoverTarget, index: Option<usize>) -> DropIndicator {
        self.canvas
            .drag_over(target, index, &self.document, &self.registry)
    }

    /// Cancel the current drag.
    pub fn cancel_drag(&mut self) -> bool {
        self.canvas.cancel()
    }

    /// Release the current drag. A valid drop creates and inserts the widget
    /// and selects it; an invalid one changes nothing.
    ///
    /// # Errors
    ///
    /// [`EditorError::Busy`], or an insert error if the target vanished.
    pub fn drop_here(&mut self) -> EditorResult<DropOutcome> {
        let decision = self.canvas.take_drop();
        self.carry_out(decision)
    }

    /// Add a widget to the open container (or the root) without dragging.
    ///
    /// # Errors
    ///
    /// Same as [`EditorContext::drop_here`].
    pub fn click_to_add(&mut self, payload: &str) -> EditorResult<DropOutcome> {
        if !self.registry.contains(payload) {
            return Ok(DropOutcome::Ignored);
        }
        let target = self.canvas.click_target(&self.document, &self.registry);
        self.carry_out(DropDecision::Place {
            widget: payload.to_string(),
            target,
        })
    }

    fn carry_out(&mut self, decision: DropDecision) -> EditorResult<DropOutcome> {
        match decision {
            DropDecision::Place {
                widget,
                target: DropTarget { parent, index },
            } => {
                let id = self.add_widget(&widget, parent, index.unwrap_or(usize::MAX))?;
                self.selection.set(Some(id));
                Ok(DropOutcome::Inserted(id))
            }
            DropDecision::Rejected => {
                tracing::warn!("drop rejected: target cannot hold children");
                Ok(DropOutcome::Rejected)
            }
            DropDecision::Ignored => Ok(DropOutcome::Ignored),
        }
    }

    /// Process a canvas event end to end.
    ///
    /// # Errors
    ///
    /// Any error of the operation the event triggers.
    pub fn handle_event(&mut self, event: &CanvasEvent) -> EditorResult<EventResponse> {
        let outcome = self.canvas.handle(event, &self.document, &self.registry);
        Ok(match outcome {
            EventOutcome::Ignored => EventResponse::Ignored,
            EventOutcome::Hover(indicator) => EventResponse::Indicator(indicator),
            EventOutcome::Cancelled => EventResponse::Cancelled,
            EventOutcome::Drop(decision) => EventResponse::Dropped(self.carry_out(decision)?),
            EventOutcome::Undo => EventResponse::History(self.undo()?),
            EventOutcome::Redo => EventResponse::History(self.redo()?),
            EventOutcome::DeleteSelection => match self.selection.get() {
                Some(id) => {
                    self.remove_node(id)?;
                    EventResponse::Deleted(id)
                }
                None => EventResponse::Ignored,
            },
            EventOutcome::Select(id) => EventResponse::Selected(self.select_node(id)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> EditorContext {
        EditorContext::new(Arc::new(WidgetRegistry::with_builtins()))
    }

    #[test]
    fn test_create_node_merges_defaults() {
        let editor = editor();
        let node = editor
            .create_node("heading", Some(&Settings::from([("text", "Hi")])))
            .expect("create");
        assert_eq!(node.settings.text("text"), "Hi");
        assert_eq!(node.settings.number("level"), Some(2.0));
        assert!(matches!(
            editor.create_node("carousel", None),
            Err(EditorError::UnknownWidget(_))
        ));
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_each_mutation_records_one_entry() {
        let mut editor = editor();
        let id = editor.add_widget("text", None, 0).expect("add");
        assert_eq!(editor.history().len(), 2);
        editor
            .update_settings(id, &Settings::from([("text", "x")]))
            .expect("update");
        assert_eq!(editor.history().len(), 3);
        assert!(editor.move_node(id, Some(id), 0).is_err());
        assert_eq!(editor.history().len(), 3);
        assert_eq!(editor.revision(), 2);
    }

    #[test]
    fn test_insert_node_rejects_invalid_subtree() {
        let mut editor = editor();
        let heading = editor.create_node("heading", None).expect("heading");
        let text = editor
            .create_node("text", None)
            .expect("text")
            .with_children(vec![heading]);
        assert!(matches!(
            editor.insert_node(None, text, 0),
            Err(EditorError::InvalidParent(_))
        ));
        assert!(matches!(
            editor.insert_node(None, Element::new("carousel", Settings::new()), 0),
            Err(EditorError::UnknownWidget(_))
        ));
        assert!(editor.document().is_empty());
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.revision(), 0);
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut editor = editor();
        let outer = editor.add_widget("container", None, 0).expect("outer");
        let inner = editor.add_widget("text", Some(outer), 0).expect("inner");
        editor.select_node(Some(inner)).expect("select");

        editor.remove_node(outer).expect("remove");
        assert_eq!(editor.selected(), None);
        assert!(editor.document().is_empty());
    }

    #[test]
    fn test_undo_clears_stale_selection() {
        let mut editor = editor();
        let id = editor.add_widget("text", None, 0).expect("add");
        editor.select_node(Some(id)).expect("select");
        assert!(editor.undo().expect("undo"));
        assert_eq!(editor.selected(), None);
        assert!(!editor.undo().expect("nothing to undo"));
        assert!(editor.redo().expect("redo"));
        assert!(editor.find(id).is_some());
    }

    #[test]
    fn test_select_missing_keeps_selection() {
        let mut editor = editor();
        let id = editor.add_widget("button", None, 0).expect("add");
        let panel = editor.select_node(Some(id)).expect("select").expect("panel");
        assert_eq!(panel.widget, "button");

        assert!(matches!(
            editor.select_node(Some(ElementId::new())),
            Err(EditorError::NotFound(_))
        ));
        assert_eq!(editor.selected(), Some(id));
        assert_eq!(editor.select_node(None), Ok(None));
        assert_eq!(editor.panel(), None);
    }

    #[test]
    fn test_apply_changes_renders_node_only() {
        let mut editor = editor();
        editor.add_widget("text", None, 0).expect("first");
        let id = editor.add_widget("heading", None, 1).expect("heading");
        let render = editor
            .apply_changes(id, &Settings::from([("text", "Bye")]))
            .expect("apply");
        assert_eq!(render.element_id, id);
        assert_eq!(render.markup, r#"<h2 data-widget="heading">Bye</h2>"#);
    }

    #[test]
    fn test_duplicate_inserts_after_original() {
        let mut editor = editor();
        let outer = editor.add_widget("container", None, 0).expect("outer");
        let a = editor.add_widget("text", Some(outer), 0).expect("a");
        editor.add_widget("image", Some(outer), 1).expect("b");

        let copy = editor.duplicate_node(a).expect("duplicate");
        let children: Vec<_> = editor
            .find(outer)
            .expect("outer")
            .children
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], a);
        assert_eq!(children[1], copy);

        let outer_copy = editor.duplicate_node(outer).expect("deep copy");
        assert_eq!(editor.document().elements()[1].id, outer_copy);
        assert_eq!(editor.document().element_count(), 8);
    }

    #[test]
    fn test_busy_guard_blocks_mutations() {
        let mut editor = editor();
        let id = editor.add_widget("text", None, 0).expect("add");
        editor.begin_pending("load").expect("pending");
        let before = editor.serialize();

        assert_eq!(
            editor.add_widget("text", None, 0),
            Err(EditorError::Busy("load".into()))
        );
        assert!(matches!(editor.remove_node(id), Err(EditorError::Busy(_))));
        assert!(matches!(editor.undo(), Err(EditorError::Busy(_))));
        assert!(matches!(
            editor.begin_pending("save"),
            Err(EditorError::Busy(_))
        ));
        assert_eq!(editor.serialize(), before);

        editor.finish_pending();
        assert!(editor.pending().is_none());
        editor.remove_node(id).expect("remove after load");
    }

    #[test]
    fn test_checkpoint_restore_is_undoable() {
        let mut editor = editor();
        editor.add_widget("text", None, 0).expect("add");
        editor.mark_checkpoint("draft");
        let saved = editor.serialize();
        editor.add_widget("image", None, 1).expect("image");

        editor.restore_checkpoint("draft").expect("restore");
        assert_eq!(editor.serialize(), saved);
        assert!(editor.undo().expect("undo"));
        assert_eq!(editor.document().element_count(), 2);
        assert!(matches!(
            editor.restore_checkpoint("nope"),
            Err(EditorError::CheckpointNotFound(_))
        ));
    }

    #[test]
    fn test_drop_flow() {
        let mut editor = editor();
        let container = editor.add_widget("container", None, 0).expect("container");

        assert!(editor.begin_drag("heading"));
        assert_eq!(
            editor.drag_over(HoverTarget::Element(container), None),
            DropIndicator::Valid(Some(container))
        );
        let DropOutcome::Inserted(id) = editor.drop_here().expect("drop") else {
            panic!("expected insert");
        };
        assert_eq!(editor.document().parent_of(id), Ok(Some(container)));
        assert_eq!(editor.selected(), Some(id));
    }

    #[test]
    fn test_click_to_add_targets_open_container() {
        let mut editor = editor();
        let container = editor.add_widget("container", None, 0).expect("container");
        editor
            .handle_event(&CanvasEvent::Click {
                target: HoverTarget::Element(container),
            })
            .expect("click");

        let DropOutcome::Inserted(id) = editor.click_to_add("text").expect("add") else {
            panic!("expected insert");
        };
        assert_eq!(editor.document().parent_of(id), Ok(Some(container)));
        assert_eq!(editor.click_to_add("carousel"), Ok(DropOutcome::Ignored));
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let mut editor = editor();
        let id = editor.add_widget("text", None, 0).expect("add");
        editor.select_node(Some(id)).expect("select");
        let delete = CanvasEvent::Key {
            key: "Delete".into(),
            modifiers: crate::canvas::KeyModifiers::default(),
        };
        assert_eq!(
            editor.handle_event(&delete).expect("delete"),
            EventResponse::Deleted(id)
        );
        assert_eq!(
            editor.handle_event(&delete).expect("nothing selected"),
            EventResponse::Ignored
        );
    }

    #[test]
    fn test_load_markup_resets_history() {
        let mut editor = editor();
        editor.add_widget("text", None, 0).expect("add");
        editor
            .load_markup(r#"<h2 data-widget="heading">Hi</h2>"#)
            .expect("load");
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.history().can_undo());
        assert_eq!(editor.document().elements()[0].settings.text("text"), "Hi");

        let before = editor.serialize();
        assert!(editor.load_markup("<div class=\"oops").is_err());
        assert_eq!(editor.serialize(), before);
    }
}
