//! Canvas drop-zone controller.
//!
//! Translates drag gestures, clicks and shortcuts into editor intents. The
//! controller never mutates the document itself; it decides *what* should
//! happen and [`crate::EditorContext`] carries it out.
//!
//! ```text
//! Idle -> Dragging -> HoveringValid | HoveringInvalid -> (drop | cancel) -> Idle
//! ```

use serde::{Deserialize, Serialize};

use crate::{Document, ElementId, WidgetRegistry};

/// What the pointer is over during a drag or click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum HoverTarget {
    /// An element on the canvas.
    Element(ElementId),
    /// The canvas root (empty area of the page body).
    Root,
    /// Anywhere that is not a drop surface.
    Outside,
}

/// Where a dropped widget goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    /// Container to insert into; `None` is the root.
    pub parent: Option<ElementId>,
    /// Position among the parent's children; `None` appends.
    pub index: Option<usize>,
}

/// Drag gesture state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging a widget, not yet over anything.
    Dragging {
        /// Widget type being dragged.
        widget: String,
    },
    /// Over a container or the root.
    HoveringValid {
        /// Widget type being dragged.
        widget: String,
        /// Where it would land.
        target: DropTarget,
    },
    /// Over a leaf widget or outside the canvas.
    HoveringInvalid {
        /// Widget type being dragged.
        widget: String,
    },
}

impl DragState {
    /// Check if a gesture is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Visual drop feedback for the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "parent", rename_all = "lowercase")]
pub enum DropIndicator {
    /// Nothing to show.
    None,
    /// Highlight a valid target (`None` is the root).
    Valid(Option<ElementId>),
    /// Show the "not allowed" cursor.
    Invalid,
}

/// Controller decision when a gesture ends in a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropDecision {
    /// Create `widget` and insert it at `target`.
    Place {
        /// Widget type to create.
        widget: String,
        /// Destination.
        target: DropTarget,
    },
    /// Dropped over an invalid target.
    Rejected,
    /// No gesture, or a payload that is not a registered widget.
    Ignored,
}

/// Result of a drop as carried out by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// A new element was inserted.
    Inserted(ElementId),
    /// The target was invalid; nothing changed.
    Rejected,
    /// The drop was ignored; nothing changed.
    Ignored,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}

impl KeyModifiers {
    /// Platform shortcut modifier (Ctrl or Cmd).
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Raw canvas input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CanvasEvent {
    /// A palette item started dragging. `payload` is the widget type name.
    DragStart {
        /// Opaque drag payload.
        payload: String,
    },
    /// The pointer moved over a target.
    DragOver {
        /// Target under the pointer.
        target: HoverTarget,
        /// Insertion position within the target; `None` appends.
        index: Option<usize>,
    },
    /// The drag left the browser window.
    DragLeaveWindow,
    /// The pointer was released.
    Drop,
    /// Keyboard event.
    Key {
        /// Key name, e.g. `Escape`, `z`, `Delete`.
        key: String,
        /// Active modifier keys.
        modifiers: KeyModifiers,
    },
    /// Click on the canvas.
    Click {
        /// Clicked target.
        target: HoverTarget,
    },
}

/// What the controller decided for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Nothing to do.
    Ignored,
    /// Drop feedback changed.
    Hover(DropIndicator),
    /// The gesture was cancelled.
    Cancelled,
    /// The gesture ended.
    Drop(DropDecision),
    /// Undo shortcut.
    Undo,
    /// Redo shortcut.
    Redo,
    /// Delete the current selection.
    DeleteSelection,
    /// Change the selection.
    Select(Option<ElementId>),
}

/// Drag/drop and click state for the canvas.
#[derive(Debug, Clone, Default)]
pub struct CanvasController {
    state: DragState,
    open_container: Option<ElementId>,
}

impl CanvasController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current gesture state.
    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Container that click-to-add targets, if one is open.
    #[must_use]
    pub fn open_container(&self) -> Option<ElementId> {
        self.open_container
    }

    /// Open (or close, with `None`) a container for click-to-add.
    pub fn set_open_container(&mut self, id: Option<ElementId>) {
        self.open_container = id;
    }

    /// Start dragging `payload`. Unregistered payloads are ignored and the
    /// controller stays idle. Returns whether a gesture started.
    pub fn begin_drag(&mut self, payload: &str, registry: &WidgetRegistry) -> bool {
        if !registry.contains(payload) {
            tracing::debug!(payload, "ignoring drag of unknown widget");
            self.state = DragState::Idle;
            return false;
        }
        self.state = DragState::Dragging {
            widget: payload.to_string(),
        };
        true
    }

    /// Update the hover target during a drag.
    pub fn drag_over(
        &mut self,
        target: HoverTarget,
        index: Option<usize>,
        document: &Document,
        registry: &WidgetRegistry,
    ) -> DropIndicator {
        let widget = match &self.state {
            DragState::Idle => return DropIndicator::None,
            DragState::Dragging { widget }
            | DragState::HoveringValid { widget, .. }
            | DragState::HoveringInvalid { widget } => widget.clone(),
        };

        let parent = match target {
            HoverTarget::Root => Some(None),
            HoverTarget::Element(id) => document
                .get(id)
                .filter(|e| registry.is_container(&e.kind))
                .map(|_| Some(id)),
            HoverTarget::Outside => None,
        };

        self.state = match parent {
            Some(parent) => DragState::HoveringValid {
                widget,
                target: DropTarget { parent, index },
            },
            None => DragState::HoveringInvalid { widget },
        };
        self.drop_indicator()
    }

    /// Abort the gesture.
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.state.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }

    /// End the gesture and report what should happen. Always returns to idle.
    pub fn take_drop(&mut self) -> DropDecision {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DropDecision::Ignored,
            DragState::HoveringValid { widget, target } => DropDecision::Place { widget, target },
            DragState::Dragging { .. } | DragState::HoveringInvalid { .. } => {
                DropDecision::Rejected
            }
        }
    }

    /// Target of click-to-add: the open container if it still exists and
    /// accepts children, otherwise the root.
    #[must_use]
    pub fn click_target(&self, document: &Document, registry: &WidgetRegistry) -> DropTarget {
        let parent = self
            .open_container
            .filter(|id| document.get(*id).is_some_and(|e| registry.is_container(&e.kind)));
        DropTarget {
            parent,
            index: None,
        }
    }

    /// Current visual feedback.
    #[must_use]
    pub fn drop_indicator(&self) -> DropIndicator {
        match &self.state {
            DragState::Idle | DragState::Dragging { .. } => DropIndicator::None,
            DragState::HoveringValid { target, .. } => DropIndicator::Valid(target.parent),
            DragState::HoveringInvalid { .. } => DropIndicator::Invalid,
        }
    }

    /// Process one canvas event.
    pub fn handle(
        &mut self,
        event: &CanvasEvent,
        document: &Document,
        registry: &WidgetRegistry,
    ) -> EventOutcome {
        match event {
            CanvasEvent::DragStart { payload } => {
                if self.begin_drag(payload, registry) {
                    EventOutcome::Hover(DropIndicator::None)
                } else {
                    EventOutcome::Ignored
                }
            }
            CanvasEvent::DragOver { target, index } => {
                if self.state.is_dragging() {
                    EventOutcome::Hover(self.drag_over(*target, *index, document, registry))
                } else {
                    EventOutcome::Ignored
                }
            }
            CanvasEvent::DragLeaveWindow => self.cancel_outcome(),
            CanvasEvent::Drop => EventOutcome::Drop(self.take_drop()),
            CanvasEvent::Key { key, modifiers } => self.handle_key(key, *modifiers),
            CanvasEvent::Click { target } => match target {
                HoverTarget::Element(id) => {
                    let Some(element) = document.get(*id) else {
                        return EventOutcome::Ignored;
                    };
                    if registry.is_container(&element.kind) {
                        self.open_container = Some(*id);
                    }
                    EventOutcome::Select(Some(*id))
                }
                HoverTarget::Root => {
                    self.open_container = None;
                    EventOutcome::Select(None)
                }
                HoverTarget::Outside => EventOutcome::Ignored,
            },
        }
    }

    fn cancel_outcome(&mut self) -> EventOutcome {
        if self.cancel() {
            EventOutcome::Cancelled
        } else {
            EventOutcome::Ignored
        }
    }

    fn handle_key(&mut self, key: &str, modifiers: KeyModifiers) -> EventOutcome {
        match key {
            "Escape" => self.cancel_outcome(),
            "z" | "Z" if modifiers.command() => {
                if modifiers.shift {
                    EventOutcome::Redo
                } else {
                    EventOutcome::Undo
                }
            }
            "y" | "Y" if modifiers.command() => EventOutcome::Redo,
            "Delete" | "Backspace" if !self.state.is_dragging() => EventOutcome::DeleteSelection,
            _ => EventOutcome::Ignored,
        }
    }
}
