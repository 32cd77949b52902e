//! Selection and the properties panel.

use serde::Serialize;

use crate::widget::{Control, WidgetDefinition};
use crate::{Element, ElementId, SettingValue};

/// The single active element, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<ElementId>,
}

impl Selection {
    /// Currently selected element.
    #[must_use]
    pub fn get(&self) -> Option<ElementId> {
        self.selected
    }

    /// Replace the selection.
    pub fn set(&mut self, id: Option<ElementId>) {
        self.selected = id;
    }

    /// Clear the selection.
    pub fn clear(&mut self) {
        self.selected = None;
    }
}

/// One control in the properties panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormControl {
    /// Setting key the control edits.
    pub key: String,
    /// Label shown next to the control.
    pub label: String,
    /// Kind of control.
    pub control: Control,
    /// Current value, with defaults applied.
    pub value: Option<SettingValue>,
}

/// Properties panel contents for the selected element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    /// Element being edited.
    pub element_id: ElementId,
    /// Widget type name.
    pub widget: String,
    /// Widget label, used as the panel title.
    pub title: String,
    /// Controls in schema order.
    pub controls: Vec<FormControl>,
}

impl PanelView {
    /// Build the panel for `element` from its widget's schema.
    #[must_use]
    pub fn build(element: &Element, definition: &WidgetDefinition) -> Self {
        let resolved = definition.resolve(&element.settings);
        let controls = definition
            .schema
            .iter()
            .map(|field| FormControl {
                key: field.key.clone(),
                label: field.label.clone(),
                control: field.control.clone(),
                value: resolved.get(&field.key).cloned(),
            })
            .collect();
        Self {
            element_id: element.id,
            widget: definition.name.clone(),
            title: definition.label.clone(),
            controls,
        }
    }

    /// Control for a setting key.
    #[must_use]
    pub fn control(&self, key: &str) -> Option<&FormControl> {
        self.controls.iter().find(|c| c.key == key)
    }
}

/// Markup of a single re-rendered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRender {
    /// Node that changed.
    pub element_id: ElementId,
    /// Its rendered subtree.
    pub markup: String,
}
