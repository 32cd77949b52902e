//! Page elements - the nodes of the document tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single widget setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Boolean toggle.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Free text, URL, color, or enumerated choice.
    Text(String),
}

impl SettingValue {
    /// Borrow as text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Read as a number. Numeric text (as submitted by form inputs) is accepted.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    /// Read as a boolean. `"true"`/`"false"` text is accepted.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Self::Number(_) => None,
        }
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Settings of one element, keyed by setting name.
///
/// Ordered so that iteration (and anything rendered from it) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, SettingValue>);

impl Settings {
    /// Create an empty settings map.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Get a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.0.get(key)
    }

    /// Set a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Option<SettingValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`Settings::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Text value of `key`, or `""` when absent or not text.
    #[must_use]
    pub fn text(&self, key: &str) -> &str {
        self.get(key).and_then(SettingValue::as_text).unwrap_or("")
    }

    /// Numeric value of `key`.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(SettingValue::as_number)
    }

    /// Boolean value of `key`.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(SettingValue::as_bool)
    }

    /// Shallow-merge `patch` over these settings. Keys not in `patch` are kept.
    pub fn merge(&mut self, patch: &Settings) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Return `self` laid over `base`: every key of `base`, overridden by `self`.
    #[must_use]
    pub fn over(&self, base: &Settings) -> Settings {
        let mut merged = base.clone();
        merged.merge(self);
        merged
    }

    /// Iterate over settings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<SettingValue>, const N: usize> From<[(K, V); N]> for Settings {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<SettingValue>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A page element: a widget instance with settings and (for containers) children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Widget type name.
    pub kind: String,
    /// Widget settings.
    #[serde(default)]
    pub settings: Settings,
    /// Ordered children. Always empty for leaf widgets.
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new element with a fresh ID.
    #[must_use]
    pub fn new(kind: impl Into<String>, settings: Settings) -> Self {
        Self {
            id: ElementId::new(),
            kind: kind.into(),
            settings,
            children: Vec::new(),
        }
    }

    /// Set the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    /// Find an element in this subtree (including `self`).
    #[must_use]
    pub fn find(&self, id: ElementId) -> Option<&Element> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Find an element in this subtree mutably.
    pub fn find_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Check if `id` is this element or one of its descendants.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.find(id).is_some()
    }

    /// All IDs in this subtree, depth-first pre-order.
    #[must_use]
    pub fn ids(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<ElementId>) {
        out.push(self.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    /// Number of elements in this subtree (including `self`).
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Element::count).sum::<usize>()
    }

    /// Deep copy with fresh IDs throughout.
    #[must_use]
    pub fn with_fresh_ids(&self) -> Self {
        Self {
            id: ElementId::new(),
            kind: self.kind.clone(),
            settings: self.settings.clone(),
            children: self.children.iter().map(Element::with_fresh_ids).collect(),
        }
    }
}
