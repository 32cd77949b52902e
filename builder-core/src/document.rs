//! Document model - the page body as a tree of elements.
//!
//! All mutating operations validate first and only then touch the tree, so a
//! failed call always leaves the document exactly as it was.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{EditorError, EditorResult, Element, ElementId, Settings, WidgetRegistry};

/// A page document: ordered top-level elements owning their subtrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from top-level elements.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::DuplicateId`] if any ID appears twice.
    pub fn from_elements(elements: Vec<Element>) -> EditorResult<Self> {
        let mut seen = HashSet::new();
        for element in &elements {
            for id in element.ids() {
                if !seen.insert(id) {
                    return Err(EditorError::DuplicateId(id.to_string()));
                }
            }
        }
        Ok(Self { elements })
    }

    /// Top-level elements.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Get an element anywhere in the tree.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find_map(|e| e.find(id))
    }

    /// Get a mutable reference to an element anywhere in the tree.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find_map(|e| e.find_mut(id))
    }

    /// Check if the element exists.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    /// Parent of an element; `Ok(None)` for top-level elements.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NotFound`] if the element does not exist.
    pub fn parent_of(&self, id: ElementId) -> EditorResult<Option<ElementId>> {
        let path = self
            .path_to(id)
            .ok_or_else(|| EditorError::NotFound(id.to_string()))?;
        Ok(path.iter().rev().nth(1).copied())
    }

    /// IDs from the top-level ancestor down to `id` (inclusive).
    #[must_use]
    pub fn path_to(&self, id: ElementId) -> Option<Vec<ElementId>> {
        fn walk(elements: &[Element], id: ElementId, path: &mut Vec<ElementId>) -> bool {
            for element in elements {
                path.push(element.id);
                if element.id == id || walk(&element.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(&self.elements, id, &mut path).then_some(path)
    }

    /// All elements, depth-first pre-order.
    pub fn iter(&self) -> Elements<'_> {
        Elements {
            stack: self.elements.iter().rev().collect(),
        }
    }

    /// Total number of elements in the tree.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.iter().map(Element::count).sum()
    }

    /// Check if the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn children_mut(&mut self, parent: Option<ElementId>) -> Option<&mut Vec<Element>> {
        match parent {
            None => Some(&mut self.elements),
            Some(id) => self.get_mut(id).map(|e| &mut e.children),
        }
    }

    fn check_parent(&self, parent: Option<ElementId>, registry: &WidgetRegistry) -> EditorResult<()> {
        let Some(parent_id) = parent else {
            return Ok(());
        };
        let parent = self
            .get(parent_id)
            .ok_or_else(|| EditorError::InvalidParent(format!("{parent_id} does not exist")))?;
        if registry.is_container(&parent.kind) {
            Ok(())
        } else {
            Err(EditorError::InvalidParent(format!(
                "{parent_id} is a {} and cannot hold children",
                parent.kind
            )))
        }
    }

    /// Insert an element (with its subtree) under `parent`, or at the top level
    /// when `parent` is `None`. `index` is clamped to the number of siblings.
    /// Returns the index actually used.
    ///
    /// # Errors
    ///
    /// - [`EditorError::InvalidParent`] if the parent is missing or not a
    ///   container, or a leaf in the subtree holds children.
    /// - [`EditorError::UnknownWidget`] if the subtree has an unregistered type.
    /// - [`EditorError::DuplicateId`] if an ID in the subtree already exists.
    pub fn insert(
        &mut self,
        parent: Option<ElementId>,
        element: Element,
        index: usize,
        registry: &WidgetRegistry,
    ) -> EditorResult<usize> {
        self.check_parent(parent, registry)?;
        check_subtree(&element, registry)?;
        let mut seen = HashSet::new();
        if let Some(dup) = element
            .ids()
            .into_iter()
            .find(|id| self.contains(*id) || !seen.insert(*id))
        {
            return Err(EditorError::DuplicateId(dup.to_string()));
        }

        let siblings = self
            .children_mut(parent)
            .ok_or_else(|| EditorError::InvalidParent(format!("{parent:?} does not exist")))?;
        let index = index.min(siblings.len());
        siblings.insert(index, element);
        Ok(index)
    }

    /// Remove an element and its whole subtree.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NotFound`] if the element does not exist.
    pub fn remove(&mut self, id: ElementId) -> EditorResult<Element> {
        fn take(elements: &mut Vec<Element>, id: ElementId) -> Option<Element> {
            if let Some(pos) = elements.iter().position(|e| e.id == id) {
                return Some(elements.remove(pos));
            }
            elements.iter_mut().find_map(|e| take(&mut e.children, id))
        }

        take(&mut self.elements, id).ok_or_else(|| EditorError::NotFound(id.to_string()))
    }

    /// Move an element to `new_parent` at `index` (clamped, counted after the
    /// element has left its old position). Atomic: if the destination is
    /// invalid nothing changes.
    ///
    /// # Errors
    ///
    /// - [`EditorError::NotFound`] if the element does not exist.
    /// - [`EditorError::InvalidParent`] if the destination is missing or not a container.
    /// - [`EditorError::CycleDetected`] if the destination is inside the moved subtree.
    pub fn move_element(
        &mut self,
        id: ElementId,
        new_parent: Option<ElementId>,
        index: usize,
        registry: &WidgetRegistry,
    ) -> EditorResult<usize> {
        let moving = self
            .get(id)
            .ok_or_else(|| EditorError::NotFound(id.to_string()))?;
        if let Some(parent_id) = new_parent {
            if moving.contains(parent_id) {
                return Err(EditorError::CycleDetected(id.to_string()));
            }
        }
        self.check_parent(new_parent, registry)?;

        let element = self.remove(id)?;
        let siblings = self
            .children_mut(new_parent)
            .ok_or_else(|| EditorError::InvalidParent(format!("{new_parent:?} does not exist")))?;
        let index = index.min(siblings.len());
        siblings.insert(index, element);
        Ok(index)
    }

    /// Shallow-merge `patch` into an element's settings. Keys absent from the
    /// patch, including ones no widget schema knows about, are kept.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NotFound`] if the element does not exist.
    pub fn update_settings(&mut self, id: ElementId, patch: &Settings) -> EditorResult<()> {
        let element = self
            .get_mut(id)
            .ok_or_else(|| EditorError::NotFound(id.to_string()))?;
        element.settings.merge(patch);
        Ok(())
    }

    /// Serialize the element tree to JSON (debug/export view, not the
    /// persisted page format).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> EditorResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EditorError::Serialization(e.to_string()))
    }

    /// Deserialize an element tree from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or contains duplicate IDs.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let doc: Self =
            serde_json::from_str(json).map_err(|e| EditorError::Serialization(e.to_string()))?;
        Self::from_elements(doc.elements)
    }
}

/// Depth-first pre-order iterator over a document.
pub struct Elements<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// Every type in the subtree is registered and only containers hold children.
fn check_subtree(element: &Element, registry: &WidgetRegistry) -> EditorResult<()> {
    if !registry.contains(&element.kind) {
        return Err(EditorError::UnknownWidget(element.kind.clone()));
    }
    if !element.children.is_empty() && !registry.is_container(&element.kind) {
        return Err(EditorError::InvalidParent(format!(
            "{} is a {} and cannot hold children",
            element.id, element.kind
        )));
    }
    element
        .children
        .iter()
        .try_for_each(|child| check_subtree(child, registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> WidgetRegistry {
        WidgetRegistry::with_builtins()
    }

    fn text(content: &str) -> Element {
        Element::new("text", Settings::from([("text", content)]))
    }

    fn container() -> Element {
        Element::new("container", Settings::new())
    }

    #[test]
    fn test_insert_and_get() {
        let registry = registry();
        let mut doc = Document::new();
        assert!(doc.is_empty());

        let el = text("Hello");
        let id = el.id;
        assert_eq!(doc.insert(None, el, 0, &registry), Ok(0));
        assert_eq!(doc.element_count(), 1);
        assert_eq!(doc.get(id).map(|e| e.settings.text("text")), Some("Hello"));
        assert_eq!(doc.parent_of(id), Ok(None));
    }

    #[test]
    fn test_insert_index_clamped() {
        let registry = registry();
        let mut doc = Document::new();
        doc.insert(None, text("a"), 0, &registry).expect("insert");
        let idx = doc.insert(None, text("b"), 99, &registry).expect("insert");
        assert_eq!(idx, 1);
        assert_eq!(doc.elements()[1].settings.text("text"), "b");
    }

    #[test]
    fn test_insert_under_leaf_rejected() {
        let registry = registry();
        let mut doc = Document::new();
        let leaf = text("leaf");
        let leaf_id = leaf.id;
        doc.insert(None, leaf, 0, &registry).expect("insert");
        let before = doc.clone();

        let err = doc.insert(Some(leaf_id), text("child"), 0, &registry);
        assert!(matches!(err, Err(EditorError::InvalidParent(_))));
        assert_eq!(doc, before);

        let missing = doc.insert(Some(ElementId::new()), text("x"), 0, &registry);
        assert!(matches!(missing, Err(EditorError::InvalidParent(_))));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_insert_validates_subtree() {
        let registry = registry();
        let mut doc = Document::new();

        let leaf_with_children = text("p").with_children(vec![Element::new(
            "heading",
            Settings::from([("text", "lost")]),
        )]);
        assert!(matches!(
            doc.insert(None, leaf_with_children, 0, &registry),
            Err(EditorError::InvalidParent(_))
        ));

        let unknown = container().with_children(vec![Element::new("carousel", Settings::new())]);
        assert_eq!(
            doc.insert(None, unknown, 0, &registry),
            Err(EditorError::UnknownWidget("carousel".into()))
        );
        assert!(doc.is_empty());

        let nested = container().with_children(vec![container().with_children(vec![text("ok")])]);
        doc.insert(None, nested, 0, &registry).expect("valid subtree");
        assert_eq!(doc.element_count(), 3);
    }

    #[test]
    fn test_insert_duplicate_id_rejected() {
        let registry = registry();
        let mut doc = Document::new();
        let el = text("a");
        doc.insert(None, el.clone(), 0, &registry).expect("insert");
        assert!(matches!(
            doc.insert(None, el, 0, &registry),
            Err(EditorError::DuplicateId(_))
        ));
        assert_eq!(doc.element_count(), 1);
    }

    #[test]
    fn test_remove_subtree() {
        let registry = registry();
        let mut doc = Document::new();
        let outer = container();
        let outer_id = outer.id;
        let child = text("inner");
        let child_id = child.id;
        doc.insert(None, outer, 0, &registry).expect("outer");
        doc.insert(Some(outer_id), child, 0, &registry).expect("child");
        assert_eq!(doc.parent_of(child_id), Ok(Some(outer_id)));

        let removed = doc.remove(outer_id).expect("remove");
        assert_eq!(removed.count(), 2);
        assert!(doc.is_empty());
        assert!(!doc.contains(child_id));
        assert_eq!(
            doc.remove(outer_id),
            Err(EditorError::NotFound(outer_id.to_string()))
        );
    }

    #[test]
    fn test_move_between_containers() {
        let registry = registry();
        let mut doc = Document::new();
        let a = container();
        let b = container();
        let (a_id, b_id) = (a.id, b.id);
        let item = text("item");
        let item_id = item.id;
        doc.insert(None, a, 0, &registry).expect("a");
        doc.insert(None, b, 1, &registry).expect("b");
        doc.insert(Some(a_id), item, 0, &registry).expect("item");

        doc.move_element(item_id, Some(b_id), 5, &registry).expect("move");
        assert_eq!(doc.parent_of(item_id), Ok(Some(b_id)));
        assert!(doc.get(a_id).is_some_and(|a| a.children.is_empty()));

        doc.move_element(item_id, None, 0, &registry).expect("to root");
        assert_eq!(doc.elements()[0].id, item_id);
    }

    #[test]
    fn test_move_is_atomic_on_invalid_destination() {
        let registry = registry();
        let mut doc = Document::new();
        let outer = container();
        let outer_id = outer.id;
        let inner = container();
        let inner_id = inner.id;
        let leaf = text("leaf");
        let leaf_id = leaf.id;
        doc.insert(None, outer, 0, &registry).expect("outer");
        doc.insert(Some(outer_id), inner, 0, &registry).expect("inner");
        doc.insert(None, leaf, 1, &registry).expect("leaf");
        let before = doc.clone();

        assert!(matches!(
            doc.move_element(outer_id, Some(inner_id), 0, &registry),
            Err(EditorError::CycleDetected(_))
        ));
        assert!(matches!(
            doc.move_element(outer_id, Some(outer_id), 0, &registry),
            Err(EditorError::CycleDetected(_))
        ));
        assert!(matches!(
            doc.move_element(inner_id, Some(leaf_id), 0, &registry),
            Err(EditorError::InvalidParent(_))
        ));
        assert!(matches!(
            doc.move_element(ElementId::new(), None, 0, &registry),
            Err(EditorError::NotFound(_))
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_update_settings_merges() {
        let registry = registry();
        let mut doc = Document::new();
        let el = Element::new("heading", Settings::from([("text", "Hi"), ("x-note", "keep")]));
        let id = el.id;
        doc.insert(None, el, 0, &registry).expect("insert");

        doc.update_settings(id, &Settings::from([("text", "Bye")]))
            .expect("update");
        let settings = &doc.get(id).expect("el").settings;
        assert_eq!(settings.text("text"), "Bye");
        assert_eq!(settings.text("x-note"), "keep");
        assert!(matches!(
            doc.update_settings(ElementId::new(), &Settings::new()),
            Err(EditorError::NotFound(_))
        ));
    }

    #[test]
    fn test_iter_pre_order_and_path() {
        let registry = registry();
        let mut doc = Document::new();
        let outer = container();
        let outer_id = outer.id;
        let first = text("1");
        let first_id = first.id;
        let last = text("2");
        let last_id = last.id;
        doc.insert(None, outer, 0, &registry).expect("outer");
        doc.insert(Some(outer_id), first, 0, &registry).expect("first");
        doc.insert(None, last, 1, &registry).expect("last");

        let order: Vec<_> = doc.iter().map(|e| e.id).collect();
        assert_eq!(order, vec![outer_id, first_id, last_id]);
        assert_eq!(doc.path_to(first_id), Some(vec![outer_id, first_id]));
        assert_eq!(doc.path_to(ElementId::new()), None);
    }

    #[test]
    fn test_json_roundtrip() {
        let registry = registry();
        let mut doc = Document::new();
        doc.insert(None, text("Hello"), 0, &registry).expect("insert");
        let json = doc.to_json().expect("to json");
        let restored = Document::from_json(&json).expect("from json");
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_from_elements_rejects_duplicates() {
        let el = text("a");
        assert!(matches!(
            Document::from_elements(vec![el.clone(), el]),
            Err(EditorError::DuplicateId(_))
        ));
    }
}
