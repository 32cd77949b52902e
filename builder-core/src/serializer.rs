//! Document ⇄ HTML.
//!
//! Serialization is a pure, deterministic depth-first walk: each element is
//! rendered by its widget with the children's markup substituted in.
//! Deserialization is best-effort. Markup written by [`serialize`] maps back
//! exactly; hand-authored markup is classified by tag, and whatever cannot be
//! represented by a widget is kept verbatim in a `content` element.

use crate::html::{self, escape_text, HtmlElement, HtmlNode};
use crate::widget::{CONTENT_WIDGET, WIDGET_ATTR};
use crate::{Document, EditorError, EditorResult, Element, Settings, WidgetRegistry};

/// Render a whole document.
#[must_use]
pub fn serialize(document: &Document, registry: &WidgetRegistry) -> String {
    document
        .elements()
        .iter()
        .map(|element| render_element(element, registry))
        .collect()
}

/// Render one element and its subtree.
///
/// Elements of an unregistered type render only their children.
#[must_use]
pub fn render_element(element: &Element, registry: &WidgetRegistry) -> String {
    let children: String = element
        .children
        .iter()
        .map(|child| render_element(child, registry))
        .collect();
    match registry.get(&element.kind) {
        Ok(definition) => definition.render(&element.settings, &children),
        Err(_) => {
            tracing::warn!(kind = %element.kind, id = %element.id, "rendering unknown widget as its children");
            children
        }
    }
}

/// Read persisted markup back into a document.
///
/// # Errors
///
/// - [`EditorError::Serialization`] if the markup has an unterminated tag or
///   comment, or nests deeper than [`html::MAX_DEPTH`].
/// - [`EditorError::UnknownWidget`] if markup needs the `content` fallback
///   and the registry does not provide it.
pub fn deserialize(markup: &str, registry: &WidgetRegistry) -> EditorResult<Document> {
    let nodes = html::parse(markup)?;
    let elements = read_nodes(&nodes, registry)?;
    tracing::debug!(elements = elements.len(), "deserialized page markup");
    Document::from_elements(elements)
}

fn read_nodes(nodes: &[HtmlNode], registry: &WidgetRegistry) -> EditorResult<Vec<Element>> {
    let mut elements = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            HtmlNode::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    elements.push(read_text(text, registry)?);
                }
            }
            HtmlNode::Element(el) => elements.push(read_element(el, registry)?),
        }
    }
    Ok(elements)
}

fn read_text(text: &str, registry: &WidgetRegistry) -> EditorResult<Element> {
    if let Ok(definition) = registry.get("text") {
        let settings = definition.resolve(&Settings::from([("text", text)]));
        return Ok(Element::new("text", settings));
    }
    passthrough(escape_text(text).into_owned(), registry)
}

fn read_element(el: &HtmlElement, registry: &WidgetRegistry) -> EditorResult<Element> {
    let definition = match el.attr(WIDGET_ATTR) {
        Some(name) => registry.get(name).ok(),
        None => registry.classify_tag(&el.tag),
    };

    if let Some(definition) = definition {
        if let Some(parsed) = definition.parse(el) {
            let mut element = Element::new(definition.name.clone(), definition.resolve(&parsed));
            if definition.accepts_children {
                element.children = read_nodes(&el.children, registry)?;
            }
            return Ok(element);
        }
    }
    passthrough(el.source.clone(), registry)
}

fn passthrough(html: String, registry: &WidgetRegistry) -> EditorResult<Element> {
    let definition = registry.get(CONTENT_WIDGET)?;
    Ok(Element::new(
        CONTENT_WIDGET,
        definition.resolve(&Settings::from([("html", html)])),
    ))
}
