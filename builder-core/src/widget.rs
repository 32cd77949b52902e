//! Widget registry - the catalog of element types.
//!
//! Each [`WidgetDefinition`] carries default settings, the settings schema the
//! properties panel renders, a pure render function and a markup parser used
//! when reading persisted pages back in. The registry is populated at startup
//! and only read afterwards, so it is shared behind an `Arc`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::html::{escape_attr, escape_text, HtmlElement};
use crate::{EditorError, EditorResult, Settings};

/// Attribute marking the root tag of every rendered widget.
pub const WIDGET_ATTR: &str = "data-widget";

/// Type name of the passthrough widget for unrecognized markup.
pub const CONTENT_WIDGET: &str = "content";

/// Renders resolved settings (and, for containers, already-rendered children).
pub type RenderFn = fn(&Settings, &str) -> String;

/// Reads settings back out of a rendered element. `None` means the element
/// cannot be represented by this widget.
pub type ParseFn = fn(&HtmlElement) -> Option<Settings>;

/// Palette grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetCategory {
    /// Text and buttons.
    Basic,
    /// Images and video.
    Media,
    /// Containers.
    Layout,
    /// Raw content.
    Advanced,
}

/// Kind of form control used to edit a setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Control {
    /// Single-line text input.
    Text,
    /// Multi-line text input.
    TextArea,
    /// Numeric input with bounds.
    Number {
        /// Minimum accepted value.
        min: f64,
        /// Maximum accepted value.
        max: f64,
    },
    /// Checkbox.
    Toggle,
    /// Dropdown with fixed options.
    Select {
        /// Allowed values.
        options: Vec<String>,
    },
    /// Color picker.
    Color,
    /// URL input.
    Url,
}

/// One entry in a widget's settings schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingField {
    /// Setting key.
    pub key: String,
    /// Human readable label.
    pub label: String,
    /// Control used to edit it.
    pub control: Control,
}

impl SettingField {
    /// Create a schema field.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, control: Control) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            control,
        }
    }
}

/// A registered widget type.
#[derive(Clone)]
pub struct WidgetDefinition {
    /// Type name, e.g. `heading`.
    pub name: String,
    /// Palette label.
    pub label: String,
    /// Palette category.
    pub category: WidgetCategory,
    /// Icon identifier.
    pub icon: String,
    /// Default settings.
    pub defaults: Settings,
    /// Editable settings, in panel order.
    pub schema: Vec<SettingField>,
    /// Whether instances may hold children.
    pub accepts_children: bool,
    /// Tags classified as this widget when reading markup without a widget marker.
    pub tags: Vec<String>,
    render: RenderFn,
    parse: Option<ParseFn>,
}

impl std::fmt::Debug for WidgetDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetDefinition")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("accepts_children", &self.accepts_children)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl WidgetDefinition {
    /// Create a leaf widget definition.
    #[must_use]
    pub fn new(name: impl Into<String>, category: WidgetCategory, render: RenderFn) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            icon: name.clone(),
            name,
            category,
            defaults: Settings::new(),
            schema: Vec::new(),
            accepts_children: false,
            tags: Vec::new(),
            render,
            parse: None,
        }
    }

    /// Set the palette label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Add a schema field with its default value.
    #[must_use]
    pub fn with_setting(
        mut self,
        field: SettingField,
        default: impl Into<crate::SettingValue>,
    ) -> Self {
        self.defaults.set(field.key.clone(), default);
        self.schema.push(field);
        self
    }

    /// Allow children.
    #[must_use]
    pub fn container(mut self) -> Self {
        self.accepts_children = true;
        self
    }

    /// Tags this widget claims when classifying unmarked markup.
    #[must_use]
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Set the markup parser.
    #[must_use]
    pub fn with_parser(mut self, parse: ParseFn) -> Self {
        self.parse = Some(parse);
        self
    }

    /// Settings laid over this widget's defaults.
    #[must_use]
    pub fn resolve(&self, settings: &Settings) -> Settings {
        settings.over(&self.defaults)
    }

    /// Render settings to markup. Missing settings fall back to defaults.
    /// `children` is ignored by leaf widgets.
    #[must_use]
    pub fn render(&self, settings: &Settings, children: &str) -> String {
        (self.render)(&self.resolve(settings), children)
    }

    /// Read settings back out of markup rendered by this widget.
    #[must_use]
    pub fn parse(&self, element: &HtmlElement) -> Option<Settings> {
        self.parse.and_then(|parse| parse(element))
    }
}

/// Registry of widget types.
#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    widgets: BTreeMap<String, WidgetDefinition>,
}

impl WidgetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in widget set.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for definition in builtin_widgets() {
            // Built-in names are distinct.
            let _ = registry.register(definition);
        }
        registry
    }

    /// Register a widget type.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::DuplicateWidget`] if the name is taken.
    pub fn register(&mut self, definition: WidgetDefinition) -> EditorResult<()> {
        if self.widgets.contains_key(&definition.name) {
            return Err(EditorError::DuplicateWidget(definition.name));
        }
        tracing::debug!(widget = %definition.name, "registered widget");
        self.widgets.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Look up a widget type.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownWidget`] if the type is not registered.
    pub fn get(&self, name: &str) -> EditorResult<&WidgetDefinition> {
        self.widgets
            .get(name)
            .ok_or_else(|| EditorError::UnknownWidget(name.to_string()))
    }

    /// Check if a widget type is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.widgets.contains_key(name)
    }

    /// Check if a widget type may hold children. Unknown types cannot.
    #[must_use]
    pub fn is_container(&self, name: &str) -> bool {
        self.widgets.get(name).is_some_and(|w| w.accepts_children)
    }

    /// Widget type claiming `tag`, if any.
    #[must_use]
    pub fn classify_tag(&self, tag: &str) -> Option<&WidgetDefinition> {
        self.widgets.values().find(|w| w.tags.iter().any(|t| t == tag))
    }

    /// All definitions in name order.
    pub fn widgets(&self) -> impl Iterator<Item = &WidgetDefinition> {
        self.widgets.values()
    }

    /// Definitions grouped by palette category.
    #[must_use]
    pub fn by_category(&self) -> BTreeMap<WidgetCategory, Vec<&WidgetDefinition>> {
        let mut groups: BTreeMap<WidgetCategory, Vec<&WidgetDefinition>> = BTreeMap::new();
        for widget in self.widgets.values() {
            groups.entry(widget.category).or_default().push(widget);
        }
        groups
    }

    /// Number of registered widgets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Check if no widgets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Built-in widgets
// ---------------------------------------------------------------------------

const ALIGNMENTS: &[&str] = &["left", "center", "right", "justify"];
const BUTTON_VARIANTS: &[&str] = &["primary", "secondary", "outline", "link"];
const FLEX_DIRECTIONS: &[&str] = &["row", "column", "row-reverse", "column-reverse"];
const FLEX_JUSTIFY: &[&str] = &[
    "flex-start",
    "center",
    "flex-end",
    "space-between",
    "space-around",
];

fn select(options: &[&str]) -> Control {
    Control::Select {
        options: options.iter().map(|o| (*o).to_string()).collect(),
    }
}

/// The canonical built-in widget set.
#[must_use]
pub fn builtin_widgets() -> Vec<WidgetDefinition> {
    vec![
        WidgetDefinition::new("heading", WidgetCategory::Basic, render_heading)
            .with_label("Heading")
            .with_icon("title")
            .with_setting(SettingField::new("text", "Text", Control::Text), "Heading")
            .with_setting(
                SettingField::new("level", "Level", Control::Number { min: 1.0, max: 6.0 }),
                2,
            )
            .with_setting(SettingField::new("align", "Alignment", select(ALIGNMENTS)), "left")
            .with_tags(&["h1", "h2", "h3", "h4", "h5", "h6"])
            .with_parser(parse_heading),
        WidgetDefinition::new("text", WidgetCategory::Basic, render_text)
            .with_label("Text")
            .with_icon("text")
            .with_setting(
                SettingField::new("text", "Text", Control::TextArea),
                "Add your text here",
            )
            .with_setting(SettingField::new("align", "Alignment", select(ALIGNMENTS)), "left")
            .with_tags(&["p"])
            .with_parser(parse_text),
        WidgetDefinition::new("button", WidgetCategory::Basic, render_button)
            .with_label("Button")
            .with_icon("button")
            .with_setting(SettingField::new("text", "Label", Control::Text), "Click me")
            .with_setting(SettingField::new("url", "Link", Control::Url), "#")
            .with_setting(
                SettingField::new("variant", "Style", select(BUTTON_VARIANTS)),
                "primary",
            )
            .with_tags(&["a", "button"])
            .with_parser(parse_button),
        WidgetDefinition::new("image", WidgetCategory::Media, render_image)
            .with_label("Image")
            .with_icon("image")
            .with_setting(SettingField::new("src", "Source", Control::Url), "")
            .with_setting(SettingField::new("alt", "Alt text", Control::Text), "")
            .with_setting(
                SettingField::new(
                    "width",
                    "Width (%)",
                    Control::Number {
                        min: 1.0,
                        max: 100.0,
                    },
                ),
                100,
            )
            .with_tags(&["img"])
            .with_parser(parse_image),
        WidgetDefinition::new("video", WidgetCategory::Media, render_video)
            .with_label("Video")
            .with_icon("play")
            .with_setting(SettingField::new("src", "Source", Control::Url), "")
            .with_setting(SettingField::new("autoplay", "Autoplay", Control::Toggle), false)
            .with_setting(SettingField::new("controls", "Show controls", Control::Toggle), true)
            .with_tags(&["video"])
            .with_parser(parse_video),
        WidgetDefinition::new("list", WidgetCategory::Basic, render_list)
            .with_label("List")
            .with_icon("list")
            .with_setting(
                SettingField::new("items", "Items (one per line)", Control::TextArea),
                "Item 1\nItem 2\nItem 3",
            )
            .with_setting(SettingField::new("ordered", "Numbered", Control::Toggle), false)
            .with_tags(&["ul", "ol"])
            .with_parser(parse_list),
        WidgetDefinition::new("container", WidgetCategory::Layout, render_container)
            .with_label("Container")
            .with_icon("box")
            .with_setting(
                SettingField::new(
                    "padding",
                    "Padding (px)",
                    Control::Number {
                        min: 0.0,
                        max: 200.0,
                    },
                ),
                16,
            )
            .with_setting(SettingField::new("background", "Background", Control::Color), "")
            .container()
            .with_tags(&["div", "section"])
            .with_parser(parse_container),
        WidgetDefinition::new("grid-container", WidgetCategory::Layout, render_grid)
            .with_label("Grid")
            .with_icon("grid")
            .with_setting(
                SettingField::new(
                    "columns",
                    "Columns",
                    Control::Number {
                        min: 1.0,
                        max: 12.0,
                    },
                ),
                2,
            )
            .with_setting(
                SettingField::new(
                    "gap",
                    "Gap (px)",
                    Control::Number {
                        min: 0.0,
                        max: 200.0,
                    },
                ),
                16,
            )
            .container()
            .with_parser(parse_grid),
        WidgetDefinition::new("flexbox-container", WidgetCategory::Layout, render_flex)
            .with_label("Flexbox")
            .with_icon("columns")
            .with_setting(
                SettingField::new("direction", "Direction", select(FLEX_DIRECTIONS)),
                "row",
            )
            .with_setting(
                SettingField::new(
                    "gap",
                    "Gap (px)",
                    Control::Number {
                        min: 0.0,
                        max: 200.0,
                    },
                ),
                16,
            )
            .with_setting(
                SettingField::new("justify", "Justify", select(FLEX_JUSTIFY)),
                "flex-start",
            )
            .container()
            .with_parser(parse_flex),
        WidgetDefinition::new(CONTENT_WIDGET, WidgetCategory::Advanced, render_content)
            .with_label("Custom HTML")
            .with_icon("code")
            .with_setting(SettingField::new("html", "HTML", Control::TextArea), "")
            .with_parser(parse_content),
    ]
}

fn number(settings: &Settings, key: &str, min: f64, max: f64, fallback: f64) -> f64 {
    settings
        .number(key)
        .filter(|n| n.is_finite())
        .map_or(fallback, |n| n.clamp(min, max))
}

fn one_of<'a>(value: &'a str, allowed: &[&str], fallback: &'a str) -> &'a str {
    if allowed.contains(&value) {
        value
    } else {
        fallback
    }
}

fn align_style(settings: &Settings) -> String {
    match one_of(settings.text("align"), ALIGNMENTS, "left") {
        "left" => String::new(),
        align => format!(r#" style="text-align:{align}""#),
    }
}

/// Free-form text bound into an inline style: one declaration value, so it
/// stops at the first `;`.
fn css_value(value: &str) -> &str {
    value.split(';').next().unwrap_or_default().trim()
}

fn parsed_align(element: &HtmlElement) -> &str {
    element
        .style("text-align")
        .filter(|a| ALIGNMENTS.contains(a))
        .unwrap_or("left")
}

fn px(value: Option<&str>) -> Option<f64> {
    value?.trim().trim_end_matches("px").trim().parse().ok()
}

fn render_heading(settings: &Settings, _children: &str) -> String {
    let level = number(settings, "level", 1.0, 6.0, 2.0).round();
    format!(
        r#"<h{level} {WIDGET_ATTR}="heading"{}>{}</h{level}>"#,
        align_style(settings),
        escape_text(settings.text("text"))
    )
}

fn parse_heading(element: &HtmlElement) -> Option<Settings> {
    let level: i32 = element.tag.strip_prefix('h')?.parse().ok()?;
    if !element.is_text_only() {
        return None;
    }
    Some(
        Settings::new()
            .with("text", element.text_content())
            .with("level", level)
            .with("align", parsed_align(element)),
    )
}

fn render_text(settings: &Settings, _children: &str) -> String {
    format!(
        r#"<p {WIDGET_ATTR}="text"{}>{}</p>"#,
        align_style(settings),
        escape_text(settings.text("text"))
    )
}

fn parse_text(element: &HtmlElement) -> Option<Settings> {
    if !element.is_text_only() {
        return None;
    }
    Some(
        Settings::new()
            .with("text", element.text_content())
            .with("align", parsed_align(element)),
    )
}

fn render_button(settings: &Settings, _children: &str) -> String {
    let variant = one_of(settings.text("variant"), BUTTON_VARIANTS, "primary");
    format!(
        r#"<a {WIDGET_ATTR}="button" class="pb-button pb-button--{variant}" href="{}">{}</a>"#,
        escape_attr(settings.text("url")),
        escape_text(settings.text("text"))
    )
}

fn parse_button(element: &HtmlElement) -> Option<Settings> {
    if !element.is_text_only() {
        return None;
    }
    let variant = element
        .attr("class")
        .and_then(|classes| {
            classes
                .split_ascii_whitespace()
                .find_map(|c| c.strip_prefix("pb-button--"))
        })
        .filter(|v| BUTTON_VARIANTS.contains(v))
        .unwrap_or("primary");
    Some(
        Settings::new()
            .with("text", element.text_content())
            .with("url", element.attr("href").unwrap_or("#"))
            .with("variant", variant),
    )
}

fn render_image(settings: &Settings, _children: &str) -> String {
    let width = number(settings, "width", 1.0, 100.0, 100.0);
    format!(
        r#"<img {WIDGET_ATTR}="image" src="{}" alt="{}" style="width:{width}%">"#,
        escape_attr(settings.text("src")),
        escape_attr(settings.text("alt"))
    )
}

fn parse_image(element: &HtmlElement) -> Option<Settings> {
    let width = element
        .style("width")
        .and_then(|w| w.trim_end_matches('%').trim().parse::<f64>().ok())
        .unwrap_or(100.0);
    Some(
        Settings::new()
            .with("src", element.attr("src").unwrap_or_default())
            .with("alt", element.attr("alt").unwrap_or_default())
            .with("width", width),
    )
}

fn render_video(settings: &Settings, _children: &str) -> String {
    let mut flags = String::new();
    if settings.flag("controls").unwrap_or(true) {
        flags.push_str(" controls");
    }
    if settings.flag("autoplay").unwrap_or(false) {
        flags.push_str(" autoplay muted");
    }
    format!(
        r#"<video {WIDGET_ATTR}="video" src="{}"{flags}></video>"#,
        escape_attr(settings.text("src"))
    )
}

fn parse_video(element: &HtmlElement) -> Option<Settings> {
    let src = element
        .attr("src")
        .or_else(|| {
            element
                .child_elements()
                .find(|c| c.tag == "source")
                .and_then(|c| c.attr("src"))
        })
        .unwrap_or_default();
    Some(
        Settings::new()
            .with("src", src)
            .with("controls", element.attr("controls").is_some())
            .with("autoplay", element.attr("autoplay").is_some()),
    )
}

fn render_list(settings: &Settings, _children: &str) -> String {
    let tag = if settings.flag("ordered").unwrap_or(false) {
        "ol"
    } else {
        "ul"
    };
    let items: String = settings
        .text("items")
        .split('\n')
        .map(|item| format!("<li>{}</li>", escape_text(item)))
        .collect();
    format!(r#"<{tag} {WIDGET_ATTR}="list">{items}</{tag}>"#)
}

fn parse_list(element: &HtmlElement) -> Option<Settings> {
    let items: Vec<String> = element
        .child_elements()
        .filter(|c| c.tag == "li")
        .map(HtmlElement::text_content)
        .collect();
    Some(
        Settings::new()
            .with("items", items.join("\n"))
            .with("ordered", element.tag == "ol"),
    )
}

fn render_container(settings: &Settings, children: &str) -> String {
    let padding = number(settings, "padding", 0.0, 200.0, 16.0);
    let background = css_value(settings.text("background"));
    let background = if background.is_empty() {
        String::new()
    } else {
        format!(";background:{}", escape_attr(background))
    };
    format!(
        r#"<div {WIDGET_ATTR}="container" class="pb-container" style="padding:{padding}px{background}">{children}</div>"#
    )
}

fn parse_container(element: &HtmlElement) -> Option<Settings> {
    Some(
        Settings::new()
            .with("padding", px(element.style("padding")).unwrap_or(0.0))
            .with("background", element.style("background").unwrap_or_default()),
    )
}

fn render_grid(settings: &Settings, children: &str) -> String {
    let columns = number(settings, "columns", 1.0, 12.0, 2.0).round();
    let gap = number(settings, "gap", 0.0, 200.0, 16.0);
    format!(
        r#"<div {WIDGET_ATTR}="grid-container" class="pb-grid" style="display:grid;grid-template-columns:repeat({columns},minmax(0,1fr));gap:{gap}px">{children}</div>"#
    )
}

fn parse_grid(element: &HtmlElement) -> Option<Settings> {
    let columns = element
        .style("grid-template-columns")
        .and_then(|v| v.strip_prefix("repeat("))
        .and_then(|v| v.split(',').next())
        .and_then(|n| n.trim().parse::<f64>().ok())
        .unwrap_or(2.0);
    Some(
        Settings::new()
            .with("columns", columns)
            .with("gap", px(element.style("gap")).unwrap_or(0.0)),
    )
}

fn render_flex(settings: &Settings, children: &str) -> String {
    let direction = one_of(settings.text("direction"), FLEX_DIRECTIONS, "row");
    let justify = one_of(settings.text("justify"), FLEX_JUSTIFY, "flex-start");
    let gap = number(settings, "gap", 0.0, 200.0, 16.0);
    format!(
        r#"<div {WIDGET_ATTR}="flexbox-container" class="pb-flex" style="display:flex;flex-direction:{direction};justify-content:{justify};gap:{gap}px">{children}</div>"#
    )
}

fn parse_flex(element: &HtmlElement) -> Option<Settings> {
    Some(
        Settings::new()
            .with("direction", element.style("flex-direction").unwrap_or("row"))
            .with(
                "justify",
                element.style("justify-content").unwrap_or("flex-start"),
            )
            .with("gap", px(element.style("gap")).unwrap_or(0.0)),
    )
}

fn render_content(settings: &Settings, _children: &str) -> String {
    format!(
        r#"<div {WIDGET_ATTR}="{CONTENT_WIDGET}">{}</div>"#,
        settings.text("html")
    )
}

fn parse_content(element: &HtmlElement) -> Option<Settings> {
    (element.attr(WIDGET_ATTR) == Some(CONTENT_WIDGET))
        .then(|| Settings::new().with("html", element.inner.clone()))
}
