//! HTML reading and escaping for persisted page markup.
//!
//! Tokenizing is done by `quick-xml` with end-name checks off, so it accepts
//! the well-formed subset the serializer emits plus typical hand-authored page
//! bodies. On top of the token stream this module builds an element tree the
//! HTML way: void tags never hold children, unknown end tags are ignored,
//! unclosed elements are closed at end of input and `script`/`style` bodies
//! are kept as raw text. Every element remembers its verbatim source so
//! unrecognized markup can be passed through untouched.

use std::borrow::Cow;

use quick_xml::escape::{escape, partial_escape, resolve_html5_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{EditorError, EditorResult};

/// Maximum element nesting accepted when reading markup.
pub const MAX_DEPTH: usize = 128;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// A node of parsed markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    /// An element with attributes and children.
    Element(HtmlElement),
    /// Decoded text.
    Text(String),
}

/// A parsed element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    /// Lowercased tag name.
    pub tag: String,
    /// Attributes in source order, names lowercased, values decoded.
    pub attrs: Vec<(String, String)>,
    /// Child nodes.
    pub children: Vec<HtmlNode>,
    /// The element's verbatim source, start tag through end tag.
    pub source: String,
    /// Verbatim source between the start and end tags.
    pub inner: String,
}

impl HtmlElement {
    /// Value of an attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of one declaration in the inline `style` attribute.
    #[must_use]
    pub fn style(&self, property: &str) -> Option<&str> {
        self.attr("style")?.split(';').find_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            (name.trim().eq_ignore_ascii_case(property)).then(|| value.trim())
        })
    }

    /// Child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &HtmlElement> {
        self.children.iter().filter_map(|node| match node {
            HtmlNode::Element(el) => Some(el),
            HtmlNode::Text(_) => None,
        })
    }

    /// Concatenated descendant text.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// True if every child is text (no nested elements).
    #[must_use]
    pub fn is_text_only(&self) -> bool {
        self.children.iter().all(|n| matches!(n, HtmlNode::Text(_)))
    }
}

fn collect_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(t) => out.push_str(t),
            HtmlNode::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// Escape text content.
#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
    partial_escape(text)
}

/// Escape an attribute value for use inside double quotes.
#[must_use]
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    escape(value)
}

/// Decode character references. Input with a malformed reference (such as a
/// bare `&`) is returned as written.
#[must_use]
fn decode_entities(input: &str) -> String {
    unescape_with(input, resolve_html5_entity)
        .map_or_else(|_| input.to_string(), Cow::into_owned)
}

/// Parse markup into a forest of nodes.
///
/// # Errors
///
/// Returns [`EditorError::Serialization`] for an unterminated tag or comment,
/// or nesting deeper than [`MAX_DEPTH`].
pub fn parse(input: &str) -> EditorResult<Vec<HtmlNode>> {
    let mut builder = TreeBuilder::new(input);
    let mut offset = 0_usize;

    // The reader restarts after every raw text body, which it cannot tokenize.
    'reader: loop {
        let mut reader = reader_at(input, offset);
        loop {
            let start = offset + position(&reader);
            let event = reader.read_event().map_err(|e| {
                EditorError::Serialization(format!("malformed markup at byte {start}: {e}"))
            })?;
            let end = offset + position(&reader);

            match event {
                Event::Start(tag) => {
                    let name = tag_name(&tag);
                    builder.open(name.clone(), attributes(&tag), start, end)?;
                    if VOID_TAGS.contains(&name.as_str()) {
                        builder.close_current(end, end);
                    } else if RAW_TEXT_TAGS.contains(&name.as_str()) {
                        let body_end = input[end..]
                            .to_ascii_lowercase()
                            .find(&format!("</{name}"))
                            .map_or(input.len(), |p| end + p);
                        let after = input[body_end..]
                            .find('>')
                            .map_or(input.len(), |gt| body_end + gt + 1);
                        builder.raw_text(&input[end..body_end]);
                        builder.close(&name, body_end, after);
                        offset = after;
                        continue 'reader;
                    }
                }
                Event::Empty(tag) => {
                    builder.open(tag_name(&tag), attributes(&tag), start, end)?;
                    builder.close_current(end, end);
                }
                Event::End(tag) => {
                    let name = String::from_utf8_lossy(tag.name().as_ref()).to_ascii_lowercase();
                    builder.close(&name, start, end);
                }
                Event::Text(_) => builder.text(&input[start..end]),
                Event::CData(data) => builder.raw_text(&String::from_utf8_lossy(&data)),
                Event::Eof => break 'reader,
                // Comments, declarations, processing instructions, doctype.
                _ => {}
            }
        }
    }

    Ok(builder.finish())
}

fn reader_at(input: &str, offset: usize) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(&input[offset..]);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    reader
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn tag_name(tag: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(tag.name().as_ref()).to_ascii_lowercase()
}

fn attributes(tag: &BytesStart<'_>) -> Vec<(String, String)> {
    tag.html_attributes()
        .flatten()
        .map(|attr| {
            let name = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = decode_entities(&String::from_utf8_lossy(&attr.value));
            (name, value)
        })
        .collect()
}

struct OpenElement {
    element: HtmlElement,
    start: usize,
    inner_start: usize,
}

struct TreeBuilder<'a> {
    input: &'a str,
    stack: Vec<OpenElement>,
    roots: Vec<HtmlNode>,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            stack: Vec::new(),
            roots: Vec::new(),
        }
    }

    fn push_node(&mut self, node: HtmlNode) {
        match self.stack.last_mut() {
            Some(open) => open.element.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn text(&mut self, raw: &str) {
        if !raw.is_empty() {
            self.push_node(HtmlNode::Text(decode_entities(raw)));
        }
    }

    fn raw_text(&mut self, raw: &str) {
        if !raw.is_empty() {
            self.push_node(HtmlNode::Text(raw.to_string()));
        }
    }

    fn open(
        &mut self,
        tag: String,
        attrs: Vec<(String, String)>,
        start: usize,
        inner_start: usize,
    ) -> EditorResult<()> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(EditorError::Serialization(format!(
                "markup nested deeper than {MAX_DEPTH} levels"
            )));
        }
        self.stack.push(OpenElement {
            element: HtmlElement {
                tag,
                attrs,
                children: Vec::new(),
                source: String::new(),
                inner: String::new(),
            },
            start,
            inner_start,
        });
        Ok(())
    }

    fn close_current(&mut self, inner_end: usize, end: usize) {
        if let Some(mut open) = self.stack.pop() {
            open.element.source = self.input[open.start..end].to_string();
            open.element.inner = self.input[open.inner_start..inner_end].to_string();
            self.push_node(HtmlNode::Element(open.element));
        }
    }

    /// Close the innermost open `tag`. `inner_end` is where its end tag starts;
    /// elements still open inside it end there.
    fn close(&mut self, tag: &str, inner_end: usize, end: usize) {
        let Some(pos) = self.stack.iter().rposition(|o| o.element.tag == tag) else {
            return;
        };
        while self.stack.len() > pos + 1 {
            self.close_current(inner_end, inner_end);
        }
        self.close_current(inner_end, end);
    }

    fn finish(mut self) -> Vec<HtmlNode> {
        let end = self.input.len();
        while !self.stack.is_empty() {
            self.close_current(end, end);
        }
        self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(input: &str) -> HtmlElement {
        let nodes = parse(input).expect("parse");
        match nodes.into_iter().next() {
            Some(HtmlNode::Element(el)) => el,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_nested_with_source() {
        let el = single(r#"<div class="a b" data-x='1'><p>Hi &amp; bye</p></div>"#);
        assert_eq!(el.tag, "div");
        assert_eq!(el.attr("class"), Some("a b"));
        assert_eq!(el.attr("data-x"), Some("1"));
        assert_eq!(el.inner, "<p>Hi &amp; bye</p>");
        let p = el.child_elements().next().expect("p");
        assert_eq!(p.text_content(), "Hi & bye");
        assert_eq!(p.source, "<p>Hi &amp; bye</p>");
    }

    #[test]
    fn test_void_and_self_closing() {
        let nodes = parse(r#"<img src="a.png"><br/><p>x</p>"#).expect("parse");
        assert_eq!(nodes.len(), 3);
        let HtmlNode::Element(img) = &nodes[0] else {
            panic!("img");
        };
        assert!(img.children.is_empty());
        assert_eq!(img.source, r#"<img src="a.png">"#);
    }

    #[test]
    fn test_html_attributes() {
        let el = single("<video src=clip.mp4 controls autoplay></video>");
        assert_eq!(el.attr("src"), Some("clip.mp4"));
        assert_eq!(el.attr("controls"), Some(""));
        assert!(el.attr("autoplay").is_some());
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        let el = single("<div><p>one<p>two");
        assert_eq!(el.tag, "div");
        assert_eq!(el.text_content(), "onetwo");
        assert_eq!(el.inner, "<p>one<p>two");
    }

    #[test]
    fn test_implicitly_closed_source_stops_at_parent_end_tag() {
        let el = single("<div><span>a</div>");
        let span = el.child_elements().next().expect("span");
        assert_eq!(span.source, "<span>a");
        assert_eq!(el.source, "<div><span>a</div>");
    }

    #[test]
    fn test_stray_end_tag_ignored() {
        let nodes = parse("</span><p>ok</p>").expect("parse");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_unterminated_tag_is_error() {
        assert!(matches!(
            parse("<p>fine</p><div class=\"x"),
            Err(EditorError::Serialization(_))
        ));
        assert!(matches!(
            parse("<!-- never closed"),
            Err(EditorError::Serialization(_))
        ));
    }

    #[test]
    fn test_comments_and_doctype_skipped() {
        let nodes = parse("<!DOCTYPE html><!-- note --><p>x</p>").expect("parse");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let deep = "<div>".repeat(MAX_DEPTH + 1);
        assert!(matches!(parse(&deep), Err(EditorError::Serialization(_))));
        let ok = "<div>".repeat(MAX_DEPTH);
        assert!(parse(&ok).is_ok());
    }

    #[test]
    fn test_script_body_is_raw() {
        let nodes = parse("<script>if (a < b) { x(); }</script><p>after</p>").expect("parse");
        assert_eq!(nodes.len(), 2);
        let HtmlNode::Element(script) = &nodes[0] else {
            panic!("script");
        };
        assert_eq!(script.text_content(), "if (a < b) { x(); }");
        assert_eq!(script.source, "<script>if (a < b) { x(); }</script>");
    }

    #[test]
    fn test_style_lookup() {
        let el = single(r#"<h2 style="text-align: center; color:red">x</h2>"#);
        assert_eq!(el.style("text-align"), Some("center"));
        assert_eq!(el.style("color"), Some("red"));
        assert_eq!(el.style("margin"), None);
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42;&nbsp;"), "a <b> AB\u{a0}");
        assert_eq!(decode_entities("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(escape_attr(r#"say "hi" & <go>"#), "say &quot;hi&quot; &amp; &lt;go&gt;");
        assert_eq!(decode_entities(&escape_text("x < y & z")), "x < y & z");
    }
}
