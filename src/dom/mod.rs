//! Owned element tree for rendered markdown
//!
//! Regions are rendered, patched and laid out as a plain tree of [`Element`]s
//! rather than a live browser document. The tree carries exactly what the
//! live preview pipeline inspects: tag names, classes, ordered attributes,
//! text, and click listeners attached by the link patcher.

use regex::Regex;

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A child of an element: either a nested element or a run of text.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Whether this is a text node containing only whitespace.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.collect_text(out),
            Node::Text(t) => out.push_str(t),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write_html(out),
            Node::Text(t) => escape_into(t, false, out),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// Behaviour attached to an element in place of default navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listener {
    /// Open `target` through the system's default handler when clicked.
    OpenExternal { target: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Element
// ─────────────────────────────────────────────────────────────────────────────

/// Tags serialized without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "wbr"];

/// A rendered element with its subtree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    listeners: Vec<Listener>,
}

impl Element {
    /// Create an empty element with the given tag name (lowercased).
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    // Builders ───────────────────────────────────────────────────────────────

    /// Add one or more space-separated classes.
    pub fn with_class(mut self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            self.add_class(class);
        }
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    // Tag and classes ────────────────────────────────────────────────────────

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    // Attributes ─────────────────────────────────────────────────────────────

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(index).1)
    }

    // Children ───────────────────────────────────────────────────────────────

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn push_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        // Keep adjacent text in one node so text_content matches the source run
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    pub fn insert_child(&mut self, index: usize, child: impl Into<Node>) {
        let index = index.min(self.children.len());
        self.children.insert(index, child.into());
    }

    /// Remove and return all children, leaving the element empty.
    pub fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    /// Element children only, skipping text nodes.
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    // Listeners ──────────────────────────────────────────────────────────────

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    pub fn add_listener(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    // Queries ────────────────────────────────────────────────────────────────

    /// Concatenated text of this element and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Text of this subtree with each descendant whose tag is in `skip_tags`
    /// replaced by `placeholder`.
    pub fn text_content_outside(&self, skip_tags: &[&str], placeholder: &str) -> String {
        let mut out = String::new();
        self.collect_text_outside(skip_tags, placeholder, &mut out);
        out
    }

    fn collect_text_outside(&self, skip_tags: &[&str], placeholder: &str, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) if skip_tags.contains(&el.tag()) => out.push_str(placeholder),
                Node::Element(el) => el.collect_text_outside(skip_tags, placeholder, out),
            }
        }
    }

    /// All descendants (not including `self`) carrying `class`, in document order.
    pub fn find_all_by_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_by_class(class, &mut found);
        found
    }

    fn collect_by_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        for child in self.element_children() {
            if child.has_class(class) {
                found.push(child);
            }
            child.collect_by_class(class, found);
        }
    }

    /// Whether `self` or any descendant carries `class`.
    pub fn contains_class(&self, class: &str) -> bool {
        self.has_class(class)
            || self
                .element_children()
                .any(|child| child.contains_class(class))
    }

    /// Whether `self` or any descendant has the given tag name.
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.tag == tag || self.element_children().any(|child| child.contains_tag(tag))
    }

    // Mutation ───────────────────────────────────────────────────────────────

    /// Visit `self` and every descendant element in pre-order.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Element)) {
        visit(self);
        for child in &mut self.children {
            if let Node::Element(el) = child {
                el.walk_mut(visit);
            }
        }
    }

    /// Delete every match of `pattern` from the text in this subtree.
    ///
    /// Descendants whose tag is in `skip_tags` are left untouched. Text nodes
    /// left empty are dropped and surrounding whitespace of edited nodes is
    /// trimmed.
    pub fn strip_text_matching(&mut self, pattern: &Regex, skip_tags: &[&str]) {
        self.children.retain_mut(|child| match child {
            Node::Text(text) => {
                if pattern.is_match(text) {
                    *text = pattern.replace_all(text, "").trim().to_string();
                }
                !text.is_empty()
            }
            Node::Element(el) => {
                if !skip_tags.contains(&el.tag()) {
                    el.strip_text_matching(pattern, skip_tags);
                }
                true
            }
        });
    }

    // Serialization ──────────────────────────────────────────────────────────

    /// Serialize this element and its subtree as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Serialize only the children of this element.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if !self.classes.is_empty() {
            out.push_str(" class=\"");
            escape_into(&self.classes.join(" "), true, out);
            out.push('"');
        }
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_into(value, true, out);
            out.push('"');
        }
        out.push('>');

        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }

        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("div").with_class("outer").with_child(
            Element::new("p")
                .with_text("Hello ")
                .with_child(
                    Element::new("span")
                        .with_class("internal-embed")
                        .with_attr("src", "a.png"),
                )
                .with_text("world"),
        )
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        assert_eq!(sample().text_content(), "Hello world");
    }

    #[test]
    fn test_to_html_escapes_text_and_attributes() {
        let el = Element::new("a")
            .with_attr("title", "say \"hi\"")
            .with_text("<b> & co");
        assert_eq!(
            el.to_html(),
            "<a title=\"say &quot;hi&quot;\">&lt;b&gt; &amp; co</a>"
        );
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let el = Element::new("img").with_attr("src", "x.png");
        assert_eq!(el.to_html(), "<img src=\"x.png\">");
    }

    #[test]
    fn test_find_all_by_class_excludes_self() {
        let el = Element::new("span")
            .with_class("internal-embed")
            .with_child(Element::new("span").with_class("internal-embed"));
        assert_eq!(el.find_all_by_class("internal-embed").len(), 1);
        assert!(el.contains_class("internal-embed"));
    }

    #[test]
    fn test_set_and_remove_attr() {
        let mut el = Element::new("a").with_attr("href", "one");
        el.set_attr("href", "two");
        assert_eq!(el.attr("href"), Some("two"));
        assert_eq!(el.remove_attr("href"), Some("two".to_string()));
        assert_eq!(el.remove_attr("href"), None);
        assert_eq!(el.to_html(), "<a></a>");
    }

    #[test]
    fn test_push_text_merges_adjacent_runs() {
        let mut el = Element::new("p");
        el.push_text("a");
        el.push_text("b");
        assert_eq!(el.children().len(), 1);
    }

    #[test]
    fn test_walk_mut_visits_every_element() {
        let mut el = sample();
        let mut count = 0;
        el.walk_mut(&mut |_| count += 1);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_strip_text_matching_drops_emptied_nodes() {
        let re = Regex::new("--- column-break ---").unwrap();
        let mut el = Element::new("p").with_text("before\n--- column-break ---");
        el.strip_text_matching(&re, &[]);
        assert_eq!(el.text_content(), "before");

        let mut only = Element::new("p").with_text("--- column-break ---");
        only.strip_text_matching(&re, &[]);
        assert!(only.children().is_empty());
    }

    #[test]
    fn test_skipped_tags_keep_their_text() {
        let re = Regex::new("--- column-break ---").unwrap();
        let mut el = Element::new("p")
            .with_text("see ")
            .with_child(Element::new("code").with_text("--- column-break ---"))
            .with_text(" --- column-break ---");

        assert_eq!(
            el.text_content_outside(&["code"], "#"),
            "see # --- column-break ---"
        );

        el.strip_text_matching(&re, &["code"]);
        assert_eq!(el.text_content(), "see --- column-break ---");
        assert_eq!(el.text_content_outside(&["code"], ""), "see ");
    }
}
