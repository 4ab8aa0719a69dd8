//! Markdown renderer implementation using comrak
//!
//! Parses region text with comrak and converts the AST into [`Element`]s
//! shaped like the host's reading-view output.

use std::path::Path;
use std::sync::OnceLock;

use comrak::{
    nodes::{AstNode, ListType as ComrakListType, NodeValue},
    parse_document, Arena, Options,
};
use log::debug;
use regex::Regex;

use super::{EMBED_MARKER_CLASS, EXTERNAL_LINK_CLASS, INTERNAL_LINK_CLASS};
use crate::dom::{Element, Node};

/// Renders markdown text into a container element.
pub trait MarkdownRenderer {
    /// Append one child to `target` per top-level block of `text`.
    fn render(&self, text: &str, target: &mut Element, source_path: &Path);
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration options for markdown parsing.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable GitHub Flavored Markdown tables
    pub tables: bool,
    /// Enable strikethrough syntax (~~text~~)
    pub strikethrough: bool,
    /// Enable autolink URLs and emails
    pub autolink: bool,
    /// Enable task lists (- [ ] and - [x])
    pub tasklist: bool,
    /// Enable footnotes
    pub footnotes: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            autolink: true,
            tasklist: true,
            footnotes: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to comrak Options.
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();
        options.extension.strikethrough = self.strikethrough;
        options.extension.table = self.tables;
        options.extension.autolink = self.autolink;
        options.extension.tasklist = self.tasklist;
        options.extension.footnotes = self.footnotes;
        options
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// [`MarkdownRenderer`] backed by comrak.
#[derive(Debug, Clone, Default)]
pub struct ComrakRenderer {
    options: MarkdownOptions,
}

impl ComrakRenderer {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    fn render_blocks(&self, text: &str) -> Vec<Node> {
        let arena = Arena::new();
        let root = parse_document(&arena, text, &self.options.to_comrak_options());
        root.children()
            .filter_map(|child| self.convert_block(child))
            .collect()
    }

    fn convert_block<'a>(&self, node: &'a AstNode<'a>) -> Option<Node> {
        let value = node.data.borrow().value.clone();
        let element = match value {
            NodeValue::Paragraph => inline_element("p", node),
            NodeValue::Heading(heading) => {
                inline_element(&format!("h{}", heading.level.clamp(1, 6)), node)
            }
            NodeValue::List(list) => {
                let mut el = match list.list_type {
                    ComrakListType::Bullet => Element::new("ul"),
                    ComrakListType::Ordered if list.start != 1 => {
                        Element::new("ol").with_attr("start", list.start.to_string())
                    }
                    ComrakListType::Ordered => Element::new("ol"),
                };
                self.append_blocks(node, &mut el);
                if el.contains_class("task-list-item") {
                    el.add_class("contains-task-list");
                }
                el
            }
            NodeValue::Item(_) => {
                let mut el = Element::new("li");
                self.append_list_item(node, &mut el);
                el
            }
            NodeValue::TaskItem(mark) => {
                let mut checkbox = Element::new("input")
                    .with_class("task-list-item-checkbox")
                    .with_attr("type", "checkbox");
                if mark.is_some_and(|c| c != ' ') {
                    checkbox.set_attr("checked", "");
                }
                let mut el = Element::new("li")
                    .with_class("task-list-item")
                    .with_child(checkbox);
                self.append_list_item(node, &mut el);
                el
            }
            NodeValue::BlockQuote => {
                let mut el = Element::new("blockquote");
                self.append_blocks(node, &mut el);
                el
            }
            NodeValue::CodeBlock(code) => {
                let language = code.info.split_whitespace().next().unwrap_or_default();
                self.code_block(language, &code.literal)
            }
            NodeValue::ThematicBreak => Element::new("hr"),
            NodeValue::HtmlBlock(html) => Element::new("div")
                .with_class("html-block")
                .with_text(html.literal.trim_end()),
            NodeValue::Table(_) => table_element(node),
            NodeValue::FrontMatter(_) => return None,
            _ => {
                let mut el = Element::new("div");
                self.append_blocks(node, &mut el);
                el
            }
        };
        Some(Node::Element(element))
    }

    fn append_blocks<'a>(&self, node: &'a AstNode<'a>, target: &mut Element) {
        for child in node.children() {
            if let Some(converted) = self.convert_block(child) {
                target.push_child(converted);
            }
        }
    }

    /// The leading paragraph of an item is inlined into the `li`, as in tight lists.
    fn append_list_item<'a>(&self, node: &'a AstNode<'a>, target: &mut Element) {
        for (index, child) in node.children().enumerate() {
            let is_paragraph = matches!(child.data.borrow().value, NodeValue::Paragraph);
            if index == 0 && is_paragraph {
                append_inlines(child, target);
            } else if let Some(converted) = self.convert_block(child) {
                target.push_child(converted);
            }
        }
    }

    /// Fenced code, or the output a plugin would render for its code block language.
    fn code_block(&self, language: &str, literal: &str) -> Element {
        if let Some(kind) = language.strip_prefix("ad-") {
            return self.admonition(kind, literal);
        }
        if language.eq_ignore_ascii_case("tasks") {
            return tasks_query(literal);
        }

        let mut code = Element::new("code");
        if !language.is_empty() {
            code.add_class(&format!("language-{}", language));
        }
        Element::new("pre").with_child(code.with_text(literal))
    }

    fn admonition(&self, kind: &str, literal: &str) -> Element {
        let kind = if kind.is_empty() { "note" } else { kind };
        let mut title = kind.to_string();
        if let Some(first) = title.get_mut(0..1) {
            first.make_ascii_uppercase();
        }

        let mut content = Element::new("div").with_class("admonition-content");
        for block in self.render_blocks(literal) {
            content.push_child(block);
        }

        Element::new("div")
            .with_class(&format!("admonition admonition-{} admonition-plugin", kind))
            .with_child(
                Element::new("div").with_class("admonition-title").with_child(
                    Element::new("div")
                        .with_class("admonition-title-content")
                        .with_text(title),
                ),
            )
            .with_child(
                Element::new("div")
                    .with_class("admonition-content-holder")
                    .with_child(content),
            )
    }
}

impl MarkdownRenderer for ComrakRenderer {
    fn render(&self, text: &str, target: &mut Element, source_path: &Path) {
        let blocks = self.render_blocks(text);
        debug!(
            "Rendered {} top-level blocks for {}",
            blocks.len(),
            source_path.display()
        );
        for block in blocks {
            target.push_child(block);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Output Shapes
// ─────────────────────────────────────────────────────────────────────────────

fn tasks_query(literal: &str) -> Element {
    let mut list = Element::new("ul").with_class("contains-task-list plugin-tasks-query-result");
    for line in literal.lines().map(str::trim).filter(|l| !l.is_empty()) {
        list.push_child(
            Element::new("li")
                .with_class("task-list-item plugin-tasks-list-item")
                .with_text(line),
        );
    }
    Element::new("div")
        .with_class("block-language-tasks")
        .with_child(list)
}

fn dice_roller(formula: &str) -> Element {
    Element::new("span")
        .with_class("dice-roller")
        .with_attr("data-dice", formula)
        .with_child(
            Element::new("div")
                .with_class("dice-roller-result")
                .with_text(formula),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

fn table_element<'a>(node: &'a AstNode<'a>) -> Element {
    let mut head = Element::new("thead");
    let mut body = Element::new("tbody");

    for row in node.children() {
        let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
        let cell_tag = if header { "th" } else { "td" };
        let mut tr = Element::new("tr");
        for cell in row.children() {
            tr.push_child(inline_element(cell_tag, cell));
        }
        if header {
            head.push_child(tr);
        } else {
            body.push_child(tr);
        }
    }

    let mut table = Element::new("table").with_child(head);
    if !body.children().is_empty() {
        table.push_child(body);
    }
    table
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Conversion
// ─────────────────────────────────────────────────────────────────────────────

fn wiki_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(!?)\[\[([^\[\]]+)\]\]").expect("wikilink pattern is valid"))
}

fn width_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(?:x\d+)?$").expect("embed size pattern is valid"))
}

fn inline_element<'a>(tag: &str, node: &'a AstNode<'a>) -> Element {
    let mut el = Element::new(tag);
    append_inlines(node, &mut el);
    el
}

/// Convert the inline children of `node` into `target`.
///
/// comrak splits text at bracket characters, so adjacent text is buffered
/// and scanned for `[[...]]` syntax as one run.
fn append_inlines<'a>(node: &'a AstNode<'a>, target: &mut Element) {
    let mut pending = String::new();

    for child in node.children() {
        let value = child.data.borrow().value.clone();
        match value {
            NodeValue::Text(text) => pending.push_str(&text),
            NodeValue::SoftBreak => pending.push('\n'),
            NodeValue::HtmlInline(html) => pending.push_str(&html),
            NodeValue::LineBreak => {
                flush_text(&mut pending, target);
                target.push_child(Element::new("br"));
            }
            NodeValue::Code(code) => {
                flush_text(&mut pending, target);
                match code.literal.strip_prefix("dice:") {
                    Some(formula) => target.push_child(dice_roller(formula.trim())),
                    None => target.push_child(Element::new("code").with_text(code.literal)),
                }
            }
            NodeValue::Emph => nested(&mut pending, target, "em", child),
            NodeValue::Strong => nested(&mut pending, target, "strong", child),
            NodeValue::Strikethrough => nested(&mut pending, target, "del", child),
            NodeValue::Link(link) => {
                flush_text(&mut pending, target);
                let mut anchor = link_element(&link.url);
                if !link.title.is_empty() {
                    anchor.set_attr("title", link.title);
                }
                append_inlines(child, &mut anchor);
                target.push_child(anchor);
            }
            NodeValue::Image(link) => {
                flush_text(&mut pending, target);
                let alt = inline_element("span", child).text_content();
                if is_external_url(&link.url) {
                    target.push_child(
                        Element::new("img")
                            .with_attr("src", link.url)
                            .with_attr("alt", alt),
                    );
                } else {
                    let alt = if alt.is_empty() { link.url.clone() } else { alt };
                    target.push_child(embed_marker(&link.url, &alt, None));
                }
            }
            _ => {
                flush_text(&mut pending, target);
                append_inlines(child, target);
            }
        }
    }

    flush_text(&mut pending, target);
}

fn nested<'a>(pending: &mut String, target: &mut Element, tag: &str, node: &'a AstNode<'a>) {
    flush_text(pending, target);
    target.push_child(inline_element(tag, node));
}

/// Emit buffered text, turning `![[...]]` into embed markers and `[[...]]` into links.
fn flush_text(pending: &mut String, target: &mut Element) {
    if pending.is_empty() {
        return;
    }
    let text = std::mem::take(pending);
    let mut last = 0;

    for caps in wiki_pattern().captures_iter(&text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        target.push_text(&text[last..whole.start()]);
        last = whole.end();

        let mut parts = inner.as_str().split('|').map(str::trim);
        let link = parts.next().unwrap_or_default();
        let is_embed = caps.get(1).is_some_and(|bang| !bang.as_str().is_empty());

        if is_embed {
            let mut alt = None;
            let mut width = None;
            for part in parts {
                match width_pattern().captures(part).and_then(|c| c.get(1)) {
                    Some(w) => width = Some(w.as_str().to_string()),
                    None => alt = Some(part.to_string()),
                }
            }
            let alt = alt.unwrap_or_else(|| link.to_string());
            target.push_child(embed_marker(link, &alt, width));
        } else {
            let label = parts.next().unwrap_or(link);
            target.push_child(
                Element::new("a")
                    .with_class(INTERNAL_LINK_CLASS)
                    .with_attr("data-href", link)
                    .with_attr("href", link)
                    .with_text(label),
            );
        }
    }

    target.push_text(&text[last..]);
}

fn embed_marker(src: &str, alt: &str, width: Option<String>) -> Element {
    let mut el = Element::new("span")
        .with_class(EMBED_MARKER_CLASS)
        .with_attr("src", src)
        .with_attr("alt", alt);
    if let Some(width) = width {
        el.set_attr("width", width);
    }
    el
}

fn link_element(url: &str) -> Element {
    if is_external_url(url) {
        Element::new("a")
            .with_class(EXTERNAL_LINK_CLASS)
            .with_attr("href", url)
            .with_attr("target", "_blank")
            .with_attr("rel", "noopener")
    } else {
        Element::new("a")
            .with_class(INTERNAL_LINK_CLASS)
            .with_attr("data-href", url)
            .with_attr("href", url)
    }
}

fn is_external_url(url: &str) -> bool {
    url.contains("://") || url.starts_with("mailto:")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
