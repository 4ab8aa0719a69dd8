//! Multi-column regions
//!
//! This module owns everything the layout side of the live preview needs:
//! - Column syntax recognition and region discovery in a note
//! - Per-region settings parsed from the settings block
//! - DOM objects, the typed units a region is laid out from
//! - Region managers that place DOM objects into columns
//! - The error manager that collects user-facing column-break warnings

mod errors;
mod region_manager;
mod settings;
pub mod syntax;

pub use errors::{ColumnBreakErrorContext, ColumnBreakReporter, ErrorManager};
pub use region_manager::{
    estimate_height, MeasurementHost, RegionData, RegionManager, ScratchMount,
};
pub use settings::{LayoutKind, RegionSettings};
pub use syntax::{find_regions, RegionSource};

use crate::dom::Element;
use crate::markdown::EMBED_MARKER_CLASS;

/// Tags whose text is shown literally and never holds a column break.
pub const CODE_TAGS: &[&str] = &["pre", "code"];

/// Stands in for code while looking for breaks, so code still counts as content.
const CODE_PLACEHOLDER: &str = "\u{FFFC}";

/// Text of `element` that column-break syntax is looked for in.
pub fn break_text(element: &Element) -> String {
    if CODE_TAGS.contains(&element.tag()) {
        return CODE_PLACEHOLDER.to_string();
    }
    element.text_content_outside(CODE_TAGS, CODE_PLACEHOLDER)
}

// ─────────────────────────────────────────────────────────────────────────────
// Element Classification Types
// ─────────────────────────────────────────────────────────────────────────────

/// Structural role of a DOM object within a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomObjectTag {
    #[default]
    None,
    ColumnBreak,
    Header,
    Paragraph,
    List,
    Embed,
    Table,
}

impl DomObjectTag {
    /// Human readable name used in warnings.
    pub fn label(&self) -> &'static str {
        match self {
            DomObjectTag::None => "block",
            DomObjectTag::ColumnBreak => "column break",
            DomObjectTag::Header => "header",
            DomObjectTag::Paragraph => "paragraph",
            DomObjectTag::List => "list",
            DomObjectTag::Embed => "embed",
            DomObjectTag::Table => "table",
        }
    }

    /// Structural role implied by an element's shape.
    pub fn for_element(element: &Element) -> Self {
        if element.has_class(EMBED_MARKER_CLASS) {
            return DomObjectTag::Embed;
        }
        match element.tag() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => DomObjectTag::Header,
            "ul" | "ol" => DomObjectTag::List,
            "table" => DomObjectTag::Table,
            "p" if element.contains_class(EMBED_MARKER_CLASS) || element.contains_tag("img") => {
                DomObjectTag::Embed
            }
            "p" => DomObjectTag::Paragraph,
            "div" if element.contains_tag("table") => DomObjectTag::Table,
            _ => DomObjectTag::None,
        }
    }
}

/// Where a column-break tag sits inside an element that is not a bare break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementColumnBreakType {
    /// No malformation: either no break at all, or the element is exactly a break tag
    #[default]
    None,
    /// The tag opens the element and content follows it
    PreBreak,
    /// Content precedes the tag, which closes the element
    PostBreak,
    /// The tag sits between content on both sides
    MidBreak,
}

/// Render strategy hint consumed by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementRenderType {
    #[default]
    Undetermined,
    /// Simple content that can skip extra measurement work
    NormalRender,
    /// Dynamic or unknown content that must be measured
    SpecialRender,
}

// ─────────────────────────────────────────────────────────────────────────────
// DOM Object
// ─────────────────────────────────────────────────────────────────────────────

/// One top-level rendered child of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct DomObject {
    /// Position of the element in render order
    pub id: usize,
    pub element: Element,
    pub tag: DomObjectTag,
    pub break_kind: ElementColumnBreakType,
    pub render_type: ElementRenderType,
    /// The element's break tag uses the legacy `column-end` spelling
    pub uses_deprecated_break: bool,
}

impl DomObject {
    /// Classify a rendered element and wrap it.
    ///
    /// Code blocks and inline code are never treated as breaks so that notes
    /// can show the break syntax itself.
    pub fn new(id: usize, element: Element, render_type: ElementRenderType) -> Self {
        let structural = DomObjectTag::for_element(&element);
        let placement = syntax::classify_break_text(&break_text(&element));

        let (tag, break_kind, uses_deprecated_break) = match placement {
            Some(p) if p.kind == ElementColumnBreakType::None => {
                (DomObjectTag::ColumnBreak, p.kind, p.deprecated)
            }
            Some(p) => (structural, p.kind, p.deprecated),
            None => (structural, ElementColumnBreakType::None, false),
        };

        Self {
            id,
            element,
            tag,
            break_kind,
            render_type,
            uses_deprecated_break,
        }
    }

    /// Whether this object affects column placement at all.
    pub fn is_break(&self) -> bool {
        self.tag == DomObjectTag::ColumnBreak || self.break_kind != ElementColumnBreakType::None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(text: &str) -> Element {
        Element::new("p").with_text(text)
    }

    #[test]
    fn test_bare_break_is_column_break() {
        let obj = DomObject::new(
            0,
            paragraph("--- column-break ---"),
            ElementRenderType::NormalRender,
        );
        assert_eq!(obj.tag, DomObjectTag::ColumnBreak);
        assert_eq!(obj.break_kind, ElementColumnBreakType::None);
        assert!(obj.is_break());
    }

    #[test]
    fn test_mixed_break_keeps_structural_tag() {
        let obj = DomObject::new(
            1,
            paragraph("text\n--- column-break ---"),
            ElementRenderType::NormalRender,
        );
        assert_eq!(obj.tag, DomObjectTag::Paragraph);
        assert_eq!(obj.break_kind, ElementColumnBreakType::PostBreak);
        assert!(obj.is_break());
    }

    #[test]
    fn test_plain_elements_are_not_breaks() {
        let heading = DomObject::new(
            0,
            Element::new("h2").with_text("Title"),
            ElementRenderType::NormalRender,
        );
        assert_eq!(heading.tag, DomObjectTag::Header);
        assert!(!heading.is_break());

        let list = DomObject::new(
            1,
            Element::new("ul").with_child(Element::new("li").with_text("a")),
            ElementRenderType::NormalRender,
        );
        assert_eq!(list.tag, DomObjectTag::List);
    }

    #[test]
    fn test_code_blocks_are_never_breaks() {
        let code = Element::new("pre")
            .with_child(Element::new("code").with_text("--- column-break ---"));
        let obj = DomObject::new(0, code, ElementRenderType::SpecialRender);
        assert!(!obj.is_break());
    }

    #[test]
    fn test_inline_code_is_never_a_break() {
        let el = Element::new("p")
            .with_text("Write ")
            .with_child(Element::new("code").with_text("--- column-break ---"))
            .with_text(" to split.");
        let obj = DomObject::new(0, el, ElementRenderType::NormalRender);
        assert_eq!(obj.tag, DomObjectTag::Paragraph);
        assert!(!obj.is_break());
    }

    #[test]
    fn test_break_after_inline_code_closes_the_paragraph() {
        let el = Element::new("p")
            .with_child(Element::new("code").with_text("--- column-break ---"))
            .with_text("\n--- column-break ---");
        let obj = DomObject::new(0, el, ElementRenderType::NormalRender);
        assert_eq!(obj.tag, DomObjectTag::Paragraph);
        assert_eq!(obj.break_kind, ElementColumnBreakType::PostBreak);
    }

    #[test]
    fn test_embed_paragraph_tag() {
        let el = Element::new("p").with_child(
            Element::new("span")
                .with_class(EMBED_MARKER_CLASS)
                .with_attr("src", "a.png"),
        );
        assert_eq!(DomObjectTag::for_element(&el), DomObjectTag::Embed);
    }
}
