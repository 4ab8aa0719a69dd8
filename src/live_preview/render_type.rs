//! Render-type classification.
//!
//! Content from plugins this crate does not know about is classified as
//! `SpecialRender`: it is measured instead of estimated. Adding a plugin to
//! the fast path means adding its marker class here explicitly.

use crate::columns::ElementRenderType;
use crate::dom::Element;

/// Marker class of the dice roller plugin. Its output changes on every roll.
const DICE_ROLLER_CLASS: &str = "dice-roller";

/// Marker class of the admonition plugin.
const ADMONITION_CLASS: &str = "admonition";

/// Outer tags whose content is plain enough to estimate.
const NORMAL_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "ul", "ol"];

/// Choose the render strategy for one rendered element.
///
/// The plugin checks run before the tag check: plugin output can sit inside
/// an ordinary paragraph or list.
pub fn classify_render_type(element: &Element) -> ElementRenderType {
    if element.contains_class(DICE_ROLLER_CLASS) {
        return ElementRenderType::SpecialRender;
    }
    if element.contains_class(ADMONITION_CLASS) {
        return ElementRenderType::NormalRender;
    }
    if NORMAL_TAGS.contains(&element.tag()) {
        return ElementRenderType::NormalRender;
    }
    ElementRenderType::SpecialRender
}
