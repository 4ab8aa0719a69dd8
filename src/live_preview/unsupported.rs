//! Replacement for plugin output that cannot work in live preview.
//!
//! Only the Tasks plugin is replaced. Output from other plugins is passed
//! through untouched.

use log::debug;

use crate::dom::Element;

/// Classes the Tasks plugin puts on its rendered query results.
const TASKS_PLUGIN_CLASSES: &[&str] = &["block-language-tasks", "plugin-tasks-query-result"];

const UNSUPPORTED_TASKS_MESSAGE: &str =
    "The Tasks plugin is not supported in Live Preview.\nPlease use reading mode.";

pub fn is_tasks_plugin_output(element: &Element) -> bool {
    TASKS_PLUGIN_CLASSES
        .iter()
        .any(|class| element.contains_class(class))
}

/// Replace Tasks plugin output with an inline warning.
pub fn patch_unsupported_render(element: Element) -> Element {
    if !is_tasks_plugin_output(&element) {
        return element;
    }
    debug!("Replacing Tasks plugin output with a warning");
    Element::new("div")
        .with_class("mcm-unsupported-render")
        .with_child(Element::new("p").with_text(UNSUPPORTED_TASKS_MESSAGE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_output_is_replaced() {
        let tasks = Element::new("div").with_class("block-language-tasks").with_child(
            Element::new("ul")
                .with_class("plugin-tasks-query-result")
                .with_child(Element::new("li").with_text("task")),
        );
        let patched = patch_unsupported_render(tasks);
        assert!(patched.has_class("mcm-unsupported-render"));
        assert!(patched.text_content().contains("Tasks plugin is not supported"));
    }

    #[test]
    fn test_other_content_passes_through() {
        let list = Element::new("ul")
            .with_class("contains-task-list")
            .with_child(Element::new("li").with_class("task-list-item"));
        assert_eq!(patch_unsupported_render(list.clone()), list);
    }
}
