//! User-facing column-break warnings.

use log::{debug, warn};

use super::{DomObjectTag, ElementColumnBreakType};
use crate::dom::Element;

/// Context for one column break, handed to the reporter and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBreakErrorContext {
    /// Last line of text directly above the break
    pub line_above: String,
    /// First line of text directly below the break
    pub line_below: String,
    pub object_tag: DomObjectTag,
    pub break_kind: ElementColumnBreakType,
}

/// Receiver for column-break diagnostics produced while validating a region.
pub trait ColumnBreakReporter {
    fn report_column_break(&mut self, context: ColumnBreakErrorContext);

    /// Notice about syntax that still works but is on its way out.
    fn report_deprecation(&mut self, message: String);
}

/// Collects warnings for one region and renders them into the region root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorManager {
    region_key: String,
    warnings: Vec<String>,
}

impl ErrorManager {
    pub fn new(region_key: impl Into<String>) -> Self {
        Self {
            region_key: region_key.into(),
            warnings: Vec::new(),
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn push(&mut self, message: String) {
        warn!("[{}] {}", self.region_key, message);
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    /// Prepend an error box listing every warning to `root`. No-op when clean.
    pub fn render_into(&self, root: &mut Element) {
        if self.warnings.is_empty() {
            return;
        }

        let heading = if self.warnings.len() == 1 {
            format!("Region '{}' has 1 issue", self.region_key)
        } else {
            format!(
                "Region '{}' has {} issues",
                self.region_key,
                self.warnings.len()
            )
        };

        let mut list = Element::new("ul").with_class("mcm-error-list");
        for message in &self.warnings {
            list.push_child(Element::new("li").with_text(message.clone()));
        }

        let error_box = Element::new("div")
            .with_class("mcm-error-box")
            .with_child(Element::new("div").with_class("mcm-error-heading").with_text(heading))
            .with_child(list);
        root.insert_child(0, error_box);
    }
}

impl ColumnBreakReporter for ErrorManager {
    fn report_column_break(&mut self, context: ColumnBreakErrorContext) {
        let tag = context.object_tag.label();
        let message = match context.break_kind {
            ElementColumnBreakType::None => {
                let above = context.line_above.trim();
                let below = context.line_below.trim();
                if above.is_empty() && below.is_empty() {
                    debug!("[{}] Column break is well formed", self.region_key);
                    return;
                }
                let mut message = String::from(
                    "A column break is not separated from the surrounding text by blank lines and may not split the columns.",
                );
                if !above.is_empty() {
                    message.push_str(&format!(" Text above: \"{}\".", above));
                }
                if !below.is_empty() {
                    message.push_str(&format!(" Text below: \"{}\".", below));
                }
                message
            }
            ElementColumnBreakType::PreBreak => format!(
                "A column break opens a {}; the rest of it was moved to the next column. Put the break on its own line followed by a blank line.",
                tag
            ),
            ElementColumnBreakType::PostBreak => format!(
                "A column break closes a {}; the next column starts after it. Put the break on its own line preceded by a blank line.",
                tag
            ),
            ElementColumnBreakType::MidBreak => format!(
                "A column break sits in the middle of a {}, which was kept whole in one column. Put the break on its own line surrounded by blank lines.",
                tag
            ),
        };
        self.push(message);
    }

    fn report_deprecation(&mut self, message: String) {
        self.push(message);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
