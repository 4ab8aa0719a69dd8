//! Column-break validation
//!
//! Walks a region's DOM objects in render order alongside the region's
//! source text. Each break object is matched to the next break tag in the
//! source, and the reporter is told what surrounds it so that breaks that
//! markdown merged into neighbouring text can be flagged.
//!
//! The position in the source is an explicit byte cursor. It only moves
//! forward, and it moves past a matched tag before that match is checked, so
//! a bad match is never examined twice.

use log::{error, warn};

use crate::columns::syntax::{contains_break_tag, find_break_tag_from};
use crate::columns::{
    break_text, ColumnBreakErrorContext, ColumnBreakReporter, DomObject, DomObjectTag,
    ElementColumnBreakType,
};

/// Characters of source shown on each side of a break.
const CONTEXT_CHARS: usize = 20;

/// Check one DOM object against the source text starting at `cursor`.
///
/// Returns the cursor to use for the next object.
pub fn validate_column_break(
    object: &DomObject,
    source: &str,
    cursor: usize,
    reporter: &mut dyn ColumnBreakReporter,
) -> usize {
    if object.tag != DomObjectTag::ColumnBreak && object.break_kind == ElementColumnBreakType::None
    {
        return cursor;
    }

    if !source.is_char_boundary(cursor) {
        error!("Column break cursor {} is outside the region text", cursor);
        return cursor;
    }
    let Some(found) = find_break_tag_from(source, cursor) else {
        error!(
            "No column break left in the region text for element {}",
            object.id
        );
        return cursor;
    };

    let tag_start = found.start;
    let tag_end = found.end;

    if object.break_kind != ElementColumnBreakType::None {
        reporter.report_column_break(ColumnBreakErrorContext {
            line_above: String::new(),
            line_below: String::new(),
            object_tag: object.tag,
            break_kind: object.break_kind,
        });
        return tag_end;
    }

    let element_text = break_text(&object.element);
    let element_text = element_text.trim();
    if !contains_break_tag(element_text) {
        warn!(
            "Element {} is marked as a column break but has no break tag",
            object.id
        );
        return tag_end;
    }

    let matched = &source[tag_start..tag_end];
    if matched != element_text {
        warn!(
            "Column break {:?} in the source does not match element text {:?}",
            matched, element_text
        );
        return tag_end;
    }

    let before = &source[chars_back(source, tag_start, CONTEXT_CHARS)..tag_start];
    let after = &source[tag_end..chars_forward(source, tag_end, CONTEXT_CHARS)];

    reporter.report_column_break(ColumnBreakErrorContext {
        line_above: line_above(before),
        line_below: line_below(after),
        object_tag: object.tag,
        break_kind: object.break_kind,
    });

    tag_end
}

/// Validate every object of a region in order. Returns the final cursor.
pub fn validate_column_breaks(
    objects: &[DomObject],
    source: &str,
    reporter: &mut dyn ColumnBreakReporter,
) -> usize {
    objects.iter().fold(0, |cursor, object| {
        validate_column_break(object, source, cursor, reporter)
    })
}

/// Byte index `count` characters before `index`, clamped to the start.
fn chars_back(text: &str, index: usize, count: usize) -> usize {
    text[..index]
        .char_indices()
        .rev()
        .nth(count - 1)
        .map_or(0, |(i, _)| i)
}

/// Byte index `count` characters after `index`, clamped to the end.
fn chars_forward(text: &str, index: usize, count: usize) -> usize {
    text[index..]
        .char_indices()
        .nth(count)
        .map_or(text.len(), |(i, _)| index + i)
}

/// The line directly above a break: the tag's own line ending is skipped.
fn line_above(before: &str) -> String {
    let before = before
        .strip_suffix('\n')
        .map(|s| s.strip_suffix('\r').unwrap_or(s))
        .unwrap_or(before);
    before.rsplit('\n').next().unwrap_or_default().trim().to_string()
}

/// The line directly below a break: the tag's own line ending is skipped.
fn line_below(after: &str) -> String {
    let after = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);
    after.split('\n').next().unwrap_or_default().trim().to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ElementRenderType;
    use crate::dom::Element;

    #[derive(Default)]
    struct RecordingReporter {
        breaks: Vec<ColumnBreakErrorContext>,
    }

    impl ColumnBreakReporter for RecordingReporter {
        fn report_column_break(&mut self, context: ColumnBreakErrorContext) {
            self.breaks.push(context);
        }

        fn report_deprecation(&mut self, _message: String) {}
    }

    fn object(id: usize, text: &str) -> DomObject {
        DomObject::new(
            id,
            Element::new("p").with_text(text),
            ElementRenderType::NormalRender,
        )
    }

    const TAG: &str = "--- column-break ---";

    #[test]
    fn test_standard_break_reports_neighbouring_lines() {
        let source = format!("text before\n{}\ntext after", TAG);
        let mut reporter = RecordingReporter::default();

        let cursor = validate_column_break(&object(0, TAG), &source, 0, &mut reporter);

        assert_eq!(cursor, "text before\n".len() + TAG.len());
        assert_eq!(reporter.breaks.len(), 1);
        assert_eq!(reporter.breaks[0].line_above, "text before");
        assert_eq!(reporter.breaks[0].line_below, "text after");
        assert_eq!(reporter.breaks[0].object_tag, DomObjectTag::ColumnBreak);
        assert_eq!(reporter.breaks[0].break_kind, ElementColumnBreakType::None);
    }

    #[test]
    fn test_blank_line_separated_break_has_empty_context() {
        let source = format!("left\n\n{}\n\nright", TAG);
        let mut reporter = RecordingReporter::default();
        validate_column_break(&object(0, TAG), &source, 0, &mut reporter);

        assert_eq!(reporter.breaks[0].line_above, "");
        assert_eq!(reporter.breaks[0].line_below, "");
    }

    #[test]
    fn test_context_is_limited_to_twenty_characters() {
        let source = format!(
            "a very long line of text before the break\n{}\nand a very long line after it",
            TAG
        );
        let mut reporter = RecordingReporter::default();
        validate_column_break(&object(0, TAG), &source, 0, &mut reporter);

        // 20 characters including the newline next to the tag
        assert_eq!(reporter.breaks[0].line_above, "xt before the break");
        assert_eq!(reporter.breaks[0].line_below, "and a very long lin");
    }

    #[test]
    fn test_context_respects_multibyte_characters() {
        let source = format!("æøå før\n{}\nétapes suivantes ici et là", TAG);
        let mut reporter = RecordingReporter::default();
        validate_column_break(&object(0, TAG), &source, 0, &mut reporter);
        assert_eq!(reporter.breaks[0].line_above, "æøå før");
    }

    #[test]
    fn test_malformed_kind_is_reported_without_text_check() {
        // Element text differs from the source tag; the kind is reported anyway
        let source = format!("intro\n{}\nrest", TAG);
        let mixed = object(3, "intro\n--- col-break ---");
        assert_eq!(mixed.break_kind, ElementColumnBreakType::PostBreak);

        let mut reporter = RecordingReporter::default();
        let cursor = validate_column_break(&mixed, &source, 0, &mut reporter);

        assert_eq!(cursor, "intro\n".len() + TAG.len());
        assert_eq!(reporter.breaks.len(), 1);
        assert_eq!(reporter.breaks[0].break_kind, ElementColumnBreakType::PostBreak);
        assert_eq!(reporter.breaks[0].object_tag, DomObjectTag::Paragraph);
        assert!(reporter.breaks[0].line_above.is_empty());
    }

    #[test]
    fn test_non_break_objects_leave_cursor_alone() {
        let mut reporter = RecordingReporter::default();
        let cursor = validate_column_break(&object(0, "plain"), TAG, 0, &mut reporter);
        assert_eq!(cursor, 0);
        assert!(reporter.breaks.is_empty());
    }

    #[test]
    fn test_missing_source_tag_keeps_cursor() {
        let mut reporter = RecordingReporter::default();
        let cursor = validate_column_break(&object(0, TAG), "no tags here", 0, &mut reporter);
        assert_eq!(cursor, 0);
        assert!(reporter.breaks.is_empty());
    }

    #[test]
    fn test_text_mismatch_consumes_tag_without_report() {
        let source = "a\n--- col-break ---\nb";
        let mut reporter = RecordingReporter::default();
        let cursor = validate_column_break(&object(0, TAG), source, 0, &mut reporter);

        assert_eq!(cursor, "a\n--- col-break ---".len());
        assert!(reporter.breaks.is_empty());
    }

    #[test]
    fn test_tags_in_code_are_not_matched() {
        let source = format!(
            "left\n\n```\n{tag}\n```\n\nUse `{tag}` here.\n\n{tag}\n\nright",
            tag = TAG
        );
        let code = DomObject::new(
            1,
            Element::new("pre").with_child(Element::new("code").with_text(TAG)),
            ElementRenderType::SpecialRender,
        );
        let inline = DomObject::new(
            2,
            Element::new("p")
                .with_text("Use ")
                .with_child(Element::new("code").with_text(TAG))
                .with_text(" here."),
            ElementRenderType::NormalRender,
        );
        let objects = vec![object(0, "left"), code, inline, object(3, TAG), object(4, "right")];

        let mut reporter = RecordingReporter::default();
        let cursor = validate_column_breaks(&objects, &source, &mut reporter);

        assert_eq!(cursor, source.rfind(TAG).unwrap() + TAG.len());
        assert_eq!(reporter.breaks.len(), 1);
        assert_eq!(reporter.breaks[0].line_above, "");
        assert_eq!(reporter.breaks[0].line_below, "");
    }

    #[test]
    fn test_breaks_are_matched_in_order() {
        let source = format!("one\n\n{tag}\ntwo\n\n{tag}\n\nthree", tag = TAG);
        let objects = vec![
            object(0, "one"),
            object(1, TAG),
            object(2, "two"),
            object(3, TAG),
            object(4, "three"),
        ];
        let mut reporter = RecordingReporter::default();
        let cursor = validate_column_breaks(&objects, &source, &mut reporter);

        assert_eq!(cursor, source.rfind(TAG).unwrap() + TAG.len());
        assert_eq!(reporter.breaks.len(), 2);
        assert_eq!(reporter.breaks[0].line_above, "");
        assert_eq!(reporter.breaks[0].line_below, "two");
        assert_eq!(reporter.breaks[1].line_above, "");
        assert_eq!(reporter.breaks[1].line_below, "");
    }
}
