//! Column syntax recognition
//!
//! Matches the tags that delimit multi-column regions and column breaks, and
//! splits a note into the regions it declares.

use std::ops::Range;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::ElementColumnBreakType;

/// Fence tags that open a region's settings block.
const SETTINGS_FENCE_TAGS: &[&str] = &["column-settings", "multi-column-settings", "settings"];

fn break_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:---|===) *(?:column|col)[- ]?(break|end) *(?:---|===)|\\(?:column|col)break",
        )
        .expect("column break pattern is valid")
    })
}

fn start_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(---|===) *start-multi-column(?: *:? *(.*))?$")
            .expect("region start pattern is valid")
    })
}

fn end_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(---|===) *end-multi-column\b").expect("region end pattern is valid")
    })
}

/// The pattern for every accepted column-break tag.
pub fn column_break_pattern() -> &'static Regex {
    break_tag_regex()
}

/// Byte range of the first column-break tag starting at or after `from`.
///
/// Tags inside fenced code blocks and inline code spans are skipped: they
/// render as code and never become break elements.
pub fn find_break_tag_from(text: &str, from: usize) -> Option<Range<usize>> {
    let code = code_ranges(text);
    break_tag_regex()
        .find_iter(text)
        .map(|m| m.range())
        .filter(|tag| tag.start >= from)
        .find(|tag| !code.iter().any(|c| c.start < tag.end && tag.start < c.end))
}

pub fn contains_break_tag(text: &str) -> bool {
    break_tag_regex().is_match(text)
}

// ─────────────────────────────────────────────────────────────────────────────
// Code Spans
// ─────────────────────────────────────────────────────────────────────────────

/// Byte ranges of fenced code blocks and inline code spans in `text`.
///
/// An unclosed fence runs to the end of the text. Backtick runs without a
/// matching closing run in the same paragraph are literal text.
pub fn code_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut prose_start = 0;
    // (marker, run length, block start)
    let mut fence: Option<(u8, usize, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        match fence {
            Some((marker, len, start)) => {
                if fence_run(content).is_some_and(|(m, l, rest)| {
                    m == marker && l >= len && rest.trim().is_empty()
                }) {
                    ranges.push(start..offset);
                    fence = None;
                    prose_start = offset;
                }
            }
            None => {
                if let Some((marker, len, info)) = fence_run(content) {
                    if marker == b'`' && info.contains('`') {
                        continue;
                    }
                    inline_code_ranges(text, prose_start..line_start, &mut ranges);
                    fence = Some((marker, len, line_start));
                }
            }
        }
    }

    match fence {
        Some((_, _, start)) => ranges.push(start..text.len()),
        None => inline_code_ranges(text, prose_start..text.len(), &mut ranges),
    }
    ranges
}

/// A fence line: marker byte, run length and the rest of the line.
fn fence_run(line: &str) -> Option<(u8, usize, &str)> {
    let rest = line.trim_start_matches(' ');
    if line.len() - rest.len() > 3 {
        return None;
    }
    let marker = *rest.as_bytes().first().filter(|b| **b == b'`' || **b == b'~')?;
    let len = rest.bytes().take_while(|b| *b == marker).count();
    (len >= 3).then(|| (marker, len, &rest[len..]))
}

fn inline_code_ranges(text: &str, prose: Range<usize>, ranges: &mut Vec<Range<usize>>) {
    let bytes = text.as_bytes();
    let mut i = prose.start;

    while i < prose.end {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let open_start = i;
                while i < prose.end && bytes[i] == b'`' {
                    i += 1;
                }
                if let Some(close_end) = closing_run(bytes, i, prose.end, i - open_start) {
                    ranges.push(open_start..close_end);
                    i = close_end;
                }
            }
            _ => i += 1,
        }
    }
}

/// End of the first backtick run of exactly `run` characters, stopping at a blank line.
fn closing_run(bytes: &[u8], from: usize, end: usize, run: usize) -> Option<usize> {
    let mut i = from;
    while i < end {
        match bytes[i] {
            b'`' => {
                let start = i;
                while i < end && bytes[i] == b'`' {
                    i += 1;
                }
                if i - start == run {
                    return Some(i);
                }
            }
            b'\n' => {
                i += 1;
                let blank = bytes[i..end]
                    .iter()
                    .find(|b| !matches!(**b, b' ' | b'\t' | b'\r'))
                    .map_or(true, |b| *b == b'\n');
                if blank {
                    return None;
                }
            }
            _ => i += 1,
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Element Break Classification
// ─────────────────────────────────────────────────────────────────────────────

/// How a column-break tag sits inside one rendered element's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPlacement {
    pub kind: ElementColumnBreakType,
    /// The tag uses the legacy `column-end` spelling
    pub deprecated: bool,
}

/// Locate a break tag in an element's text and classify its placement.
///
/// Returns `None` when the text has no break tag. A tag that is the whole
/// trimmed text is a standard break (`ElementColumnBreakType::None`).
pub fn classify_break_text(text: &str) -> Option<BreakPlacement> {
    let trimmed = text.trim();
    let caps = break_tag_regex().captures(trimmed)?;
    let whole = caps.get(0)?;

    let deprecated = caps
        .get(1)
        .is_some_and(|word| word.as_str().eq_ignore_ascii_case("end"));

    let before = trimmed[..whole.start()].trim();
    let after = trimmed[whole.end()..].trim();

    let kind = match (before.is_empty(), after.is_empty()) {
        (true, true) => ElementColumnBreakType::None,
        (true, false) => ElementColumnBreakType::PreBreak,
        (false, true) => ElementColumnBreakType::PostBreak,
        (false, false) => ElementColumnBreakType::MidBreak,
    };

    Some(BreakPlacement { kind, deprecated })
}

// ─────────────────────────────────────────────────────────────────────────────
// Region Discovery
// ─────────────────────────────────────────────────────────────────────────────

/// One multi-column region declared in a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSource {
    /// Region id from the start tag, or a generated `region-<line>` id
    pub id: String,
    /// Body of the settings block (without fences), empty when absent
    pub settings_text: String,
    /// Text laid out in columns: everything between the settings block and the end tag
    pub content: String,
    /// Full text of the region including its tags, used for cache identity
    pub raw: String,
    /// 1-indexed line of the start tag
    pub start_line: usize,
    /// The region was opened or closed with the legacy `===` tags
    pub legacy_syntax: bool,
}

/// Split `document` into the regions it declares.
///
/// A region without an end tag runs to the end of the document.
pub fn find_regions(document: &str) -> Vec<RegionSource> {
    let lines = line_spans(document);
    let mut regions = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let (line_start, line_end) = lines[index];
        let line = document[line_start..line_end].trim();

        let Some(caps) = start_tag_regex().captures(line) else {
            index += 1;
            continue;
        };

        let start_line = index + 1;
        let mut legacy_syntax = &caps[1] == "===";
        let id = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("region-{}", start_line));

        index += 1;

        // Optional settings fence right after the start tag
        let mut settings_text = String::new();
        if let Some(&(s, e)) = lines.get(index) {
            if is_settings_fence(&document[s..e]) {
                let body_start = lines.get(index + 1).map_or(document.len(), |l| l.0);
                let mut body_end = document.len();
                index += 1;
                while let Some(&(s, e)) = lines.get(index) {
                    index += 1;
                    if document[s..e].trim_start().starts_with("```") {
                        body_end = s;
                        break;
                    }
                }
                settings_text = document[body_start..body_end.max(body_start)].to_string();
            }
        }

        let content_start = lines.get(index).map_or(document.len(), |l| l.0);
        let mut content_end = document.len();
        let mut region_end = document.len();
        while let Some(&(s, e)) = lines.get(index) {
            index += 1;
            if let Some(end) = end_tag_regex().captures(document[s..e].trim()) {
                legacy_syntax |= &end[1] == "===";
                content_end = s;
                region_end = e;
                break;
            }
        }

        let content = document[content_start..content_end.max(content_start)]
            .trim_end_matches(['\n', '\r'])
            .to_string();

        debug!(
            "Found region '{}' at line {} ({} bytes of content)",
            id,
            start_line,
            content.len()
        );

        regions.push(RegionSource {
            id,
            settings_text,
            content,
            raw: document[line_start..region_end].to_string(),
            start_line,
            legacy_syntax,
        });
    }

    regions
}

fn is_settings_fence(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed
        .strip_prefix("```")
        .map(|tag| SETTINGS_FENCE_TAGS.iter().any(|t| tag.trim().eq_ignore_ascii_case(t)))
        .unwrap_or(false)
}

/// `(start, end)` byte spans of each line, excluding the line terminator.
fn line_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        spans.push((start, start + content.len()));
        start += line.len();
    }
    spans
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_tag_variants() {
        for tag in [
            "--- column-break ---",
            "--- col-break ---",
            "--- Column Break ---",
            "=== columnbreak ===",
            "\\columnbreak",
            "--- column-end ---",
        ] {
            assert!(contains_break_tag(tag), "{} should match", tag);
        }
        assert!(!contains_break_tag("--- end-multi-column"));
        assert!(!contains_break_tag("---"));
    }

    #[test]
    fn test_code_ranges_cover_fences_and_spans() {
        let text = "a `x` b\n```\ncode\n```\nafter ``y ` z``\n~~~~\nopen";
        let ranges = code_ranges(text);
        let spans: Vec<&str> = ranges.iter().map(|r| &text[r.clone()]).collect();
        assert_eq!(
            spans,
            vec!["`x`", "```\ncode\n```\n", "``y ` z``", "~~~~\nopen"]
        );
    }

    #[test]
    fn test_unmatched_backticks_are_literal() {
        assert!(code_ranges("a ` b\n\nc ` d").is_empty());
        assert!(code_ranges("``` not a fence ` ```").len() == 1);
    }

    #[test]
    fn test_find_break_tag_skips_code() {
        let tag = "--- column-break ---";
        let text = format!("```\n{tag}\n```\n`{tag}`\n\n{tag}\n", tag = tag);
        let found = find_break_tag_from(&text, 0).unwrap();
        assert_eq!(found.start, text.rfind(tag).unwrap());
        assert!(find_break_tag_from(&text, found.end).is_none());
    }

    #[test]
    fn test_classify_standard_break() {
        let placement = classify_break_text("  --- column-break ---\n").unwrap();
        assert_eq!(placement.kind, ElementColumnBreakType::None);
        assert!(!placement.deprecated);
    }

    #[test]
    fn test_classify_break_placements() {
        let pre = classify_break_text("--- column-break ---\nafter").unwrap();
        assert_eq!(pre.kind, ElementColumnBreakType::PreBreak);

        let post = classify_break_text("before\n--- column-break ---").unwrap();
        assert_eq!(post.kind, ElementColumnBreakType::PostBreak);

        let mid = classify_break_text("before\n--- column-break ---\nafter").unwrap();
        assert_eq!(mid.kind, ElementColumnBreakType::MidBreak);

        assert!(classify_break_text("no break here").is_none());
    }

    #[test]
    fn test_classify_deprecated_end_tag() {
        let placement = classify_break_text("--- column-end ---").unwrap();
        assert!(placement.deprecated);
    }

    #[test]
    fn test_find_regions_with_settings() {
        let doc = "# Title\n\n--- start-multi-column: Intro\n```column-settings\nNumber of Columns: 3\n```\nleft\n\n--- column-break ---\n\nright\n--- end-multi-column\n\nafter";
        let regions = find_regions(doc);
        assert_eq!(regions.len(), 1);

        let region = &regions[0];
        assert_eq!(region.id, "Intro");
        assert_eq!(region.start_line, 3);
        assert_eq!(region.settings_text, "Number of Columns: 3\n");
        assert_eq!(region.content, "left\n\n--- column-break ---\n\nright");
        assert!(region.raw.starts_with("--- start-multi-column: Intro"));
        assert!(region.raw.ends_with("--- end-multi-column"));
        assert!(!region.legacy_syntax);
    }

    #[test]
    fn test_find_regions_without_end_tag_or_id() {
        let doc = "--- start-multi-column\none\n--- column-break ---\ntwo\n";
        let regions = find_regions(doc);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id, "region-1");
        assert_eq!(regions[0].content, "one\n--- column-break ---\ntwo");
        assert!(regions[0].settings_text.is_empty());
    }

    #[test]
    fn test_find_regions_legacy_tags() {
        let doc = "=== start-multi-column: Old\ntext\n=== end-multi-column\n--- start-multi-column: New\nmore\n--- end-multi-column";
        let regions = find_regions(doc);
        assert_eq!(regions.len(), 2);
        assert!(regions[0].legacy_syntax);
        assert!(!regions[1].legacy_syntax);
        assert_eq!(regions[1].content, "more");
    }
}
