//! HTML page generation
//!
//! Builds a standalone HTML document for a note: text outside multi-column
//! regions goes through comrak's HTML renderer, regions are replaced by the
//! live preview widgets built for them.

use std::fs;
use std::path::Path;

use comrak::{markdown_to_html, Options};
use log::{debug, info};

use crate::columns::find_regions;
use crate::error::{Error, Result};
use crate::live_preview::{Clock, LivePreview};

// ─────────────────────────────────────────────────────────────────────────────
// Note Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Render the body of `document` to HTML, one widget per region.
pub fn render_note_body<C: Clock>(
    document: &str,
    source_path: &Path,
    preview: &mut LivePreview<C>,
) -> String {
    let mut body = String::new();
    let mut cursor = 0;

    for region in find_regions(document) {
        let Some(offset) = document[cursor..].find(&region.raw) else {
            continue;
        };
        let start = cursor + offset;
        body.push_str(&markdown_to_html_body(&document[cursor..start]));

        let rendered = preview.render_region(&region, source_path);
        body.push_str(&rendered.root.to_html());
        body.push('\n');

        cursor = start + region.raw.len();
    }
    body.push_str(&markdown_to_html_body(&document[cursor..]));
    body
}

/// Convert markdown outside any region to HTML.
fn markdown_to_html_body(markdown: &str) -> String {
    if markdown.trim().is_empty() {
        return String::new();
    }

    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    markdown_to_html(markdown, &options)
}

// ─────────────────────────────────────────────────────────────────────────────
// Documents
// ─────────────────────────────────────────────────────────────────────────────

/// Wrap a rendered body in a complete HTML document.
pub fn generate_html_document(body: &str, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="colflow">
    <title>{title}</title>
</head>
<body>
    <article class="markdown-rendered">
{body}
    </article>
</body>
</html>
"#,
        title = html_escape(title),
        body = body,
    )
}

/// Write a finished document to `output_path`.
pub fn write_html_file(output_path: &Path, html: &str) -> Result<()> {
    debug!("Writing {} bytes to {}", html.len(), output_path.display());
    fs::write(output_path, html).map_err(|source| Error::FileWrite {
        path: output_path.to_path_buf(),
        source,
    })?;
    info!("Wrote {}", output_path.display());
    Ok(())
}

/// HTML-escape a string.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
