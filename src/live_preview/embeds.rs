//! Embed patchers
//!
//! The reading view leaves embeds as bare marker elements that its own
//! post-processing fills in later. Live preview never runs that step, so each
//! patcher here rewrites one kind of marker into the finished shape.
//!
//! Every patcher takes the element by value and returns either the same
//! element untouched or a replacement. A reference that cannot be resolved
//! is not an error: the element simply is not an embed of that kind.

use std::path::Path;

use log::debug;

use super::unsupported::patch_unsupported_render;
use crate::dom::Element;
use crate::markdown::EMBED_MARKER_CLASS;
use crate::vault::{FileHandle, FileResolver};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "svg", "webp"];
const PDF_EXTENSION: &str = "pdf";
const NOTE_EXTENSION: &str = "md";

const UNSUPPORTED_FILE_EMBED_MESSAGE: &str =
    "File embeds are not supported in Live Preview.\nPlease use reading mode to view.";

/// A marker that resolved to a file in the vault.
struct ResolvedEmbed {
    src: String,
    alt: Option<String>,
    width: Option<String>,
    file: FileHandle,
}

/// Find the element's single embed marker and resolve its `src`.
///
/// The marker is either the element itself or its only marked descendant.
fn resolve_embed(
    element: &Element,
    source_path: &Path,
    resolver: &dyn FileResolver,
) -> Option<ResolvedEmbed> {
    let marker = if element.has_class(EMBED_MARKER_CLASS) {
        element
    } else {
        match element.find_all_by_class(EMBED_MARKER_CLASS).as_slice() {
            [only] => *only,
            _ => return None,
        }
    };

    let src = marker.attr("src")?;
    let file = resolver.resolve_link(src, source_path)?;
    Some(ResolvedEmbed {
        src: src.to_string(),
        alt: marker.attr("alt").map(str::to_string),
        width: marker.attr("width").map(str::to_string),
        file,
    })
}

/// Container every patched embed sits in, carrying the marker's attributes.
fn embed_container(embed: &ResolvedEmbed, kind_classes: &str) -> Element {
    let mut container = Element::new("div")
        .with_class(EMBED_MARKER_CLASS)
        .with_class(kind_classes)
        .with_class("is-loaded")
        .with_attr("src", embed.src.clone());
    if let Some(alt) = &embed.alt {
        container.set_attr("alt", alt.clone());
    }
    container
}

// ─────────────────────────────────────────────────────────────────────────────
// Patchers
// ─────────────────────────────────────────────────────────────────────────────

/// Replace an image embed marker with an image pointing at the resolved file.
pub fn patch_image_embed(
    element: Element,
    source_path: &Path,
    resolver: &dyn FileResolver,
) -> Element {
    let Some(embed) = resolve_embed(&element, source_path, resolver) else {
        return element;
    };
    if !IMAGE_EXTENSIONS.contains(&embed.file.extension().as_str()) {
        return element;
    }

    let mut img = Element::new("img").with_attr("src", resolver.resource_path(&embed.file));
    if let Some(alt) = &embed.alt {
        img.set_attr("alt", alt.clone());
    }
    if let Some(width) = &embed.width {
        img.set_attr("width", width.clone());
    }

    debug!("Patched image embed {}", embed.src);
    embed_container(&embed, "media-embed image-embed").with_child(img)
}

/// Replace a PDF embed marker with an embedded viewer frame.
pub fn patch_pdf_embed(
    element: Element,
    source_path: &Path,
    resolver: &dyn FileResolver,
) -> Element {
    let Some(embed) = resolve_embed(&element, source_path, resolver) else {
        return element;
    };
    if embed.file.extension() != PDF_EXTENSION {
        return element;
    }

    // Keep `#page=N` style fragments so the viewer opens at the right page
    let mut frame_src = resolver.resource_path(&embed.file);
    if let Some((_, fragment)) = embed.src.split_once('#') {
        frame_src.push('#');
        frame_src.push_str(fragment);
    }

    debug!("Patched pdf embed {}", embed.src);
    embed_container(&embed, "pdf-embed").with_child(
        Element::new("iframe")
            .with_class("pdf-embed-frame")
            .with_attr("src", frame_src),
    )
}

/// Replace a note embed with a placeholder; note transclusion needs reading mode.
pub fn patch_file_embed(
    element: Element,
    source_path: &Path,
    resolver: &dyn FileResolver,
) -> Element {
    let Some(embed) = resolve_embed(&element, source_path, resolver) else {
        return element;
    };
    if embed.file.extension() != NOTE_EXTENSION {
        return element;
    }

    debug!("Replaced unsupported file embed {}", embed.src);
    embed_container(&embed, "markdown-embed inline-embed").with_child(
        Element::new("div")
            .with_class("mcm-unsupported-embed")
            .with_text(UNSUPPORTED_FILE_EMBED_MESSAGE),
    )
}

/// Wrap a bare table in the container live preview styles tables with.
pub fn patch_table(element: Element) -> Element {
    if element.tag() != "table" {
        return element;
    }
    Element::new("div")
        .with_class("cm-embed-block markdown-rendered cm-table-widget show-indentation-guide")
        .with_child(
            Element::new("div")
                .with_class("table-wrapper")
                .with_child(element),
        )
}

/// Run every patcher over one element, in order, each on the previous result.
pub fn patch_element(
    element: Element,
    source_path: &Path,
    resolver: &dyn FileResolver,
) -> Element {
    let element = patch_image_embed(element, source_path, resolver);
    let element = patch_pdf_embed(element, source_path, resolver);
    let element = patch_file_embed(element, source_path, resolver);
    let element = patch_table(element);
    patch_unsupported_render(element)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
