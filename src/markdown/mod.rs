//! Markdown rendering into element trees
//!
//! This module turns region text into the element tree the host's reading
//! view would produce, using the comrak library, a CommonMark + GFM
//! compatible parser.
//!
//! # Features
//! - GitHub Flavored Markdown (tables, task lists, strikethrough, autolinks)
//! - `![[file]]` embeds as embed marker elements
//! - `[[Note]]` wikilinks and external links with distinct classes
//! - Output shapes of the admonition, Tasks and dice roller plugins
//!
//! # Example
//! ```ignore
//! use crate::markdown::{ComrakRenderer, MarkdownRenderer};
//!
//! let mut container = Element::new("div");
//! ComrakRenderer::default().render("# Hello", &mut container, Path::new("note.md"));
//! ```

mod renderer;

pub use renderer::{ComrakRenderer, MarkdownOptions, MarkdownRenderer};

/// Class the host puts on elements that stand for an embedded file.
pub const EMBED_MARKER_CLASS: &str = "internal-embed";

/// Class on links that leave the vault.
pub const EXTERNAL_LINK_CLASS: &str = "external-link";

/// Class on links to other notes in the vault.
pub const INTERNAL_LINK_CLASS: &str = "internal-link";
