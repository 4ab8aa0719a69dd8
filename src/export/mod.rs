//! Document export for colflow
//!
//! Turns a note into a standalone HTML page with its multi-column regions
//! rendered the way live preview shows them.

pub mod html;

pub use html::{generate_html_document, render_note_body, write_html_file};
