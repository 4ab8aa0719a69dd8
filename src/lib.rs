//! colflow - multi-column markdown regions for live preview
//!
//! Renders `start-multi-column` regions of a markdown note into column
//! layouts, patching embeds and links the way an editor's live preview needs
//! them and reporting malformed column breaks without failing the render.

pub mod columns;
pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod live_preview;
pub mod markdown;
pub mod vault;
