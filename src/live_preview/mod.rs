//! Live preview rendering of multi-column regions
//!
//! The reading view runs post-processing steps that live preview skips, so
//! the elements a region renders to are patched here before layout:
//! - `render_type`: decides which elements need real measurement
//! - `embeds` and `unsupported`: rewrite embed markers and plugin output
//! - `validator`: matches rendered breaks against the region text
//! - `links`: keeps link clicks from navigating the editor
//! - `cache`: reuses finished regions across rebuilds
//! - `widget`: runs all of the above for one region

pub mod cache;
pub mod embeds;
pub mod links;
pub mod render_type;
pub mod unsupported;
pub mod validator;
mod widget;

pub use cache::{
    Attachable, CacheEntry, CacheKey, Clock, RenderCache, SystemClock, DEFAULT_GRACE_PERIOD,
};
pub use links::{dispatch_click, patch_external_links, ExternalOpener, SystemOpener};
pub use render_type::classify_render_type;
pub use widget::{LivePreview, MountHandle, RenderedRegion};
