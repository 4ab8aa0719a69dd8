//! Live preview widget construction
//!
//! Composes the pipeline for one region: render the region text, classify and
//! patch every top-level element, build DOM objects, validate column breaks,
//! lay the objects out into columns, then patch links and cache the result.
//!
//! Steps run strictly in document order and the layout engine only sees the
//! objects after validation has finished with all of them.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info};

use super::cache::{Attachable, CacheKey, Clock, RenderCache, SystemClock};
use super::embeds::patch_element;
use super::links::patch_external_links;
use super::render_type::classify_render_type;
use super::validator::validate_column_breaks;
use crate::columns::{
    ColumnBreakReporter, DomObject, ErrorManager, MeasurementHost, RegionData, RegionManager,
    RegionSettings, RegionSource,
};
use crate::config::Settings;
use crate::dom::{Element, Node};
use crate::markdown::MarkdownRenderer;
use crate::vault::FileResolver;

const LEGACY_REGION_NOTICE: &str =
    "The '===' region tags are deprecated. Use '--- start-multi-column' and '--- end-multi-column' instead.";
const LEGACY_BREAK_NOTICE: &str =
    "'column-end' is deprecated as a column break. Use '--- column-break ---' instead.";

// ─────────────────────────────────────────────────────────────────────────────
// Rendered Region
// ─────────────────────────────────────────────────────────────────────────────

/// Shared flag the host flips when a rendered region enters or leaves the view.
///
/// Clones share the same flag, so the copy held by the cache sees what the
/// host does with the copy it was handed.
#[derive(Debug, Clone, Default)]
pub struct MountHandle(Rc<Cell<bool>>);

impl MountHandle {
    pub fn attach(&self) {
        self.0.set(true);
    }

    pub fn detach(&self) {
        self.0.set(false);
    }

    pub fn is_mounted(&self) -> bool {
        self.0.get()
    }
}

/// A finished region, ready to be placed in the document.
#[derive(Debug, Clone)]
pub struct RenderedRegion {
    pub root: Element,
    pub warnings: Vec<String>,
    mount: MountHandle,
}

impl RenderedRegion {
    pub fn mount_handle(&self) -> &MountHandle {
        &self.mount
    }
}

impl Attachable for RenderedRegion {
    fn is_attached(&self) -> bool {
        self.mount.is_mounted()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Live Preview
// ─────────────────────────────────────────────────────────────────────────────

/// Builds live preview widgets for multi-column regions.
pub struct LivePreview<C: Clock = SystemClock> {
    renderer: Box<dyn MarkdownRenderer>,
    resolver: Box<dyn FileResolver>,
    measurement_host: Option<Box<dyn MeasurementHost>>,
    settings: Settings,
    cache: RenderCache<RenderedRegion, C>,
}

impl LivePreview<SystemClock> {
    pub fn new(
        renderer: Box<dyn MarkdownRenderer>,
        resolver: Box<dyn FileResolver>,
        settings: Settings,
    ) -> Self {
        let grace_period = Duration::from_secs(settings.cache_grace_period_secs);
        Self::with_cache(renderer, resolver, settings, RenderCache::new(grace_period))
    }
}

impl<C: Clock> LivePreview<C> {
    pub fn with_cache(
        renderer: Box<dyn MarkdownRenderer>,
        resolver: Box<dyn FileResolver>,
        settings: Settings,
        cache: RenderCache<RenderedRegion, C>,
    ) -> Self {
        Self {
            renderer,
            resolver,
            measurement_host: None,
            settings,
            cache,
        }
    }

    /// Measure special elements through `host` when balancing auto layouts.
    pub fn with_measurement_host(mut self, host: Box<dyn MeasurementHost>) -> Self {
        self.measurement_host = Some(host);
        self
    }

    pub fn cache(&self) -> &RenderCache<RenderedRegion, C> {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build the widget for `region` of the note at `source_path`.
    ///
    /// A cached result for the same note and region text is returned as is.
    pub fn render_region(&mut self, region: &RegionSource, source_path: &Path) -> RenderedRegion {
        let key = CacheKey::new(source_path, &region.raw);
        self.cache.evict(Some(&key));

        if self.settings.use_live_preview_cache {
            if let Some(cached) = self.cache.get(&key) {
                debug!("Reusing cached render of region '{}'", region.id);
                return cached.clone();
            }
        }

        let rendered = self.build_region(region, source_path);
        if self.settings.use_live_preview_cache {
            self.cache.put(key, rendered.clone());
        }
        rendered
    }

    fn build_region(&self, region: &RegionSource, source_path: &Path) -> RenderedRegion {
        let mut scratch = Element::new("div");
        self.renderer
            .render(&region.content, &mut scratch, source_path);

        let dom_list: Vec<DomObject> = top_level_elements(scratch)
            .into_iter()
            .enumerate()
            .map(|(id, element)| {
                let render_type = classify_render_type(&element);
                let element = patch_element(element, source_path, self.resolver.as_ref());
                DomObject::new(id, element, render_type)
            })
            .collect();

        let mut errors = ErrorManager::new(region.id.clone());
        if region.legacy_syntax {
            errors.report_deprecation(LEGACY_REGION_NOTICE.to_string());
        }
        if dom_list.iter().any(|object| object.uses_deprecated_break) {
            errors.report_deprecation(LEGACY_BREAK_NOTICE.to_string());
        }
        validate_column_breaks(&dom_list, &region.content, &mut errors);

        let data = RegionData::new(
            dom_list,
            source_path.to_path_buf(),
            RegionSettings::parse(&region.settings_text),
            region.id.clone(),
            errors,
        );
        let manager = RegionManager::new(data);

        let mut root = Element::new("div")
            .with_class("mcm-live-preview-region")
            .with_attr("data-region-id", region.id.clone());
        manager.render_with_measurement(&mut root, self.measurement_host.as_deref());

        let errors = &manager.region_data().error_manager;
        if self.settings.render_inline_errors {
            errors.render_into(&mut root);
        }
        if self.settings.patch_external_links {
            patch_external_links(&mut root);
        }

        info!(
            "Rendered region '{}' of {} ({} warning(s))",
            region.id,
            source_path.display(),
            errors.warnings().len()
        );

        RenderedRegion {
            root,
            warnings: errors.warnings().to_vec(),
            mount: MountHandle::default(),
        }
    }
}

/// Top-level children of the scratch container, in order.
///
/// Whitespace-only text is dropped; other loose text gets a paragraph.
fn top_level_elements(mut scratch: Element) -> Vec<Element> {
    scratch
        .take_children()
        .into_iter()
        .filter(|node| !node.is_blank_text())
        .map(|node| match node {
            Node::Element(element) => element,
            Node::Text(text) => Element::new("p").with_text(text),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::find_regions;
    use crate::markdown::ComrakRenderer;
    use crate::vault::FileHandle;
    use std::path::PathBuf;
    use std::time::Instant;

    struct NoFiles;

    impl FileResolver for NoFiles {
        fn resolve_link(&self, _raw_ref: &str, _source_path: &Path) -> Option<FileHandle> {
            None
        }

        fn resource_path(&self, file: &FileHandle) -> String {
            file.path().display().to_string()
        }
    }

    /// Renders each blank-line separated chunk as one paragraph, verbatim.
    struct ChunkRenderer;

    impl MarkdownRenderer for ChunkRenderer {
        fn render(&self, text: &str, target: &mut Element, _source_path: &Path) {
            for chunk in text.split("\n\n").map(str::trim).filter(|c| !c.is_empty()) {
                target.push_child(Element::new("p").with_text(chunk));
                target.push_child(Node::text("\n"));
            }
        }
    }

    #[derive(Clone)]
    struct ManualClock(Rc<Cell<Instant>>);

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.0.get()
        }
    }

    fn note() -> PathBuf {
        PathBuf::from("/vault/note.md")
    }

    fn region(body: &str) -> RegionSource {
        let document = format!("--- start-multi-column: Intro\n{}\n--- end-multi-column\n", body);
        find_regions(&document).remove(0)
    }

    fn preview(settings: Settings) -> LivePreview {
        LivePreview::new(Box::new(ChunkRenderer), Box::new(NoFiles), settings)
    }

    fn column_texts(root: &Element) -> Vec<String> {
        root.find_all_by_class("mcm-column-content")
            .into_iter()
            .map(Element::text_content)
            .collect()
    }

    #[test]
    fn test_region_is_split_into_columns() {
        let mut preview = preview(Settings::default());
        let rendered = preview.render_region(
            &region("left\n\n--- column-break ---\n\nright"),
            &note(),
        );

        assert!(rendered.root.has_class("mcm-live-preview-region"));
        assert_eq!(rendered.root.attr("data-region-id"), Some("Intro"));
        assert_eq!(column_texts(&rendered.root), vec!["left", "right"]);
        assert!(rendered.warnings.is_empty());
        assert!(rendered.root.find_all_by_class("mcm-error-box").is_empty());
    }

    #[test]
    fn test_crowded_break_is_reported_inline() {
        let mut preview = preview(Settings::default());
        let rendered = preview.render_region(
            &region("left\n--- column-break ---\n\nright"),
            &note(),
        );

        assert_eq!(rendered.warnings.len(), 1);
        assert!(rendered.warnings[0].contains("paragraph"));
        let first = rendered.root.children()[0].as_element().unwrap();
        assert!(first.has_class("mcm-error-box"));
    }

    #[test]
    fn test_inline_errors_can_be_disabled() {
        let settings = Settings {
            render_inline_errors: false,
            ..Settings::default()
        };
        let mut preview = preview(settings);
        let rendered = preview.render_region(
            &region("left\n--- column-break ---\n\nright"),
            &note(),
        );

        assert_eq!(rendered.warnings.len(), 1);
        assert!(rendered.root.find_all_by_class("mcm-error-box").is_empty());
    }

    #[test]
    fn test_deprecated_syntax_produces_notices() {
        let mut preview = preview(Settings::default());
        let document = "=== start-multi-column: Old\na\n\n--- column-end ---\n\nb\n=== end-multi-column\n";
        let old = find_regions(document).remove(0);
        let rendered = preview.render_region(&old, &note());

        assert!(rendered.warnings.iter().any(|w| w.contains("'===' region tags")));
        assert!(rendered.warnings.iter().any(|w| w.contains("'column-end'")));
        assert_eq!(column_texts(&rendered.root), vec!["a", "b"]);
    }

    #[test]
    fn test_cached_region_is_reused() {
        let mut preview = preview(Settings::default());
        let source = region("one\n\n--- column-break ---\n\ntwo");

        let first = preview.render_region(&source, &note());
        let second = preview.render_region(&source, &note());
        assert_eq!(preview.cache().len(), 1);

        // Same mount flag: the cached copy is the one handed out
        first.mount_handle().attach();
        assert!(second.is_attached());
    }

    #[test]
    fn test_cache_disabled_renders_fresh() {
        let settings = Settings {
            use_live_preview_cache: false,
            ..Settings::default()
        };
        let mut preview = preview(settings);
        let source = region("one");

        let first = preview.render_region(&source, &note());
        let second = preview.render_region(&source, &note());
        assert!(preview.cache().is_empty());

        first.mount_handle().attach();
        assert!(!second.is_attached());
    }

    #[test]
    fn test_detached_regions_expire_on_next_construction() {
        let clock = ManualClock(Rc::new(Cell::new(Instant::now())));
        let cache = RenderCache::with_clock(clock.clone(), Duration::from_secs(120));
        let mut preview = LivePreview::with_cache(
            Box::new(ChunkRenderer),
            Box::new(NoFiles),
            Settings::default(),
            cache,
        );

        let old = preview.render_region(&region("old"), &note());
        let kept = preview.render_region(&region("kept"), &note());
        kept.mount_handle().attach();
        assert!(!old.is_attached());

        clock.0.set(clock.0.get() + Duration::from_secs(121));
        preview.render_region(&region("new"), &note());

        assert_eq!(preview.cache().len(), 2);
        assert!(preview
            .cache()
            .contains(&CacheKey::new(&note(), &region("kept").raw)));
        assert!(!preview
            .cache()
            .contains(&CacheKey::new(&note(), &region("old").raw)));
    }

    #[test]
    fn test_external_links_are_patched_with_comrak() {
        let mut preview = comrak_preview();
        let rendered = preview.render_region(
            &region("See [site](https://example.com)\n\n--- column-break ---\n\n- item"),
            &note(),
        );

        let anchors = rendered.root.find_all_by_class("external-link");
        assert_eq!(anchors.len(), 1);
        assert!(anchors[0].attr("href").is_none());
        assert_eq!(anchors[0].listeners().len(), 1);
        assert_eq!(rendered.root.find_all_by_class("mcm-column-div").len(), 2);
    }

    fn comrak_preview() -> LivePreview {
        LivePreview::new(
            Box::new(ComrakRenderer::default()),
            Box::new(NoFiles),
            Settings::default(),
        )
    }

    #[test]
    fn test_break_syntax_in_fenced_code_is_shown() {
        let mut preview = comrak_preview();
        let rendered = preview.render_region(
            &region("left\n\n```\n--- column-break ---\n```\n\n--- column-break ---\n\nright"),
            &note(),
        );

        assert!(rendered.warnings.is_empty(), "{:?}", rendered.warnings);
        let columns = column_texts(&rendered.root);
        assert_eq!(columns.len(), 2);
        assert!(columns[0].starts_with("left"));
        assert!(columns[0].contains("--- column-break ---"));
        assert_eq!(columns[1].trim(), "right");
    }

    #[test]
    fn test_break_syntax_in_inline_code_is_shown() {
        let mut preview = comrak_preview();
        let rendered = preview.render_region(
            &region("Write `--- column-break ---` to split.\n\n--- column-break ---\n\nright"),
            &note(),
        );

        assert!(rendered.warnings.is_empty(), "{:?}", rendered.warnings);
        let columns: Vec<String> = column_texts(&rendered.root)
            .iter()
            .map(|c| c.trim().to_string())
            .collect();
        assert_eq!(columns, vec!["Write --- column-break --- to split.", "right"]);
    }

    #[test]
    fn test_loose_text_is_wrapped() {
        let mut scratch = Element::new("div");
        scratch.push_child(Node::text("  \n"));
        scratch.push_child(Node::text("loose"));
        scratch.push_child(Element::new("h2").with_text("Title"));

        let elements = top_level_elements(scratch);
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].tag(), "p");
        assert_eq!(elements[0].text_content(), "loose");
        assert_eq!(elements[1].tag(), "h2");
    }
}
