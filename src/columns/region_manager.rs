//! Region managers: place a region's DOM objects into columns.
//!
//! A region picks its manager once, from its settings. Every variant exposes
//! the same two operations: render into a live preview container, and hand
//! back the region data it was built from.

use std::collections::HashMap;
use std::path::PathBuf;

use log::debug;

use super::syntax::column_break_pattern;
use super::{
    DomObject, DomObjectTag, ElementColumnBreakType, ElementRenderType, ErrorManager, LayoutKind,
    RegionSettings, CODE_TAGS,
};
use crate::dom::Element;

// ─────────────────────────────────────────────────────────────────────────────
// Measurement
// ─────────────────────────────────────────────────────────────────────────────

/// Pixel height assumed per rendered line when estimating.
const ESTIMATED_LINE_HEIGHT: f32 = 24.0;
/// Characters assumed to fit on one rendered line.
const ESTIMATED_LINE_WIDTH: usize = 60;
/// Height added for each image or embedded viewer.
const ESTIMATED_MEDIA_HEIGHT: f32 = 240.0;

/// A visible scratch container supplied by the host for measuring elements.
pub trait MeasurementHost {
    fn attach(&self, element: &Element);
    /// Height of the attached element, if the host could lay it out.
    fn measured_height(&self) -> Option<f32>;
    fn detach(&self);
}

/// Keeps an element attached to a measurement host for its own lifetime.
pub struct ScratchMount<'a> {
    host: &'a dyn MeasurementHost,
}

impl<'a> ScratchMount<'a> {
    pub fn new(host: &'a dyn MeasurementHost, element: &Element) -> Self {
        host.attach(element);
        Self { host }
    }

    pub fn height(&self) -> Option<f32> {
        self.host.measured_height()
    }
}

impl Drop for ScratchMount<'_> {
    fn drop(&mut self) {
        self.host.detach();
    }
}

/// Rough rendered height of an element, from its text and media.
pub fn estimate_height(element: &Element) -> f32 {
    let text = element.text_content();
    let lines: usize = text
        .lines()
        .map(|line| 1 + line.chars().count() / ESTIMATED_LINE_WIDTH)
        .sum::<usize>()
        .max(1);

    let mut height = lines as f32 * ESTIMATED_LINE_HEIGHT;
    if element.contains_tag("img") || element.contains_tag("iframe") {
        height += ESTIMATED_MEDIA_HEIGHT;
    }
    if matches!(element.tag(), "h1" | "h2") {
        height *= 1.5;
    }
    height
}

fn measure(object: &DomObject, element: &Element, host: Option<&dyn MeasurementHost>) -> f32 {
    if object.render_type == ElementRenderType::NormalRender {
        return estimate_height(element);
    }
    host.and_then(|host| ScratchMount::new(host, element).height())
        .unwrap_or_else(|| estimate_height(element))
}

// ─────────────────────────────────────────────────────────────────────────────
// Region Data
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a region manager is constructed from.
#[derive(Debug, Clone)]
pub struct RegionData {
    pub dom_list: Vec<DomObject>,
    /// DOM object id to index in `dom_list`
    pub dom_object_map: HashMap<usize, usize>,
    /// Note the region belongs to
    pub region_parent: PathBuf,
    pub settings: RegionSettings,
    pub region_key: String,
    pub error_manager: ErrorManager,
}

impl RegionData {
    pub fn new(
        dom_list: Vec<DomObject>,
        region_parent: PathBuf,
        settings: RegionSettings,
        region_key: String,
        error_manager: ErrorManager,
    ) -> Self {
        let dom_object_map = dom_list
            .iter()
            .enumerate()
            .map(|(index, obj)| (obj.id, index))
            .collect();
        Self {
            dom_list,
            dom_object_map,
            region_parent,
            settings,
            region_key,
            error_manager,
        }
    }

    pub fn dom_object(&self, id: usize) -> Option<&DomObject> {
        self.dom_object_map
            .get(&id)
            .and_then(|&index| self.dom_list.get(index))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Region Manager
// ─────────────────────────────────────────────────────────────────────────────

/// Layout strategy for one region.
#[derive(Debug, Clone)]
pub enum RegionManager {
    /// Everything in one column; breaks are dropped
    SingleColumn(RegionData),
    /// Columns balanced by measured height; breaks are dropped
    AutoLayout(RegionData),
    /// Columns split at column breaks
    Standard(RegionData),
}

impl RegionManager {
    /// Select the manager variant from the region's settings.
    pub fn new(data: RegionData) -> Self {
        match data.settings.layout_kind() {
            LayoutKind::SingleColumn => RegionManager::SingleColumn(data),
            LayoutKind::AutoLayout => RegionManager::AutoLayout(data),
            LayoutKind::Standard => RegionManager::Standard(data),
        }
    }

    pub fn region_data(&self) -> &RegionData {
        match self {
            RegionManager::SingleColumn(data)
            | RegionManager::AutoLayout(data)
            | RegionManager::Standard(data) => data,
        }
    }

    /// Append the laid-out columns to `container`, estimating heights where needed.
    pub fn render_region_elements_to_live_preview(&self, container: &mut Element) {
        self.render_with_measurement(container, None);
    }

    /// Append the laid-out columns to `container`, measuring through `host` when given.
    pub fn render_with_measurement(
        &self,
        container: &mut Element,
        host: Option<&dyn MeasurementHost>,
    ) {
        let columns = match self {
            RegionManager::SingleColumn(data) => vec![content_elements(data)],
            RegionManager::Standard(data) => standard_columns(data),
            RegionManager::AutoLayout(data) => balanced_columns(data, host),
        };

        let data = self.region_data();
        debug!(
            "Laid out region '{}' into {} column(s)",
            data.region_key,
            columns.len()
        );
        container.push_child(column_parent(columns, &data.settings));
    }
}

/// The element to display for an object, with any break tag text removed.
fn display_element(object: &DomObject) -> Option<Element> {
    if object.tag == DomObjectTag::ColumnBreak {
        return None;
    }
    let mut element = object.element.clone();
    if object.break_kind != ElementColumnBreakType::None {
        element.strip_text_matching(column_break_pattern(), CODE_TAGS);
    }
    Some(element)
}

fn content_elements(data: &RegionData) -> Vec<Element> {
    data.dom_list.iter().filter_map(display_element).collect()
}

fn standard_columns(data: &RegionData) -> Vec<Vec<Element>> {
    let count = data.settings.number_of_columns.max(1);
    let mut columns: Vec<Vec<Element>> = vec![Vec::new(); count];
    let mut current = 0;
    let advance = |current: &mut usize| {
        if *current + 1 < count {
            *current += 1;
        }
    };

    for object in &data.dom_list {
        if object.tag == DomObjectTag::ColumnBreak {
            advance(&mut current);
            continue;
        }
        let Some(element) = display_element(object) else {
            continue;
        };
        match object.break_kind {
            ElementColumnBreakType::PreBreak => {
                advance(&mut current);
                columns[current].push(element);
            }
            ElementColumnBreakType::PostBreak | ElementColumnBreakType::MidBreak => {
                columns[current].push(element);
                advance(&mut current);
            }
            ElementColumnBreakType::None => columns[current].push(element),
        }
    }

    columns
}

fn balanced_columns(data: &RegionData, host: Option<&dyn MeasurementHost>) -> Vec<Vec<Element>> {
    let count = data.settings.number_of_columns.max(1);
    let measured: Vec<(Element, f32)> = data
        .dom_list
        .iter()
        .filter_map(|object| {
            let element = display_element(object)?;
            let height = measure(object, &element, host);
            Some((element, height))
        })
        .collect();

    let total: f32 = measured.iter().map(|(_, h)| h).sum();
    let target = total / count as f32;

    let mut columns: Vec<Vec<Element>> = vec![Vec::new(); count];
    let mut current = 0;
    let mut placed = 0.0;
    for (element, height) in measured {
        if current + 1 < count && placed >= target * (current + 1) as f32 {
            current += 1;
        }
        columns[current].push(element);
        placed += height;
    }

    columns
}

fn column_parent(columns: Vec<Vec<Element>>, settings: &RegionSettings) -> Element {
    let mut parent = Element::new("div")
        .with_class("mcm-column-parent")
        .with_class(&format!("mcm-{}-columns", columns.len()));
    if settings.border {
        parent.add_class("mcm-column-border");
    }
    if settings.shadow {
        parent.add_class("mcm-column-shadow");
    }
    if let Some(spacing) = &settings.column_spacing {
        parent.set_attr("style", format!("gap: {}", spacing));
    }

    for (index, elements) in columns.into_iter().enumerate() {
        let mut content = Element::new("div").with_class("mcm-column-content");
        for element in elements {
            content.push_child(element);
        }
        parent.push_child(
            Element::new("div")
                .with_class("mcm-column-div")
                .with_class(&format!("mcm-column-{}", index + 1))
                .with_child(content),
        );
    }

    parent
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
