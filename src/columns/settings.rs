//! Region settings parsed from a region's settings block.
//!
//! Settings are free-form `Key: value` lines. Keys are matched case
//! insensitively and unknown keys are ignored with a log message.

use log::{debug, warn};

/// Upper bound on columns in one region.
const MAX_COLUMNS: usize = 6;

/// Layout strategy selected once per region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    SingleColumn,
    AutoLayout,
    Standard,
}

/// Per-region layout settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSettings {
    pub number_of_columns: usize,
    /// Balance content across columns instead of following column breaks
    pub auto_layout: bool,
    /// CSS length placed between columns
    pub column_spacing: Option<String>,
    pub border: bool,
    pub shadow: bool,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            number_of_columns: 2,
            auto_layout: false,
            column_spacing: None,
            border: true,
            shadow: true,
        }
    }
}

impl RegionSettings {
    /// Parse a settings block, falling back to defaults for anything missing or invalid.
    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                debug!("Ignoring settings line without a key: {:?}", line);
                continue;
            };
            let key = normalize_key(key);
            let value = value.trim();

            match key.as_str() {
                "numberofcolumns" | "numofcols" | "colcount" | "columncount" => {
                    match value.parse::<usize>() {
                        Ok(n) => settings.number_of_columns = n.clamp(1, MAX_COLUMNS),
                        Err(_) => warn!("Invalid column count {:?}, keeping default", value),
                    }
                }
                "columnlayout" | "layout" => {
                    settings.auto_layout = value.eq_ignore_ascii_case("auto")
                        || parse_flag(value).unwrap_or(false);
                }
                "autolayout" | "fluiddivlayout" => {
                    settings.auto_layout = parse_flag(value).unwrap_or(settings.auto_layout);
                }
                "columnspacing" | "spacing" => {
                    settings.column_spacing = Some(value.to_string()).filter(|v| !v.is_empty());
                }
                "border" | "columnborder" => {
                    settings.border = parse_flag(value).unwrap_or(settings.border);
                }
                "shadow" | "columnshadow" => {
                    settings.shadow = parse_flag(value).unwrap_or(settings.shadow);
                }
                _ => debug!("Unknown region setting {:?}", key),
            }
        }

        settings
    }

    /// The layout variant these settings select.
    pub fn layout_kind(&self) -> LayoutKind {
        if self.auto_layout {
            LayoutKind::AutoLayout
        } else if self.number_of_columns == 1 {
            LayoutKind::SingleColumn
        } else {
            LayoutKind::Standard
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "enabled" | "auto" => Some(true),
        "off" | "false" | "no" | "disabled" => Some(false),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
