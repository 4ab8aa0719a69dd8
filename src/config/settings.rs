//! User settings for colflow
//!
//! This module defines the `Settings` struct that holds the user-configurable
//! live preview options, with serde support for JSON persistence.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences for live preview rendering.
///
/// This struct is serialized to JSON and persisted to the user's config directory.
/// All fields have sensible defaults via the `Default` trait and `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Render Cache
    // ─────────────────────────────────────────────────────────────────────────
    /// Reuse finished regions while their note and text are unchanged
    pub use_live_preview_cache: bool,

    /// Seconds a region may stay out of view before its cache entry is dropped
    pub cache_grace_period_secs: u64,

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────
    /// Show column-break warnings at the top of each region
    pub render_inline_errors: bool,

    /// Open external links with the system handler instead of navigating
    pub patch_external_links: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Vault
    // ─────────────────────────────────────────────────────────────────────────
    /// Vault used when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_vault: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_live_preview_cache: true,
            cache_grace_period_secs: 120,
            render_inline_errors: true,
            patch_external_links: true,
            default_vault: None,
        }
    }
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum allowed cache grace period.
    pub const MIN_GRACE_PERIOD_SECS: u64 = 1;
    /// Maximum allowed cache grace period.
    pub const MAX_GRACE_PERIOD_SECS: u64 = 3600;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.cache_grace_period_secs = self
            .cache_grace_period_secs
            .clamp(Self::MIN_GRACE_PERIOD_SECS, Self::MAX_GRACE_PERIOD_SECS);

        if self
            .default_vault
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.default_vault = None;
        }
    }

    /// Load settings and sanitize them to ensure validity.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
