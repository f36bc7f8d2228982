//! Utility functions for the assistant app
//!
//! Settings location and persistence, plus the small text helpers the
//! screen uses.

use anyhow::{anyhow, Context, Result};
use shared::settings::AppSettings;
use std::path::PathBuf;

pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "Nexus", "NexusAssistant")
        .map(|proj| proj.config_dir().join("settings.json"))
}

pub fn load_settings_or_default() -> AppSettings {
    match config_path() {
        Some(path) => AppSettings::load_or_default(&path),
        None => AppSettings::default(),
    }
}

pub fn save_settings(settings: &AppSettings) -> Result<()> {
    let path = config_path().ok_or_else(|| anyhow!("No config directory on this system"))?;
    settings
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Status line shown while a request is in flight.
pub fn waiting_status(reasoning_mode: bool) -> &'static str {
    if reasoning_mode {
        "Reasoning deeply (this may take a moment)"
    } else {
        "Analyzing"
    }
}

pub fn input_hint(reasoning_mode: bool) -> &'static str {
    if reasoning_mode {
        "Ask a complex question requiring deep reasoning..."
    } else {
        "Ask about stock, or analyze an image..."
    }
}

/// Fit `size` inside a `max` x `max` box, keeping the aspect ratio.
pub fn fit_within(size: [u32; 2], max: u32) -> [u32; 2] {
    let [w, h] = size;
    if w <= max && h <= max {
        return size;
    }
    if w >= h {
        [max, ((h as u64 * max as u64) / w.max(1) as u64).max(1) as u32]
    } else {
        [((w as u64 * max as u64) / h.max(1) as u64).max(1) as u32, max]
    }
}

/// Blank input means "no value"; anything else is kept trimmed.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_within_keeps_small_images() {
        assert_eq!(fit_within([100, 50], 320), [100, 50]);
    }

    #[test]
    fn test_fit_within_scales_landscape_and_portrait() {
        assert_eq!(fit_within([1280, 640], 320), [320, 160]);
        assert_eq!(fit_within([600, 1200], 300), [150, 300]);
        assert_eq!(fit_within([5000, 1], 100), [100, 1]);
    }

    #[test]
    fn test_mode_dependent_texts() {
        assert!(waiting_status(true).starts_with("Reasoning deeply"));
        assert_eq!(waiting_status(false), "Analyzing");
        assert!(input_hint(true).contains("deep reasoning"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(" key "), Some("key".to_string()));
    }
}
