//! Configuration module for the options window.
//!
//! Window-level preferences (theme, font size, last opened panel, logging)
//! live in `AppState` and persist to `~/.config/adblock-options/settings.json`.
//! Filter and whitelist state is NOT stored here; the filtering service owns it.

pub mod loader;

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Default URL behind the "open store" control.
pub const DEFAULT_STORE_URL: &str = "https://adguard.com/en/adguard-browser-extension/overview.html";

/// Persisted window preferences
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppState {
    // UI Customization Settings
    pub theme_idx: usize,
    pub ui_font_size: f32,
    pub window_width: f32,
    pub window_height: f32,

    // Navigation
    pub restore_last_panel: bool,
    pub last_panel_hash: String,

    // Behaviour
    pub store_url: String,
    pub popup_duration_ms: u64,

    // Debug Settings
    pub debug_logging: bool,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            theme_idx: 0,
            ui_font_size: 12.0,
            window_width: 1000.0,
            window_height: 720.0,
            restore_last_panel: true,
            last_panel_hash: String::new(),
            store_url: DEFAULT_STORE_URL.to_string(),
            popup_duration_ms: 3000,
            debug_logging: false,
        }
    }
}

/// Loads and saves `AppState`
pub struct SettingsManager;

impl SettingsManager {
    /// Load AppState from the global settings path, or defaults if it doesn't exist
    pub fn load() -> Result<AppState, ConfigError> {
        let path = loader::get_global_settings_path()?;
        Ok(Self::load_from(&path))
    }

    /// Load AppState from `path`.
    ///
    /// Missing or unparsable files fall back to defaults instead of failing.
    pub fn load_from(path: &Path) -> AppState {
        match loader::load_state_from_file(path) {
            Ok(mut state) => {
                if state.popup_duration_ms == 0 {
                    log::warn!("[Config] popup_duration_ms was 0, restoring default");
                    state.popup_duration_ms = AppState::default().popup_duration_ms;
                }
                if !(8.0..=24.0).contains(&state.ui_font_size) {
                    log::warn!("[Config] ui_font_size {} out of range, restoring default", state.ui_font_size);
                    state.ui_font_size = AppState::default().ui_font_size;
                }
                state
            }
            Err(ConfigError::FileNotFound(_)) => AppState::default(),
            Err(e) => {
                log::warn!("[Config] Failed to load settings, falling back to defaults: {}", e);
                AppState::default()
            }
        }
    }

    /// Save AppState to the global settings path
    pub fn save(state: &AppState) -> Result<PathBuf, ConfigError> {
        let path = loader::get_global_settings_path()?;
        Self::save_to(state, &path)?;
        Ok(path)
    }

    pub fn save_to(state: &AppState, path: &Path) -> Result<(), ConfigError> {
        loader::save_state_to_file(state, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_default() {
        let state = AppState::default();
        assert_eq!(state.theme_idx, 0);
        assert_eq!(state.popup_duration_ms, 3000);
        assert!(state.restore_last_panel);
        assert_eq!(state.store_url, DEFAULT_STORE_URL);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let state: AppState = serde_json::from_str(r#"{"theme_idx": 1}"#).unwrap();
        assert_eq!(state.theme_idx, 1);
        assert_eq!(state.window_width, 1000.0);
    }
}
