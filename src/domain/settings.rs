use crate::domain::error::ConfigError;
use crate::domain::models::SignalSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "nuimo_mouse".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // Device selection, exactly one of the two
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_address: Option<String>,

    /// Sources to subscribe to
    #[serde(default = "default_sources")]
    pub sources: Vec<SignalSource>,

    /// Restrict GATT service enumeration to these UUIDs (empty = all)
    #[serde(default)]
    pub services: Vec<String>,

    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,

    // Pointer tuning, used by the action sink only
    #[serde(default = "default_swipe_distance")]
    pub swipe_distance: i32,
    #[serde(default = "default_scroll_multiplier")]
    pub scroll_multiplier: f64,

    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: None,
            device_address: None,
            sources: default_sources(),
            services: Vec::new(),
            scan_timeout_secs: default_scan_timeout_secs(),
            swipe_distance: default_swipe_distance(),
            scroll_multiplier: default_scroll_multiplier(),
            log_settings: LogSettings::default(),
        }
    }
}

fn default_sources() -> Vec<SignalSource> {
    SignalSource::ALL.to_vec()
}
fn default_scan_timeout_secs() -> u64 {
    10
}
fn default_swipe_distance() -> i32 {
    100
}
fn default_scroll_multiplier() -> f64 {
    0.05
}

/// Read-only access to the settings file
pub struct SettingsService {
    settings: Settings,
    settings_path: Option<PathBuf>,
}

impl SettingsService {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; an explicitly given file
    /// must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let settings = Self::load_from_file(path)?;
                Ok(Self {
                    settings,
                    settings_path: Some(path.to_path_buf()),
                })
            }
            None => {
                let settings_path = Self::default_settings_path().filter(|p| p.exists());
                let settings = match &settings_path {
                    Some(path) => Self::load_from_file(path)?,
                    None => Settings::default(),
                };
                Ok(Self {
                    settings,
                    settings_path,
                })
            }
        }
    }

    pub fn default_settings_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("NuimoMouse");
        path.push("settings.json");
        Some(path)
    }

    fn load_from_file(path: &Path) -> Result<Settings, ConfigError> {
        let load_error = |reason: String| ConfigError::Load {
            path: path.display().to_string(),
            reason,
        };
        let contents = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| load_error(e.to_string()))
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "device_name": "Nuimo", "sources": ["button", "rotation"] }"#)
                .unwrap();
        assert_eq!(settings.device_name.as_deref(), Some("Nuimo"));
        assert_eq!(
            settings.sources,
            vec![SignalSource::Button, SignalSource::Rotation]
        );
        assert_eq!(settings.swipe_distance, 100);
        assert_eq!(settings.log_settings, LogSettings::default());
    }

    #[test]
    fn test_unknown_source_rejected() {
        let result = serde_json::from_str::<Settings>(r#"{ "sources": ["led"] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let path = std::env::temp_dir().join(format!("nuimo_mouse_{}.json", std::process::id()));
        fs::write(&path, r#"{ "device_address": "AA:BB:CC:DD:EE:FF", "scroll_multiplier": 0.5 }"#)
            .unwrap();

        let service = SettingsService::load(Some(&path)).unwrap();
        assert_eq!(
            service.get().device_address.as_deref(),
            Some("AA:BB:CC:DD:EE:FF")
        );
        assert_eq!(service.get().scroll_multiplier, 0.5);
        assert_eq!(service.path(), Some(path.as_path()));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let path = std::env::temp_dir().join("nuimo_mouse_does_not_exist.json");
        assert!(matches!(
            SettingsService::load(Some(&path)),
            Err(ConfigError::Load { .. })
        ));
    }
}
