use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_UNDO_LEVELS, MAX_RECENT_LIBRARIES};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

fn default_undo_levels() -> usize {
    DEFAULT_UNDO_LEVELS
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfigData {
    /// Directory holding the symbol library files
    #[serde(default)]
    pub library_dir: Option<PathBuf>,

    /// Number of drawing states kept by the undo history
    #[serde(default = "default_undo_levels")]
    pub undo_levels: usize,

    /// Recently used library directories for quick access
    #[serde(default)]
    pub recent_libraries: Vec<PathBuf>,
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            library_dir: None,
            undo_levels: DEFAULT_UNDO_LEVELS,
            recent_libraries: Vec::new(),
        }
    }
}

impl AppConfigData {
    /// Move `path` to the front of the recent list, trimming it to size.
    pub fn push_recent_library(&mut self, path: PathBuf) {
        // Remove if already in list (to move it to front)
        self.recent_libraries.retain(|p| p != &path);
        self.recent_libraries.insert(0, path);
        self.recent_libraries.truncate(MAX_RECENT_LIBRARIES);
    }
}

/// Runtime configuration resource
#[derive(Resource, Debug)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to switch to another library directory
#[derive(Message, Debug, Clone)]
pub struct SetLibraryDirRequest {
    pub path: PathBuf,
}

/// Result of loading config from disk
pub struct LoadConfigResult {
    pub config: AppConfig,
    /// Error message if config was reset to defaults due to an error
    pub reset_reason: Option<String>,
}

/// Load configuration from `config_path`
pub fn load_config(config_path: &Path) -> LoadConfigResult {
    let (data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    info!("Loaded config from {:?}", config_path);
                    (data, None)
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}", e);
                    (
                        AppConfigData::default(),
                        Some(format!("Configuration file was corrupted: {}", e)),
                    )
                }
            },
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (AppConfigData::default(), None)
    };

    LoadConfigResult {
        config: AppConfig {
            data,
            config_path: config_path.to_path_buf(),
            dirty: false,
        },
        reset_reason,
    }
}

/// Save configuration to disk
pub fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config(&config.config_path);
    config.data = result.config.data;
    config.dirty = result.config.dirty;

    // Set notification if config was reset due to an error
    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

/// System to set the library directory
fn set_library_dir_system(
    mut events: MessageReader<SetLibraryDirRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        config.data.library_dir = Some(event.path.clone());
        config.data.push_recent_library(event.path.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
        info!("Set library directory to {:?}", event.path);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<SetLibraryDirRequest>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                (
                    set_library_dir_system.run_if(on_message::<SetLibraryDirRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_data_default() {
        let data = AppConfigData::default();
        assert!(data.library_dir.is_none());
        assert_eq!(data.undo_levels, DEFAULT_UNDO_LEVELS);
        assert!(data.recent_libraries.is_empty());
    }

    #[test]
    fn test_app_config_data_serialization() {
        let data = AppConfigData {
            library_dir: Some(PathBuf::from("/path/to/libs")),
            undo_levels: 25,
            recent_libraries: vec![PathBuf::from("/path/one"), PathBuf::from("/path/two")],
        };

        let json = serde_json::to_string(&data).unwrap();
        let parsed: AppConfigData = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, data);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed: AppConfigData = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, AppConfigData::default());
    }

    #[test]
    fn test_recent_libraries_are_bounded() {
        let mut data = AppConfigData::default();
        for i in 0..(MAX_RECENT_LIBRARIES + 3) {
            data.push_recent_library(PathBuf::from(format!("/libs/{}", i)));
        }
        data.push_recent_library(PathBuf::from("/libs/4"));

        assert_eq!(data.recent_libraries.len(), MAX_RECENT_LIBRARIES);
        assert_eq!(data.recent_libraries[0], PathBuf::from("/libs/4"));
        assert_eq!(
            data.recent_libraries.iter().filter(|p| **p == PathBuf::from("/libs/4")).count(),
            1
        );
    }

    #[test]
    fn test_load_corrupted_config_resets_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = load_config(&path);
        assert!(result.reset_reason.is_some());
        assert_eq!(result.config.data, AppConfigData::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig {
            data: AppConfigData::default(),
            config_path: dir.path().join("config.json"),
            dirty: true,
        };
        config.data.library_dir = Some(dir.path().join("libs"));
        save_config(&config);

        let result = load_config(&config.config_path);
        assert!(result.reset_reason.is_none());
        assert_eq!(result.config.data.library_dir, Some(dir.path().join("libs")));
    }
}
