use log::{LevelFilter, debug, error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory stripped from document locations to form bookmark keys.
    /// Defaults to the platform documents directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_file: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            documents_dir: None,
            preferences_file: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn log_level_filter(&self) -> LevelFilter {
        match self.log_level.to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }
}

/// Loads settings from `path`. A missing file is created with defaults; an
/// unreadable one is logged and replaced by defaults in memory only.
pub fn load_settings_from_path(path: &Path) -> Settings {
    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        let settings = Settings::default();
        save_settings_to_file(&settings, path);
        return settings;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");
                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }
                settings
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                Settings::default()
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            Settings::default()
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match serde_yaml::to_string(settings) {
        Ok(yaml) => format!("{SETTINGS_HEADER}{yaml}"),
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# pagemark configuration
#
# documents_dir:    directory stripped from document paths when building
#                   bookmark keys (default: your Documents folder)
# preferences_file: where bookmarks are stored
#                   (default: <data dir>/pagemark/preferences.json)
# log_level:        off | error | warn | info | debug | trace

"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_creates_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pagemark").join("config.yaml");

        let settings = load_settings_from_path(&path);
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_round_trip_with_overrides() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        let settings = Settings {
            documents_dir: Some(PathBuf::from("/home/reader/Documents")),
            preferences_file: Some(PathBuf::from("/tmp/prefs.json")),
            log_level: "debug".to_string(),
            ..Settings::default()
        };

        save_settings_to_file(&settings, &path);
        assert_eq!(load_settings_from_path(&path), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "documents_dir: /srv/books\n").unwrap();

        let settings = load_settings_from_path(&path);
        assert_eq!(settings.documents_dir, Some(PathBuf::from("/srv/books")));
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.version, CURRENT_VERSION);
    }

    #[test]
    fn test_old_version_is_migrated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "version: 0\nlog_level: warn\n").unwrap();

        let settings = load_settings_from_path(&path);
        assert_eq!(settings.version, CURRENT_VERSION);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(&format!("version: {CURRENT_VERSION}")));
    }

    #[test]
    fn test_invalid_yaml_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "log_level: [unclosed").unwrap();

        assert_eq!(load_settings_from_path(&path), Settings::default());
    }

    #[test]
    fn test_log_level_filter() {
        let mut settings = Settings::default();
        assert_eq!(settings.log_level_filter(), LevelFilter::Info);
        settings.log_level = "DEBUG".to_string();
        assert_eq!(settings.log_level_filter(), LevelFilter::Debug);
        settings.log_level = "verbose".to_string();
        assert_eq!(settings.log_level_filter(), LevelFilter::Info);
    }
}
