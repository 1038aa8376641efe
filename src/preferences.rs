use log::{debug, error};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key/value storage the bookmark store persists into.
///
/// Values are arbitrary JSON so a single preference file can be shared with
/// other kinds of state; readers are responsible for rejecting values of the
/// wrong shape.
pub trait Preferences {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value);

    fn remove(&mut self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to access preferences file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse preferences file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("preferences file {path:?} does not contain a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("failed to serialize preferences")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: BTreeMap<String, Value>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// JSON-object file rewritten in full after every mutation.
#[derive(Debug)]
pub struct FilePreferences {
    values: MemoryPreferences,
    file_path: Option<PathBuf>,
}

impl FilePreferences {
    pub fn ephemeral() -> Self {
        Self {
            values: MemoryPreferences::new(),
            file_path: None,
        }
    }

    pub fn with_file(path: &Path) -> Self {
        Self {
            values: MemoryPreferences::new(),
            file_path: Some(path.to_path_buf()),
        }
    }

    pub fn open(path: &Path) -> Result<Self, PreferencesError> {
        if !path.exists() {
            debug!("Preferences file {path:?} not found, starting empty");
            return Ok(Self::with_file(path));
        }

        let content = fs::read_to_string(path).map_err(|source| PreferencesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: Value =
            serde_json::from_str(&content).map_err(|source| PreferencesError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let Value::Object(object) = parsed else {
            return Err(PreferencesError::NotAnObject {
                path: path.to_path_buf(),
            });
        };

        let mut values = MemoryPreferences::new();
        for (key, value) in object {
            values.set(&key, value);
        }
        debug!("Loaded {} preference entries from {path:?}", values.len());

        Ok(Self {
            values,
            file_path: Some(path.to_path_buf()),
        })
    }

    /// Opens the file, or starts empty (still bound to `path`) if it can't be read.
    pub fn open_or_empty(path: &Path) -> Self {
        Self::open(path).unwrap_or_else(|e| {
            error!("Failed to load preferences from {path:?}: {e:#}");
            Self::with_file(path)
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let object: Map<String, Value> = self
            .values
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let content = serde_json::to_string_pretty(&Value::Object(object))?;

        atomic_write(path, &content).map_err(|source| PreferencesError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Saved preferences to {path:?}");
        Ok(())
    }

    fn save_logged(&self) {
        if let Err(e) = self.save() {
            error!("Failed to save preferences: {e:#}");
        }
    }
}

impl Preferences for FilePreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.set(key, value);
        self.save_logged();
    }

    fn remove(&mut self, key: &str) {
        if self.values.contains(key) {
            self.values.remove(key);
            self.save_logged();
        }
    }
}

/// Write to a temp file next to `path`, then rename over it.
fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
