use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::profile::{default_profiles, Profile};

use super::types::*;

/// Whole-collection persistence for profiles, settings and history.
///
/// Loads never fail: unreadable data falls back to defaults. Saves replace
/// the stored collection entirely.
pub trait Storage: Send + Sync {
    fn load_profiles(&self) -> Vec<Profile>;
    fn save_profiles(&self, profiles: &[Profile]) -> Result<(), StorageError>;

    fn load_settings(&self) -> Settings;
    fn save_settings(&self, settings: &Settings) -> Result<(), StorageError>;

    fn load_history(&self) -> Vec<HistoryEntry>;
    fn save_history(&self, history: &[HistoryEntry]) -> Result<(), StorageError>;

    /// Prepend a run to history, keeping the newest MAX_HISTORY_ENTRIES
    fn record_run(&self, entry: HistoryEntry) -> Result<(), StorageError> {
        let mut history = self.load_history();
        history.insert(0, entry);
        history.truncate(MAX_HISTORY_ENTRIES);
        self.save_history(&history)
    }
}

/// Pretty-printed JSON files in one data directory
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStorage { dir: dir.into() }
    }

    /// `<platform data dir>/splitify`
    pub fn default_location() -> Result<Self, StorageError> {
        let base = dirs::data_dir().ok_or(StorageError::DataDirNotFound)?;
        Ok(Self::new(base.join("splitify")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StorageError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(file), content)?;
        Ok(())
    }

    fn load_or<T: DeserializeOwned>(&self, file: &str, fallback: impl FnOnce() -> T) -> T {
        match self.read_json(file) {
            Ok(Some(value)) => value,
            Ok(None) => fallback(),
            Err(e) => {
                tracing::warn!(file, error = %e, "unreadable data file, using defaults");
                fallback()
            }
        }
    }
}

impl Storage for JsonFileStorage {
    fn load_profiles(&self) -> Vec<Profile> {
        self.load_or(PROFILES_FILE, default_profiles)
    }

    fn save_profiles(&self, profiles: &[Profile]) -> Result<(), StorageError> {
        self.write_json(PROFILES_FILE, profiles)
    }

    fn load_settings(&self) -> Settings {
        self.load_or(SETTINGS_FILE, Settings::default)
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.write_json(SETTINGS_FILE, settings)
    }

    fn load_history(&self) -> Vec<HistoryEntry> {
        self.load_or(HISTORY_FILE, Vec::new)
    }

    fn save_history(&self, history: &[HistoryEntry]) -> Result<(), StorageError> {
        self.write_json(HISTORY_FILE, history)
    }
}

/// In-memory storage for tests and dry runs
#[derive(Default)]
pub struct MemoryStorage {
    profiles: Mutex<Option<Vec<Profile>>>,
    settings: Mutex<Settings>,
    history: Mutex<Vec<HistoryEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        MemoryStorage {
            profiles: Mutex::new(Some(profiles)),
            ..Default::default()
        }
    }
}

impl Storage for MemoryStorage {
    fn load_profiles(&self) -> Vec<Profile> {
        self.profiles
            .lock()
            .ok()
            .and_then(|p| p.clone())
            .unwrap_or_else(default_profiles)
    }

    fn save_profiles(&self, profiles: &[Profile]) -> Result<(), StorageError> {
        *self.profiles.lock().map_err(|_| StorageError::Lock)? = Some(profiles.to_vec());
        Ok(())
    }

    fn load_settings(&self) -> Settings {
        self.settings
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        *self.settings.lock().map_err(|_| StorageError::Lock)? = settings.clone();
        Ok(())
    }

    fn load_history(&self) -> Vec<HistoryEntry> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    fn save_history(&self, history: &[HistoryEntry]) -> Result<(), StorageError> {
        *self.history.lock().map_err(|_| StorageError::Lock)? = history.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Parameter;

    fn entry(source: &str) -> HistoryEntry {
        HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            source_file: source.to_string(),
            column_index: 0,
            profile_name: None,
            output_dir: "/tmp".to_string(),
            files: Vec::new(),
            row_count: 0,
        }
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("data"));

        assert_eq!(storage.load_profiles()[0].name, "SElectric");
        assert_eq!(storage.load_settings(), Settings::default());
        assert!(storage.load_history().is_empty());
    }

    #[test]
    fn test_profiles_replaced_as_a_whole() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());

        let profiles = vec![
            Profile::new("A", "", vec![Parameter::new("1", "X", true)]),
            Profile::new("B", "", Vec::new()),
        ];
        storage.save_profiles(&profiles).unwrap();
        assert_eq!(storage.load_profiles(), profiles);

        storage.save_profiles(&profiles[1..]).unwrap();
        let loaded = storage.load_profiles();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "B");
    }

    #[test]
    fn test_corrupt_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROFILES_FILE), "{ not json").unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "[1, 2]").unwrap();

        let storage = JsonFileStorage::new(dir.path());
        assert_eq!(storage.load_profiles()[0].name, "SElectric");
        assert_eq!(storage.load_settings(), Settings::default());

        // Non-array profile documents are rejected too
        fs::write(dir.path().join(PROFILES_FILE), r#"{"id":"x"}"#).unwrap();
        assert_eq!(storage.load_profiles()[0].name, "SElectric");
    }

    #[test]
    fn test_partial_settings_merge_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), r#"{"theme":"light"}"#).unwrap();

        let settings = JsonFileStorage::new(dir.path()).load_settings();
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.update_interval_hours, 4);
        assert!(settings.check_updates_on_startup);
    }

    #[test]
    fn test_record_run_caps_history() {
        let storage = MemoryStorage::new();
        for i in 0..(MAX_HISTORY_ENTRIES + 5) {
            storage.record_run(entry(&format!("file{}.xlsx", i))).unwrap();
        }

        let history = storage.load_history();
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history[0].source_file, format!("file{}.xlsx", MAX_HISTORY_ENTRIES + 4));
    }

    #[test]
    fn test_memory_storage_profiles() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load_profiles()[0].name, "SElectric");

        storage.save_profiles(&[]).unwrap();
        assert!(storage.load_profiles().is_empty());
    }
}
