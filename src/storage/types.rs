use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::split::SplitManifest;

/// Maximum number of split runs kept in history
pub const MAX_HISTORY_ENTRIES: usize = 50;

pub const PROFILES_FILE: &str = "splitify_profiles.json";
pub const SETTINGS_FILE: &str = "splitify_settings.json";
pub const HISTORY_FILE: &str = "splitify_history.json";

/// User settings. Keys missing from the stored file take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: String,
    pub favorite_profile_id: Option<String>,
    pub update_interval_hours: u32,
    pub check_updates_on_startup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: "dark".to_string(),
            favorite_profile_id: None,
            update_interval_hours: 4,
            check_updates_on_startup: true,
        }
    }
}

/// One completed split run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: String,
    pub source_file: String,
    pub column_index: usize,
    pub profile_name: Option<String>,
    pub output_dir: String,
    pub files: Vec<String>,
    /// Rows written across all files
    pub row_count: usize,
}

impl HistoryEntry {
    pub fn from_manifest(
        source_file: &str,
        column_index: usize,
        profile_name: Option<&str>,
        manifest: &SplitManifest,
    ) -> Self {
        HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            source_file: source_file.to_string(),
            column_index,
            profile_name: profile_name.map(String::from),
            output_dir: manifest.output_dir.clone(),
            files: manifest.created.iter().map(|f| f.file_name.clone()).collect(),
            row_count: manifest.rows_written(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Storage lock poisoned")]
    Lock,
}
