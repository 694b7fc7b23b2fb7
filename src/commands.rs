use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::excel::ExcelError;
use crate::profile::{find_profile, Parameter, Profile};
use crate::split::{self, ColumnDiscovery, SplitError, SplitManifest, SplitOptions};
use crate::storage::{HistoryEntry, Settings, Storage, StorageError};

pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        AppState { storage }
    }
}

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        CommandError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<SplitError> for CommandError {
    fn from(e: SplitError) -> Self {
        CommandError {
            message: e.to_string(),
        }
    }
}

impl From<ExcelError> for CommandError {
    fn from(e: ExcelError) -> Self {
        CommandError {
            message: e.to_string(),
        }
    }
}

impl From<StorageError> for CommandError {
    fn from(e: StorageError) -> Self {
        CommandError {
            message: e.to_string(),
        }
    }
}

/// Arguments of one split run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRequest {
    pub source_path: String,
    pub column_index: usize,
    pub parameters: Vec<Parameter>,
    /// Directory of the source file when absent
    #[serde(default)]
    pub output_dir: Option<String>,
    /// Recorded in history only
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub options: SplitOptions,
}

// Profile commands
pub fn get_profiles(state: &AppState) -> Vec<Profile> {
    state.storage.load_profiles()
}

pub fn save_profiles(state: &AppState, profiles: &[Profile]) -> bool {
    match state.storage.save_profiles(profiles) {
        Ok(()) => {
            tracing::info!(count = profiles.len(), "saved profiles");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to save profiles");
            false
        }
    }
}

/// Merge profiles from a JSON array file; entries with a known id replace the stored one
pub fn import_profiles(state: &AppState, json_path: &str) -> Result<usize, CommandError> {
    let content = std::fs::read_to_string(json_path)
        .map_err(|e| CommandError::new(format!("Failed to read {}: {}", json_path, e)))?;
    let imported: Vec<Profile> = serde_json::from_str(&content)
        .map_err(|e| CommandError::new(format!("Invalid profile file: {}", e)))?;

    let mut profiles = state.storage.load_profiles();
    for profile in &imported {
        match profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => profiles.push(profile.clone()),
        }
    }

    state.storage.save_profiles(&profiles)?;
    tracing::info!(imported = imported.len(), total = profiles.len(), "imported profiles");
    Ok(imported.len())
}

/// Profile by id or name; otherwise the favorite profile, then the first one
pub fn resolve_profile(state: &AppState, id_or_name: Option<&str>) -> Result<Profile, CommandError> {
    let profiles = state.storage.load_profiles();

    if let Some(key) = id_or_name {
        return find_profile(&profiles, key)
            .cloned()
            .ok_or_else(|| CommandError::new(format!("Profile not found: {}", key)));
    }

    let settings = state.storage.load_settings();
    settings
        .favorite_profile_id
        .as_deref()
        .and_then(|id| profiles.iter().find(|p| p.id == id))
        .or_else(|| profiles.first())
        .cloned()
        .ok_or_else(|| CommandError::new("No profiles available"))
}

// Spreadsheet commands
pub fn read_file_columns(file_path: &str) -> Result<ColumnDiscovery, CommandError> {
    Ok(split::discover_columns(file_path)?)
}

pub fn split_file(state: &AppState, request: SplitRequest) -> Result<SplitManifest, CommandError> {
    let output_dir = match request.output_dir {
        Some(dir) => dir,
        None => source_directory(&request.source_path)?,
    };

    let manifest = split::classify_and_split(
        &request.source_path,
        request.column_index,
        &request.parameters,
        &output_dir,
        &request.options,
    )?;

    let entry = HistoryEntry::from_manifest(
        &request.source_path,
        request.column_index,
        request.profile_name.as_deref(),
        &manifest,
    );
    if let Err(e) = state.storage.record_run(entry) {
        tracing::warn!(error = %e, "failed to record split history");
    }

    Ok(manifest)
}

fn source_directory(source_path: &str) -> Result<String, CommandError> {
    Path::new(source_path)
        .parent()
        .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        .map(|p| p.to_string_lossy().to_string())
        .ok_or_else(|| CommandError::new(format!("Cannot determine directory of {}", source_path)))
}

// Settings commands
pub fn get_settings(state: &AppState) -> Settings {
    state.storage.load_settings()
}

pub fn save_settings(state: &AppState, settings: &Settings) -> bool {
    match state.storage.save_settings(settings) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "failed to save settings");
            false
        }
    }
}

// History commands
pub fn get_history(state: &AppState) -> Vec<HistoryEntry> {
    state.storage.load_history()
}

pub fn clear_history(state: &AppState) -> Result<(), CommandError> {
    state.storage.save_history(&[])?;
    Ok(())
}
