use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::excel::ExcelError;
use crate::profile::Parameter;

/// Outcome of classifying one data row. Every row gets exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Payable match, collected under `region`
    Payable { region: String, parameter: &'a Parameter },
    /// Matched a parameter that is not payable
    Excluded(&'a Parameter),
    /// No parameter matches the cell value
    Unmatched,
}

/// Caller options for a split run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOptions {
    /// Write excluded and unmatched rows to a NON_MATCHING file
    #[serde(default)]
    pub keep_non_matching: bool,
    /// Replaces the source file stem in output names
    #[serde(default)]
    pub output_prefix: Option<String>,
    /// Date stamped into file names; today when absent
    #[serde(default)]
    pub run_date: Option<chrono::NaiveDate>,
}

/// One output file written by a split
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFile {
    pub file_name: String,
    pub row_count: usize,
    pub region: String,
    /// Distinct parameter values that fed this file, sorted
    pub cost_centers: Vec<String>,
    pub checksum: String,
}

/// Result of a successful split
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitManifest {
    pub success: bool,
    pub created: Vec<CreatedFile>,
    /// Region labels whose group ended up empty
    pub skipped: Vec<String>,
    pub output_dir: String,
    /// Data rows in the source sheet, header excluded
    pub total_rows: usize,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl SplitManifest {
    pub fn rows_written(&self) -> usize {
        self.created.iter().map(|f| f.row_count).sum()
    }
}

/// A column as offered to the user for selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnHeader {
    pub index: usize,
    pub name: String,
}

/// Column headers, row count and sample values of a source file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDiscovery {
    pub headers: Vec<ColumnHeader>,
    pub total_rows: usize,
    pub sheet_names: Vec<String>,
    /// Column index -> up to five distinct non-empty values
    pub samples: BTreeMap<usize, Vec<String>>,
}

#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Excel(#[from] ExcelError),

    #[error("File is empty")]
    EmptyFile,

    #[error("File has no data rows")]
    NoDataRows,

    #[error("Output directory does not exist: {path}")]
    OutputDirMissing { path: String },

    #[error("Failed to write {file}: {message} ({} file(s) already written)", .written.len())]
    Write {
        file: String,
        written: Vec<String>,
        message: String,
    },
}
