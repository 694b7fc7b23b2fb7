//! Spreadsheet codec for the split engine.
//!
//! This module provides:
//! - Reading the first sheet of xlsx/xls/xlsb/ods/csv files into a snapshot
//! - Writing snapshots to new xlsx files with styles, layout and merges intact
//! - A1 reference and merge range helpers

pub mod types;
pub mod range;
pub mod reader;
pub mod writer;

// Re-export commonly used types and functions
pub use types::*;
pub use range::{column_number_to_letter, parse_cell_ref};
pub use reader::{read_first_sheet, snapshot_worksheet, compute_checksum};
pub use writer::{build_workbook, write_workbook};
