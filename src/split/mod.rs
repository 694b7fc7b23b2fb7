//! Classification and split engine.
//!
//! Rows of the first sheet are matched against profile parameters by the
//! value of one column, grouped by region and written to one workbook per
//! region, with an optional NON_MATCHING workbook for everything else.

pub mod types;
pub mod lookup;
pub mod classifier;
pub mod planner;
pub mod fidelity;
pub mod naming;
pub mod engine;
pub mod discovery;

pub use types::*;
pub use lookup::{normalize_key, ParameterLookup};
pub use classifier::{classify_row, classify_value, region_label};
pub use planner::{plan_split, RegionGroup, SplitPlan};
pub use fidelity::{project_rows, RowRemap};
pub use naming::{output_file_name, sanitize_label, NON_MATCHING_LABEL};
pub use engine::classify_and_split;
pub use discovery::{discover_columns, sample_column_values};
