use std::collections::{BTreeSet, HashMap};

use crate::excel::SheetSnapshot;

use super::classifier::classify_row;
use super::lookup::ParameterLookup;
use super::types::Classification;

/// Rows collected under one region label
#[derive(Debug, Clone, Default)]
pub struct RegionGroup {
    pub region: String,
    /// Indices into `SheetSnapshot::rows`, in source order
    pub rows: Vec<usize>,
    /// Parameter values that resolved to this region
    pub cost_centers: BTreeSet<String>,
}

/// Which rows go into which output file
#[derive(Debug, Clone, Default)]
pub struct SplitPlan {
    /// Groups in order of first appearance in the sheet
    pub groups: Vec<RegionGroup>,
    /// Excluded and unmatched rows in source order; empty unless requested
    pub catch_all: Vec<usize>,
    pub data_rows: usize,
    pub unmatched_rows: usize,
    pub excluded_rows: usize,
}

impl SplitPlan {
    pub fn matched_rows(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }
}

/// Classify every data row once and group the results.
///
/// The header (`rows[0]`) is never classified.
pub fn plan_split(
    sheet: &SheetSnapshot,
    column_index: usize,
    lookup: &ParameterLookup<'_>,
    keep_non_matching: bool,
) -> SplitPlan {
    let mut plan = SplitPlan::default();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for (row_index, row) in sheet.rows.iter().enumerate().skip(1) {
        plan.data_rows += 1;

        match classify_row(sheet, row, column_index, lookup) {
            Classification::Payable { region, parameter } => {
                let index = *group_index.entry(region.clone()).or_insert_with(|| {
                    plan.groups.push(RegionGroup {
                        region,
                        ..Default::default()
                    });
                    plan.groups.len() - 1
                });

                let group = &mut plan.groups[index];
                group.rows.push(row_index);
                group.cost_centers.insert(parameter.value.clone());
            }
            Classification::Excluded(_) => {
                plan.excluded_rows += 1;
                if keep_non_matching {
                    plan.catch_all.push(row_index);
                }
            }
            Classification::Unmatched => {
                plan.unmatched_rows += 1;
                if keep_non_matching {
                    plan.catch_all.push(row_index);
                }
            }
        }
    }

    plan
}
