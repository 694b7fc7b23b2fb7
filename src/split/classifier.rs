use crate::excel::{CellContent, RowSnapshot, SheetSnapshot};
use crate::profile::Parameter;

use super::lookup::{normalize_key, ParameterLookup};
use super::types::Classification;

/// Region a payable parameter files its rows under: the trimmed label,
/// or the parameter value when the label is blank
pub fn region_label(parameter: &Parameter) -> String {
    let label = parameter.label.trim();
    if label.is_empty() {
        parameter.value.clone()
    } else {
        label.to_string()
    }
}

/// Classify a cell's display text against the lookup
pub fn classify_value<'a>(display_text: &str, lookup: &ParameterLookup<'a>) -> Classification<'a> {
    match lookup.get(&normalize_key(display_text)) {
        None => Classification::Unmatched,
        Some(parameter) if !parameter.payable => Classification::Excluded(parameter),
        Some(parameter) => Classification::Payable {
            region: region_label(parameter),
            parameter,
        },
    }
}

/// Classify one data row by the value in `column_index` (zero-based within the used range)
pub fn classify_row<'a>(
    sheet: &SheetSnapshot,
    row: &RowSnapshot,
    column_index: usize,
    lookup: &ParameterLookup<'a>,
) -> Classification<'a> {
    let display_text = sheet
        .content_at(row, column_index)
        .map(CellContent::display_text)
        .unwrap_or_default();

    classify_value(&display_text, lookup)
}
