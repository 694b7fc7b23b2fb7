use std::path::Path;
use umya_spreadsheet::{Cell, RichText, Spreadsheet, TextElement, Worksheet, new_file, writer};

use super::reader::compute_checksum;
use super::types::{CellContent, CellSnapshot, ExcelError, SheetSnapshot, DEFAULT_SHEET_NAME};

/// Number format applied to dates that arrive without a style (csv, xls)
const DEFAULT_DATE_FORMAT: &str = "yyyy-mm-dd";

/// Build an in-memory workbook holding one sheet equal to the snapshot
pub fn build_workbook(snapshot: &SheetSnapshot) -> Result<Spreadsheet, ExcelError> {
    let mut book = new_file();

    let sheet = book
        .get_sheet_by_name_mut(DEFAULT_SHEET_NAME)
        .ok_or_else(|| ExcelError::sheet_not_found(DEFAULT_SHEET_NAME))?;

    if !snapshot.name.is_empty() {
        sheet.set_name(snapshot.name.as_str());
    }

    fill_worksheet(sheet, snapshot);

    Ok(book)
}

/// Write the snapshot to an xlsx file and return the file's checksum
pub fn write_workbook(snapshot: &SheetSnapshot, output_path: &Path) -> Result<String, ExcelError> {
    let book = build_workbook(snapshot)?;

    writer::xlsx::write(&book, output_path).map_err(|e| {
        ExcelError::write_error(format!(
            "Failed to write file '{}': {}",
            output_path.display(),
            e
        ))
    })?;

    compute_checksum(&output_path.to_string_lossy())
}

fn fill_worksheet(sheet: &mut Worksheet, snapshot: &SheetSnapshot) {
    for column in &snapshot.columns {
        let dimension = sheet.get_column_dimension_by_number_mut(&column.col);
        if let Some(width) = column.width {
            dimension.set_width(width);
        }
        if column.hidden {
            dimension.set_hidden(true);
        }
        if let Some(style) = &column.style {
            dimension.set_style(style.clone());
        }
    }

    for row in &snapshot.rows {
        if row.height.is_some() || row.hidden {
            let dimension = sheet.get_row_dimension_mut(&row.row_num);
            if let Some(height) = row.height {
                dimension.set_height(height);
                dimension.set_custom_height(true);
            }
            if row.hidden {
                dimension.set_hidden(true);
            }
        }

        for cell in &row.cells {
            write_cell(sheet.get_cell_mut((cell.col, row.row_num)), cell);
        }
    }

    for merge in &snapshot.merges {
        sheet.add_merge_cells(merge.to_a1());
    }
}

/// Copy one snapshot cell, style first so the value keeps its number format
fn write_cell(target: &mut Cell, source: &CellSnapshot) {
    if let Some(style) = &source.style {
        target.set_style(style.clone());
    }

    write_content(target, &source.content, source.style.is_some());

    if let Some(link) = &source.hyperlink {
        target.set_hyperlink(link.clone());
    }
}

fn write_content(target: &mut Cell, content: &CellContent, styled: bool) {
    match content {
        CellContent::Empty => {}
        CellContent::Text(s) => {
            target.set_value_string(s.as_str());
        }
        CellContent::RichText(runs) => {
            let mut rich_text = RichText::default();
            for run in runs {
                let mut element = TextElement::default();
                element.set_text(run.text.as_str());
                if let Some(font) = &run.font {
                    element.set_run_properties(font.clone());
                }
                rich_text.add_rich_text_elements(element);
            }
            target.set_rich_text(rich_text);
        }
        CellContent::Number(n) => {
            target.set_value_number(*n);
        }
        CellContent::Boolean(b) => {
            target.set_value_bool(*b);
        }
        CellContent::DateTime(serial) => {
            target.set_value_number(*serial);
            if !styled {
                target
                    .get_style_mut()
                    .get_number_format_mut()
                    .set_format_code(DEFAULT_DATE_FORMAT);
            }
        }
        // umya writes error cells without their code, so errors are kept as text
        CellContent::Error(e) => {
            target.set_value_string(e.as_str());
        }
        CellContent::Formula { formula, cached_value } => {
            // set_value_* drops the formula, so the cached result goes in first.
            // Text and error results would be stored as shared strings; Excel recalculates those.
            if let Some(cached) = cached_value.as_deref() {
                let textual = matches!(
                    cached,
                    CellContent::Text(_) | CellContent::RichText(_) | CellContent::Error(_)
                );
                if !textual {
                    write_content(target, cached, styled);
                }
            }
            let formula_text = formula.strip_prefix('=').unwrap_or(formula);
            target.set_formula(formula_text);
        }
    }
}
