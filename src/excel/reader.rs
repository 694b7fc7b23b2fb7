use calamine::{open_workbook_auto, Data, Reader, Sheets};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use umya_spreadsheet::{reader, Cell, CellRawValue, Worksheet};

use super::types::*;

/// Read the first sheet of a workbook into a snapshot
pub fn read_first_sheet(path: &str) -> Result<SourceWorkbook, ExcelError> {
    let file_path = Path::new(path);

    if !file_path.exists() {
        return Err(ExcelError::file_not_found(path));
    }

    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let format = SourceFormat::from_extension(extension).ok_or_else(|| {
        ExcelError::invalid_format(format!("Unsupported file type: '{}'", extension))
    })?;

    let workbook = match format {
        SourceFormat::Xlsx => read_xlsx(file_path)?,
        SourceFormat::Legacy => read_with_calamine(path)?,
        SourceFormat::Csv => read_csv(path)?,
    };

    tracing::debug!(
        path,
        ?format,
        sheet = %workbook.sheet.name,
        rows = workbook.sheet.rows.len(),
        merges = workbook.sheet.merges.len(),
        "read source sheet"
    );

    Ok(workbook)
}

/// Read xlsx with full cell, layout and merge information
fn read_xlsx(path: &Path) -> Result<SourceWorkbook, ExcelError> {
    let book = reader::xlsx::read(path)
        .map_err(|e| ExcelError::read_error(format!("Failed to open workbook: {}", e)))?;

    let sheet_names: Vec<String> = book
        .get_sheet_collection()
        .iter()
        .map(|s| s.get_name().to_string())
        .collect();

    let worksheet = book
        .get_sheet(&0)
        .ok_or_else(|| ExcelError::sheet_not_found("(first sheet)"))?;

    Ok(SourceWorkbook {
        sheet_names,
        sheet: snapshot_worksheet(worksheet),
        format: SourceFormat::Xlsx,
    })
}

/// Copy a worksheet into a snapshot.
///
/// The used range is bounded by cells holding a value. Style-only cells inside
/// those rows are kept so blank formatted cells survive the copy.
pub fn snapshot_worksheet(worksheet: &Worksheet) -> SheetSnapshot {
    let mut sheet = SheetSnapshot {
        name: worksheet.get_name().to_string(),
        ..Default::default()
    };

    let mut by_row: BTreeMap<u32, Vec<CellSnapshot>> = BTreeMap::new();
    // (min_col, min_row, max_col, max_row)
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for cell in worksheet.get_cell_collection() {
        let col = *cell.get_coordinate().get_col_num();
        let row = *cell.get_coordinate().get_row_num();
        let content = convert_umya_cell(cell);

        if !content.is_empty() {
            bounds = Some(match bounds {
                None => (col, row, col, row),
                Some((c0, r0, c1, r1)) => (c0.min(col), r0.min(row), c1.max(col), r1.max(row)),
            });
        }

        let hyperlink = cell
            .get_hyperlink()
            .filter(|h| !h.get_url().is_empty())
            .cloned();

        by_row.entry(row).or_default().push(CellSnapshot {
            col,
            content,
            style: Some(cell.get_style().clone()),
            hyperlink,
        });
    }

    let Some((min_col, min_row, max_col, max_row)) = bounds else {
        return sheet;
    };

    sheet.first_col = min_col;
    sheet.last_col = max_col;

    let row_layout: HashMap<u32, (f64, bool)> = worksheet
        .get_row_dimensions()
        .iter()
        .map(|r| (*r.get_row_num(), (*r.get_height(), *r.get_hidden())))
        .collect();

    for row_num in min_row..=max_row {
        let mut row = RowSnapshot::new(row_num);

        if let Some((height, hidden)) = row_layout.get(&row_num) {
            row.height = Some(*height).filter(|h| *h > 0.0);
            row.hidden = *hidden;
        }

        if let Some(mut cells) = by_row.remove(&row_num) {
            cells.sort_by_key(|c| c.col);
            row.cells = cells;
        }

        sheet.rows.push(row);
    }

    sheet.columns = worksheet
        .get_column_dimensions()
        .iter()
        .map(|c| ColumnLayout {
            col: *c.get_col_num(),
            width: Some(*c.get_width()).filter(|w| *w > 0.0),
            hidden: *c.get_hidden(),
            style: Some(c.get_style().clone()),
        })
        .collect();

    sheet.merges = worksheet
        .get_merge_cells()
        .iter()
        .filter_map(|r| MergeRange::parse(&r.get_range()))
        .collect();

    sheet
}

/// Convert an umya cell to our CellContent
fn convert_umya_cell(cell: &Cell) -> CellContent {
    let value = raw_content(cell.get_raw_value());

    if cell.is_formula() {
        return CellContent::Formula {
            formula: cell.get_formula().to_string(),
            cached_value: (!value.is_empty()).then(|| Box::new(value)),
        };
    }

    match value {
        CellContent::Number(serial) if has_date_format(cell) => CellContent::DateTime(serial),
        content => content,
    }
}

fn raw_content(raw: &CellRawValue) -> CellContent {
    match raw {
        CellRawValue::String(s) | CellRawValue::Str(s) | CellRawValue::Lazy(s) if s.is_empty() => {
            CellContent::Empty
        }
        CellRawValue::String(s) | CellRawValue::Str(s) | CellRawValue::Lazy(s) => {
            CellContent::Text(s.clone())
        }
        CellRawValue::RichText(rich_text) => CellContent::RichText(
            rich_text
                .get_rich_text_elements()
                .iter()
                .map(|element| TextRun {
                    text: element.get_text().to_string(),
                    font: element.get_run_properties().cloned(),
                })
                .collect(),
        ),
        CellRawValue::Numeric(n) => CellContent::Number(*n),
        CellRawValue::Bool(b) => CellContent::Boolean(*b),
        // umya keeps no error code, only the fact that the cell is an error
        CellRawValue::Error => CellContent::Error(VALUE_ERROR.to_string()),
        CellRawValue::Inline | CellRawValue::Null => CellContent::Empty,
    }
}

/// Whether the cell's number format renders a date
fn has_date_format(cell: &Cell) -> bool {
    cell.get_style()
        .get_number_format()
        .map(|f| is_date_format_code(f.get_format_code()))
        .unwrap_or(false)
}

fn is_date_format_code(code: &str) -> bool {
    // Strip quoted literals and bracketed sections ([Red], [$-409]) first
    let mut stripped = String::new();
    let mut in_quotes = false;
    let mut in_brackets = false;
    for c in code.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            _ if !in_quotes && !in_brackets => stripped.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }

    stripped != "general" && (stripped.contains('y') || stripped.contains('d'))
}

/// Read xls/xlsb/ods through calamine: values and formulas, no styles
fn read_with_calamine(path: &str) -> Result<SourceWorkbook, ExcelError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| ExcelError::read_error(format!("Failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| ExcelError::sheet_not_found("(first sheet)"))?;

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| ExcelError::read_error(format!("Failed to read sheet '{}': {}", first, e)))?;

    // Not every format exposes formulas
    let formulas = workbook.worksheet_formula(&first).ok();

    let mut sheet = SheetSnapshot {
        name: first.clone(),
        ..Default::default()
    };

    if let Some((start_row, start_col)) = range.start() {
        let (_, width) = range.get_size();
        sheet.first_col = start_col + 1;
        sheet.last_col = start_col + width as u32;

        for (row_offset, cells) in range.rows().enumerate() {
            let abs_row = start_row + row_offset as u32;
            let mut row = RowSnapshot::new(abs_row + 1);

            for (col_offset, data) in cells.iter().enumerate() {
                let abs_col = start_col + col_offset as u32;
                let value = convert_cell_value(data);

                let formula = formulas
                    .as_ref()
                    .and_then(|f| f.get_value((abs_row, abs_col)))
                    .filter(|f| !f.is_empty());

                let content = match formula {
                    Some(formula) => CellContent::Formula {
                        formula: formula.clone(),
                        cached_value: (!value.is_empty()).then(|| Box::new(value)),
                    },
                    None => value,
                };

                if !content.is_empty() {
                    row.cells.push(CellSnapshot::new(abs_col + 1, content));
                }
            }

            sheet.rows.push(row);
        }
    }

    Ok(SourceWorkbook {
        sheet_names,
        sheet,
        format: SourceFormat::Legacy,
    })
}

/// Convert calamine Data to our CellContent
fn convert_cell_value(data: &Data) -> CellContent {
    match data {
        Data::Empty => CellContent::Empty,
        Data::String(s) if s.is_empty() => CellContent::Empty,
        Data::String(s) => CellContent::Text(s.clone()),
        Data::Float(f) => CellContent::Number(*f),
        Data::Int(i) => CellContent::Number(*i as f64),
        Data::Bool(b) => CellContent::Boolean(*b),
        Data::DateTime(dt) => CellContent::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => CellContent::Text(s.clone()),
        Data::DurationIso(s) => CellContent::Text(s.clone()),
        Data::Error(e) => CellContent::Error(e.to_string()),
    }
}

/// Read a CSV file: one text grid, no styles or merges
fn read_csv(path: &str) -> Result<SourceWorkbook, ExcelError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ExcelError::read_error(format!("Failed to open CSV: {}", e)))?;

    let mut sheet = SheetSnapshot {
        name: DEFAULT_SHEET_NAME.to_string(),
        first_col: 1,
        ..Default::default()
    };

    for (index, record) in csv_reader.records().enumerate() {
        let record = record
            .map_err(|e| ExcelError::read_error(format!("Failed to read CSV record: {}", e)))?;

        let mut row = RowSnapshot::new(index as u32 + 1);
        for (col_offset, field) in record.iter().enumerate() {
            let content = infer_csv_value(field);
            if !content.is_empty() {
                row.cells.push(CellSnapshot::new(col_offset as u32 + 1, content));
            }
        }

        sheet.last_col = sheet.last_col.max(record.len() as u32);
        sheet.rows.push(row);
    }

    Ok(SourceWorkbook {
        sheet_names: vec![DEFAULT_SHEET_NAME.to_string()],
        sheet,
        format: SourceFormat::Csv,
    })
}

/// Numbers are only inferred when the text is already in canonical form,
/// so codes such as "01" keep their leading zero.
fn infer_csv_value(field: &str) -> CellContent {
    if field.is_empty() {
        return CellContent::Empty;
    }

    if let Ok(n) = field.parse::<f64>() {
        let number = CellContent::Number(n);
        if n.is_finite() && number.display_text() == field {
            return number;
        }
    }

    if field.eq_ignore_ascii_case("true") || field.eq_ignore_ascii_case("false") {
        return CellContent::Boolean(field.eq_ignore_ascii_case("true"));
    }

    CellContent::Text(field.to_string())
}

/// Compute SHA-256 checksum of a file
pub fn compute_checksum(path: &str) -> Result<String, ExcelError> {
    let mut file = File::open(path)
        .map_err(|e| ExcelError::read_error(format!("Failed to open file for checksum: {}", e)))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)
            .map_err(|e| ExcelError::read_error(format!("Failed to read file for checksum: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_infer_csv_value() {
        assert!(matches!(infer_csv_value("30"), CellContent::Number(n) if n == 30.0));
        assert!(matches!(infer_csv_value("01"), CellContent::Text(ref s) if s == "01"));
        assert!(matches!(infer_csv_value("TRUE"), CellContent::Boolean(true)));
        assert!(matches!(infer_csv_value("NAM"), CellContent::Text(_)));
        assert!(infer_csv_value("").is_empty());
    }

    #[test]
    fn test_is_date_format_code() {
        assert!(is_date_format_code("yyyy-mm-dd"));
        assert!(is_date_format_code("[$-409]d-mmm-yy;@"));
        assert!(!is_date_format_code("General"));
        assert!(!is_date_format_code("#,##0.00"));
        assert!(!is_date_format_code("0.00\" days\""));
    }

    #[test]
    fn test_read_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Name,Cost Center").unwrap();
        writeln!(file, "Alice,30").unwrap();
        writeln!(file, "Bob,").unwrap();

        let workbook = read_first_sheet(path.to_str().unwrap()).unwrap();
        assert_eq!(workbook.format, SourceFormat::Csv);
        assert_eq!(workbook.sheet_names, vec!["Sheet1".to_string()]);
        assert_eq!(workbook.sheet.rows.len(), 3);
        assert_eq!(workbook.sheet.width(), 2);

        let alice = &workbook.sheet.rows[1];
        let cost_center = workbook.sheet.content_at(alice, 1).unwrap();
        assert_eq!(cost_center.display_text(), "30");

        let bob = &workbook.sheet.rows[2];
        assert!(workbook.sheet.content_at(bob, 1).is_none());
    }

    #[test]
    fn test_read_missing_and_unsupported() {
        let err = read_first_sheet("/definitely/not/here.xlsx").unwrap_err();
        assert_eq!(err.error_type, ExcelErrorType::FileNotFound);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let err = read_first_sheet(path.to_str().unwrap()).unwrap_err();
        assert_eq!(err.error_type, ExcelErrorType::InvalidFormat);
    }

    #[test]
    fn test_read_with_calamine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.xlsx");

        // Used range starts at B2
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut((2, 2)).set_value_string("Code");
        sheet.get_cell_mut((3, 2)).set_value_string("Amount");
        sheet.get_cell_mut((2, 3)).set_value_string("30");
        sheet.get_cell_mut((3, 3)).set_value_number(12.5);
        sheet.get_cell_mut((3, 4)).set_value_number(25.0);
        sheet.get_cell_mut((3, 4)).set_formula("C3*2");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let workbook = read_with_calamine(path.to_str().unwrap()).unwrap();
        assert_eq!(workbook.format, SourceFormat::Legacy);
        assert_eq!(workbook.sheet_names, vec!["Sheet1".to_string()]);

        let sheet = &workbook.sheet;
        assert_eq!(sheet.first_col, 2);
        assert_eq!(sheet.last_col, 3);
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0].row_num, 2);

        assert_eq!(sheet.content_at(&sheet.rows[0], 0).unwrap().display_text(), "Code");
        assert_eq!(sheet.content_at(&sheet.rows[1], 0).unwrap().display_text(), "30");
        assert!(sheet.content_at(&sheet.rows[2], 0).is_none());

        match sheet.content_at(&sheet.rows[2], 1) {
            Some(CellContent::Formula { formula, cached_value }) => {
                assert_eq!(formula, "C3*2");
                assert_eq!(cached_value.as_deref().map(CellContent::display_text).as_deref(), Some("25"));
            }
            other => panic!("expected formula, got {:?}", other),
        }
    }

    #[test]
    fn test_compute_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"abc").unwrap();

        let checksum = compute_checksum(path.to_str().unwrap()).unwrap();
        assert_eq!(
            checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
