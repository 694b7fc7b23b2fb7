use std::collections::BTreeMap;

use crate::excel::{read_first_sheet, CellContent, SheetSnapshot};

use super::types::{ColumnDiscovery, ColumnHeader, SplitError};

/// Number of distinct sample values collected per column
pub const SAMPLE_LIMIT: usize = 5;

/// Headers, data row count, sheet names and sample values of a source file
pub fn discover_columns(source_path: &str) -> Result<ColumnDiscovery, SplitError> {
    let workbook = read_first_sheet(source_path)?;
    let sheet = &workbook.sheet;

    if sheet.rows.is_empty() {
        return Err(SplitError::EmptyFile);
    }

    let headers = column_headers(sheet);
    let samples = headers
        .iter()
        .map(|h| (h.index, sample_column_values(sheet, h.index, SAMPLE_LIMIT)))
        .collect::<BTreeMap<_, _>>();

    tracing::debug!(
        source_path,
        columns = headers.len(),
        rows = sheet.rows.len() - 1,
        "discovered columns"
    );

    Ok(ColumnDiscovery {
        headers,
        total_rows: sheet.rows.len() - 1,
        sheet_names: workbook.sheet_names,
        samples,
    })
}

/// Header names of the used range; blank headers become "Column N" (1-based)
pub fn column_headers(sheet: &SheetSnapshot) -> Vec<ColumnHeader> {
    let Some(header_row) = sheet.rows.first() else {
        return Vec::new();
    };

    (0..sheet.width())
        .map(|index| {
            let name = sheet
                .content_at(header_row, index)
                .map(CellContent::display_text)
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| format!("Column {}", index + 1));
            ColumnHeader { index, name }
        })
        .collect()
}

/// First `limit` distinct non-empty values of a column, in first-seen order
pub fn sample_column_values(sheet: &SheetSnapshot, column_index: usize, limit: usize) -> Vec<String> {
    let mut samples: Vec<String> = Vec::with_capacity(limit);

    for row in sheet.rows.iter().skip(1) {
        if samples.len() >= limit {
            break;
        }

        let Some(text) = sheet.content_at(row, column_index).map(CellContent::display_text) else {
            continue;
        };

        if !text.is_empty() && !samples.contains(&text) {
            samples.push(text);
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::{CellSnapshot, RowSnapshot};
    use std::io::Write;

    fn sheet(header: &[&str], column: &[&str]) -> SheetSnapshot {
        let mut header_row = RowSnapshot::new(1);
        header_row.cells = header
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| CellSnapshot::new(i as u32 + 1, CellContent::Text(h.to_string())))
            .collect();

        let mut rows = vec![header_row];
        for (i, value) in column.iter().enumerate() {
            let mut row = RowSnapshot::new(i as u32 + 2);
            if !value.is_empty() {
                row.cells = vec![CellSnapshot::new(1, CellContent::Text(value.to_string()))];
            }
            rows.push(row);
        }

        SheetSnapshot {
            name: "Sheet1".to_string(),
            first_col: 1,
            last_col: header.len() as u32,
            rows,
            ..Default::default()
        }
    }

    #[test]
    fn test_sample_first_five_distinct() {
        let sheet = sheet(&["Code"], &["a", "a", "b", "b", "b", "c", "d", "e", "f"]);
        assert_eq!(sample_column_values(&sheet, 0, SAMPLE_LIMIT), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_sample_skips_empty_values() {
        let sheet = sheet(&["Code"], &["", "x", "", "x", "y"]);
        assert_eq!(sample_column_values(&sheet, 0, SAMPLE_LIMIT), vec!["x", "y"]);
    }

    #[test]
    fn test_sample_out_of_range_date() {
        let mut sheet = sheet(&["Due"], &["x"]);
        sheet.rows[1].cells = vec![CellSnapshot::new(1, CellContent::DateTime(1.0e10))];

        assert_eq!(sample_column_values(&sheet, 0, SAMPLE_LIMIT), vec!["10000000000"]);
    }

    #[test]
    fn test_discover_columns_with_out_of_range_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");

        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut((1, 1)).set_value_string("Code");
        sheet.get_cell_mut((2, 1)).set_value_string("Due");
        sheet.get_cell_mut((1, 2)).set_value_string("30");
        let due = sheet.get_cell_mut((2, 2));
        due.set_value_number(1.0e10);
        due.get_style_mut().get_number_format_mut().set_format_code("yyyy-mm-dd");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let discovery = discover_columns(path.to_str().unwrap()).unwrap();
        assert_eq!(discovery.samples[&1], vec!["10000000000"]);
    }

    #[test]
    fn test_blank_headers_are_synthesized() {
        let sheet = sheet(&["Name", "", "Cost Center"], &[]);
        let names: Vec<String> = column_headers(&sheet).into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["Name", "Column 2", "Cost Center"]);
    }

    #[test]
    fn test_discover_columns_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costs.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Invoice,,Cost Center").unwrap();
        writeln!(file, "INV-1,x,30").unwrap();
        writeln!(file, "INV-2,y,30").unwrap();
        writeln!(file, "INV-3,z,99").unwrap();

        let discovery = discover_columns(path.to_str().unwrap()).unwrap();
        assert_eq!(discovery.total_rows, 3);
        assert_eq!(discovery.sheet_names, vec!["Sheet1".to_string()]);
        assert_eq!(discovery.headers[1].name, "Column 2");
        assert_eq!(discovery.samples[&2], vec!["30", "99"]);
    }

    #[test]
    fn test_discover_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        let err = discover_columns(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SplitError::EmptyFile));
    }
}
