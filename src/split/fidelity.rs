//! Row projection for output sheets.
//!
//! `project_rows` turns a source snapshot and a row selection into the
//! snapshot of one output file. Output rows are renumbered from 1 (the
//! header) and merged regions are carried over only when every row they
//! span survives the selection.

use std::collections::HashMap;

use crate::excel::{MergeRange, RowSnapshot, SheetSnapshot};

/// Source row number -> output row number
#[derive(Debug, Clone, Default)]
pub struct RowRemap {
    rows: HashMap<u32, u32>,
}

impl RowRemap {
    /// Header maps to row 1, selected rows follow in the order given
    pub fn new(header_row: u32, selected_rows: impl IntoIterator<Item = u32>) -> Self {
        let mut rows = HashMap::new();
        rows.insert(header_row, 1);
        for (offset, source_row) in selected_rows.into_iter().enumerate() {
            rows.insert(source_row, offset as u32 + 2);
        }
        RowRemap { rows }
    }

    pub fn get(&self, source_row: u32) -> Option<u32> {
        self.rows.get(&source_row).copied()
    }

    /// Rewrite a merge, or None if any row it spans was dropped
    pub fn remap_merge(&self, merge: &MergeRange) -> Option<MergeRange> {
        let start_row = self.get(merge.start_row)?;
        let end_row = self.get(merge.end_row)?;

        let contiguous = (merge.start_row..=merge.end_row)
            .all(|row| self.get(row) == Some(start_row + (row - merge.start_row)));
        if !contiguous {
            return None;
        }

        Some(MergeRange {
            start_col: merge.start_col,
            start_row,
            end_col: merge.end_col,
            end_row,
        })
    }
}

/// Build the output sheet for the header plus `selection` (indices into `source.rows`, ascending).
///
/// Columns keep their absolute positions; widths, hidden flags and column
/// styles are copied unchanged.
pub fn project_rows(source: &SheetSnapshot, selection: &[usize]) -> SheetSnapshot {
    debug_assert!(selection.windows(2).all(|w| w[0] < w[1]));

    let mut output = SheetSnapshot {
        name: source.name.clone(),
        first_col: source.first_col,
        last_col: source.last_col,
        rows: Vec::with_capacity(selection.len() + 1),
        columns: source.columns.clone(),
        merges: Vec::new(),
    };

    let Some(header) = source.rows.first() else {
        return output;
    };

    let selected: Vec<&RowSnapshot> = selection
        .iter()
        .filter_map(|&index| source.rows.get(index))
        .collect();

    let remap = RowRemap::new(header.row_num, selected.iter().map(|r| r.row_num));

    output.rows.push(renumbered(header, 1));
    for (offset, row) in selected.iter().enumerate() {
        output.rows.push(renumbered(row, offset as u32 + 2));
    }

    output.merges = source
        .merges
        .iter()
        .filter_map(|merge| remap.remap_merge(merge))
        .collect();

    output
}

fn renumbered(row: &RowSnapshot, row_num: u32) -> RowSnapshot {
    RowSnapshot {
        row_num,
        ..row.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::{CellContent, CellSnapshot, ColumnLayout};

    fn merge(start_col: u32, start_row: u32, end_col: u32, end_row: u32) -> MergeRange {
        MergeRange {
            start_col,
            start_row,
            end_col,
            end_row,
        }
    }

    /// Header on row 3 (two blank rows above), data rows 4..=9
    fn source() -> SheetSnapshot {
        let rows = (3..=9)
            .map(|row_num| {
                let mut row = RowSnapshot::new(row_num);
                row.height = Some(15.0 + row_num as f64);
                row.cells = vec![CellSnapshot::new(
                    1,
                    CellContent::Text(format!("r{}", row_num)),
                )];
                row
            })
            .collect();

        SheetSnapshot {
            name: "Data".to_string(),
            first_col: 1,
            last_col: 3,
            rows,
            columns: vec![ColumnLayout {
                col: 2,
                width: Some(40.0),
                hidden: true,
                style: None,
            }],
            merges: vec![
                merge(1, 3, 3, 3), // header band
                merge(2, 5, 3, 6), // rows 5-6, both kept
                merge(1, 7, 1, 8), // rows 7-8, row 8 dropped
                merge(2, 4, 2, 6), // rows 4-6, row 4 dropped
                merge(1, 1, 2, 1), // above the used range
            ],
        }
    }

    #[test]
    fn test_rows_renumbered_in_source_order() {
        let source = source();
        // rows[2] = row 5, rows[3] = row 6, rows[4] = row 7
        let output = project_rows(&source, &[2, 3, 4]);

        let numbers: Vec<u32> = output.rows.iter().map(|r| r.row_num).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);

        let texts: Vec<String> = output
            .rows
            .iter()
            .map(|r| r.cells[0].content.display_text())
            .collect();
        assert_eq!(texts, vec!["r3", "r5", "r6", "r7"]);

        // Row metadata travels with the row
        assert_eq!(output.rows[1].height, Some(20.0));
        assert_eq!(output.columns.len(), 1);
        assert!(output.columns[0].hidden);
        assert_eq!(output.name, "Data");
    }

    #[test]
    fn test_merges_remapped_or_dropped() {
        let source = source();
        let output = project_rows(&source, &[2, 3, 4]);

        assert_eq!(output.merges, vec![merge(1, 1, 3, 1), merge(2, 2, 3, 3)]);
    }

    #[test]
    fn test_merge_with_gap_is_dropped() {
        let mut source = source();
        source.merges = vec![merge(1, 5, 1, 7)];

        // Rows 5 and 7 kept, row 6 dropped
        let output = project_rows(&source, &[2, 4]);
        assert!(output.merges.is_empty());

        let output = project_rows(&source, &[2, 3, 4]);
        assert_eq!(output.merges, vec![merge(1, 2, 1, 4)]);
    }

    #[test]
    fn test_empty_selection_keeps_header_only() {
        let output = project_rows(&source(), &[]);
        assert_eq!(output.rows.len(), 1);
        assert_eq!(output.merges, vec![merge(1, 1, 3, 1)]);
    }

    #[test]
    fn test_row_remap() {
        let remap = RowRemap::new(1, [4, 9, 10]);
        assert_eq!(remap.get(1), Some(1));
        assert_eq!(remap.get(4), Some(2));
        assert_eq!(remap.get(10), Some(4));
        assert_eq!(remap.get(5), None);

        assert_eq!(remap.remap_merge(&merge(1, 9, 2, 10)), Some(merge(1, 3, 2, 4)));
        assert_eq!(remap.remap_merge(&merge(1, 4, 2, 9)), None);
    }
}
