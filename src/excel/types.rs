use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use umya_spreadsheet::{Font, Hyperlink, Style};

/// Sheet name used when the source format has no sheet names (CSV)
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Error code reported for every xlsx error cell; umya-spreadsheet keeps no other
pub const VALUE_ERROR: &str = "#VALUE!";

/// A formatted run inside a rich text cell
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub font: Option<Font>,
}

/// Represents a cell value with type information
#[derive(Debug, Clone)]
pub enum CellContent {
    Empty,
    Text(String),
    RichText(Vec<TextRun>),
    Number(f64),
    Boolean(bool),
    DateTime(f64), // Excel serial date
    Error(String),
    Formula { formula: String, cached_value: Option<Box<CellContent>> },
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent::Empty
    }
}

impl CellContent {
    /// Plain display text of the value, as a user would read it in the cell.
    ///
    /// Rich text concatenates its runs, formulas render their cached result and
    /// empty cells render as an empty string.
    pub fn display_text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::RichText(runs) => runs.iter().map(|r| r.text.as_str()).collect(),
            CellContent::Number(n) => format_number(*n),
            CellContent::Boolean(b) => b.to_string(),
            CellContent::DateTime(serial) => format_excel_datetime(*serial),
            CellContent::Error(e) => e.clone(),
            CellContent::Formula { cached_value, .. } => cached_value
                .as_ref()
                .map(|v| v.display_text())
                .unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }
}

/// Render a number without a trailing ".0" for integral values
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Format Excel datetime (days since 1899-12-30) to ISO 8601.
///
/// Whole days render as a bare date. Serials outside chrono's range render
/// as plain numbers.
pub fn format_excel_datetime(value: f64) -> String {
    excel_serial_to_datetime(value)
        .map(|datetime| {
            if datetime.time().num_seconds_from_midnight() == 0 {
                datetime.format("%Y-%m-%d").to_string()
            } else {
                datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
        })
        .unwrap_or_else(|| format_number(value))
}

fn excel_serial_to_datetime(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }

    let days = value.floor();
    // Rounding can reach 86400, which rolls over into the next day
    let seconds = ((value - days) * 86400.0).round() as i64;

    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(days as i64)?)?
        .checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

/// One populated cell of a source row
#[derive(Debug, Clone)]
pub struct CellSnapshot {
    /// 1-based absolute column number
    pub col: u32,
    pub content: CellContent,
    pub style: Option<Style>,
    pub hyperlink: Option<Hyperlink>,
}

impl CellSnapshot {
    pub fn new(col: u32, content: CellContent) -> Self {
        CellSnapshot {
            col,
            content,
            style: None,
            hyperlink: None,
        }
    }
}

/// A row as read from the source sheet
#[derive(Debug, Clone, Default)]
pub struct RowSnapshot {
    /// 1-based row number in the sheet this row belongs to
    pub row_num: u32,
    pub height: Option<f64>,
    pub hidden: bool,
    /// Populated cells ordered by column
    pub cells: Vec<CellSnapshot>,
}

impl RowSnapshot {
    pub fn new(row_num: u32) -> Self {
        RowSnapshot {
            row_num,
            ..Default::default()
        }
    }

    pub fn cell(&self, col: u32) -> Option<&CellSnapshot> {
        self.cells.iter().find(|c| c.col == col)
    }
}

/// Column-level layout carried over to output sheets
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    /// 1-based column number
    pub col: u32,
    pub width: Option<f64>,
    pub hidden: bool,
    pub style: Option<Style>,
}

/// A merged cell region, 1-based and inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRange {
    pub start_col: u32,
    pub start_row: u32,
    pub end_col: u32,
    pub end_row: u32,
}

/// In-memory copy of a worksheet: the unit the split engine reads and writes.
///
/// `rows[0]` is the header row. Rows are contiguous from the first used row
/// of the sheet to the last, so blank rows in between are present with no cells.
#[derive(Debug, Clone, Default)]
pub struct SheetSnapshot {
    pub name: String,
    /// 1-based number of the first used column
    pub first_col: u32,
    /// 1-based number of the last used column
    pub last_col: u32,
    pub rows: Vec<RowSnapshot>,
    pub columns: Vec<ColumnLayout>,
    pub merges: Vec<MergeRange>,
}

impl SheetSnapshot {
    /// Number of columns spanned by the used range
    pub fn width(&self) -> usize {
        if self.rows.is_empty() || self.last_col < self.first_col {
            0
        } else {
            (self.last_col - self.first_col + 1) as usize
        }
    }

    /// Absolute column number for a zero-based index into the used range.
    /// `None` when the index cannot address a sheet column.
    pub fn column_number(&self, column_index: usize) -> Option<u32> {
        u32::try_from(column_index)
            .ok()
            .and_then(|i| self.first_col.checked_add(i))
    }

    /// Cell content at a data row and zero-based column index
    pub fn content_at<'r>(&self, row: &'r RowSnapshot, column_index: usize) -> Option<&'r CellContent> {
        self.column_number(column_index)
            .and_then(|col| row.cell(col))
            .map(|c| &c.content)
    }
}

/// Result of opening a source file
#[derive(Debug, Clone)]
pub struct SourceWorkbook {
    pub sheet_names: Vec<String>,
    /// First sheet of the workbook
    pub sheet: SheetSnapshot,
    pub format: SourceFormat,
}

/// How a source file is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// xlsx/xlsm, read with styles, merges and layout
    Xlsx,
    /// xls/xlsb/ods, values and formulas only
    Legacy,
    /// csv, values only
    Csv,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" => Some(SourceFormat::Xlsx),
            "xls" | "xlsb" | "ods" => Some(SourceFormat::Legacy),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }
}

/// Excel-specific errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelError {
    pub message: String,
    pub error_type: ExcelErrorType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ExcelErrorType {
    FileNotFound,
    InvalidFormat,
    SheetNotFound,
    ReadError,
    WriteError,
}

impl std::fmt::Display for ExcelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExcelError {}

impl ExcelError {
    pub fn new(message: impl Into<String>, error_type: ExcelErrorType) -> Self {
        ExcelError {
            message: message.into(),
            error_type,
        }
    }

    pub fn file_not_found(path: &str) -> Self {
        ExcelError::new(format!("File not found: {}", path), ExcelErrorType::FileNotFound)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::InvalidFormat)
    }

    pub fn sheet_not_found(sheet: &str) -> Self {
        ExcelError::new(format!("Sheet not found: {}", sheet), ExcelErrorType::SheetNotFound)
    }

    pub fn read_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::ReadError)
    }

    pub fn write_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::WriteError)
    }
}
