use super::types::MergeRange;

/// Convert column number (1-based) to Excel column letter (A, B, ..., Z, AA, AB, ...)
pub fn column_number_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;

    while n > 0 {
        n -= 1;
        let c = (b'A' + (n % 26) as u8) as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Parse a single A1-style reference into 1-based (col, row). `$` markers are ignored.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.replace('$', "");
    let split_at = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split_at);

    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        let value = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        col = col.checked_mul(26)?.checked_add(value)?;
    }

    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some((col, row))
}

impl MergeRange {
    /// Parse "A1:C3"; a single reference yields a one-cell range
    pub fn parse(range: &str) -> Option<Self> {
        let (start, end) = match range.split_once(':') {
            Some((s, e)) => (parse_cell_ref(s)?, parse_cell_ref(e)?),
            None => {
                let cell = parse_cell_ref(range)?;
                (cell, cell)
            }
        };

        Some(MergeRange {
            start_col: start.0.min(end.0),
            start_row: start.1.min(end.1),
            end_col: start.0.max(end.0),
            end_row: start.1.max(end.1),
        })
    }

    /// A1-style notation, e.g. "A1:C3"
    pub fn to_a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            column_number_to_letter(self.start_col),
            self.start_row,
            column_number_to_letter(self.end_col),
            self.end_row
        )
    }
}
