use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Region label of the catch-all file
pub const NON_MATCHING_LABEL: &str = "NON_MATCHING";

/// Extension of every output file
pub const OUTPUT_EXTENSION: &str = "xlsx";

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\?%*:|"<>]"#).expect("valid file name pattern"));

/// Replace characters that are not allowed in file names with '-'
pub fn sanitize_label(label: &str) -> String {
    UNSAFE_FILE_CHARS.replace_all(label, "-").into_owned()
}

/// Base name for output files: the explicit prefix, or the source file stem
pub fn file_base(source_path: &Path, output_prefix: Option<&str>) -> String {
    match output_prefix {
        Some(prefix) if !prefix.is_empty() => prefix.to_string(),
        _ => source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// `{YYYYMMDD}_{base}_{region}.xlsx`
pub fn output_file_name(date: NaiveDate, base: &str, region: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        date.format("%Y%m%d"),
        base,
        sanitize_label(region),
        OUTPUT_EXTENSION
    )
}
