use std::collections::HashSet;
use std::path::Path;

use crate::excel::{read_first_sheet, write_workbook, SheetSnapshot};
use crate::profile::Parameter;

use super::fidelity::project_rows;
use super::lookup::ParameterLookup;
use super::naming::{file_base, output_file_name, NON_MATCHING_LABEL};
use super::planner::plan_split;
use super::types::{CreatedFile, SplitError, SplitManifest, SplitOptions};

/// Split the first sheet of `source_path` into one workbook per region.
///
/// Files are written one after another. A write failure stops the run;
/// files written before it are left in place and listed in the error.
pub fn classify_and_split(
    source_path: &str,
    column_index: usize,
    parameters: &[Parameter],
    output_dir: &str,
    options: &SplitOptions,
) -> Result<SplitManifest, SplitError> {
    let output_root = Path::new(output_dir);
    if !output_root.is_dir() {
        return Err(SplitError::OutputDirMissing {
            path: output_dir.to_string(),
        });
    }

    let workbook = read_first_sheet(source_path)?;
    let sheet = &workbook.sheet;

    if sheet.rows.len() < 2 {
        return Err(SplitError::NoDataRows);
    }

    let lookup = ParameterLookup::build(parameters);
    let mut warnings = Vec::new();

    for key in lookup.shadowed() {
        tracing::warn!(value = %key, "duplicate parameter value, the last entry wins");
        warnings.push(format!(
            "Parameter value '{}' appears more than once; the last entry is used",
            key
        ));
    }

    let plan = plan_split(sheet, column_index, &lookup, options.keep_non_matching);

    tracing::info!(
        source_path,
        column_index,
        data_rows = plan.data_rows,
        regions = plan.groups.len(),
        unmatched = plan.unmatched_rows,
        excluded = plan.excluded_rows,
        keep_non_matching = options.keep_non_matching,
        "classified source rows"
    );

    let date = options
        .run_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let base = file_base(Path::new(source_path), options.output_prefix.as_deref());

    let mut writer = FileSetWriter::new(output_root, sheet);
    let mut skipped = Vec::new();

    for group in &plan.groups {
        if group.rows.is_empty() {
            skipped.push(group.region.clone());
            continue;
        }

        let file_name = output_file_name(date, &base, &group.region);
        let cost_centers = group.cost_centers.iter().cloned().collect();
        writer.write(file_name, &group.region, &group.rows, cost_centers)?;
    }

    if !plan.catch_all.is_empty() {
        let file_name = output_file_name(date, &base, NON_MATCHING_LABEL);
        writer.write(file_name, NON_MATCHING_LABEL, &plan.catch_all, Vec::new())?;
    }

    warnings.extend(writer.collisions.iter().map(|name| {
        format!("Output file '{}' was written more than once; only the last region is kept", name)
    }));

    tracing::info!(
        output_dir,
        files = writer.created.len(),
        "split complete"
    );

    Ok(SplitManifest {
        success: true,
        created: writer.created,
        skipped,
        output_dir: output_dir.to_string(),
        total_rows: plan.data_rows,
        warnings,
    })
}

/// Sequential writer for the output files of one split
struct FileSetWriter<'a> {
    output_root: &'a Path,
    source: &'a SheetSnapshot,
    created: Vec<CreatedFile>,
    names: HashSet<String>,
    collisions: Vec<String>,
}

impl<'a> FileSetWriter<'a> {
    fn new(output_root: &'a Path, source: &'a SheetSnapshot) -> Self {
        FileSetWriter {
            output_root,
            source,
            created: Vec::new(),
            names: HashSet::new(),
            collisions: Vec::new(),
        }
    }

    fn write(
        &mut self,
        file_name: String,
        region: &str,
        rows: &[usize],
        cost_centers: Vec<String>,
    ) -> Result<(), SplitError> {
        let output = project_rows(self.source, rows);
        let path = self.output_root.join(&file_name);

        let checksum = write_workbook(&output, &path).map_err(|e| {
            tracing::error!(file = %file_name, error = %e, "failed to write output file");
            SplitError::Write {
                file: file_name.clone(),
                written: self.created.iter().map(|f| f.file_name.clone()).collect(),
                message: e.to_string(),
            }
        })?;

        tracing::debug!(file = %file_name, rows = rows.len(), region, "wrote output file");

        if !self.names.insert(file_name.clone()) {
            tracing::warn!(file = %file_name, "output file name reused");
            self.collisions.push(file_name.clone());
        }

        self.created.push(CreatedFile {
            file_name,
            row_count: rows.len(),
            region: region.to_string(),
            cost_centers,
            checksum,
        });

        Ok(())
    }
}
