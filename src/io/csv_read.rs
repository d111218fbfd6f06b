use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{Result, ToolError};
use crate::model::{ExtractedReport, normalize_identifier};

/// Reads the header record of a CSV file. Its cells become the field
/// identifiers; CSV reports carry no filters or data sources.
pub fn extract(path: &Path) -> Result<ExtractedReport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| csv_error(path, err))?;

    let mut header = StringRecord::new();
    let found = reader
        .read_record(&mut header)
        .map_err(|err| csv_error(path, err))?;
    if !found {
        return Err(ToolError::malformed(path, "CSV file has no header record"));
    }

    let fields = header.iter().map(normalize_identifier).collect();
    Ok(ExtractedReport::with_fields(fields))
}

fn csv_error(path: &Path, err: csv::Error) -> ToolError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io_err) = err.into_kind() {
            return ToolError::Io(io_err);
        }
        return ToolError::malformed(path, "CSV read failed");
    }
    ToolError::malformed(path, err)
}
