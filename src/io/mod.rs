//! Readers for the supported report formats plus the workbook adapters.

pub mod csv_read;
pub mod excel_read;
pub mod excel_write;
pub mod json_read;
pub mod xml_read;

use std::path::Path;

use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::ExtractedReport;

/// Report formats that can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Xml,
    Json,
}

impl ReportFormat {
    /// Picks the format from the file extension, ignoring case.
    pub fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(ReportFormat::Csv),
            Some("xml") => Ok(ReportFormat::Xml),
            Some("json") => Ok(ReportFormat::Json),
            _ => Err(ToolError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Runs the extractor for this format.
    pub fn extract(self, path: &Path) -> Result<ExtractedReport> {
        match self {
            ReportFormat::Csv => csv_read::extract(path),
            ReportFormat::Xml => xml_read::extract(path),
            ReportFormat::Json => json_read::extract(path),
        }
    }
}

/// Extracts the identifiers of the report stored at `path`.
pub fn extract(path: &Path) -> Result<ExtractedReport> {
    let format = ReportFormat::detect(path)?;
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }

    let report = format.extract(path)?;
    debug!(
        path = %path.display(),
        ?format,
        fields = report.field_identifiers.len(),
        filters = report.filter_expressions.len(),
        sources = report.data_sources.len(),
        "extracted report"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn detects_extensions_case_insensitively() {
        assert_eq!(
            ReportFormat::detect(Path::new("a/B.CSV")).expect("csv"),
            ReportFormat::Csv
        );
        assert_eq!(
            ReportFormat::detect(Path::new("report.Xml")).expect("xml"),
            ReportFormat::Xml
        );
        assert_eq!(
            ReportFormat::detect(Path::new("rows.json")).expect("json"),
            ReportFormat::Json
        );
    }

    #[test]
    fn rejects_unknown_extensions() {
        for name in ["report.txt", "report", "report.csv.bak"] {
            let err = ReportFormat::detect(Path::new(name)).expect_err("unsupported");
            assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let err = extract(Path::new("definitely/not/here.csv")).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }
}
