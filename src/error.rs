use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool reads report definitions or writes the merged workbook.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the outcome cannot be serialised as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when an existing output workbook cannot be interpreted.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the input extension is not one of csv, xml or json.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Raised when an input cannot be parsed or lacks a required element.
    #[error("malformed input {path}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Coarse classification of [`ToolError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    UnsupportedFormat,
    MalformedInput,
    Io,
}

impl ToolError {
    /// Builds a [`ToolError::MalformedInput`] for the given path.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ToolError::MalformedInput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::MissingInput(_) => ErrorKind::FileNotFound,
            ToolError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ToolError::MalformedInput { .. } => ErrorKind::MalformedInput,
            ToolError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::FileNotFound
            }
            ToolError::Io(_)
            | ToolError::Json(_)
            | ToolError::ExcelWrite(_)
            | ToolError::ExcelRead(_)
            | ToolError::InvalidWorkbook(_)
            | ToolError::Logging(_) => ErrorKind::Io,
        }
    }
}
