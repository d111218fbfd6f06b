use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{Result, ToolError};
use crate::model::{ExtractedReport, normalize_identifier};

/// Reads a JSON array of records. The keys of the first record, in document
/// order, become the field identifiers; an empty array yields none.
pub fn extract(path: &Path) -> Result<ExtractedReport> {
    let source = fs::read(path)?;
    let json: Value =
        serde_json::from_slice(&source).map_err(|err| ToolError::malformed(path, err))?;

    let records = json
        .as_array()
        .ok_or_else(|| ToolError::malformed(path, "expected a JSON array of records"))?;

    let fields = match records.first() {
        None => Vec::new(),
        Some(Value::Object(record)) => {
            record.keys().map(|key| normalize_identifier(key)).collect()
        }
        Some(_) => {
            return Err(ToolError::malformed(
                path,
                "first array element is not a JSON object",
            ));
        }
    };

    Ok(ExtractedReport::with_fields(fields))
}
