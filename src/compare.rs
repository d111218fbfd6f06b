use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::assemble::{self, MERGE_THRESHOLD, SourceReport};
use crate::error::Result;
use crate::io;
use crate::model::{CellValue, MatchResult};
use crate::workbook::{ReportWorkbook, SheetKind};

/// What a comparison produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonOutcome {
    /// Merged workbook, absent when the pair scored below the threshold.
    pub output_path: Option<PathBuf>,
    pub overall_percent: f64,
    pub result: MatchResult,
}

impl ComparisonOutcome {
    pub fn merged(&self) -> bool {
        self.output_path.is_some()
    }

    /// Human readable summary of the outcome.
    pub fn message(&self) -> String {
        let output = match &self.output_path {
            Some(path) => path.display().to_string(),
            None => format!("none (below {MERGE_THRESHOLD}% merge threshold)"),
        };
        format!(
            "Matching Percentage: {:.2}%\nOutput File: {output}",
            self.overall_percent
        )
    }
}

/// Compares two reports and writes the merged workbook into the current
/// working directory.
pub fn compare(first: &Path, second: &Path) -> Result<ComparisonOutcome> {
    compare_into(first, second, Path::new(""))
}

/// Compares two reports and, when they match closely enough, appends both
/// detail rows and the summary row to `{first}_{second}_merged.xlsx` inside
/// `output_dir`.
///
/// The workbook is loaded once, updated in memory and saved once.
#[instrument(
    level = "info",
    skip_all,
    fields(first = %first.display(), second = %second.display())
)]
pub fn compare_into(first: &Path, second: &Path, output_dir: &Path) -> Result<ComparisonOutcome> {
    let first_report = io::extract(first)?;
    let second_report = io::extract(second)?;

    let result = MatchResult::between(&first_report, &second_report);
    info!(
        field_match = result.field_match_percent,
        filter_match = result.filter_match_percent,
        source_match = result.source_match_percent,
        overall = result.overall_percent,
        "computed match percentages"
    );

    let plan = assemble::assemble(
        SourceReport {
            path: first,
            report: &first_report,
        },
        SourceReport {
            path: second,
            report: &second_report,
        },
        &result,
    );

    let Some(plan) = plan else {
        info!(threshold = MERGE_THRESHOLD, "match below threshold, not merging");
        return Ok(ComparisonOutcome {
            output_path: None,
            overall_percent: result.overall_percent,
            result,
        });
    };

    let output_path = output_dir.join(&plan.output_file_name);
    let mut workbook = ReportWorkbook::open_or_create(&output_path)?;
    for detail in &plan.details {
        workbook.append(SheetKind::Detail, detail.to_cells());
    }
    workbook.append(SheetKind::Summary, plan.summary.to_cells());
    workbook.save(&output_path)?;
    info!(output = %output_path.display(), "merged workbook written");

    Ok(ComparisonOutcome {
        output_path: Some(output_path),
        overall_percent: result.overall_percent,
        result,
    })
}

/// Appends a single row to the given sheet of the workbook at `path` in one
/// load, append, save cycle.
///
/// Not safe to call concurrently for the same path.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), ?kind))]
pub fn append_row(path: &Path, kind: SheetKind, cells: Vec<CellValue>) -> Result<()> {
    let mut workbook = ReportWorkbook::open_or_create(path)?;
    workbook.append(kind, cells);
    debug!("row appended");
    workbook.save(path)
}
