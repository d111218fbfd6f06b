//! Merge decision and construction of the workbook rows for a compared pair.

use std::path::Path;

use crate::model::{DetailRow, ExtractedReport, MatchResult, NO_MATCH, SummaryRow, join_block};

/// Overall match percentage a pair must reach to be merged.
pub const MERGE_THRESHOLD: f64 = 75.0;
/// Extension of the merged workbook.
pub const WORKBOOK_EXTENSION: &str = "xlsx";

/// An input report together with where it was read from.
#[derive(Debug, Clone, Copy)]
pub struct SourceReport<'a> {
    pub path: &'a Path,
    pub report: &'a ExtractedReport,
}

impl SourceReport<'_> {
    /// File name without directory or extension.
    pub fn name(&self) -> String {
        report_name(self.path)
    }

    fn detail_row(&self) -> DetailRow {
        DetailRow {
            name: self.name(),
            path: self.path.display().to_string(),
            field_identifiers: join_block(&self.report.field_identifiers),
            data_sources: join_block(&self.report.data_sources),
            filter_expressions: join_block(&self.report.filter_expressions),
        }
    }
}

/// Rows to write for a pair that passed the merge threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    /// File name of the merged workbook, `{first}_{second}_merged.xlsx`.
    pub output_file_name: String,
    pub details: [DetailRow; 2],
    pub summary: SummaryRow,
}

/// True when the overall percentage reaches the merge threshold.
pub fn should_merge(result: &MatchResult) -> bool {
    result.overall_percent >= MERGE_THRESHOLD
}

/// Builds the rows for a compared pair, or `None` when the pair scored below
/// [`MERGE_THRESHOLD`].
pub fn assemble(
    first: SourceReport<'_>,
    second: SourceReport<'_>,
    result: &MatchResult,
) -> Option<MergePlan> {
    if !should_merge(result) {
        return None;
    }

    let first_name = first.name();
    let second_name = second.name();

    let summary = SummaryRow {
        combined_name: format!("{first_name}_{second_name}_COMBINED"),
        matched_fields: matched_block(&result.matched_field_identifiers),
        field_match_percent: result.field_match_percent,
        matched_filters: matched_block(&result.matched_filters),
        filter_match_percent: result.filter_match_percent,
        matched_sources: matched_block(&result.matched_sources),
        source_match_percent: result.source_match_percent,
        overall_percent: result.overall_percent,
    };

    Some(MergePlan {
        output_file_name: format!("{first_name}_{second_name}_merged.{WORKBOOK_EXTENSION}"),
        details: [first.detail_row(), second.detail_row()],
        summary,
    })
}

/// File stem of `path`, or the empty string when it has none.
pub fn report_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn matched_block<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a String>,
    I::IntoIter: ExactSizeIterator,
{
    let values = values.into_iter();
    if values.len() == 0 {
        NO_MATCH.to_string()
    } else {
        join_block(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn report(fields: &[&str], filters: &[&str], source: &str) -> ExtractedReport {
        ExtractedReport {
            field_identifiers: fields.iter().map(|s| s.to_string()).collect(),
            filter_expressions: filters.iter().map(|s| s.to_string()).collect(),
            data_sources: vec![source.to_string()],
        }
    }

    #[test]
    fn below_threshold_is_rejected() {
        let lhs = ExtractedReport::with_fields(vec!["id".into(), "name".into(), "email".into()]);
        let rhs = ExtractedReport::with_fields(vec!["id".into(), "name".into(), "email".into()]);
        let result = MatchResult::between(&lhs, &rhs);

        assert!((result.overall_percent - 100.0 / 3.0).abs() < 1e-9);
        let plan = assemble(
            SourceReport { path: Path::new("a.csv"), report: &lhs },
            SourceReport { path: Path::new("b.csv"), report: &rhs },
            &result,
        );
        assert!(plan.is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut result = MatchResult {
            matched_field_identifiers: BTreeSet::new(),
            field_match_percent: 75.0,
            matched_filters: BTreeSet::new(),
            filter_match_percent: 75.0,
            matched_sources: BTreeSet::new(),
            source_match_percent: 75.0,
            overall_percent: 75.0,
        };
        assert!(should_merge(&result));
        result.overall_percent = 74.999;
        assert!(!should_merge(&result));
    }

    #[test]
    fn builds_rows_and_names() {
        let lhs = report(&["b", "a"], &["x = 1"], "sales");
        let rhs = report(&["a", "b"], &["x = 1"], "sales");
        let result = MatchResult::between(&lhs, &rhs);

        let plan = assemble(
            SourceReport { path: Path::new("dir/first.report.xml"), report: &lhs },
            SourceReport { path: Path::new("/abs/second.xml"), report: &rhs },
            &result,
        )
        .expect("pair merged");

        assert_eq!(plan.output_file_name, "first.report_second_merged.xlsx");
        assert_eq!(plan.summary.combined_name, "first.report_second_COMBINED");
        assert_eq!(plan.summary.matched_fields, "a,\nb");
        assert_eq!(plan.summary.matched_filters, "x = 1");
        assert_eq!(plan.summary.overall_percent, 100.0);

        let first = &plan.details[0];
        assert_eq!(first.name, "first.report");
        assert_eq!(first.path, Path::new("dir/first.report.xml").display().to_string());
        assert_eq!(first.field_identifiers, "b,\na");
        assert_eq!(first.data_sources, "sales");
        assert_eq!(first.filter_expressions, "x = 1");
    }

    #[test]
    fn empty_matches_render_no_match() {
        let empty: BTreeSet<String> = BTreeSet::new();
        assert_eq!(matched_block(&empty), NO_MATCH);
    }
}
