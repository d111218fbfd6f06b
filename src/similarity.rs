//! Set-overlap scoring between two extracted reports.

use std::collections::BTreeSet;

use crate::model::{ExtractedReport, MatchResult};

/// Jaccard overlap of two identifier lists as a percentage in `[0, 100]`.
///
/// Duplicates are ignored. Two empty inputs score `0`.
pub fn percentage<S: AsRef<str>>(lhs: &[S], rhs: &[S]) -> f64 {
    let lhs = to_set(lhs);
    let rhs = to_set(rhs);

    let union = lhs.union(&rhs).count();
    if union == 0 {
        return 0.0;
    }
    let shared = lhs.intersection(&rhs).count();
    shared as f64 / union as f64 * 100.0
}

/// Values present in both lists.
pub fn matched<S: AsRef<str>>(lhs: &[S], rhs: &[S]) -> BTreeSet<String> {
    let rhs = to_set(rhs);
    to_set(lhs)
        .into_iter()
        .filter(|value| rhs.contains(value))
        .map(str::to_string)
        .collect()
}

fn to_set<S: AsRef<str>>(values: &[S]) -> BTreeSet<&str> {
    values.iter().map(|value| value.as_ref()).collect()
}

impl MatchResult {
    /// Scores the overlap of every category and averages the three
    /// percentages without weighting.
    pub fn between(lhs: &ExtractedReport, rhs: &ExtractedReport) -> Self {
        let field_match_percent = percentage(&lhs.field_identifiers, &rhs.field_identifiers);
        let filter_match_percent = percentage(&lhs.filter_expressions, &rhs.filter_expressions);
        let source_match_percent = percentage(&lhs.data_sources, &rhs.data_sources);

        MatchResult {
            matched_field_identifiers: matched(&lhs.field_identifiers, &rhs.field_identifiers),
            field_match_percent,
            matched_filters: matched(&lhs.filter_expressions, &rhs.filter_expressions),
            filter_match_percent,
            matched_sources: matched(&lhs.data_sources, &rhs.data_sources),
            source_match_percent,
            overall_percent: (field_match_percent + filter_match_percent + source_match_percent)
                / 3.0,
        }
    }
}
