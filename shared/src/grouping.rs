//! Grouping of evaluation visits by date and by operator

use indexmap::IndexMap;

use crate::dates::sort_by_date_desc;
use crate::models::{EvaluationVisit, EvaluationsResponse};

/// Placeholder the field app stores when no operator was assigned
pub const OPERATOR_PLACEHOLDER: &str = "N/A";

/// Visits keyed by date or operator, in insertion order
pub type VisitGroups = IndexMap<String, Vec<EvaluationVisit>>;

pub fn is_placeholder_operator(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.eq_ignore_ascii_case(OPERATOR_PLACEHOLDER)
}

/// Group visits by date, keys in order of first occurrence
pub fn group_by_date(visits: &[EvaluationVisit]) -> VisitGroups {
    let mut groups = VisitGroups::new();
    for visit in visits {
        groups
            .entry(visit.date.trim().to_string())
            .or_default()
            .push(visit.clone());
    }
    groups
}

/// Group visits by operator name, skipping placeholder and blank operators
pub fn group_by_operator(visits: &[EvaluationVisit]) -> VisitGroups {
    let mut groups = VisitGroups::new();
    for visit in visits {
        let Some(name) = visit.operator_name() else {
            continue;
        };
        if is_placeholder_operator(name) {
            continue;
        }
        groups.entry(name.to_string()).or_default().push(visit.clone());
    }
    groups
}

/// Reorder date groups most recent first
pub fn sort_groups_by_date_desc(groups: VisitGroups) -> VisitGroups {
    let mut entries: Vec<(String, Vec<EvaluationVisit>)> = groups.into_iter().collect();
    sort_by_date_desc(&mut entries, |(date, _)| date.as_str());
    entries.into_iter().collect()
}

/// Date keys of a grouping, most recent first
pub fn sorted_date_keys(groups: &VisitGroups) -> Vec<String> {
    let mut keys: Vec<String> = groups.keys().cloned().collect();
    crate::dates::sort_dates_desc(&mut keys);
    keys
}

/// Fill in whatever the evaluations API left out and order dates descending.
///
/// The flat list is rebuilt from the date groups when missing; each grouping
/// is rebuilt from the flat list when missing.
pub fn normalize_response(mut response: EvaluationsResponse) -> EvaluationsResponse {
    if response.evaluations.is_empty() && !response.evaluations_by_date.is_empty() {
        response.evaluations = response
            .evaluations_by_date
            .values()
            .flatten()
            .cloned()
            .collect();
    }
    if response.evaluations_by_date.is_empty() {
        response.evaluations_by_date = group_by_date(&response.evaluations);
    }
    if response.evaluations_by_operator.is_empty() {
        response.evaluations_by_operator = group_by_operator(&response.evaluations);
    } else {
        response
            .evaluations_by_operator
            .retain(|name, _| !is_placeholder_operator(name));
    }
    response.evaluations_by_date = sort_groups_by_date_desc(response.evaluations_by_date);
    response
}
