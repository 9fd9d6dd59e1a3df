//! Dashboard page state
//!
//! Holds the evaluations of the farm being viewed and the supervisor's
//! current date/operator selection. Metrics are recomputed from the
//! selection on every call and never cached.

use serde::Serialize;

use crate::grouping::{normalize_response, VisitGroups};
use crate::metrics::{calculate_metrics, MetricsSummary};
use crate::models::{EvaluationVisit, EvaluationsResponse};

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    data: Option<EvaluationsResponse>,
    error: Option<String>,
    selected_date: Option<String>,
    selected_operator: Option<String>,
}

/// Snapshot of what the page renders
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub dates: Vec<String>,
    pub operators: Vec<String>,
    pub selected_date: Option<String>,
    pub selected_operator: Option<String>,
    pub visit_count: usize,
    pub metrics: Option<MetricsSummary>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the outcome of a fetch. A failure clears everything loaded before.
    pub fn load(&mut self, result: Result<EvaluationsResponse, String>) {
        self.selected_date = None;
        self.selected_operator = None;
        match result {
            Ok(response) => {
                self.data = Some(normalize_response(response));
                self.error = None;
            }
            Err(message) => {
                tracing::warn!("Evaluations unavailable: {}", message);
                self.data = None;
                self.error = Some(message);
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.message.as_deref())
    }

    pub fn evaluations(&self) -> &[EvaluationVisit] {
        self.data
            .as_ref()
            .map(|d| d.evaluations.as_slice())
            .unwrap_or(&[])
    }

    pub fn by_date(&self) -> Option<&VisitGroups> {
        self.data.as_ref().map(|d| &d.evaluations_by_date)
    }

    pub fn by_operator(&self) -> Option<&VisitGroups> {
        self.data.as_ref().map(|d| &d.evaluations_by_operator)
    }

    /// Evaluation dates, most recent first
    pub fn dates(&self) -> Vec<String> {
        self.by_date()
            .map(|groups| groups.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn operators(&self) -> Vec<String> {
        self.by_operator()
            .map(|groups| groups.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn select_date(&mut self, date: Option<String>) {
        self.selected_date = date.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
    }

    pub fn select_operator(&mut self, operator: Option<String>) {
        self.selected_operator = operator
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
    }

    pub fn selected_date(&self) -> Option<&str> {
        self.selected_date.as_deref()
    }

    pub fn selected_operator(&self) -> Option<&str> {
        self.selected_operator.as_deref()
    }

    /// Visits matching the current selection; nothing is selected until a date or operator is
    pub fn selected_visits(&self) -> Vec<&EvaluationVisit> {
        if self.selected_date.is_none() && self.selected_operator.is_none() {
            return Vec::new();
        }
        self.evaluations()
            .iter()
            .filter(|visit| {
                self.selected_date
                    .as_deref()
                    .map_or(true, |date| visit.date.trim() == date)
            })
            .filter(|visit| {
                self.selected_operator
                    .as_deref()
                    .map_or(true, |op| visit.operator_name() == Some(op))
            })
            .collect()
    }

    /// Metrics over the observations of the selected visits
    pub fn metrics(&self) -> Option<MetricsSummary> {
        if !self.is_loaded() {
            return None;
        }
        let visits = self.selected_visits();
        if visits.is_empty() {
            return None;
        }
        Some(calculate_metrics(
            visits.iter().flat_map(|visit| visit.details.iter()),
        ))
    }

    pub fn find_visit(&self, evaluation_id: &str) -> Option<&EvaluationVisit> {
        self.evaluations().iter().find(|visit| visit.id == evaluation_id)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            dates: self.dates(),
            operators: self.operators(),
            selected_date: self.selected_date.clone(),
            selected_operator: self.selected_operator.clone(),
            visit_count: self.selected_visits().len(),
            metrics: self.metrics(),
            error: self.error.clone(),
            message: self.message().map(str::to_string),
        }
    }
}
