//! Dashboard state tests for the Pollination Monitor
//!
//! Tests for loading a farm's evaluations, selecting a date or operator and
//! recomputing metrics from the selection.

use serde_json::json;
use shared::{DashboardState, EvaluationsResponse};

fn response() -> EvaluationsResponse {
    serde_json::from_value(json!({
        "evaluations": [
            {
                "id": "a", "date": "15/01/2024", "operator": "Luis",
                "details": [
                    { "antesis": 2, "antesisLeft": 1, "postAntesis": 1 },
                    { "pass1": 1 }
                ]
            },
            {
                "id": "b", "date": "01/03/2024", "operator": "Marta",
                "details": [{ "antesis": 4, "pass1": 0 }]
            },
            {
                "id": "c", "date": "01/03/2024", "operator": "Luis",
                "details": [{ "emasculation": 1 }]
            }
        ],
        "message": "3 evaluaciones"
    }))
    .unwrap()
}

fn loaded() -> DashboardState {
    let mut state = DashboardState::new();
    state.load(Ok(response()));
    state
}

#[test]
fn load_exposes_dates_and_operators() {
    let state = loaded();

    assert!(state.is_loaded());
    assert_eq!(state.dates(), vec!["01/03/2024", "15/01/2024"]);
    assert_eq!(state.operators(), vec!["Luis", "Marta"]);
    assert_eq!(state.message(), Some("3 evaluaciones"));
}

#[test]
fn no_metrics_until_something_is_selected() {
    let state = loaded();
    assert!(state.selected_visits().is_empty());
    assert!(state.metrics().is_none());
}

#[test]
fn date_selection_aggregates_all_operators() {
    let mut state = loaded();
    state.select_date(Some("01/03/2024".to_string()));

    let metrics = state.metrics().unwrap();
    assert_eq!(state.selected_visits().len(), 2);
    assert_eq!(metrics.event_count, 2);
    assert_eq!(metrics.sum_antesis, 4.0);
    assert_eq!(metrics.sum_emasculation, 1.0);
}

#[test]
fn date_and_operator_selection_narrows_visits() {
    let mut state = loaded();
    state.select_date(Some("15/01/2024".to_string()));
    state.select_operator(Some("Luis".to_string()));

    let metrics = state.metrics().unwrap();
    assert_eq!(metrics.event_count, 2);
    assert_eq!(metrics.sum_inflorescence, 4.0);
    assert_eq!(metrics.antesis_proportion, 75.0);
    assert_eq!(metrics.pass1_pct, 5.0);
}

#[test]
fn operator_selection_spans_dates() {
    let mut state = loaded();
    state.select_operator(Some("Luis".to_string()));

    assert_eq!(state.selected_visits().len(), 2);
    let snapshot = state.snapshot();
    assert_eq!(snapshot.visit_count, 2);
    assert_eq!(snapshot.selected_operator.as_deref(), Some("Luis"));
    assert!(snapshot.metrics.is_some());
}

#[test]
fn failed_load_clears_previous_data() {
    let mut state = loaded();
    state.select_date(Some("01/03/2024".to_string()));
    state.load(Err("Evaluations API unavailable".to_string()));

    assert!(!state.is_loaded());
    assert_eq!(state.error(), Some("Evaluations API unavailable"));
    assert!(state.dates().is_empty());
    assert!(state.evaluations().is_empty());
    assert!(state.selected_date().is_none());
    assert!(state.metrics().is_none());
}

#[test]
fn successful_load_clears_previous_error() {
    let mut state = DashboardState::new();
    state.load(Err("timeout".to_string()));
    state.load(Ok(response()));

    assert!(state.error().is_none());
    assert!(state.find_visit("b").is_some());
    assert!(state.find_visit("zzz").is_none());
}
