//! WebAssembly module for the Pollination Monitor
//!
//! Provides client-side computation for:
//! - Evaluation metrics over observation lists
//! - Date ordering and grouping of evaluation visits
//! - Export rows for spreadsheet downloads
//! - Dashboard selection state
//!
//! Values cross the boundary as JSON strings.

use shared::{
    build_export_table, calculate_metrics, normalize_response, observations_from_value,
    sort_dates_desc, sorted_date_keys, DashboardState, EvaluationVisit, EvaluationsResponse,
};
use wasm_bindgen::prelude::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str(concat!(
        "pollination-monitor-wasm ",
        env!("CARGO_PKG_VERSION")
    )));
}

fn js_error(message: String) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

fn metrics_json(observations_json: &str, rounded: bool) -> Result<String, String> {
    let value: serde_json::Value = serde_json::from_str(observations_json)
        .map_err(|e| format!("Invalid observations JSON: {}", e))?;
    let metrics = calculate_metrics(&observations_from_value(&value));
    let metrics = if rounded { metrics.rounded() } else { metrics };
    serde_json::to_string(&metrics).map_err(|e| e.to_string())
}

fn sorted_dates_json(dates_json: &str) -> Result<String, String> {
    let mut dates: Vec<String> =
        serde_json::from_str(dates_json).map_err(|e| format!("Invalid dates JSON: {}", e))?;
    sort_dates_desc(&mut dates);
    serde_json::to_string(&dates).map_err(|e| e.to_string())
}

fn grouped_json(response_json: &str) -> Result<String, String> {
    let response: EvaluationsResponse = serde_json::from_str(response_json)
        .map_err(|e| format!("Invalid evaluations JSON: {}", e))?;
    let response = normalize_response(response);
    let dates = sorted_date_keys(&response.evaluations_by_date);

    let mut body = serde_json::to_value(&response).map_err(|e| e.to_string())?;
    if let serde_json::Value::Object(map) = &mut body {
        map.insert("dates".to_string(), serde_json::json!(dates));
    }
    serde_json::to_string(&body).map_err(|e| e.to_string())
}

fn export_json(visit_json: &str) -> Result<String, String> {
    let visit: EvaluationVisit = serde_json::from_str(visit_json)
        .map_err(|e| format!("Invalid evaluation JSON: {}", e))?;
    let table = build_export_table(&visit, "xlsx").map_err(|e| e.to_string())?;
    serde_json::to_string(&table).map_err(|e| e.to_string())
}

fn load_json(state: &mut DashboardState, response_json: &str) -> Result<(), String> {
    match serde_json::from_str::<EvaluationsResponse>(response_json) {
        Ok(response) => {
            state.load(Ok(response));
            Ok(())
        }
        Err(e) => {
            let message = format!("Invalid evaluations JSON: {}", e);
            state.load(Err(message.clone()));
            Err(message)
        }
    }
}

/// Calculate the metrics summary of a JSON observation list
#[wasm_bindgen]
pub fn calculate_pollination_metrics(
    observations_json: &str,
    rounded: bool,
) -> Result<String, JsValue> {
    metrics_json(observations_json, rounded).map_err(js_error)
}

/// Sort a JSON list of DD/MM/YYYY dates, most recent first
#[wasm_bindgen]
pub fn sort_evaluation_dates(dates_json: &str) -> Result<String, JsValue> {
    sorted_dates_json(dates_json).map_err(js_error)
}

/// Normalize an evaluations response and add its ordered date keys
#[wasm_bindgen]
pub fn group_evaluations(response_json: &str) -> Result<String, JsValue> {
    grouped_json(response_json).map_err(js_error)
}

/// Header and rows of the spreadsheet export of one visit
#[wasm_bindgen]
pub fn export_rows(visit_json: &str) -> Result<String, JsValue> {
    export_json(visit_json).map_err(js_error)
}

/// Dashboard page state held by the browser
#[wasm_bindgen]
#[derive(Default)]
pub struct Dashboard {
    state: DashboardState,
}

#[wasm_bindgen]
impl Dashboard {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Dashboard {
        Dashboard::default()
    }

    /// Load a fetched evaluations response; an unreadable body counts as a failed load
    pub fn load(&mut self, response_json: &str) -> Result<(), JsValue> {
        load_json(&mut self.state, response_json).map_err(js_error)
    }

    /// Record a failed fetch; previously loaded data is dropped
    pub fn load_failed(&mut self, message: String) {
        self.state.load(Err(message));
    }

    pub fn select_date(&mut self, date: Option<String>) {
        self.state.select_date(date);
    }

    pub fn select_operator(&mut self, operator: Option<String>) {
        self.state.select_operator(operator);
    }

    pub fn dates(&self) -> js_sys::Array {
        self.state.dates().into_iter().map(JsValue::from).collect()
    }

    pub fn operators(&self) -> js_sys::Array {
        self.state.operators().into_iter().map(JsValue::from).collect()
    }

    /// Current view as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.snapshot()).map_err(|e| js_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_json() {
        let json = metrics_json(r#"[{"antesis": 2, "antesisLeft": 1, "postAntesis": 1}]"#, false)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sumInflorescence"], 4.0);
        assert_eq!(value["antesisProportion"], 75.0);
    }

    #[test]
    fn test_metrics_json_null_is_zero() {
        let json = metrics_json("null", false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["eventCount"], 0);
        assert_eq!(value["totalScore"], 0.0);
    }

    #[test]
    fn test_sorted_dates_json() {
        let json = sorted_dates_json(r#"["01/03/2024","15/01/2024","20/02/2024"]"#).unwrap();
        assert_eq!(json, r#"["01/03/2024","20/02/2024","15/01/2024"]"#);
        assert!(sorted_dates_json("{").is_err());
    }

    #[test]
    fn test_grouped_json_adds_dates() {
        let json = grouped_json(
            r#"{"evaluations": [
                {"id": 1, "date": "15/01/2024", "operator": "Ana"},
                {"id": 2, "date": "01/03/2024", "operator": "N/A"}
            ]}"#,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dates"], serde_json::json!(["01/03/2024", "15/01/2024"]));
        assert!(value["evaluationsByOperator"].get("N/A").is_none());
    }

    #[test]
    fn test_malformed_body_clears_loaded_state() {
        let mut state = DashboardState::new();
        load_json(
            &mut state,
            r#"{"evaluations": [{"id": "a", "date": "15/01/2024", "operator": "Luis", "details": [{"antesis": 1}]}]}"#,
        )
        .unwrap();
        state.select_operator(Some("Luis".to_string()));
        assert!(state.metrics().is_some());

        let err = load_json(&mut state, "{").unwrap_err();
        assert!(err.starts_with("Invalid evaluations JSON"));
        assert!(!state.is_loaded());
        assert!(state.dates().is_empty());
        assert!(state.selected_operator().is_none());
        assert!(state.metrics().is_none());
        assert_eq!(state.error(), Some(err.as_str()));
    }

    #[test]
    fn test_export_json_without_data() {
        let err = export_json(r#"{"id": "v1", "date": "15/01/2024"}"#).unwrap_err();
        assert!(err.contains("v1"));
    }
}
