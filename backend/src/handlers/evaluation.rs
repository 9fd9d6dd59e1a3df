//! Evaluation handlers for dashboard data, metrics and export

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentSession;
use crate::services::evaluation::{
    FarmEvaluationsView, SelectionMetrics, SelectionQuery, VisitMetrics,
};
use crate::services::{EvaluationService, ExportFormat, ExportService};
use crate::AppState;

#[derive(Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub rounded: bool,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>, // "xlsx" or "csv"
}

/// Evaluations of a farm with date and operator groupings
pub async fn list_farm_evaluations(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(farm_id): Path<String>,
) -> AppResult<Json<FarmEvaluationsView>> {
    let service = EvaluationService::new(state.evaluations_api(current.0.session_id));
    let view = service.farm_evaluations(&farm_id).await?;
    Ok(Json(view))
}

/// Aggregate metrics for a date and/or operator selection
pub async fn get_selection_metrics(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(farm_id): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> AppResult<Json<SelectionMetrics>> {
    let service = EvaluationService::new(state.evaluations_api(current.0.session_id));
    let metrics = service.selection_metrics(&farm_id, query).await?;
    Ok(Json(metrics))
}

/// Metrics of one evaluation visit
pub async fn get_evaluation_metrics(
    State(state): State<AppState>,
    current: CurrentSession,
    Path((farm_id, evaluation_id)): Path<(String, String)>,
    Query(query): Query<MetricsQuery>,
) -> AppResult<Json<VisitMetrics>> {
    let service = EvaluationService::new(state.evaluations_api(current.0.session_id));
    let metrics = service
        .evaluation_metrics(&farm_id, &evaluation_id, query.rounded)
        .await?;
    Ok(Json(metrics))
}

/// Download one evaluation visit as a spreadsheet
pub async fn export_evaluation(
    State(state): State<AppState>,
    current: CurrentSession,
    Path((farm_id, evaluation_id)): Path<(String, String)>,
    Query(query): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let format: ExportFormat = query
        .format
        .as_deref()
        .unwrap_or(state.config.export.default_format.as_str())
        .parse()?;

    let service = EvaluationService::new(state.evaluations_api(current.0.session_id));
    let visit = service.find_evaluation(&farm_id, &evaluation_id).await?;
    let file = ExportService::export_visit(&visit, format)?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    ))
}
