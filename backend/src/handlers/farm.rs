//! Farm handlers

use axum::{
    extract::{Path, State},
    Json,
};
use shared::Farm;

use crate::error::AppResult;
use crate::middleware::CurrentSession;
use crate::services::EvaluationService;
use crate::AppState;

/// List farms visible to the current supervisor
pub async fn list_farms(
    State(state): State<AppState>,
    current: CurrentSession,
) -> AppResult<Json<Vec<Farm>>> {
    let service = EvaluationService::new(state.evaluations_api(current.0.session_id));
    let farms = service.list_farms().await?;
    Ok(Json(farms))
}

/// Get a farm by ID
pub async fn get_farm(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(farm_id): Path<String>,
) -> AppResult<Json<Farm>> {
    let service = EvaluationService::new(state.evaluations_api(current.0.session_id));
    let farm = service.get_farm(&farm_id).await?;
    Ok(Json(farm))
}
