//! Evaluation service
//!
//! Loads a farm's evaluations through the evaluations API and derives the
//! dashboard views from them. Nothing is cached: every call fetches.

use serde::{Deserialize, Serialize};
use shared::{
    calculate_metrics, validate_date_filter, validate_identifier, DashboardState, EvaluationVisit,
    Farm, MetricsSummary, VisitGroups,
};

use crate::error::{AppError, AppResult};
use crate::external::EvaluationsApiClient;

/// Evaluations of a farm, grouped and ordered for the dashboard
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmEvaluationsView {
    pub farm_id: String,
    pub evaluations: Vec<EvaluationVisit>,
    pub evaluations_by_date: VisitGroups,
    pub evaluations_by_operator: VisitGroups,
    /// Date keys, most recent first
    pub dates: Vec<String>,
    pub operators: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Date/operator selection for aggregate metrics
#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub date: Option<String>,
    pub operator: Option<String>,
    #[serde(default)]
    pub rounded: bool,
}

/// Metrics over a selection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    pub visit_count: usize,
    pub metrics: MetricsSummary,
}

/// Metrics of one visit
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitMetrics {
    pub evaluation_id: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    pub metrics: MetricsSummary,
}

pub struct EvaluationService {
    api: EvaluationsApiClient,
}

impl EvaluationService {
    pub fn new(api: EvaluationsApiClient) -> Self {
        Self { api }
    }

    pub async fn list_farms(&self) -> AppResult<Vec<Farm>> {
        self.api.list_farms().await
    }

    pub async fn get_farm(&self, farm_id: &str) -> AppResult<Farm> {
        validate_identifier("farm_id", farm_id)?;
        self.api.get_farm(farm_id.trim()).await
    }

    /// Fetch a farm's evaluations into a fresh dashboard state
    async fn load_dashboard(&self, farm_id: &str) -> AppResult<DashboardState> {
        validate_identifier("farm_id", farm_id)?;
        let response = self.api.get_farm_evaluations(farm_id.trim()).await?;

        let mut dashboard = DashboardState::new();
        dashboard.load(Ok(response));
        tracing::debug!(
            "Loaded {} evaluations for farm {}",
            dashboard.evaluations().len(),
            farm_id
        );
        Ok(dashboard)
    }

    pub async fn farm_evaluations(&self, farm_id: &str) -> AppResult<FarmEvaluationsView> {
        let dashboard = self.load_dashboard(farm_id).await?;

        Ok(FarmEvaluationsView {
            farm_id: farm_id.trim().to_string(),
            evaluations: dashboard.evaluations().to_vec(),
            evaluations_by_date: dashboard.by_date().cloned().unwrap_or_default(),
            evaluations_by_operator: dashboard.by_operator().cloned().unwrap_or_default(),
            dates: dashboard.dates(),
            operators: dashboard.operators(),
            message: dashboard.message().map(str::to_string),
        })
    }

    /// Aggregate metrics over the visits matching a date and/or operator
    pub async fn selection_metrics(
        &self,
        farm_id: &str,
        query: SelectionQuery,
    ) -> AppResult<SelectionMetrics> {
        validate_date_filter(query.date.as_deref())?;

        let mut dashboard = self.load_dashboard(farm_id).await?;
        dashboard.select_date(query.date);
        dashboard.select_operator(query.operator);

        if dashboard.selected_date().is_none() && dashboard.selected_operator().is_none() {
            return Err(AppError::Validation {
                field: "date".to_string(),
                message: "Select a date or an operator".to_string(),
                message_es: "Seleccione una fecha o un polinizador".to_string(),
            });
        }

        let visit_count = dashboard.selected_visits().len();
        let metrics = dashboard.metrics().unwrap_or_default();

        Ok(SelectionMetrics {
            date: dashboard.selected_date().map(str::to_string),
            operator: dashboard.selected_operator().map(str::to_string),
            visit_count,
            metrics: if query.rounded { metrics.rounded() } else { metrics },
        })
    }

    /// Find one visit of a farm
    pub async fn find_evaluation(
        &self,
        farm_id: &str,
        evaluation_id: &str,
    ) -> AppResult<EvaluationVisit> {
        validate_identifier("evaluation_id", evaluation_id)?;
        let dashboard = self.load_dashboard(farm_id).await?;

        dashboard
            .find_visit(evaluation_id.trim())
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Evaluation {}", evaluation_id)))
    }

    pub async fn evaluation_metrics(
        &self,
        farm_id: &str,
        evaluation_id: &str,
        rounded: bool,
    ) -> AppResult<VisitMetrics> {
        let visit = self.find_evaluation(farm_id, evaluation_id).await?;
        let metrics = calculate_metrics(&visit.details);

        Ok(VisitMetrics {
            evaluation_id: visit.id.clone(),
            date: visit.date.clone(),
            operator: visit.operator_name().map(str::to_string),
            metrics: if rounded { metrics.rounded() } else { metrics },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use reqwest::Client;
    use serde_json::json;

    async fn service_with(body: serde_json::Value) -> EvaluationService {
        let app = Router::new().route(
            "/farms/:id/evaluations",
            get(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        EvaluationService::new(EvaluationsApiClient::anonymous(
            Client::new(),
            format!("http://{}", addr),
        ))
    }

    fn sample() -> serde_json::Value {
        json!({
            "evaluations": [
                {
                    "id": "a", "date": "15/01/2024", "operator": "Luis",
                    "details": [{ "inflorescence": 4, "antesis": 4, "emasculation": 2 }]
                },
                {
                    "id": "b", "date": "01/03/2024", "operator": "Marta",
                    "details": [{ "inflorescence": 2, "antesis": 1 }]
                },
                {
                    "id": "c", "date": "15/01/2024", "operator": "N/A",
                    "details": [{ "inflorescence": 6 }]
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_farm_evaluations_orders_dates_and_drops_placeholder() {
        let service = service_with(sample()).await;
        let view = service.farm_evaluations("7").await.unwrap();

        assert_eq!(view.dates, vec!["01/03/2024", "15/01/2024"]);
        assert_eq!(view.operators, vec!["Luis", "Marta"]);
        assert_eq!(view.evaluations.len(), 3);
    }

    #[tokio::test]
    async fn test_selection_metrics_by_date() {
        let service = service_with(sample()).await;
        let query = SelectionQuery {
            date: Some("15/01/2024".to_string()),
            ..Default::default()
        };
        let result = service.selection_metrics("7", query).await.unwrap();

        assert_eq!(result.visit_count, 2);
        assert_eq!(result.metrics.event_count, 2);
        assert_eq!(result.metrics.sum_antesis, 4.0);
    }

    #[tokio::test]
    async fn test_selection_of_unparseable_date_key() {
        let mut body = sample();
        body["evaluations"].as_array_mut().unwrap().push(json!({
            "id": "d", "date": "2024-03-01", "operator": "Ana",
            "details": [{ "antesis": 3 }, { "antesis": 1 }]
        }));
        let service = service_with(body).await;

        let view = service.farm_evaluations("7").await.unwrap();
        assert!(view.dates.contains(&"2024-03-01".to_string()));

        let query = SelectionQuery {
            date: Some(" 2024-03-01 ".to_string()),
            ..Default::default()
        };
        let result = service.selection_metrics("7", query).await.unwrap();

        assert_eq!(result.date.as_deref(), Some("2024-03-01"));
        assert_eq!(result.visit_count, 1);
        assert_eq!(result.metrics.event_count, 2);
        assert_eq!(result.metrics.sum_antesis, 4.0);
    }

    #[tokio::test]
    async fn test_selection_requires_filter() {
        let service = service_with(sample()).await;
        let err = service
            .selection_metrics("7", SelectionQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_evaluation_is_not_found() {
        let service = service_with(sample()).await;
        let err = service.find_evaluation("7", "zzz").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_farm_id_is_rejected_before_fetch() {
        let service = EvaluationService::new(EvaluationsApiClient::anonymous(
            Client::new(),
            "http://127.0.0.1:1",
        ));
        let err = service.farm_evaluations("../admin").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
