//! Evaluations API client
//!
//! Client for the field-data API that owns farms and pollination
//! evaluations. The client carries no global state: the bearer token comes
//! from an injected [`TokenProvider`] and a rejected token is reported to an
//! injected [`UnauthorizedHandler`].

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{EvaluationsResponse, Farm, FarmList, LoginCredentials, UpstreamLogin};

use crate::error::{AppError, AppResult};

/// Source of the bearer token sent upstream
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Called when the evaluations API answers 401
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

/// No token, for unauthenticated calls such as login
pub struct NoToken;

impl TokenProvider for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// Ignores rejections, for unauthenticated calls
pub struct IgnoreUnauthorized;

impl UnauthorizedHandler for IgnoreUnauthorized {
    fn on_unauthorized(&self) {}
}

/// Client for the evaluations API
#[derive(Clone)]
pub struct EvaluationsApiClient {
    http_client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    on_unauthorized: Arc<dyn UnauthorizedHandler>,
}

impl EvaluationsApiClient {
    /// Create a client sending the provider's token
    pub fn new(
        http_client: Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        on_unauthorized: Arc<dyn UnauthorizedHandler>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            tokens,
            on_unauthorized,
        }
    }

    /// Create a client for unauthenticated calls
    pub fn anonymous(http_client: Client, base_url: impl Into<String>) -> Self {
        Self::new(
            http_client,
            base_url,
            Arc::new(NoToken),
            Arc::new(IgnoreUnauthorized),
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http_client.request(method, url);
        match self.tokens.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> AppResult<Response> {
        builder.send().await.map_err(|e| {
            tracing::warn!("Evaluations API request for {} failed: {}", what, e);
            AppError::UpstreamUnavailable(format!("{} request failed: {}", what, e))
        })
    }

    /// Map upstream status codes to errors and decode a successful body
    async fn decode<T: DeserializeOwned>(&self, response: Response, what: &str) -> AppResult<T> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized.on_unauthorized();
            return Err(AppError::SessionExpired);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Evaluations API error for {}: {} - {}",
                what, status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse {} response: {}", what, e))
        })
    }

    /// Exchange credentials for an upstream token
    pub async fn login(&self, credentials: &LoginCredentials) -> AppResult<UpstreamLogin> {
        let builder = self.request(Method::POST, "/auth/login").json(credentials);
        let response = self.send(builder, "login").await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST => {
                Err(AppError::InvalidCredentials)
            }
            _ => self.decode(response, "login").await,
        }
    }

    /// List the farms visible to the current user
    pub async fn list_farms(&self) -> AppResult<Vec<Farm>> {
        let builder = self.request(Method::GET, "/farms");
        let response = self.send(builder, "Farms").await?;
        let farms: FarmList = self.decode(response, "Farms").await?;
        Ok(farms.into_farms())
    }

    /// Get one farm
    pub async fn get_farm(&self, farm_id: &str) -> AppResult<Farm> {
        let builder = self.request(Method::GET, &format!("/farms/{}", farm_id));
        let response = self.send(builder, "Farm").await?;
        self.decode(response, "Farm").await
    }

    /// Get the evaluations of a farm, grouped by date and operator
    pub async fn get_farm_evaluations(&self, farm_id: &str) -> AppResult<EvaluationsResponse> {
        let builder = self.request(Method::GET, &format!("/farms/{}/evaluations", farm_id));
        let response = self.send(builder, "Farm evaluations").await?;
        self.decode(response, "Farm evaluations").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };

    struct StaticToken(&'static str);

    impl TokenProvider for StaticToken {
        fn token(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
    }

    impl UnauthorizedHandler for CountingHandler {
        fn on_unauthorized(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn spawn_stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_bearer_token_is_forwarded() {
        let app = Router::new().route(
            "/farms",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get(AUTHORIZATION)
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(serde_json::json!([{ "id": 1, "nombre": auth }]))
            }),
        );
        let base_url = spawn_stub(app).await;

        let client = EvaluationsApiClient::new(
            Client::new(),
            base_url,
            Arc::new(StaticToken("abc")),
            Arc::new(IgnoreUnauthorized),
        );
        let farms = client.list_farms().await.unwrap();
        assert_eq!(farms[0].name, "Bearer abc");
    }

    #[tokio::test]
    async fn test_unauthorized_invokes_handler() {
        let app = Router::new().route(
            "/farms/:id/evaluations",
            get(|| async { StatusCode::UNAUTHORIZED }),
        );
        let base_url = spawn_stub(app).await;

        let handler = Arc::new(CountingHandler::default());
        let client = EvaluationsApiClient::new(
            Client::new(),
            base_url,
            Arc::new(StaticToken("stale")),
            handler.clone(),
        );
        let err = client.get_farm_evaluations("7").await.unwrap_err();
        assert!(matches!(err, AppError::SessionExpired));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_rejection_is_invalid_credentials() {
        let app = Router::new().route("/auth/login", post(|| async { StatusCode::UNAUTHORIZED }));
        let base_url = spawn_stub(app).await;

        let client = EvaluationsApiClient::anonymous(Client::new(), base_url);
        let credentials = LoginCredentials {
            username: "ana".to_string(),
            password: "wrong".to_string(),
        };
        let err = client.login(&credentials).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_server_error_is_external_service_error() {
        let app = Router::new().route(
            "/farms/:id",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base_url = spawn_stub(app).await;

        let client = EvaluationsApiClient::anonymous(Client::new(), base_url);
        let err = client.get_farm("7").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalService(_)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_unavailable() {
        let client = EvaluationsApiClient::anonymous(Client::new(), "http://127.0.0.1:1");
        let err = client.list_farms().await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }
}
