//! Pollination Monitor - Backend Server
//!
//! Dashboard backend for supervisors reviewing pollination evaluations of
//! oil-palm farms. Farm and evaluation data come from the evaluations API;
//! this server aggregates metrics and produces spreadsheet exports.

use axum::{routing::get, Router};
use chrono::Utc;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod routes;
mod services;

pub use config::Config;

use external::EvaluationsApiClient;
use services::session::{ClearSessionOnUnauthorized, SessionTokenProvider};
use services::{InMemorySessionStore, SessionStore};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// Evaluations API client acting for one session
    pub fn evaluations_api(&self, session_id: Uuid) -> EvaluationsApiClient {
        EvaluationsApiClient::new(
            self.http.clone(),
            self.config.upstream.base_url.clone(),
            Arc::new(SessionTokenProvider::new(self.sessions.clone(), session_id)),
            Arc::new(ClearSessionOnUnauthorized::new(
                self.sessions.clone(),
                session_id,
            )),
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pm_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Pollination Monitor Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Evaluations API: {}", config.upstream.base_url);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream.timeout_secs))
        .build()?;

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    spawn_session_purge(sessions.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config.clone()),
        http,
        sessions,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop expired sessions
fn spawn_session_purge(sessions: Arc<dyn SessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.purge_expired(Utc::now());
            if removed > 0 {
                tracing::debug!("Purged {} expired sessions", removed);
            }
        }
    });
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Pollination Monitor API v1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Request, StatusCode},
    };
    use crate::config::{ExportConfig, JwtConfig, ServerConfig, UpstreamConfig};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            config: Arc::new(Config {
                environment: "test".to_string(),
                server: ServerConfig {
                    port: 0,
                    host: "127.0.0.1".to_string(),
                },
                upstream: UpstreamConfig {
                    base_url: "http://127.0.0.1:1".to_string(),
                    timeout_secs: 1,
                },
                jwt: JwtConfig {
                    secret: "test-secret".to_string(),
                    session_expiry: 3600,
                },
                export: ExportConfig {
                    default_format: "xlsx".to_string(),
                },
            }),
            http: reqwest::Client::new(),
            sessions: Arc::new(InMemorySessionStore::new()),
        }
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = create_app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_farms_require_session() {
        let app = create_app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/farms")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_for_cleared_session_is_rejected() {
        let state = test_state();
        let claims = services::auth::Claims {
            sub: Uuid::new_v4().to_string(),
            name: "Ana".to_string(),
            exp: (Utc::now() + chrono::Duration::seconds(60)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let app = create_app(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/farms/7/evaluations")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
