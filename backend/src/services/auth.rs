//! Authentication service for login, logout and session tokens
//!
//! Credentials are checked by the evaluations API. On success a session is
//! stored and the browser receives our own signed session token; the
//! upstream token never leaves the server.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{LoginCredentials, UserProfile};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::EvaluationsApiClient;
use crate::services::session::{Session, SessionStore};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    api: EvaluationsApiClient,
    sessions: Arc<dyn SessionStore>,
    jwt_secret: String,
    session_expiry: i64,
}

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Session ID
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issued session token
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(http_client: Client, sessions: Arc<dyn SessionStore>, config: &Config) -> Self {
        Self {
            api: EvaluationsApiClient::anonymous(http_client, config.upstream.base_url.clone()),
            sessions,
            jwt_secret: config.jwt.secret.clone(),
            session_expiry: config.jwt.session_expiry,
        }
    }

    /// Log in against the evaluations API and open a session
    pub async fn login(&self, credentials: &LoginCredentials) -> AppResult<AuthTokens> {
        let upstream = self.api.login(credentials).await?;

        let user = upstream.user.unwrap_or_else(|| UserProfile {
            name: credentials.username.clone(),
            ..Default::default()
        });

        let session_id = Uuid::new_v4();
        let now = Utc::now();
        self.sessions.set(
            session_id,
            Session {
                upstream_token: upstream.token,
                user: user.clone(),
                created_at: now,
                expires_at: now + Duration::seconds(self.session_expiry),
            },
        );

        tracing::info!("Opened session {} for {}", session_id, user.name);

        let access_token = self.issue_token(session_id, &user.name)?;
        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.session_expiry,
            user,
        })
    }

    /// End a session
    pub fn logout(&self, session_id: &Uuid) {
        self.sessions.clear(session_id);
        tracing::info!("Closed session {}", session_id);
    }

    fn issue_token(&self, session_id: Uuid, name: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: session_id.to_string(),
            name: name.to_string(),
            exp: (now + Duration::seconds(self.session_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}

/// Verify a session token and return the session id it carries
pub fn verify_session_token(token: &str, secret: &str) -> AppResult<Uuid> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })?;

    Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)
}
