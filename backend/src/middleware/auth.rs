//! Authentication middleware
//!
//! Validates the session token and attaches the live session to the request

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use shared::UserProfile;
use uuid::Uuid;

use crate::error::{AppError, ErrorDetail, ErrorResponse};
use crate::services::auth::verify_session_token;
use crate::AppState;

/// Session information attached to authenticated requests
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub user: UserProfile,
}

/// Authentication middleware that validates session tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|header| header.strip_prefix("Bearer ")) {
        Some(token) => token.trim(),
        None => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let session_id = match verify_session_token(token, &state.config.jwt.secret) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    let session = match state.sessions.get(&session_id) {
        Some(session) => session,
        None => return AppError::SessionExpired.into_response(),
    };

    if session.is_expired(Utc::now()) {
        state.sessions.clear(&session_id);
        return AppError::SessionExpired.into_response();
    }

    request.extensions_mut().insert(AuthSession {
        session_id,
        user: session.user,
    });

    next.run(request).await
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message_en: message.to_string(),
            message_es: "No autorizado".to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for the authenticated session
#[derive(Clone, Debug)]
pub struct CurrentSession(pub AuthSession);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message_en: "Authentication required".to_string(),
                        message_es: "Debe iniciar sesión".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
