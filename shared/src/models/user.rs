//! User and login models

use serde::{Deserialize, Serialize};

use crate::types::{deserialize_id, deserialize_opt_text};

/// Supervisor profile as reported by the evaluations API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(
        default,
        alias = "correo",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        alias = "rol",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
}

/// Credentials forwarded to the evaluations API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Successful login against the evaluations API
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamLogin {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    #[serde(default, alias = "usuario")]
    pub user: Option<UserProfile>,
}
