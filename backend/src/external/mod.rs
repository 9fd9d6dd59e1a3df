//! External API integrations

pub mod evaluations_api;

pub use evaluations_api::{EvaluationsApiClient, TokenProvider, UnauthorizedHandler};
