//! HTTP request handlers

pub mod auth;
pub mod evaluation;
pub mod farm;
pub mod health;

pub use auth::{login, logout, me};
pub use evaluation::{
    export_evaluation, get_evaluation_metrics, get_selection_metrics, list_farm_evaluations,
};
pub use farm::{get_farm, list_farms};
pub use health::health_check;
