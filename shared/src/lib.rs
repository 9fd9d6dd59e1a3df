//! Shared types and logic for the Pollination Monitor
//!
//! This crate contains the evaluation models and the pure computations
//! (metrics, grouping, date ordering, export rows) shared between the
//! backend, the browser bindings (via WASM), and other components.

pub mod dashboard;
pub mod dates;
pub mod export;
pub mod grouping;
pub mod metrics;
pub mod models;
pub mod types;
pub mod validation;

pub use dashboard::*;
pub use dates::*;
pub use export::*;
pub use grouping::*;
pub use metrics::*;
pub use models::*;
pub use types::*;
pub use validation::*;
