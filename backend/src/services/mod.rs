//! Business logic services for the Pollination Monitor

pub mod auth;
pub mod evaluation;
pub mod export;
pub mod session;

pub use auth::AuthService;
pub use evaluation::EvaluationService;
pub use export::{ExportFormat, ExportService};
pub use session::{InMemorySessionStore, SessionStore};
