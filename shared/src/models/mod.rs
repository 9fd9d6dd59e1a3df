//! Domain models for the Pollination Monitor

mod evaluation;
mod farm;
mod user;

pub use evaluation::*;
pub use farm::*;
pub use user::*;
