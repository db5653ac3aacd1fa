//! Configuration management for the Qualys tool server.
//!
//! The schema lives in [`schema`]; [`loader`] fills it from environment
//! variables. Credentials are deliberately allowed to be absent here: the
//! dispatcher reports missing credentials per call instead of refusing to
//! start.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    BASE_URL_ENV, DAYS_BOUNDARY_ENV, PASSWORD_ENV, TIMEOUT_SECS_ENV, USERNAME_ENV,
};
pub use schema::{DEFAULT_BASE_URL, DaysBoundary, PoolSettings, QualysConfig};
