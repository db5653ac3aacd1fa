//! Operation catalog, rate limiting and dispatch for the Qualys tool server.
//!
//! A [`Dispatcher`] owns the [`Catalog`] (definitions paired with their
//! handlers), a [`RateLimiter`] and a [`Transport`](qualys_adapters::Transport).
//! Each call is checked for credentials, bound against its definition, turned
//! into a wire request, sent no sooner than [`MIN_REQUEST_INTERVAL`] after the
//! previous one, and rendered as text. Failures are classified into
//! `"Error: "`-prefixed text rather than returned as `Err`.

#![warn(missing_docs, clippy::pedantic)]

pub mod catalog;
pub mod classify;
pub mod dispatcher;
pub mod operations;
pub mod scheduler;

pub use catalog::{
    Catalog, FormOperation, Operation, OperationHandler, RequestContext, ResponseKind,
    build_catalog, qualys_catalog,
};
pub use classify::{
    CONNECTION_REFUSED_MESSAGE, DispatchError, DispatchResult, MISSING_CREDENTIALS_MESSAGE,
    classify,
};
pub use dispatcher::{Dispatcher, ERROR_PREFIX, ToolOutput};
pub use operations::{TAG_SEARCH_PATH, TagSearch};
pub use scheduler::{MIN_REQUEST_INTERVAL, RateLimiter};
