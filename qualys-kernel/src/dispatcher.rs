//! Routes tool calls through validation, rate limiting and the transport.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use qualys_adapters::{QualysClient, Transport};
use qualys_config::QualysConfig;
use qualys_tools::{OperationDefinition, ToolResult};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, RequestContext, qualys_catalog};
use crate::classify::{DispatchError, DispatchResult, classify};
use crate::scheduler::RateLimiter;

/// Prefix marking a failed call's text.
pub const ERROR_PREFIX: &str = "Error: ";

/// Text returned to the protocol layer for one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutput {
    text: String,
    is_error: bool,
}

impl ToolOutput {
    /// Pretty-prints a successful result.
    #[must_use]
    pub fn success(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self {
            text,
            is_error: false,
        }
    }

    /// Wraps a classified failure message.
    #[must_use]
    pub fn failure(message: impl fmt::Display) -> Self {
        Self {
            text: format!("{ERROR_PREFIX}{message}"),
            is_error: true,
        }
    }

    /// Returns the text block.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consumes the output, returning the text block.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    /// Returns `true` when the call failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }
}

/// Owns the catalog, the rate limiter and the transport for one server.
pub struct Dispatcher {
    catalog: Catalog,
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    config: QualysConfig,
    today: fn() -> NaiveDate,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("operations", &self.catalog.len())
            .field("limiter", &self.limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl Dispatcher {
    /// Creates a dispatcher that sends through `transport`.
    ///
    /// # Errors
    ///
    /// Fails only when the built-in catalog is inconsistent.
    pub fn new(config: QualysConfig, transport: Arc<dyn Transport>) -> ToolResult<Self> {
        Ok(Self {
            catalog: qualys_catalog()?,
            transport,
            limiter: RateLimiter::default(),
            config,
            today: local_today,
        })
    }

    /// Creates a dispatcher backed by a lazily connected [`QualysClient`].
    ///
    /// # Errors
    ///
    /// Fails only when the built-in catalog is inconsistent.
    pub fn from_config(config: QualysConfig) -> ToolResult<Self> {
        let client = QualysClient::new(config.clone());
        Self::new(config, Arc::new(client))
    }

    /// Replaces the rate limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Replaces the clock used for derived dates.
    #[must_use]
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Returns the advertised operations in listing order.
    #[must_use]
    pub fn definitions(&self) -> Vec<&OperationDefinition> {
        self.catalog.list()
    }

    /// Returns the configuration captured at construction.
    #[must_use]
    pub fn config(&self) -> &QualysConfig {
        &self.config
    }

    /// Runs one call. Failures are returned as text, never as `Err`.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> ToolOutput {
        let started = Instant::now();
        match self.execute(name, arguments).await {
            Ok(value) => {
                info!(
                    operation = %name,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "operation completed"
                );
                ToolOutput::success(&value)
            }
            Err(err) => {
                let message = classify(&err);
                warn!(operation = %name, error = %message, "operation failed");
                ToolOutput::failure(message)
            }
        }
    }

    async fn execute(&self, name: &str, arguments: &Value) -> DispatchResult<Value> {
        if !self.config.has_credentials() {
            return Err(DispatchError::MissingCredentials);
        }

        let entry = self
            .catalog
            .get(name)
            .ok_or_else(|| DispatchError::unknown_operation(name))?;
        let bound = entry.definition().bind(arguments)?;

        let context = RequestContext::new((self.today)(), self.config.days_boundary());
        let handler = entry.handler();
        let request = handler.build_request(&bound, &context)?;
        debug!(operation = %name, path = request.path(), "dispatching request");

        let response = self
            .limiter
            .schedule(|| self.transport.send(request))
            .await?;

        Ok(handler.interpret(&bound, &response))
    }
}
