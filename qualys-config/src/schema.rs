//! Strongly typed configuration schema.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{ConfigError, ConfigResult};

/// Platform endpoint used when `QUALYS_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://qualysapi.qualys.com";

/// How a relative "days" filter maps onto a calendar cutoff date.
///
/// The remote service does not document whether its `*_since` filters are
/// inclusive of the cutoff day, so the direction is configurable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DaysBoundary {
    /// `N` days means the cutoff is exactly `N` days before today.
    #[default]
    Inclusive,
    /// `N` days means the cutoff is `N - 1` days before today, so today
    /// itself counts as one of the `N` days.
    Exclusive,
}

impl DaysBoundary {
    /// Number of days to subtract from today for a filter spanning `days`.
    #[must_use]
    pub const fn offset(self, days: u32) -> u32 {
        match self {
            Self::Inclusive => days,
            Self::Exclusive => days.saturating_sub(1),
        }
    }
}

impl FromStr for DaysBoundary {
    type Err = ConfigError;

    fn from_str(value: &str) -> ConfigResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inclusive" => Ok(Self::Inclusive),
            "exclusive" => Ok(Self::Exclusive),
            other => Err(ConfigError::invalid(
                "days_boundary",
                format!("expected `inclusive` or `exclusive`, got `{other}`"),
            )),
        }
    }
}

impl fmt::Display for DaysBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inclusive => "inclusive",
            Self::Exclusive => "exclusive",
        })
    }
}

/// Outbound connection pool tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSettings {
    /// TCP keep-alive interval for pooled sockets.
    pub keep_alive: Duration,
    /// How long an idle connection stays in the pool.
    pub idle_timeout: Duration,
    /// Upper bound on idle connections kept per host.
    pub max_idle_per_host: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            keep_alive: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(90),
            max_idle_per_host: 10,
        }
    }
}

/// Settings consumed by the connection manager and dispatcher.
#[derive(Clone, PartialEq, Eq)]
pub struct QualysConfig {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    request_timeout: Duration,
    days_boundary: DaysBoundary,
    pool: PoolSettings,
}

impl fmt::Debug for QualysConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualysConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("days_boundary", &self.days_boundary)
            .field("pool", &self.pool)
            .finish()
    }
}

impl Default for QualysConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            username: None,
            password: None,
            request_timeout: Duration::from_secs(30),
            days_boundary: DaysBoundary::default(),
            pool: PoolSettings::default(),
        }
    }
}

impl QualysConfig {
    /// Creates a configuration pointing at the default platform without
    /// credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the platform base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the URL has no HTTP(S) scheme
    /// or no host.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> ConfigResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Supplies the account credentials. Blank values are treated as absent.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = non_blank(username.into());
        self.password = non_blank(password.into());
        self
    }

    /// Sets the upper bound applied to each outbound request.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets how relative day filters are converted into dates.
    #[must_use]
    pub fn with_days_boundary(mut self, boundary: DaysBoundary) -> Self {
        self.days_boundary = boundary;
        self
    }

    /// Overrides the connection pool tuning.
    #[must_use]
    pub fn with_pool(mut self, pool: PoolSettings) -> Self {
        self.pool = pool;
        self
    }

    pub(crate) fn set_username(&mut self, username: Option<String>) {
        self.username = username.and_then(non_blank);
    }

    pub(crate) fn set_password(&mut self, password: Option<String>) {
        self.password = password.and_then(non_blank);
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the configured password.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns `true` when both username and password are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the relative-days boundary policy.
    #[must_use]
    pub const fn days_boundary(&self) -> DaysBoundary {
        self.days_boundary
    }

    /// Returns the connection pool tuning.
    #[must_use]
    pub const fn pool(&self) -> PoolSettings {
        self.pool
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn sanitize_base_url(input: &str) -> ConfigResult<String> {
    let base = input.trim();
    let rest = base
        .strip_prefix("https://")
        .or_else(|| base.strip_prefix("http://"))
        .ok_or_else(|| {
            ConfigError::invalid("base_url", "must start with http:// or https://")
        })?;
    if rest.trim_matches('/').is_empty() {
        return Err(ConfigError::invalid("base_url", "missing host"));
    }
    Ok(base.trim_end_matches('/').to_owned())
}
