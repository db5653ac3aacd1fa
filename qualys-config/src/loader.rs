//! Environment-backed configuration loader.

use std::env;
use std::time::Duration;

use tracing::debug;

use crate::{ConfigError, ConfigResult, QualysConfig};

/// Platform base URL.
pub const BASE_URL_ENV: &str = "QUALYS_BASE_URL";
/// Account username.
pub const USERNAME_ENV: &str = "QUALYS_USERNAME";
/// Account password.
pub const PASSWORD_ENV: &str = "QUALYS_PASSWORD";
/// Per-request timeout in whole seconds.
pub const TIMEOUT_SECS_ENV: &str = "QUALYS_TIMEOUT_SECS";
/// `inclusive` or `exclusive` handling of relative day filters.
pub const DAYS_BOUNDARY_ENV: &str = "QUALYS_DAYS_BOUNDARY";

impl QualysConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a present variable cannot be
    /// parsed. Missing credentials are not an error at this stage.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`QualysConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config = config
                .with_base_url(&base_url)
                .map_err(|err| rekey(err, BASE_URL_ENV))?;
        }

        config.set_username(lookup(USERNAME_ENV));
        config.set_password(lookup(PASSWORD_ENV));

        if let Some(raw) = lookup(TIMEOUT_SECS_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ConfigError::invalid(TIMEOUT_SECS_ENV, format!("`{raw}` is not a whole number"))
            })?;
            if secs == 0 {
                return Err(ConfigError::invalid(TIMEOUT_SECS_ENV, "must be positive"));
            }
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        if let Some(raw) = lookup(DAYS_BOUNDARY_ENV) {
            let boundary = raw.parse().map_err(|err| rekey(err, DAYS_BOUNDARY_ENV))?;
            config = config.with_days_boundary(boundary);
        }

        debug!(
            base_url = config.base_url(),
            credentials = config.has_credentials(),
            "configuration loaded"
        );
        Ok(config)
    }
}

fn rekey(err: ConfigError, key: &str) -> ConfigError {
    let ConfigError::InvalidValue { reason, .. } = err;
    ConfigError::invalid(key, reason)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{DEFAULT_BASE_URL, DaysBoundary};

    fn load(pairs: &[(&str, &str)]) -> ConfigResult<QualysConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        QualysConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert!(!cfg.has_credentials());
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.days_boundary(), DaysBoundary::Inclusive);
    }

    #[test]
    fn reads_all_variables() {
        let cfg = load(&[
            (BASE_URL_ENV, "https://qualysapi.qg3.apps.qualys.com/"),
            (USERNAME_ENV, "analyst"),
            (PASSWORD_ENV, "secret"),
            (TIMEOUT_SECS_ENV, "45"),
            (DAYS_BOUNDARY_ENV, "exclusive"),
        ])
        .unwrap();

        assert_eq!(cfg.base_url(), "https://qualysapi.qg3.apps.qualys.com");
        assert_eq!(cfg.username(), Some("analyst"));
        assert_eq!(cfg.password(), Some("secret"));
        assert!(cfg.has_credentials());
        assert_eq!(cfg.request_timeout(), Duration::from_secs(45));
        assert_eq!(cfg.days_boundary(), DaysBoundary::Exclusive);
    }

    #[test]
    fn blank_base_url_falls_back_to_default() {
        let cfg = load(&[(BASE_URL_ENV, "   ")]).unwrap();
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = load(&[(TIMEOUT_SECS_ENV, "soon")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == TIMEOUT_SECS_ENV)
        );

        let err = load(&[(BASE_URL_ENV, "ftp://example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == BASE_URL_ENV));

        let err = load(&[(TIMEOUT_SECS_ENV, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
