//! Resolved client configuration. Values come from CLI flags or their `LIBRIS_*`
//! environment variables; this module only normalizes and validates them.
//! Configuration values are public; do not store secrets here.

use crate::errors::AppError;
use std::time::Duration;
use url::Url;

/// Default request timeout applied to every HTTP call.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Client configuration for the catalogue API and the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub cognito_region: String,
    pub cognito_client_id: String,
    pub cognito_endpoint: String,
    pub timeout: Duration,
}

impl AppConfig {
    /// Builds a config, deriving the regional Cognito endpoint unless overridden.
    ///
    /// # Errors
    /// Returns `AppError::Config` when a required value is empty or a URL is invalid.
    pub fn new(
        api_base_url: &str,
        cognito_region: &str,
        cognito_client_id: &str,
        cognito_endpoint: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let api_base_url = required("api-url", api_base_url)?;
        let cognito_region = required("cognito-region", cognito_region)?;
        let cognito_client_id = required("cognito-client-id", cognito_client_id)?;

        let cognito_endpoint = cognito_endpoint
            .and_then(normalize_value)
            .unwrap_or_else(|| regional_endpoint(&cognito_region));

        validate_url("api-url", &api_base_url)?;
        validate_url("cognito-endpoint", &cognito_endpoint)?;

        if timeout.is_zero() {
            return Err(AppError::Config("timeout must be at least 1 second".to_string()));
        }

        Ok(Self {
            api_base_url,
            cognito_region,
            cognito_client_id,
            cognito_endpoint,
            timeout,
        })
    }
}

/// Public Cognito user-pool endpoint for a region.
#[must_use]
pub fn regional_endpoint(region: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com")
}

fn required(name: &str, value: &str) -> Result<String, AppError> {
    normalize_value(value)
        .ok_or_else(|| AppError::Config(format!("missing required argument: --{name}")))
}

fn validate_url(name: &str, value: &str) -> Result<(), AppError> {
    let url = Url::parse(value).map_err(|err| AppError::Config(format!("invalid --{name}: {err}")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::Config(format!(
            "invalid --{name}: unsupported scheme {scheme}"
        ))),
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
