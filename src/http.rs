//! HTTP helpers for JSON APIs with a consistent timeout and error policy. The
//! catalogue and identity clients use these helpers instead of building requests
//! by hand. The helpers never log request bodies; callers pass credentials in
//! bodies and headers that must stay out of traces.

use crate::errors::AppError;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// JSON client bound to one base URL.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Builds a client with the crate user agent and a per-request timeout.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the underlying client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches JSON and fails on any non-success status.
    ///
    /// # Errors
    /// Returns network, timeout, HTTP or parse errors.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = build_url_with_base(&self.base_url, path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(map_request_error)?;

        handle_json_response(response).await
    }

    /// Fetches JSON and returns `None` on 204 or 404.
    ///
    /// # Errors
    /// Returns network, timeout, HTTP or parse errors.
    pub async fn get_optional_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, AppError> {
        let url = build_url_with_base(&self.base_url, path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(map_request_error)?;

        handle_optional_json_response(response).await
    }

    /// Posts JSON and parses a JSON response.
    ///
    /// # Errors
    /// Returns network, timeout, HTTP or parse errors.
    pub async fn post_json_response<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let response = self
            .post_with_headers(path, "application/json", body, &[])
            .await?;

        handle_json_response(response).await
    }

    /// Posts a JSON body with an explicit content type and extra headers and
    /// hands back the raw response, for APIs with their own error envelope.
    ///
    /// # Errors
    /// Returns serialization, network or timeout errors. HTTP status is not checked.
    pub async fn post_with_headers<B: Serialize + ?Sized>(
        &self,
        path: &str,
        content_type: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> Result<Response, AppError> {
        let url = build_url_with_base(&self.base_url, path);
        let payload = serde_json::to_vec(body)
            .map_err(|err| AppError::Serialization(format!("Failed to encode request: {err}")))?;

        let mut builder = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, content_type)
            .body(payload);

        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        debug!("POST {}", url);
        builder.send().await.map_err(map_request_error)
    }
}

/// Builds a URL from an explicit base URL and the provided path.
pub(crate) fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport errors into `AppError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
pub(crate) async fn handle_json_response<T: DeserializeOwned>(
    response: Response,
) -> Result<T, AppError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

/// Parses optional JSON responses and treats 204/404 as absent.
async fn handle_optional_json_response<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, AppError> {
    match response.status() {
        StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}"))),
        _ => Err(http_error(response).await),
    }
}

async fn http_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AppError::Http {
        status,
        message: sanitize_body(&body),
    }
}

/// Sanitizes HTTP error bodies by trimming and truncating.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
