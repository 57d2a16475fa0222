//! reqwest-backed client for the catalogue API.

use crate::{
    catalog::{Book, BookApi, Recommendation},
    config::AppConfig,
    errors::AppError,
    http::HttpClient,
};
use serde::Serialize;
use tracing::instrument;

#[derive(Serialize)]
struct RecommendationRequest<'a> {
    query: &'a str,
}

#[derive(Clone, Debug)]
pub struct HttpBookApi {
    http: HttpClient,
}

impl HttpBookApi {
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            http: HttpClient::new(&config.api_base_url, config.timeout)?,
        })
    }
}

impl BookApi for HttpBookApi {
    #[instrument(skip(self))]
    async fn get_book(&self, id: &str) -> Result<Option<Book>, AppError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        self.http
            .get_optional_json(&format!("/books/{}", encode_segment(id)))
            .await
    }

    #[instrument(skip(self))]
    async fn list_books(&self) -> Result<Vec<Book>, AppError> {
        self.http.get_json("/books").await
    }

    #[instrument(skip(self))]
    async fn get_recommendations(&self, query: &str) -> Result<Vec<Recommendation>, AppError> {
        self.http
            .post_json_response("/recommendations", &RecommendationRequest { query })
            .await
    }
}

/// Percent-encodes a single path segment.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
