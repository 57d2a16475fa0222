//! Catalogue seam for the book-discovery API: book detail, listing and
//! recommendation generation. `BookApi` is what the recommendation flow and the
//! CLI depend on; `HttpBookApi` is the reqwest-backed implementation.

pub mod client;
pub mod types;

pub use client::HttpBookApi;
pub use types::{Book, Recommendation, RecordId};

use crate::errors::AppError;
use std::future::Future;

pub trait BookApi: Send + Sync {
    /// Fetches one book; `None` when the API does not know the id.
    fn get_book(&self, id: &str) -> impl Future<Output = Result<Option<Book>, AppError>> + Send;

    fn list_books(&self) -> impl Future<Output = Result<Vec<Book>, AppError>> + Send;

    /// Ranked recommendation records for a free-text query.
    fn get_recommendations(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Recommendation>, AppError>> + Send;
}
