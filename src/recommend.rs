//! Recommendation fetch flow: query → ranked records → concurrent book lookups →
//! records whose book was found, in the order the API ranked them.
//!
//! A failed or empty lookup drops only that record. A failure of the
//! recommendation request itself is returned to the caller.

use crate::{
    catalog::{Book, BookApi, Recommendation},
    errors::AppError,
};
use futures::future::join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Example prompts offered next to the query box.
pub const EXAMPLE_QUERIES: [&str; 4] = [
    "I love mystery novels with strong female protagonists",
    "Looking for science fiction books about space exploration",
    "Recommend me some feel-good romance novels",
    "I want to read about personal development and productivity",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendError {
    #[error("Please enter a query")]
    EmptyQuery,
    #[error(transparent)]
    Api(#[from] AppError),
}

/// A recommendation record together with the book it points at.
#[derive(Clone, Debug, PartialEq)]
pub struct RecommendedBook {
    pub recommendation: Recommendation,
    pub book: Book,
}

/// Runs the recommendation flow for `query`.
///
/// # Errors
/// `RecommendError::EmptyQuery` for a blank query, before any request; the API
/// error when the recommendation request fails.
#[instrument(skip(api))]
pub async fn recommend<A: BookApi>(
    api: &A,
    query: &str,
) -> Result<Vec<RecommendedBook>, RecommendError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(RecommendError::EmptyQuery);
    }

    let recommendations = api.get_recommendations(query).await?;
    debug!("received {} recommendations", recommendations.len());

    let lookups = join_all(
        recommendations
            .iter()
            .map(|recommendation| api.get_book(&recommendation.book_id)),
    )
    .await;

    let hydrated = recommendations
        .into_iter()
        .zip(lookups)
        .filter_map(|(recommendation, lookup)| match lookup {
            Ok(Some(book)) => Some(RecommendedBook {
                recommendation,
                book,
            }),
            Ok(None) => {
                debug!("book {} not found, dropping", recommendation.book_id);
                None
            }
            Err(err) => {
                warn!("book {} lookup failed: {}", recommendation.book_id, err);
                None
            }
        })
        .collect();

    Ok(hydrated)
}

/// Same as [`recommend`], abandoning every outstanding request once `cancel`
/// fires. Returns `Ok(None)` when cancelled.
///
/// # Errors
/// See [`recommend`].
pub async fn recommend_until_cancelled<A: BookApi>(
    api: &A,
    query: &str,
    cancel: &CancellationToken,
) -> Result<Option<Vec<RecommendedBook>>, RecommendError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("recommendation request cancelled");
            Ok(None)
        }
        result = recommend(api, query) => result.map(Some),
    }
}
