//! Plain-text rendering of books, recommendations and auth state for the
//! terminal front end.

use crate::{
    auth::{AuthPhase, AuthSnapshot},
    catalog::Book,
    recommend::RecommendedBook,
};
use std::fmt::Write as _;

/// Rating with one decimal place, e.g. `4.5`.
#[must_use]
pub fn format_rating(rating: f64) -> String {
    format!("{rating:.1}")
}

/// Confidence in `[0, 1]` as a rounded percentage, e.g. `87%`.
#[must_use]
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", (confidence.clamp(0.0, 1.0) * 100.0).round())
}

/// One-line summary used in listings.
#[must_use]
pub fn book_line(book: &Book) -> String {
    format!(
        "[{}] {} by {} ({}, {})",
        book.id,
        book.title,
        book.author,
        book.genre,
        format_rating(book.rating)
    )
}

/// Full detail view of a book.
#[must_use]
pub fn book_detail(book: &Book) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", book.title);
    let _ = writeln!(out, "by {}", book.author);
    let _ = writeln!(out);
    let _ = writeln!(out, "Rating:    {}", format_rating(book.rating));
    let _ = writeln!(out, "Genre:     {}", book.genre);
    if let Some(year) = book.published_year {
        let _ = writeln!(out, "Published: {year}");
    }
    if !book.isbn.is_empty() {
        let _ = writeln!(out, "ISBN:      {}", book.isbn);
    }
    if !book.cover_image.is_empty() {
        let _ = writeln!(out, "Cover:     {}", book.cover_image);
    }
    if !book.description.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", book.description);
    }
    out
}

/// Recommendation block: title, author, reason, confidence and genre.
#[must_use]
pub fn recommendation(item: &RecommendedBook) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} by {}", item.book.title, item.book.author);
    if !item.recommendation.reason.is_empty() {
        let _ = writeln!(out, "  {}", item.recommendation.reason);
    }
    let _ = writeln!(
        out,
        "  Confidence: {}  |  {}",
        format_confidence(item.recommendation.confidence),
        item.book.genre
    );
    out
}

/// Short label of the auth phase, used in the shell prompt.
#[must_use]
pub fn phase_label(phase: AuthPhase) -> &'static str {
    match phase {
        AuthPhase::Unknown => "checking",
        AuthPhase::Anonymous => "anonymous",
        AuthPhase::Authenticated => "signed-in",
        AuthPhase::AwaitingConfirmation => "confirm",
    }
}

/// Describes the current session for `whoami`.
#[must_use]
pub fn session_summary(snapshot: &AuthSnapshot) -> String {
    match (&snapshot.session, &snapshot.pending_email) {
        (_, Some(email)) => format!("Check your email: a verification code was sent to {email}"),
        (Some(session), None) => format!(
            "{} <{}> ({}, since {})",
            session.name, session.email, session.role, session.created_at
        ),
        (None, None) => "Not signed in".to_string(),
    }
}
