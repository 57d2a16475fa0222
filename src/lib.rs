//! # Libris (Book Discovery Client)
//!
//! `libris` talks to two collaborators: a hosted identity provider (a Cognito
//! user pool) for accounts, and the book-discovery REST API for the catalogue and
//! AI-generated recommendations.
//!
//! ## Authentication
//!
//! The [`auth::AuthController`] is the single writer of "who is logged in" and
//! "is a signup waiting for its emailed code". It proxies every call to an
//! [`identity::IdentityProvider`] and publishes [`auth::AuthSnapshot`]s through a
//! `watch` channel, so views subscribe instead of reading global state.
//!
//! Signup does not sign the user in. After the confirmation code is accepted the
//! controller leaves the pending state and the user logs in explicitly.
//!
//! ## Recommendations
//!
//! [`recommend::recommend`] asks the API for ranked records, fetches every book
//! concurrently and keeps, in request order, only the records whose book was
//! found. Missing books are dropped silently.

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod display;
pub mod errors;
pub mod http;
pub mod identity;
pub mod recommend;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with("libris/"));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
