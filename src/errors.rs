//! Error types shared by the identity and catalogue clients. `AppError` is the
//! transport-level failure surfaced to callers unchanged; the auth controller and
//! the recommendation flow wrap it with their own local preconditions.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppError {
    Config(String),
    Network(String),
    Timeout(String),
    Http { status: u16, message: String },
    /// Error reported by the identity provider, e.g. `NotAuthorizedException`.
    Identity { code: String, message: String },
    Parse(String),
    Serialization(String),
    /// No signed-in user is held by the identity client.
    NotSignedIn,
}

impl AppError {
    /// Provider error code, when the identity provider produced one.
    #[must_use]
    pub fn identity_code(&self) -> Option<&str> {
        match self {
            AppError::Identity { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(message) => write!(formatter, "Config error: {message}"),
            AppError::Network(message) => write!(formatter, "Network error: {message}"),
            AppError::Timeout(message) => write!(formatter, "Timeout: {message}"),
            AppError::Http { status, message } => {
                write!(formatter, "Request failed ({status}): {message}")
            }
            AppError::Identity { code, message } => {
                write!(formatter, "Identity provider error ({code}): {message}")
            }
            AppError::Parse(message) => write!(formatter, "Response error: {message}"),
            AppError::Serialization(message) => {
                write!(formatter, "Request error: {message}")
            }
            AppError::NotSignedIn => write!(formatter, "No user is signed in"),
        }
    }
}

impl std::error::Error for AppError {}
