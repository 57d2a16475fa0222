use crate::errors::AppError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Failure reported by the identity provider or the network, unchanged.
    #[error(transparent)]
    Provider(#[from] AppError),
    /// `confirm_account` was called without a signup awaiting confirmation.
    #[error("No pending email")]
    NoPendingEmail,
}
