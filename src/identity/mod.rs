//! Identity provider seam. The auth controller only needs five calls from the
//! hosted provider; `IdentityProvider` names them so the controller can run
//! against the Cognito client in production and scripted fakes in tests.
//!
//! Flow Overview: signup returns the next step (usually an emailed code), the
//! code is confirmed separately, and sign-in only reports whether the user is
//! signed in. Principal details always come from a follow-up `current_user`.

pub mod cognito;
pub mod types;

pub use cognito::CognitoClient;
pub use types::{Principal, SignInOutcome, SignUpOutcome, SignUpStep, UserAttributes};

use crate::errors::AppError;
use secrecy::SecretString;
use std::future::Future;

/// Calls the auth controller makes against the hosted identity provider.
/// Implementations must never log passwords or confirmation codes.
pub trait IdentityProvider: Send + Sync {
    /// Looks up the signed-in principal. `AppError::NotSignedIn` when there is none.
    fn current_user(&self) -> impl Future<Output = Result<Principal, AppError>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<SignInOutcome, AppError>> + Send;

    fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        attributes: &UserAttributes,
    ) -> impl Future<Output = Result<SignUpOutcome, AppError>> + Send;

    fn confirm_sign_up(
        &self,
        email: &str,
        code: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}
