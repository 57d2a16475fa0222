//! Provider-neutral results of identity calls. These carry no tokens.

use serde::{Deserialize, Serialize};

/// The provider's view of an authenticated user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    /// Identifier the user signed in with, when the provider reports it.
    pub login_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignInOutcome {
    pub is_signed_in: bool,
    /// Challenge the provider still requires when `is_signed_in` is false.
    pub challenge: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignUpStep {
    ConfirmSignUp,
    Done,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user_id: Option<String>,
    pub next_step: SignUpStep,
}

/// Attributes attached to a new account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAttributes {
    pub email: String,
    pub name: String,
}
