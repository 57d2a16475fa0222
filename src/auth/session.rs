//! Session record exposed to views. Contains no secrets.

use crate::identity::Principal;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// ISO-8601 instant at which the session was hydrated.
    pub created_at: String,
}

impl Session {
    /// Builds a session from the provider principal. The email is the login id
    /// the provider reports, or `fallback_email` when it reports none.
    pub(crate) fn from_principal(principal: Principal, fallback_email: &str) -> Self {
        let email = principal
            .login_id
            .filter(|login_id| !login_id.is_empty())
            .unwrap_or_else(|| fallback_email.to_string());

        Self {
            id: principal.user_id,
            email,
            name: principal.username,
            role: Role::User,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
