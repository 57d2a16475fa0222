//! Auth feature module: the session controller, its published snapshots and
//! the session record derived from the provider principal. Passwords and
//! confirmation codes pass through here and must never be logged.
//!
//! Flow Overview: `initialize` hydrates the session once. Signup moves to
//! `AwaitingConfirmation` when the provider wants an emailed code; confirming
//! the code leaves that state without signing in. Login and logout replace or
//! clear the session only after the provider call succeeds.

mod error;
pub(crate) mod session;
pub(crate) mod state;

pub use error::AuthError;
pub use session::{Role, Session};
pub use state::{AuthController, AuthPhase, AuthSnapshot};
