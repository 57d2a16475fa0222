//! Auth session state and its controller. The controller hydrates the session
//! once, mediates every identity call and publishes snapshots over a `watch`
//! channel. It is the only writer; views hold receivers.
//!
//! Overlapping operations share one loading flag. Each operation takes the next
//! generation number and only the most recently started one may clear the flag,
//! so an older call settling late cannot report idle while a newer one runs.

use crate::{
    auth::{AuthError, Session},
    errors::AppError,
    identity::{IdentityProvider, SignUpStep, UserAttributes},
};
use secrecy::SecretString;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{watch, OnceCell};
use tracing::{debug, error, info, instrument};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    /// The initial session lookup has not finished.
    Unknown,
    Anonymous,
    Authenticated,
    /// A signup is waiting for its emailed confirmation code.
    AwaitingConfirmation,
}

/// Read-only view of the controller state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    pub pending_email: Option<String>,
    pub is_loading: bool,
    checked: bool,
}

impl AuthSnapshot {
    fn initial() -> Self {
        Self {
            session: None,
            pending_email: None,
            is_loading: true,
            checked: false,
        }
    }

    /// A pending signup takes precedence so the confirmation view stays reachable
    /// even if a session exists.
    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        if self.pending_email.is_some() {
            AuthPhase::AwaitingConfirmation
        } else if self.session.is_some() {
            AuthPhase::Authenticated
        } else if self.checked {
            AuthPhase::Anonymous
        } else {
            AuthPhase::Unknown
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn needs_confirmation(&self) -> bool {
        self.pending_email.is_some()
    }
}

pub struct AuthController<P> {
    provider: P,
    state: watch::Sender<AuthSnapshot>,
    generation: AtomicU64,
    initialized: OnceCell<()>,
}

/// Clears the loading flag when an operation settles or is dropped, unless a
/// newer operation has started since.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<AuthSnapshot>,
    generation: &'a AtomicU64,
    token: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let token = self.token;
        let generation = self.generation;
        self.state.send_if_modified(|snapshot| {
            if generation.load(Ordering::SeqCst) == token && snapshot.is_loading {
                snapshot.is_loading = false;
                true
            } else {
                false
            }
        });
    }
}

impl<P: IdentityProvider> AuthController<P> {
    /// Creates a controller in the `Unknown` phase with the loading flag set.
    /// Call [`AuthController::initialize`] to perform the session lookup.
    pub fn new(provider: P) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::initial());
        Self {
            provider,
            state,
            generation: AtomicU64::new(0),
            initialized: OnceCell::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Marks a new operation as in flight and returns the guard that settles it.
    fn begin(&self) -> LoadingGuard<'_> {
        let mut token = 0;
        self.state.send_modify(|snapshot| {
            token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            snapshot.is_loading = true;
        });
        LoadingGuard {
            state: &self.state,
            generation: &self.generation,
            token,
        }
    }

    /// Looks up the current session once per controller lifetime. Any failure,
    /// including "nobody signed in", leaves the controller anonymous. Later
    /// calls return immediately; concurrent calls wait for the first one.
    pub async fn initialize(&self) {
        self.initialized
            .get_or_init(|| async {
                let _loading = self.begin();
                let session = match self.provider.current_user().await {
                    Ok(principal) => Some(Session::from_principal(principal, "")),
                    Err(AppError::NotSignedIn) => None,
                    Err(err) => {
                        debug!("session lookup failed: {}", err);
                        None
                    }
                };
                self.state.send_modify(|snapshot| {
                    snapshot.session = session;
                    snapshot.checked = true;
                });
                let phase = self.state.borrow().phase();
                info!("auth initialized: {:?}", phase);
            })
            .await;
    }

    /// Signs in and replaces the session with the provider principal. When the
    /// provider reports the user is not signed in yet (another challenge is
    /// required) the state is left as it was.
    ///
    /// # Errors
    /// Provider failures are returned unchanged and leave the state untouched.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        let _loading = self.begin();
        let result: Result<(), AppError> = async {
            let outcome = self.provider.sign_in(email, password).await?;
            if !outcome.is_signed_in {
                debug!("sign-in incomplete, challenge: {:?}", outcome.challenge);
                return Ok(());
            }

            let principal = self.provider.current_user().await?;
            let session = Session::from_principal(principal, email);
            self.state.send_modify(|snapshot| {
                snapshot.session = Some(session);
                snapshot.pending_email = None;
                snapshot.checked = true;
            });
            Ok(())
        }
        .await;

        result.map_err(|err| {
            error!("Login error: {}", err);
            AuthError::Provider(err)
        })
    }

    /// Signs out and clears the session. On provider failure the session is kept.
    ///
    /// # Errors
    /// Provider failures are returned unchanged.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _loading = self.begin();
        match self.provider.sign_out().await {
            Ok(()) => {
                self.state.send_modify(|snapshot| {
                    snapshot.session = None;
                    snapshot.checked = true;
                });
                Ok(())
            }
            Err(err) => {
                error!("Logout error: {}", err);
                Err(AuthError::Provider(err))
            }
        }
    }

    /// Requests account creation. When the provider asks for a confirmation code
    /// the controller records `email` as pending; otherwise the state is unchanged.
    ///
    /// # Errors
    /// Provider failures are returned unchanged.
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
        name: &str,
    ) -> Result<(), AuthError> {
        let _loading = self.begin();
        let attributes = UserAttributes {
            email: email.to_string(),
            name: name.to_string(),
        };

        match self.provider.sign_up(email, password, &attributes).await {
            Ok(outcome) => {
                if outcome.next_step == SignUpStep::ConfirmSignUp {
                    self.state.send_modify(|snapshot| {
                        snapshot.pending_email = Some(email.to_string());
                    });
                }
                Ok(())
            }
            Err(err) => {
                error!("Signup error: {}", err);
                Err(AuthError::Provider(err))
            }
        }
    }

    /// Confirms the pending signup with the emailed code and clears the pending
    /// email. The user is not signed in afterwards; they log in separately.
    ///
    /// # Errors
    /// `AuthError::NoPendingEmail` before any provider call when no signup is
    /// pending; provider failures otherwise.
    #[instrument(skip(self, code))]
    pub async fn confirm_account(&self, code: &str) -> Result<(), AuthError> {
        let pending = self.state.borrow().pending_email.clone();
        let Some(email) = pending else {
            return Err(AuthError::NoPendingEmail);
        };

        let _loading = self.begin();
        match self.provider.confirm_sign_up(&email, code).await {
            Ok(()) => {
                self.state.send_modify(|snapshot| {
                    snapshot.pending_email = None;
                });
                Ok(())
            }
            Err(err) => {
                error!("Confirmation error: {}", err);
                Err(AuthError::Provider(err))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::identity::{Principal, SignInOutcome, SignUpOutcome};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    /// Pauses a fake call until the test releases it.
    struct Gate {
        entered: oneshot::Sender<()>,
        release: oneshot::Receiver<()>,
    }

    fn gate() -> (Gate, oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        (
            Gate {
                entered: entered_tx,
                release: release_rx,
            },
            entered_rx,
            release_tx,
        )
    }

    #[derive(Default)]
    struct FakeProvider {
        current_user: Mutex<VecDeque<Result<Principal, AppError>>>,
        sign_in: Mutex<VecDeque<Result<SignInOutcome, AppError>>>,
        sign_up: Mutex<VecDeque<Result<SignUpOutcome, AppError>>>,
        confirm: Mutex<VecDeque<Result<(), AppError>>>,
        sign_out: Mutex<VecDeque<Result<(), AppError>>>,
        gates: Mutex<VecDeque<(&'static str, Gate)>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn wait_gate(&self, op: &'static str) {
            let gate = {
                let mut gates = self.gates.lock().unwrap();
                let position = gates.iter().position(|(name, _)| *name == op);
                position.and_then(|index| gates.remove(index))
            };
            if let Some((_, gate)) = gate {
                let _ = gate.entered.send(());
                let _ = gate.release.await;
            }
        }
    }

    fn principal() -> Principal {
        Principal {
            user_id: "sub-123".to_string(),
            username: "ann".to_string(),
            login_id: Some("a@x.com".to_string()),
        }
    }

    fn signed_in() -> SignInOutcome {
        SignInOutcome {
            is_signed_in: true,
            challenge: None,
        }
    }

    fn needs_code() -> SignUpOutcome {
        SignUpOutcome {
            user_id: Some("sub-123".to_string()),
            next_step: SignUpStep::ConfirmSignUp,
        }
    }

    fn provider_error(code: &str) -> AppError {
        AppError::Identity {
            code: code.to_string(),
            message: "rejected".to_string(),
        }
    }

    impl IdentityProvider for FakeProvider {
        async fn current_user(&self) -> Result<Principal, AppError> {
            self.record("current_user".to_string());
            self.wait_gate("current_user").await;
            self.current_user
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AppError::NotSignedIn))
        }

        async fn sign_in(
            &self,
            email: &str,
            _password: &SecretString,
        ) -> Result<SignInOutcome, AppError> {
            self.record(format!("sign_in:{email}"));
            self.wait_gate("sign_in").await;
            self.sign_in
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(signed_in()))
        }

        async fn sign_up(
            &self,
            email: &str,
            _password: &SecretString,
            attributes: &UserAttributes,
        ) -> Result<SignUpOutcome, AppError> {
            self.record(format!("sign_up:{email}:{}", attributes.name));
            self.wait_gate("sign_up").await;
            self.sign_up
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(needs_code()))
        }

        async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), AppError> {
            self.record(format!("confirm:{email}:{code}"));
            self.wait_gate("confirm").await;
            self.confirm.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }

        async fn sign_out(&self) -> Result<(), AppError> {
            self.record("sign_out".to_string());
            self.wait_gate("sign_out").await;
            self.sign_out.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn password() -> SecretString {
        SecretString::from("Abc12345")
    }

    async fn anonymous_controller(provider: FakeProvider) -> AuthController<FakeProvider> {
        let controller = AuthController::new(provider);
        controller.initialize().await;
        controller
    }

    async fn authenticated_controller(provider: FakeProvider) -> AuthController<FakeProvider> {
        provider
            .current_user
            .lock()
            .unwrap()
            .push_back(Ok(principal()));
        let controller = AuthController::new(provider);
        controller.initialize().await;
        assert_eq!(controller.snapshot().phase(), AuthPhase::Authenticated);
        controller
    }

    #[tokio::test]
    async fn starts_unknown_and_loading() {
        let controller = AuthController::new(FakeProvider::default());
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase(), AuthPhase::Unknown);
        assert!(snapshot.is_loading);
        assert!(!snapshot.is_authenticated());
    }

    #[tokio::test]
    async fn initialize_without_session_is_anonymous() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase(), AuthPhase::Anonymous);
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn initialize_with_session_is_authenticated() {
        let controller = authenticated_controller(FakeProvider::default()).await;
        let session = controller.snapshot().session.unwrap();
        assert_eq!(session.id, "sub-123");
        assert_eq!(session.email, "a@x.com");
        assert_eq!(session.name, "ann");
    }

    #[tokio::test]
    async fn initialize_provider_error_is_anonymous() {
        let provider = FakeProvider::default();
        provider
            .current_user
            .lock()
            .unwrap()
            .push_back(Err(AppError::Network("offline".to_string())));
        let controller = anonymous_controller(provider).await;
        assert_eq!(controller.snapshot().phase(), AuthPhase::Anonymous);
        assert!(!controller.snapshot().is_loading);
    }

    #[tokio::test]
    async fn initialize_runs_once() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        controller.initialize().await;
        controller.initialize().await;
        assert_eq!(controller.provider().calls(), vec!["current_user"]);
    }

    #[tokio::test]
    async fn login_sets_session_from_principal() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        controller
            .provider()
            .current_user
            .lock()
            .unwrap()
            .push_back(Ok(principal()));

        controller.login("a@x.com", &password()).await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase(), AuthPhase::Authenticated);
        assert!(!snapshot.is_loading);
        let session = snapshot.session.unwrap();
        assert_eq!(session.id, "sub-123");
        assert_eq!(session.email, "a@x.com");
    }

    #[tokio::test]
    async fn login_email_falls_back_to_submitted_email() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        controller
            .provider()
            .current_user
            .lock()
            .unwrap()
            .push_back(Ok(Principal {
                login_id: None,
                ..principal()
            }));

        controller.login("typed@x.com", &password()).await.unwrap();

        assert_eq!(controller.snapshot().session.unwrap().email, "typed@x.com");
    }

    #[tokio::test]
    async fn login_failure_propagates_and_keeps_state() {
        let controller = authenticated_controller(FakeProvider::default()).await;
        let before = controller.snapshot().session;
        controller
            .provider()
            .sign_in
            .lock()
            .unwrap()
            .push_back(Err(provider_error("NotAuthorizedException")));

        let result = controller.login("a@x.com", &password()).await;

        assert_eq!(
            result,
            Err(AuthError::Provider(provider_error("NotAuthorizedException")))
        );
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.session, before);
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn login_not_signed_in_leaves_state() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        controller
            .provider()
            .sign_in
            .lock()
            .unwrap()
            .push_back(Ok(SignInOutcome {
                is_signed_in: false,
                challenge: Some("NEW_PASSWORD_REQUIRED".to_string()),
            }));

        controller.login("a@x.com", &password()).await.unwrap();

        assert_eq!(controller.snapshot().phase(), AuthPhase::Anonymous);
        assert_eq!(controller.provider().calls(), vec!["current_user", "sign_in:a@x.com"]);
    }

    #[tokio::test]
    async fn login_clears_pending_signup() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        controller.signup("a@x.com", &password(), "Ann").await.unwrap();
        controller
            .provider()
            .current_user
            .lock()
            .unwrap()
            .push_back(Ok(principal()));

        controller.login("a@x.com", &password()).await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.pending_email, None);
        assert_eq!(snapshot.phase(), AuthPhase::Authenticated);
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let controller = authenticated_controller(FakeProvider::default()).await;
        controller.logout().await.unwrap();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.session, None);
        assert_eq!(snapshot.phase(), AuthPhase::Anonymous);
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn logout_failure_keeps_session() {
        let controller = authenticated_controller(FakeProvider::default()).await;
        controller
            .provider()
            .sign_out
            .lock()
            .unwrap()
            .push_back(Err(AppError::Network("offline".to_string())));

        let result = controller.logout().await;

        assert!(matches!(result, Err(AuthError::Provider(AppError::Network(_)))));
        let snapshot = controller.snapshot();
        assert!(snapshot.session.is_some());
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn signup_requiring_confirmation_awaits_code() {
        let controller = anonymous_controller(FakeProvider::default()).await;

        controller.signup("a@x.com", &password(), "Ann").await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase(), AuthPhase::AwaitingConfirmation);
        assert_eq!(snapshot.pending_email.as_deref(), Some("a@x.com"));
        assert!(snapshot.needs_confirmation());
        assert!(!snapshot.is_loading);
        assert!(controller
            .provider()
            .calls()
            .contains(&"sign_up:a@x.com:Ann".to_string()));
    }

    #[tokio::test]
    async fn signup_without_confirmation_leaves_state() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        controller
            .provider()
            .sign_up
            .lock()
            .unwrap()
            .push_back(Ok(SignUpOutcome {
                user_id: None,
                next_step: SignUpStep::Done,
            }));

        controller.signup("a@x.com", &password(), "Ann").await.unwrap();

        assert_eq!(controller.snapshot().phase(), AuthPhase::Anonymous);
    }

    #[tokio::test]
    async fn signup_failure_propagates() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        controller
            .provider()
            .sign_up
            .lock()
            .unwrap()
            .push_back(Err(provider_error("UsernameExistsException")));

        let result = controller.signup("a@x.com", &password(), "Ann").await;

        assert_eq!(
            result,
            Err(AuthError::Provider(provider_error("UsernameExistsException")))
        );
        assert_eq!(controller.snapshot().pending_email, None);
    }

    #[tokio::test]
    async fn confirm_without_pending_email_fails_before_provider_call() {
        let controller = anonymous_controller(FakeProvider::default()).await;

        for code in ["123456", "", "000000"] {
            assert_eq!(
                controller.confirm_account(code).await,
                Err(AuthError::NoPendingEmail)
            );
        }

        assert_eq!(controller.provider().calls(), vec!["current_user"]);
        assert!(!controller.snapshot().is_loading);
    }

    #[tokio::test]
    async fn confirm_clears_pending_without_signing_in() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        controller.signup("a@x.com", &password(), "Ann").await.unwrap();

        controller.confirm_account("123456").await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.pending_email, None);
        assert_eq!(snapshot.phase(), AuthPhase::Anonymous);
        assert!(controller
            .provider()
            .calls()
            .contains(&"confirm:a@x.com:123456".to_string()));
    }

    #[tokio::test]
    async fn confirm_failure_keeps_pending_email() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        controller.signup("a@x.com", &password(), "Ann").await.unwrap();
        controller
            .provider()
            .confirm
            .lock()
            .unwrap()
            .push_back(Err(provider_error("CodeMismatchException")));

        let result = controller.confirm_account("999999").await;

        assert_eq!(
            result,
            Err(AuthError::Provider(provider_error("CodeMismatchException")))
        );
        assert_eq!(
            controller.snapshot().phase(),
            AuthPhase::AwaitingConfirmation
        );
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        let mut receiver = controller.subscribe();
        let _ = receiver.borrow_and_update();

        controller.signup("a@x.com", &password(), "Ann").await.unwrap();

        assert!(receiver.has_changed().unwrap());
        assert_eq!(
            receiver.borrow_and_update().phase(),
            AuthPhase::AwaitingConfirmation
        );
    }

    #[tokio::test]
    async fn stale_completion_does_not_clear_loading() {
        let controller = Arc::new(anonymous_controller(FakeProvider::default()).await);
        let (older_gate, older_entered, older_release) = gate();
        let (newer_gate, newer_entered, newer_release) = gate();
        controller
            .provider()
            .gates
            .lock()
            .unwrap()
            .extend([("sign_in", older_gate), ("sign_up", newer_gate)]);
        controller
            .provider()
            .current_user
            .lock()
            .unwrap()
            .push_back(Ok(principal()));

        let older = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.login("a@x.com", &password()).await })
        };
        older_entered.await.unwrap();

        let newer = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.signup("b@x.com", &password(), "Bo").await })
        };
        newer_entered.await.unwrap();

        older_release.send(()).unwrap();
        older.await.unwrap().unwrap();
        assert!(controller.snapshot().is_loading);

        newer_release.send(()).unwrap();
        newer.await.unwrap().unwrap();
        assert!(!controller.snapshot().is_loading);
    }

    #[tokio::test]
    async fn newest_completion_clears_loading_while_older_runs() {
        let controller = Arc::new(anonymous_controller(FakeProvider::default()).await);
        let (older_gate, older_entered, older_release) = gate();
        controller
            .provider()
            .gates
            .lock()
            .unwrap()
            .push_back(("sign_out", older_gate));

        let older = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.logout().await })
        };
        older_entered.await.unwrap();

        controller.signup("a@x.com", &password(), "Ann").await.unwrap();
        assert!(!controller.snapshot().is_loading);

        older_release.send(()).unwrap();
        older.await.unwrap().unwrap();
        assert!(!controller.snapshot().is_loading);
    }

    #[tokio::test]
    async fn dropped_operation_releases_loading() {
        let controller = anonymous_controller(FakeProvider::default()).await;
        let (pending_gate, entered, _release) = gate();
        controller
            .provider()
            .gates
            .lock()
            .unwrap()
            .push_back(("sign_in", pending_gate));

        {
            let password = password();
            let login = controller.login("a@x.com", &password);
            tokio::pin!(login);
            tokio::select! {
                _ = &mut login => panic!("login should be blocked"),
                _ = entered => {}
            }
            assert!(controller.snapshot().is_loading);
        }

        assert!(!controller.snapshot().is_loading);
        assert_eq!(controller.snapshot().phase(), AuthPhase::Anonymous);
    }
}
