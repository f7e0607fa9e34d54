//! Session manager state machine.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, instrument, warn};

use modelwatch_core::error::{AuthenticationError, AuthorizationError, Error, RegistrationError};
use modelwatch_core::{
    AccessToken, ApiUrl, Credentials, Identity, NoopPolicy, Role, SessionStatus, TokenStore,
    UnauthorizedPolicy,
};

use crate::client::RestClient;
use crate::endpoints::{
    AUTH_CHANGE_PASSWORD, AUTH_LOGIN_EMAIL, AUTH_LOGOUT, AUTH_ME, AUTH_REFRESH, AUTH_REGISTER,
    AUTH_RESET_PASSWORD, AUTH_RESET_PASSWORD_CONFIRM, ChangePasswordRequest, LoginRequest,
    LoginResponse, MessageResponse, RegisterRequest, ResetPasswordConfirmRequest,
    ResetPasswordRequest, TokenResponse,
};

/// Internal session state. `Authenticated` carries both halves of the
/// session so that identity and credential are present together by
/// construction.
#[derive(Debug)]
enum SessionState {
    Initializing,
    Anonymous,
    Authenticating,
    Authenticated {
        identity: Identity,
        token: AccessToken,
    },
}

/// Input for account registration.
///
/// Registration does not imply login: a successful call returns the created
/// identity but leaves the session untouched.
pub struct RegistrationData {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Option<Role>,
}

// Intentionally hide password in Debug output
impl fmt::Debug for RegistrationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationData")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .finish()
    }
}

/// Single source of truth for authentication state.
///
/// The manager owns the session lifecycle: it restores a persisted
/// credential once at startup, serializes every state transition through
/// one internal lock, and persists the bearer token through the injected
/// [`TokenStore`]. Handles are cheap to clone and share one session.
///
/// Overlapping login attempts cannot race destructively: each attempt is
/// tagged with a sequence number and only the most recently issued
/// attempt's result is applied. Logout bumps the same sequence, so a
/// login resolving after a logout is discarded too.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: RestClient,
    store: Box<dyn TokenStore>,
    policy: Box<dyn UnauthorizedPolicy>,
    state: RwLock<SessionState>,
    attempt: AtomicU64,
    initialized: AtomicBool,
}

impl SessionManager {
    /// Create a session manager with no unauthorized policy.
    pub fn new(api: ApiUrl, store: impl TokenStore + 'static) -> Self {
        Self::with_policy(api, store, NoopPolicy)
    }

    /// Create a session manager with an explicit unauthorized policy.
    pub fn with_policy(
        api: ApiUrl,
        store: impl TokenStore + 'static,
        policy: impl UnauthorizedPolicy + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client: RestClient::new(api),
                store: Box::new(store),
                policy: Box::new(policy),
                state: RwLock::new(SessionState::Initializing),
                attempt: AtomicU64::new(0),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    /// Restore the session from the persisted credential.
    ///
    /// Runs at most once per manager lifetime; later calls are no-ops that
    /// return the current status. A persisted token is validated against
    /// the identity endpoint; rejection discards it. Initialization never
    /// fails: every path lands in `Anonymous` or `Authenticated`.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> SessionStatus {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            debug!("session already initialized");
            return self.status();
        }

        let token = match self.inner.store.load() {
            Ok(token) => token,
            Err(err) => {
                // An unreadable slot is treated like an absent credential.
                warn!(error = %err, "failed to read persisted token");
                None
            }
        };

        let Some(token) = token else {
            self.set_state(SessionState::Anonymous);
            debug!("no persisted token");
            return SessionStatus::Anonymous;
        };

        debug!("restoring session from persisted token");
        match self
            .inner
            .client
            .get_authed::<Identity>(AUTH_ME, token.as_str())
            .await
        {
            Ok(identity) => {
                info!(user = %identity.email, "session restored");
                self.set_state(SessionState::Authenticated { identity, token });
                SessionStatus::Authenticated
            }
            Err(err) => {
                debug!(error = %err, "persisted token rejected, discarding");
                self.clear_store();
                self.set_state(SessionState::Anonymous);
                SessionStatus::Anonymous
            }
        }
    }

    /// Authenticate with email and password.
    ///
    /// On success the token is persisted and the identity cached, both from
    /// the same login transaction. On failure the session reverts to
    /// `Anonymous` with no token in persistence, and the server's reason is
    /// surfaced as an [`AuthenticationError`]. If a newer attempt was issued
    /// before this one resolved, this result is discarded.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: Credentials) -> Result<Identity, Error> {
        let attempt = self.begin_attempt();
        self.set_state(SessionState::Authenticating);
        info!("logging in");

        let request = LoginRequest {
            email: credentials.email(),
            password: credentials.password(),
        };
        let result = self
            .inner
            .client
            .post::<_, LoginResponse>(AUTH_LOGIN_EMAIL, &request)
            .await;

        let mut state = self.inner.state.write().unwrap();
        if self.inner.attempt.load(Ordering::SeqCst) != attempt {
            debug!("discarding stale login result");
            return Err(AuthenticationError::superseded().into());
        }

        match result {
            Ok(response) => {
                let token = AccessToken::new(response.access_token);
                if let Err(err) = self.inner.store.save(&token) {
                    // A failed persist is a hard failure of the login.
                    if let Err(clear_err) = self.inner.store.clear() {
                        warn!(error = %clear_err, "failed to clear token store");
                    }
                    *state = SessionState::Anonymous;
                    warn!(error = %err, "failed to persist token");
                    return Err(err.into());
                }

                let identity = response.user;
                *state = SessionState::Authenticated {
                    identity: identity.clone(),
                    token,
                };
                info!(user = %identity.email, "login succeeded");
                Ok(identity)
            }
            Err(err) => {
                if let Err(clear_err) = self.inner.store.clear() {
                    warn!(error = %clear_err, "failed to clear token store");
                }
                *state = SessionState::Anonymous;
                debug!(error = %err, "login failed");
                Err(AuthenticationError::new(login_failure_message(&err)).into())
            }
        }
    }

    /// Create a new account.
    ///
    /// Never mutates session state; a registered user logs in explicitly.
    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn register(&self, data: RegistrationData) -> Result<Identity, Error> {
        let request = RegisterRequest {
            email: &data.email,
            username: &data.username,
            password: &data.password,
            full_name: data.full_name.as_deref(),
            role: data.role,
        };

        match self
            .inner
            .client
            .post::<_, Identity>(AUTH_REGISTER, &request)
            .await
        {
            Ok(identity) => {
                info!(user = %identity.email, "account registered");
                Ok(identity)
            }
            Err(err) => Err(RegistrationError::new(err.user_message()).into()),
        }
    }

    /// End the session.
    ///
    /// The local transition to `Anonymous` and the token deletion are
    /// unconditional and complete before the remote notification is
    /// attempted; that notification is best-effort and its outcome is
    /// ignored. Any in-flight login is invalidated.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.begin_attempt();
        let token = {
            let mut state = self.inner.state.write().unwrap();
            let token = match &*state {
                SessionState::Authenticated { token, .. } => Some(token.clone()),
                _ => None,
            };
            *state = SessionState::Anonymous;
            token
        };
        self.clear_store();
        info!("logged out");

        if let Some(token) = token {
            if let Err(err) = self
                .inner
                .client
                .post_authed_empty(AUTH_LOGOUT, token.as_str())
                .await
            {
                debug!(error = %err, "logout notification failed");
            }
        }
    }

    /// Replace the cached identity wholesale.
    ///
    /// The caller supplies a fully valid identity; there is no partial
    /// merge. The token is untouched, and the call is ignored outside an
    /// authenticated session.
    pub fn update_identity(&self, identity: Identity) {
        let mut state = self.inner.state.write().unwrap();
        if let SessionState::Authenticated {
            identity: current, ..
        } = &mut *state
        {
            *current = identity;
        } else {
            debug!("update_identity ignored outside an authenticated session");
        }
    }

    /// Rotate the bearer credential.
    ///
    /// On success the new token is persisted and swapped in place; the
    /// identity is unchanged and the session stays `Authenticated`.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), Error> {
        let token = self
            .token()
            .ok_or_else(|| Error::Authorization(AuthorizationError::missing_credential()))?;
        info!("refreshing access token");

        match self
            .inner
            .client
            .post_authed_no_body::<TokenResponse>(AUTH_REFRESH, token.as_str())
            .await
        {
            Ok(response) => {
                let new_token = AccessToken::new(response.access_token);
                let mut state = self.inner.state.write().unwrap();
                // Swap only if the session is still live; a logout that won
                // the race must not be resurrected.
                if let SessionState::Authenticated { token, .. } = &mut *state {
                    self.inner.store.save(&new_token)?;
                    *token = new_token;
                    debug!("access token rotated");
                }
                Ok(())
            }
            Err(err) => Err(self.handle_authed_failure(err)),
        }
    }

    /// Change the account password.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<String, Error> {
        let token = self
            .token()
            .ok_or_else(|| Error::Authorization(AuthorizationError::missing_credential()))?;

        let request = ChangePasswordRequest {
            current_password,
            new_password,
        };
        match self
            .inner
            .client
            .post_authed::<_, MessageResponse>(AUTH_CHANGE_PASSWORD, &request, token.as_str())
            .await
        {
            Ok(response) => {
                info!("password changed");
                Ok(response.message)
            }
            Err(err) => Err(self.handle_authed_failure(err)),
        }
    }

    /// Request a password reset email.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<String, Error> {
        let request = ResetPasswordRequest { email };
        let response = self
            .inner
            .client
            .post::<_, MessageResponse>(AUTH_RESET_PASSWORD, &request)
            .await?;
        Ok(response.message)
    }

    /// Confirm a password reset with the emailed token.
    #[instrument(skip_all)]
    pub async fn confirm_password_reset(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<String, Error> {
        let request = ResetPasswordConfirmRequest {
            token: reset_token,
            new_password,
        };
        let response = self
            .inner
            .client
            .post::<_, MessageResponse>(AUTH_RESET_PASSWORD_CONFIRM, &request)
            .await?;
        Ok(response.message)
    }

    /// Current session status.
    pub fn status(&self) -> SessionStatus {
        match *self.inner.state.read().unwrap() {
            SessionState::Initializing => SessionStatus::Initializing,
            SessionState::Anonymous => SessionStatus::Anonymous,
            SessionState::Authenticating => SessionStatus::Authenticating,
            SessionState::Authenticated { .. } => SessionStatus::Authenticated,
        }
    }

    /// Snapshot of the cached identity, if authenticated.
    pub fn identity(&self) -> Option<Identity> {
        match &*self.inner.state.read().unwrap() {
            SessionState::Authenticated { identity, .. } => Some(identity.clone()),
            _ => None,
        }
    }

    /// Snapshot of the held token, if authenticated.
    pub fn token(&self) -> Option<AccessToken> {
        match &*self.inner.state.read().unwrap() {
            SessionState::Authenticated { token, .. } => Some(token.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.status().is_loading()
    }

    /// Start a new attempt generation, invalidating in-flight logins.
    fn begin_attempt(&self) -> u64 {
        self.inner.attempt.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn set_state(&self, next: SessionState) {
        *self.inner.state.write().unwrap() = next;
    }

    fn clear_store(&self) {
        if let Err(err) = self.inner.store.clear() {
            warn!(error = %err, "failed to clear token store");
        }
    }

    /// Apply the blanket authorization-failure policy to an authenticated
    /// request's error: on a 401-class failure the session is forcibly
    /// terminated and the policy hook fires once. Other errors pass
    /// through untouched.
    fn handle_authed_failure(&self, err: Error) -> Error {
        if matches!(err, Error::Authorization(_)) {
            self.force_logout();
        }
        err
    }

    fn force_logout(&self) {
        self.begin_attempt();
        self.clear_store();
        self.set_state(SessionState::Anonymous);
        info!("session terminated after authorization failure");
        self.inner.policy.on_unauthorized();
    }
}

/// A 401 from the login endpoint means the credentials were wrong, not
/// that a session expired; surface the server's reason for it.
fn login_failure_message(err: &Error) -> String {
    match err {
        Error::Authorization(auth) => auth
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| "Incorrect email or password".to_string()),
        other => other.user_message(),
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("api", self.inner.client.api())
            .field("status", &self.status())
            .finish()
    }
}
