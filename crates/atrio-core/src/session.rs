//! Session state machines for the user and admin realms.
//!
//! A session owns its API client, its durable token slot, and the in-memory
//! principal. State-changing operations take `&mut self`, so two operations
//! on the same session can never interleave.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::api::types::{
    AdminAccount, Credentials, LoginOutcome, ProfileUpdate, RegisterRequest, Token, TwoFactorAck,
    TwoFactorSettings, UserAccount,
};
use crate::api::{AdminApi, UserApi};
use crate::store::{TokenStore, mask_token};

/// Lifecycle of a session's principal binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState<P> {
    /// Nothing has been loaded yet; hydration has not run.
    Uninitialized,
    /// Startup hydration is in flight.
    Hydrating,
    /// No principal is bound.
    Anonymous,
    /// A principal is bound and its token was accepted by the backend.
    Authenticated(P),
}

impl<P> SessionState<P> {
    /// Returns the bound principal, if authenticated.
    pub fn principal(&self) -> Option<&P> {
        match self {
            SessionState::Authenticated(principal) => Some(principal),
            _ => None,
        }
    }

    /// Returns true until startup hydration has settled.
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Uninitialized | SessionState::Hydrating)
    }

    /// Returns true if a principal is bound.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// What the caller should do next after a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFlow {
    /// The session is authenticated; nothing further to do.
    Completed,
    /// The backend wants a second factor; run `verify_two_factor` next.
    TwoFactorRequired,
}

/// User session manager.
pub struct UserSession {
    api: UserApi,
    store: TokenStore,
    state: SessionState<UserAccount>,
    /// Temp token held between the two-factor login branch and verification.
    /// Process memory only; never written to the durable store.
    pending_challenge: Option<String>,
}

impl UserSession {
    /// Creates a session over its API client and token slot.
    pub fn new(api: UserApi, store: TokenStore) -> Self {
        Self {
            api,
            store,
            state: SessionState::Uninitialized,
            pending_challenge: None,
        }
    }

    /// Returns the current session state.
    pub fn state(&self) -> &SessionState<UserAccount> {
        &self.state
    }

    /// Returns true if a two-factor verification is waiting for its second factor.
    pub fn has_pending_challenge(&self) -> bool {
        self.pending_challenge.is_some()
    }

    /// Reconstructs session state from the durable token slot.
    ///
    /// Runs at most once per session; later calls are no-ops. Without a
    /// stored token no request is made. Failures are absorbed: a token the
    /// backend rejects is purged and the session settles anonymous.
    pub async fn hydrate(&mut self) {
        if !matches!(self.state, SessionState::Uninitialized) {
            debug!("user session already hydrated; ignoring");
            return;
        }
        self.state = SessionState::Hydrating;

        let token = match self.store.get() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.state = SessionState::Anonymous;
                return;
            }
            Err(e) => {
                warn!("token store unreadable during hydration: {e:#}");
                self.state = SessionState::Anonymous;
                return;
            }
        };

        match self.api.current_user(&token).await {
            Ok(principal) => {
                debug!(token = %mask_token(&token), "user session hydrated");
                self.state = SessionState::Authenticated(principal);
            }
            Err(e) => {
                warn!("stored user token rejected during hydration: {e}");
                if let Err(e) = self.store.clear() {
                    warn!("failed to clear rejected user token: {e:#}");
                }
                self.state = SessionState::Anonymous;
            }
        }
    }

    /// Attempts a password login.
    ///
    /// On the two-factor branch the temp token is held in memory and the
    /// caller is signaled to run [`UserSession::verify_two_factor`]; nothing
    /// is persisted and no principal is bound. On the direct branch the
    /// token is persisted, the principal fetched, and the session becomes
    /// authenticated.
    ///
    /// # Errors
    /// Returns an error if the operation fails; prior state is kept.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<LoginFlow> {
        match self.api.login(credentials).await? {
            LoginOutcome::TwoFactorRequired { temp_token } => {
                debug!("login requires a second factor");
                self.pending_challenge = Some(temp_token);
                Ok(LoginFlow::TwoFactorRequired)
            }
            LoginOutcome::Authenticated(token) => {
                self.establish(token).await?;
                Ok(LoginFlow::Completed)
            }
        }
    }

    /// Redeems the held temp token with the second-factor password.
    ///
    /// On success the session proceeds exactly as a direct login. On failure
    /// the temp token stays held so the caller may retry; lockout policy
    /// belongs to the server.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn verify_two_factor(&mut self, external_password: &str) -> Result<()> {
        let temp_token = self
            .pending_challenge
            .clone()
            .ok_or_else(|| ApiError::auth("No two-factor verification is pending"))?;

        let token = self
            .api
            .verify_two_factor(&temp_token, external_password)
            .await?;
        // The temp token is single-use; it is spent once verification succeeds.
        self.pending_challenge = None;
        self.establish(token).await
    }

    /// Discards a held temp token without contacting the backend.
    pub fn cancel_two_factor(&mut self) {
        if self.pending_challenge.take().is_some() {
            debug!("discarded pending two-factor challenge");
        }
    }

    /// Registers an account, then signs in with the same credentials.
    ///
    /// Registration alone issues no token, so the session is established by
    /// the follow-up login, which may itself branch to two-factor.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn register(
        &mut self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<LoginFlow> {
        let request = RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        };
        let account = self.api.register(&request).await?;
        debug!(id = account.id, "account registered");

        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.login(&credentials).await
    }

    /// Logs out: best-effort remote notification, then unconditional local
    /// teardown. A failed remote call never blocks the local logout.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn logout(&mut self) -> Result<()> {
        match self.store.get() {
            Ok(Some(token)) => {
                if let Err(e) = self.api.logout(Some(&token)).await {
                    warn!("remote logout failed; clearing local session anyway: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => warn!("token store unreadable during logout: {e:#}"),
        }

        self.store.clear().context("clear user token")?;
        self.pending_challenge = None;
        self.state = SessionState::Anonymous;
        Ok(())
    }

    /// Applies a profile patch and replaces the bound principal.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn update_profile(&mut self, patch: &ProfileUpdate) -> Result<UserAccount> {
        let token = self.require_token()?;
        let principal = self.api.update_profile(&token, patch).await?;
        self.state = SessionState::Authenticated(principal.clone());
        Ok(principal)
    }

    /// Changes the caller's two-factor settings, then re-fetches the account
    /// so the bound principal is replaced wholesale rather than patched.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn update_two_factor(&mut self, settings: &TwoFactorSettings) -> Result<TwoFactorAck> {
        let token = self.require_token()?;
        let ack = self.api.update_two_factor(&token, settings).await?;
        let principal = self.api.current_user(&token).await?;
        self.state = SessionState::Authenticated(principal);
        Ok(ack)
    }

    /// Returns the stored token, or an auth error when there is none.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn require_token(&self) -> Result<String> {
        self.store
            .get()?
            .ok_or_else(|| ApiError::auth("No authentication token").into())
    }

    /// Persists a fresh token and binds the principal behind it.
    async fn establish(&mut self, token: Token) -> Result<()> {
        self.store
            .set(&token.access_token)
            .context("persist user token")?;
        let principal = self.api.current_user(&token.access_token).await?;
        debug!(token = %mask_token(&token.access_token), "user session established");
        self.state = SessionState::Authenticated(principal);
        Ok(())
    }
}

/// Admin session manager.
///
/// Same lifecycle as [`UserSession`] minus registration and the two-factor
/// branch; admin logins return a token directly.
pub struct AdminSession {
    api: AdminApi,
    store: TokenStore,
    state: SessionState<AdminAccount>,
}

impl AdminSession {
    /// Creates a session over its API client and token slot.
    pub fn new(api: AdminApi, store: TokenStore) -> Self {
        Self {
            api,
            store,
            state: SessionState::Uninitialized,
        }
    }

    /// Returns the current session state.
    pub fn state(&self) -> &SessionState<AdminAccount> {
        &self.state
    }

    /// Returns the underlying API client for admin management calls.
    pub fn api(&self) -> &AdminApi {
        &self.api
    }

    /// Reconstructs session state from the durable token slot.
    ///
    /// Same contract as [`UserSession::hydrate`].
    pub async fn hydrate(&mut self) {
        if !matches!(self.state, SessionState::Uninitialized) {
            debug!("admin session already hydrated; ignoring");
            return;
        }
        self.state = SessionState::Hydrating;

        let token = match self.store.get() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.state = SessionState::Anonymous;
                return;
            }
            Err(e) => {
                warn!("token store unreadable during hydration: {e:#}");
                self.state = SessionState::Anonymous;
                return;
            }
        };

        match self.api.current_admin(&token).await {
            Ok(principal) => {
                debug!(token = %mask_token(&token), "admin session hydrated");
                self.state = SessionState::Authenticated(principal);
            }
            Err(e) => {
                warn!("stored admin token rejected during hydration: {e}");
                if let Err(e) = self.store.clear() {
                    warn!("failed to clear rejected admin token: {e:#}");
                }
                self.state = SessionState::Anonymous;
            }
        }
    }

    /// Attempts an admin password login.
    ///
    /// # Errors
    /// Returns an error if the operation fails; prior state is kept.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let token = self.api.login(credentials).await?;
        self.store
            .set(&token.access_token)
            .context("persist admin token")?;
        let principal = self.api.current_admin(&token.access_token).await?;
        debug!(
            role = %principal.role,
            token = %mask_token(&token.access_token),
            "admin session established"
        );
        self.state = SessionState::Authenticated(principal);
        Ok(())
    }

    /// Logs out: best-effort remote notification, then unconditional local
    /// teardown. Without a stored token no request is made.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn logout(&mut self) -> Result<()> {
        match self.store.get() {
            Ok(Some(token)) => {
                if let Err(e) = self.api.logout(&token).await {
                    warn!("remote admin logout failed; clearing local session anyway: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => warn!("token store unreadable during logout: {e:#}"),
        }

        self.store.clear().context("clear admin token")?;
        self.state = SessionState::Anonymous;
        Ok(())
    }

    /// Returns the stored token, or an auth error when there is none.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn require_token(&self) -> Result<String> {
        self.store
            .get()?
            .ok_or_else(|| ApiError::auth("No admin authentication token").into())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::api::{ApiConfig, ApiError, ApiErrorKind};
    use crate::store::SessionKind;

    use super::*;

    fn user_session(dir: &std::path::Path) -> UserSession {
        // Unroutable port; these tests never touch the network.
        let config = ApiConfig::for_base_url("http://127.0.0.1:1");
        let api = UserApi::new(&config).unwrap();
        UserSession::new(api, TokenStore::at(dir.join("tokens.json"), SessionKind::User))
    }

    /// A fresh session is uninitialized and reports loading.
    #[test]
    fn test_fresh_session_is_loading() {
        let dir = tempdir().unwrap();
        let session = user_session(dir.path());

        assert_eq!(*session.state(), SessionState::Uninitialized);
        assert!(session.state().is_loading());
        assert!(!session.state().is_authenticated());
        assert_eq!(session.state().principal(), None);
    }

    /// Hydration without a stored token settles anonymous with no request.
    #[tokio::test]
    async fn test_hydrate_empty_store_settles_anonymous() {
        let dir = tempdir().unwrap();
        let mut session = user_session(dir.path());

        session.hydrate().await;
        assert_eq!(*session.state(), SessionState::Anonymous);
        assert!(!session.state().is_loading());

        // Second call is a no-op.
        session.hydrate().await;
        assert_eq!(*session.state(), SessionState::Anonymous);
    }

    /// Token-requiring operations fail with an auth error when anonymous.
    #[test]
    fn test_require_token_when_anonymous() {
        let dir = tempdir().unwrap();
        let session = user_session(dir.path());

        let err = session.require_token().unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.kind, ApiErrorKind::Auth);
    }

    /// Verification without a pending challenge is rejected locally.
    #[tokio::test]
    async fn test_verify_without_pending_challenge() {
        let dir = tempdir().unwrap();
        let mut session = user_session(dir.path());

        let err = session.verify_two_factor("000000").await.unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.kind, ApiErrorKind::Auth);
    }

    /// Cancelling with no challenge held is harmless.
    #[test]
    fn test_cancel_without_challenge() {
        let dir = tempdir().unwrap();
        let mut session = user_session(dir.path());

        assert!(!session.has_pending_challenge());
        session.cancel_two_factor();
        assert!(!session.has_pending_challenge());
    }

    /// State accessors behave across the enum.
    #[test]
    fn test_session_state_accessors() {
        let state: SessionState<()> = SessionState::Hydrating;
        assert!(state.is_loading());
        assert!(!state.is_authenticated());

        let state = SessionState::Authenticated("principal");
        assert_eq!(state.principal(), Some(&"principal"));
        assert!(!state.is_loading());
    }
}
