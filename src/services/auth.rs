//! Admin session
//!
//! The session is a bearer token kept in client storage. Its state is only
//! ever changed by [`AuthService::initialize`], [`AuthService::login`] and
//! [`AuthService::logout`].

use std::sync::Arc;

use crate::client::PortalBackend;
use crate::models::LoginRequest;

/// Where anonymous visitors of admin pages are sent
pub const LOGIN_PATH: &str = "/admin/login";

/// Client side token storage
pub trait TokenStore {
    fn token(&self) -> Option<String>;
    fn set_token(&mut self, token: &str);
    fn clear_token(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Stored token not verified yet
    #[default]
    Loading,
    Authenticated,
    Anonymous,
}

/// Authentication state of the current visitor
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    state: AuthState,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }
}

/// What a protected page does for a given session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Verification still in flight
    Placeholder,
    Render,
    RedirectToLogin,
}

pub fn guard(state: AuthState) -> GuardDecision {
    match state {
        AuthState::Loading => GuardDecision::Placeholder,
        AuthState::Authenticated => GuardDecision::Render,
        AuthState::Anonymous => GuardDecision::RedirectToLogin,
    }
}

pub struct AuthService {
    backend: Arc<dyn PortalBackend>,
}

impl AuthService {
    pub fn new(backend: Arc<dyn PortalBackend>) -> Self {
        Self { backend }
    }

    /// Verify the stored token, discarding it unless the backend accepts it
    pub async fn initialize<S: TokenStore>(&self, session: &mut AuthSession, store: &mut S) {
        let Some(token) = store.token().filter(|t| !t.is_empty()) else {
            session.state = AuthState::Anonymous;
            return;
        };

        match self.backend.verify(Some(&token)).await {
            Ok(response) if response.authenticated => {
                session.state = AuthState::Authenticated;
            }
            Ok(_) => {
                tracing::debug!("Stored admin token rejected");
                store.clear_token();
                session.state = AuthState::Anonymous;
            }
            Err(e) => {
                tracing::warn!("Admin token verification failed: {}", e);
                store.clear_token();
                session.state = AuthState::Anonymous;
            }
        }
    }

    /// Exchange credentials for a token; any failure yields `false`
    pub async fn login<S: TokenStore>(
        &self,
        session: &mut AuthSession,
        store: &mut S,
        username: &str,
        password: &str,
    ) -> bool {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        match self.backend.login(&request).await {
            Ok(response) => match response.token.filter(|t| !t.is_empty()) {
                Some(token) => {
                    store.set_token(&token);
                    session.state = AuthState::Authenticated;
                    tracing::info!(username, "Admin logged in");
                    true
                }
                None => {
                    tracing::warn!(username, "Login response carried no token");
                    false
                }
            },
            Err(e) => {
                tracing::info!(username, "Admin login failed: {}", e);
                false
            }
        }
    }

    /// Forget the token; returns the page to redirect to
    pub fn logout<S: TokenStore>(&self, session: &mut AuthSession, store: &mut S) -> &'static str {
        store.clear_token();
        session.state = AuthState::Anonymous;
        LOGIN_PATH
    }
}
