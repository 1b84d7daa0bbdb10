//! Auth Gate
//!
//! Per-request authentication decision. Two states: `Anonymous` and
//! `Authenticated(User)`. Entry resolves the transported token and
//! re-fetches the full User from the store; a session pointing at a
//! vanished user degrades to Anonymous and the orphan session is removed.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::application::bounded;
use crate::application::config::AuthConfig;
use crate::application::session::SessionCodec;
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionStore, UserStore};
use crate::error::{AuthError, AuthResult};

/// Authentication state of a request
#[derive(Debug, Clone)]
pub enum AuthState {
    Anonymous,
    Authenticated(User),
}

impl AuthState {
    /// The single guard every protected handler calls.
    pub fn require_authenticated(&self) -> AuthResult<&User> {
        match self {
            AuthState::Authenticated(user) => Ok(user),
            AuthState::Anonymous => Err(AuthError::Unauthenticated),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Auth gate
pub struct AuthGate<R>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
{
    store: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> AuthGate<R>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Decide the auth state for a request from its headers.
    ///
    /// Missing, malformed, or stale tokens yield `Ok(Anonymous)`; only
    /// store failure is an error, which handlers turn into a generic
    /// error page rather than proceeding.
    pub async fn authenticate(&self, headers: &HeaderMap) -> AuthResult<AuthState> {
        let token = platform::cookie::extract_cookie(headers, &self.config.session_cookie_name);

        match token {
            Some(token) => self.authenticate_token(&token).await,
            None => Ok(AuthState::Anonymous),
        }
    }

    /// Decide the auth state for a bare token.
    pub async fn authenticate_token(&self, token: &str) -> AuthResult<AuthState> {
        let codec = SessionCodec::new(self.store.clone(), self.config.clone());

        let Some(user_id) = codec.resolve(token).await? else {
            return Ok(AuthState::Anonymous);
        };

        let user = bounded(self.config.store_timeout, self.store.find_by_id(&user_id)).await?;

        match user {
            Some(user) => Ok(AuthState::Authenticated(user)),
            None => {
                // The user vanished underneath the session; drop the orphan
                tracing::warn!(user_id = %user_id, "Session resolved to a missing user");
                codec.destroy(token).await?;
                Ok(AuthState::Anonymous)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::provider::Provider;

    #[test]
    fn test_require_authenticated_rejects_anonymous() {
        assert!(matches!(
            AuthState::Anonymous.require_authenticated(),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[test]
    fn test_require_authenticated_accepts_user() {
        let user = User::federated(Provider::Google, "g-1");
        let state = AuthState::Authenticated(user.clone());
        let guarded = state.require_authenticated().unwrap();
        assert_eq!(guarded.user_id, user.user_id);
    }
}
