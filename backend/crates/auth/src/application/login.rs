//! Login Use Case
//!
//! Authenticates a username/password pair and creates a session.
//!
//! Failure is uniform: unknown usernames, federated-only accounts, and
//! wrong passwords all verify against some Argon2id hash (a decoy when no
//! real one exists) and return the same `InvalidCredentials`, so neither
//! the error nor the latency reveals which case occurred.

use std::sync::Arc;

use crate::application::bounded;
use crate::application::config::AuthConfig;
use crate::application::session::{EstablishedSession, SessionCodec};
use crate::domain::repository::{SessionStore, UserStore};
use crate::domain::value_object::{
    auth_method::AuthMethod, user_password::{RawPassword, UserPassword}, username::Username,
};
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
{
    store: Arc<R>,
    config: Arc<AuthConfig>,
    /// Decoy credential for the unknown-username path
    decoy: Arc<UserPassword>,
}

impl<R> LoginUseCase<R>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<R>, config: Arc<AuthConfig>, decoy: Arc<UserPassword>) -> Self {
        Self {
            store,
            config,
            decoy,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<EstablishedSession> {
        // Malformed input can only mean bad credentials; do not leak which
        let username =
            Username::new(&input.username).map_err(|_| AuthError::InvalidCredentials)?;
        let raw_password =
            RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;

        let user = bounded(
            self.config.store_timeout,
            self.store.find_by_username(&username),
        )
        .await?;

        // Pick the hash to verify against: the real one, or the decoy so
        // the failure path costs the same
        let (hash, user) = match user {
            Some(user) => match user.password_hash.clone() {
                Some(hash) => (hash, Some(user)),
                None => ((*self.decoy).clone(), None),
            },
            None => ((*self.decoy).clone(), None),
        };

        let pepper = self.config.password_pepper.clone();
        let password_valid =
            tokio::task::spawn_blocking(move || hash.verify(&raw_password, pepper.as_deref()))
                .await
                .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))?;

        let user = match user {
            Some(user) if password_valid => user,
            _ => return Err(AuthError::InvalidCredentials),
        };

        tracing::info!(
            user_id = %user.user_id,
            username = %username.canonical(),
            "User logged in"
        );

        let codec = SessionCodec::new(self.store.clone(), self.config.clone());
        codec.establish(user.user_id, AuthMethod::Local).await
    }
}
