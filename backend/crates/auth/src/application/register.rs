//! Register Use Case
//!
//! Creates a local account and immediately establishes a session
//! (auto-login after registration).

use std::sync::Arc;

use crate::application::bounded;
use crate::application::config::AuthConfig;
use crate::application::session::{EstablishedSession, SessionCodec};
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionStore, UserStore};
use crate::domain::value_object::{
    auth_method::AuthMethod, user_password::{RawPassword, UserPassword}, username::Username,
};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

/// Register use case
pub struct RegisterUseCase<R>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
{
    store: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> RegisterUseCase<R>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<EstablishedSession> {
        let username =
            Username::new(&input.username).map_err(|e| AuthError::InvalidInput(e.to_string()))?;

        let raw_password = RawPassword::new(input.password)?;

        // Argon2id is memory-hard on purpose; keep it off the async workers
        let pepper = self.config.password_pepper.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || UserPassword::from_raw(&raw_password, pepper.as_deref()))
                .await
                .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))??;

        let user = User::local(username, password_hash);

        bounded(self.config.store_timeout, self.store.create_user(&user))
            .await
            .map_err(|e| match e {
                // Store vocabulary stays inside the authenticator
                AuthError::DuplicateKey { .. } => AuthError::UsernameTaken,
                other => other,
            })?;

        tracing::info!(
            user_id = %user.user_id,
            username = %user.username.as_ref().map(|n| n.canonical()).unwrap_or_default(),
            "User registered"
        );

        let codec = SessionCodec::new(self.store.clone(), self.config.clone());
        codec.establish(user.user_id, AuthMethod::Local).await
    }
}
