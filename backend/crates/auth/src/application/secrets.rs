//! Secret Submission and Listing
//!
//! The one post-authentication mutation (store a secret) and the public
//! read that renders the wall.

use std::sync::Arc;

use crate::application::bounded;
use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Longest secret we accept; anything bigger is noise or abuse.
const MAX_SECRET_LENGTH: usize = 1000;

/// Submit secret use case
pub struct SubmitSecretUseCase<R>
where
    R: UserStore + Clone + Send + Sync + 'static,
{
    store: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> SubmitSecretUseCase<R>
where
    R: UserStore + Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Store `secret` for the authenticated user. Idempotent for
    /// identical text.
    pub async fn execute(&self, user_id: &UserId, secret: &str) -> AuthResult<()> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(AuthError::InvalidInput("Secret cannot be empty".to_string()));
        }
        if secret.chars().count() > MAX_SECRET_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "Secret is limited to {MAX_SECRET_LENGTH} characters"
            )));
        }

        bounded(self.config.store_timeout, self.store.set_secret(user_id, secret)).await?;

        tracing::info!(user_id = %user_id, "Secret submitted");
        Ok(())
    }
}

/// List secrets use case
pub struct ListSecretsUseCase<R>
where
    R: UserStore + Clone + Send + Sync + 'static,
{
    store: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ListSecretsUseCase<R>
where
    R: UserStore + Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Every user who has shared a secret, in stable order.
    ///
    /// Full scan; fine at this scale, and the store contract permits an
    /// index-backed implementation without touching callers.
    pub async fn execute(&self) -> AuthResult<Vec<User>> {
        bounded(self.config.store_timeout, self.store.users_with_secret()).await
    }
}
