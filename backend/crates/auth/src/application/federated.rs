//! Federated Identity Resolver
//!
//! Maps an already-verified external identity onto a local user record
//! and establishes a session. The OAuth2 wire protocol is a collaborator
//! (`infra::oauth`); by the time this use case runs, the subject id has
//! been verified with the provider.

use std::sync::Arc;

use crate::application::bounded;
use crate::application::config::AuthConfig;
use crate::application::session::{EstablishedSession, SessionCodec};
use crate::domain::repository::{SessionStore, UserStore};
use crate::domain::value_object::{auth_method::AuthMethod, provider::Provider};
use crate::error::AuthResult;

/// An external identity the provider has vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub provider: Provider,
    /// The provider's stable subject id for this user
    pub subject: String,
}

/// Resolve identity use case
pub struct ResolveIdentityUseCase<R>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
{
    store: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ResolveIdentityUseCase<R>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Find or create the local user for this identity and sign them in.
    ///
    /// Federated identity is trusted once verified; the only failure mode
    /// here is store unavailability.
    pub async fn execute(&self, identity: VerifiedIdentity) -> AuthResult<EstablishedSession> {
        let user = bounded(
            self.config.store_timeout,
            self.store
                .find_or_create_by_provider(identity.provider, &identity.subject),
        )
        .await?;

        tracing::info!(
            user_id = %user.user_id,
            provider = %identity.provider,
            "Federated identity resolved"
        );

        let codec = SessionCodec::new(self.store.clone(), self.config.clone());
        codec
            .establish(user.user_id, AuthMethod::Provider(identity.provider))
            .await
    }
}
