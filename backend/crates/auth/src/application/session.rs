//! Session Codec
//!
//! Mints, resolves, and destroys session tokens. A token is
//! `"{session_id}.{base64url(hmac_sha256(session_id))}"`; the id is a
//! random UUID v4, never derived from the user id. The stored session
//! carries nothing but the user id.

use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use uuid::Uuid;

use crate::application::bounded;
use crate::application::config::AuthConfig;
use crate::domain::entity::session::Session;
use crate::domain::repository::SessionStore;
use crate::domain::value_object::{auth_method::AuthMethod, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Result of a successful authentication: the minted token plus the
/// identity it stands for, tagged with how it was proven.
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    /// Signed token for transport-layer attachment (cookie)
    pub token: String,
    pub user_id: UserId,
    pub method: AuthMethod,
}

/// Session codec
pub struct SessionCodec<S>
where
    S: SessionStore + Clone + Send + Sync + 'static,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> SessionCodec<S>
where
    S: SessionStore + Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Mint and persist a new session for `user_id`
    pub async fn establish(
        &self,
        user_id: UserId,
        method: AuthMethod,
    ) -> AuthResult<EstablishedSession> {
        let ttl = ChronoDuration::from_std(self.config.session_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;
        let session = Session::new(user_id, ttl);

        bounded(
            self.config.store_timeout,
            self.store.create_session(&session),
        )
        .await?;

        let token = self.sign(session.session_id);

        tracing::info!(
            user_id = %user_id,
            session_id = %session.session_id,
            method = %method,
            "Session established"
        );

        Ok(EstablishedSession {
            token,
            user_id,
            method,
        })
    }

    /// Resolve a token to the user id it stands for
    ///
    /// Absent, malformed, forged, and expired tokens all resolve to
    /// `None` (anonymous); expired rows are deleted on sight.
    pub async fn resolve(&self, token: &str) -> AuthResult<Option<UserId>> {
        let Some(session_id) = self.parse(token) else {
            return Ok(None);
        };

        let session = bounded(self.config.store_timeout, self.store.find_session(session_id))
            .await?;

        match session {
            None => Ok(None),
            Some(session) if session.is_expired() => {
                bounded(
                    self.config.store_timeout,
                    self.store.delete_session(session_id),
                )
                .await?;
                Ok(None)
            }
            Some(session) => Ok(Some(session.user_id)),
        }
    }

    /// Destroy the session behind a token; idempotent
    ///
    /// Destroying a malformed or already-absent token is not an error.
    pub async fn destroy(&self, token: &str) -> AuthResult<()> {
        if let Some(session_id) = self.parse(token) {
            bounded(
                self.config.store_timeout,
                self.store.delete_session(session_id),
            )
            .await?;
            tracing::info!(session_id = %session_id, "Session destroyed");
        }
        Ok(())
    }

    /// Sign a session id into a transportable token
    fn sign(&self, session_id: Uuid) -> String {
        use base64::Engine;
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let session_id = session_id.to_string();

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.config.session_secret)
            .expect("HMAC can take key of any size");
        mac.update(session_id.as_bytes());
        let signature = mac.finalize().into_bytes();

        format!(
            "{}.{}",
            session_id,
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// Parse and verify a token, returning the session id
    fn parse(&self, token: &str) -> Option<Uuid> {
        use base64::Engine;
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let (session_id_str, signature_b64) = token.split_once('.')?;

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.config.session_secret)
            .expect("HMAC can take key of any size");
        mac.update(session_id_str.as_bytes());

        let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signature_b64)
            .ok()?;

        mac.verify_slice(&signature).ok()?;

        session_id_str.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryStore;

    fn codec() -> SessionCodec<MemoryStore> {
        SessionCodec::new(
            Arc::new(MemoryStore::new()),
            Arc::new(AuthConfig::development()),
        )
    }

    #[tokio::test]
    async fn test_establish_then_resolve() {
        let codec = codec();
        let user_id = UserId::new();

        let established = codec.establish(user_id, AuthMethod::Local).await.unwrap();
        let resolved = codec.resolve(&established.token).await.unwrap();
        assert_eq!(resolved, Some(user_id));
    }

    #[tokio::test]
    async fn test_garbage_token_is_anonymous() {
        let codec = codec();
        assert_eq!(codec.resolve("garbage").await.unwrap(), None);
        assert_eq!(codec.resolve("a.b.c").await.unwrap(), None);
        assert_eq!(codec.resolve("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_forged_signature_is_anonymous() {
        let codec = codec();
        let established = codec
            .establish(UserId::new(), AuthMethod::Local)
            .await
            .unwrap();

        let (id_part, _) = established.token.split_once('.').unwrap();
        let forged = format!("{id_part}.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        assert_eq!(codec.resolve(&forged).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let codec = codec();
        let established = codec
            .establish(UserId::new(), AuthMethod::Local)
            .await
            .unwrap();

        codec.destroy(&established.token).await.unwrap();
        assert_eq!(codec.resolve(&established.token).await.unwrap(), None);

        // Destroying again, or destroying junk, is not an error.
        codec.destroy(&established.token).await.unwrap();
        codec.destroy("not-a-token").await.unwrap();
    }

    #[tokio::test]
    async fn test_token_is_not_derived_from_user_id() {
        let codec = codec();
        let user_id = UserId::new();
        let established = codec.establish(user_id, AuthMethod::Local).await.unwrap();
        assert!(!established.token.contains(&user_id.to_string()));
    }
}
