//! In-Memory Store Implementation
//!
//! Mutex-guarded maps behind the same store contracts as PostgreSQL.
//! Used for local development and by the test suite; find-or-create is
//! atomic because every operation holds the single lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::entity::{session::Session, user::User};
use crate::domain::repository::{SessionStore, UserStore};
use crate::domain::value_object::{provider::Provider, user_id::UserId, username::Username};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
}

/// In-memory user and session store
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AuthResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AuthError::Internal("Store mutex poisoned".to_string()))
    }
}

impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        let mut inner = self.lock()?;

        if let Some(username) = &user.username {
            let taken = inner.users.values().any(|existing| {
                existing
                    .username
                    .as_ref()
                    .is_some_and(|n| n.canonical() == username.canonical())
            });
            if taken {
                return Err(AuthError::DuplicateKey {
                    constraint: "users_username_canonical_key".to_string(),
                });
            }
        }

        for identity in &user.provider_ids {
            let taken = inner
                .users
                .values()
                .any(|existing| existing.provider_ids.contains(identity));
            if taken {
                return Err(AuthError::DuplicateKey {
                    constraint: "user_identities_pkey".to_string(),
                });
            }
        }

        inner.users.insert(user.user_id.into_uuid(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let inner = self.lock()?;
        Ok(inner.users.get(user_id.as_uuid()).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<User>> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .values()
            .find(|user| {
                user.username
                    .as_ref()
                    .is_some_and(|n| n.canonical() == username.canonical())
            })
            .cloned())
    }

    async fn find_or_create_by_provider(
        &self,
        provider: Provider,
        subject: &str,
    ) -> AuthResult<User> {
        // One lock covers lookup and insert, so identical concurrent
        // calls cannot both create
        let mut inner = self.lock()?;

        let existing = inner
            .users
            .values()
            .find(|user| user.provider_subject(provider) == Some(subject))
            .cloned();
        if let Some(user) = existing {
            return Ok(user);
        }

        let user = User::federated(provider, subject);
        inner.users.insert(user.user_id.into_uuid(), user.clone());
        Ok(user)
    }

    async fn set_secret(&self, user_id: &UserId, secret: &str) -> AuthResult<()> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .get_mut(user_id.as_uuid())
            .ok_or(AuthError::UserNotFound)?;
        user.set_secret(secret.to_string());
        Ok(())
    }

    async fn users_with_secret(&self) -> AuthResult<Vec<User>> {
        let inner = self.lock()?;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|user| user.has_shared_secret())
            .cloned()
            .collect();
        // Stable order to match the SQL implementation
        users.sort_by_key(|user| (user.created_at, user.user_id.into_uuid()));
        Ok(users)
    }
}

impl SessionStore for MemoryStore {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        let mut inner = self.lock()?;
        inner.sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<Session>> {
        let inner = self.lock()?;
        Ok(inner.sessions.get(&session_id).cloned())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        let mut inner = self.lock()?;
        inner.sessions.remove(&session_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let mut inner = self.lock()?;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, session| !session.is_expired());
        Ok((before - inner.sessions.len()) as u64)
    }
}
