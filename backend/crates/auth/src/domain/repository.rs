//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer. These are the only suspension points in the core.

use uuid::Uuid;

use crate::domain::entity::{session::Session, user::User};
use crate::domain::value_object::{provider::Provider, user_id::UserId, username::Username};
use crate::error::AuthResult;

/// User / credential store trait
#[trait_variant::make(UserStore: Send)]
pub trait LocalUserStore {
    /// Create a new user record
    ///
    /// Fails with `AuthError::DuplicateKey` when the username or one of
    /// the provider identities already exists.
    async fn create_user(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by username (canonical form)
    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<User>>;

    /// Atomic find-or-create for a verified external identity
    ///
    /// Concurrent calls with the same `(provider, subject)` must resolve
    /// to exactly one user record.
    async fn find_or_create_by_provider(
        &self,
        provider: Provider,
        subject: &str,
    ) -> AuthResult<User>;

    /// Store the user's shared secret; `AuthError::UserNotFound` if the
    /// record vanished
    async fn set_secret(&self, user_id: &UserId, secret: &str) -> AuthResult<()>;

    /// All users whose secret is present and non-empty, in stable order
    async fn users_with_secret(&self) -> AuthResult<Vec<User>>;
}

/// Session store trait
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Persist a new session
    async fn create_session(&self, session: &Session) -> AuthResult<()>;

    /// Find a session by its id; expired rows may still be returned and
    /// are filtered by the caller
    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<Session>>;

    /// Delete a session; idempotent
    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()>;

    /// Remove expired sessions, returning how many were deleted
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
