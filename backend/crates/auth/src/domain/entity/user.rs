//! User Entity
//!
//! The unit of identity. A user always carries at least one way to
//! authenticate: a password hash (local account) or a provider identity
//! (federated account). Both may accumulate on the same record over time.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    provider::{Provider, ProviderIdentity},
    user_id::UserId,
    user_password::UserPassword,
    username::Username,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier; the only value placed into session state
    pub user_id: UserId,
    /// Unique handle; present for local accounts
    pub username: Option<Username>,
    /// Argon2id credential; present for local accounts
    pub password_hash: Option<UserPassword>,
    /// External identities, each globally unique
    pub provider_ids: Vec<ProviderIdentity>,
    /// Shared secret; absence means "has not shared one"
    pub secret: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a local account from a username and hashed password
    pub fn local(username: Username, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            username: Some(username),
            password_hash: Some(password_hash),
            provider_ids: Vec::new(),
            secret: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a federated account from a verified external identity
    ///
    /// No username, no password: the provider identity is the sole
    /// authentication method.
    pub fn federated(provider: Provider, subject: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            username: None,
            password_hash: None,
            provider_ids: vec![ProviderIdentity::new(provider, subject)],
            secret: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Subject id for a given provider, if linked
    pub fn provider_subject(&self, provider: Provider) -> Option<&str> {
        self.provider_ids
            .iter()
            .find(|identity| identity.provider == provider)
            .map(|identity| identity.subject.as_str())
    }

    /// True if a password credential exists
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// True once the user has shared a non-empty secret
    pub fn has_shared_secret(&self) -> bool {
        self.secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Store the user's shared secret
    pub fn set_secret(&mut self, text: String) {
        self.secret = Some(text);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn password() -> UserPassword {
        let raw = RawPassword::new("a sound passphrase".to_string()).unwrap();
        UserPassword::from_raw(&raw, None).unwrap()
    }

    #[test]
    fn test_local_user_has_password_method() {
        let user = User::local(Username::new("alice").unwrap(), password());
        assert!(user.has_password());
        assert!(user.provider_ids.is_empty());
        assert!(!user.has_shared_secret());
    }

    #[test]
    fn test_federated_user_has_identity_only() {
        let user = User::federated(Provider::Google, "g-subject-1");
        assert!(!user.has_password());
        assert!(user.username.is_none());
        assert_eq!(user.provider_subject(Provider::Google), Some("g-subject-1"));
        assert_eq!(user.provider_subject(Provider::Facebook), None);
    }

    #[test]
    fn test_set_secret() {
        let mut user = User::federated(Provider::Facebook, "fb-1");
        user.set_secret("I like trains".to_string());
        assert!(user.has_shared_secret());
        assert_eq!(user.secret.as_deref(), Some("I like trains"));
    }
}
