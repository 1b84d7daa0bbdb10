//! Session Entity
//!
//! Server-side record binding an opaque token to a User id. The sole
//! identity payload is `user_id`; resolution always re-fetches the User,
//! so stale profile data in a session is structurally impossible.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;

/// Session entity
#[derive(Debug, Clone)]
pub struct Session {
    /// Session ID (UUID v4, independent of the user id)
    pub session_id: Uuid,
    /// Reference to User
    pub user_id: UserId,
    /// Expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session
    ///
    /// TTL is provided by the application layer (config), not hard-coded
    /// here.
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            expires_at_ms: (now + ttl).timestamp_millis(),
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_not_expired() {
        let session = Session::new(UserId::new(), Duration::hours(1));
        assert!(!session.is_expired());
    }

    #[test]
    fn test_past_ttl_is_expired() {
        let session = Session::new(UserId::new(), Duration::milliseconds(-1));
        assert!(session.is_expired());
    }

    #[test]
    fn test_session_id_is_random() {
        let user_id = UserId::new();
        let a = Session::new(user_id, Duration::hours(1));
        let b = Session::new(user_id, Duration::hours(1));
        assert_ne!(a.session_id, b.session_id);
    }
}
