//! PostgreSQL Store Implementation
//!
//! Uniqueness lives in the schema: `users.username_canonical` and the
//! `(provider, subject)` primary key on `user_identities`. Find-or-create
//! leans on the latter so concurrent resolutions of the same identity
//! can never create two users.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{session::Session, user::User};
use crate::domain::repository::{SessionStore, UserStore};
use crate::domain::value_object::{
    provider::{Provider, ProviderIdentity},
    user_id::UserId,
    user_password::UserPassword,
    username::Username,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed user and session store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load provider identities for a batch of users
    async fn load_identities(
        &self,
        user_ids: &[Uuid],
    ) -> AuthResult<HashMap<Uuid, Vec<ProviderIdentity>>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT provider, subject, user_id
            FROM user_identities
            WHERE user_id = ANY($1)
            ORDER BY provider, subject
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<Uuid, Vec<ProviderIdentity>> = HashMap::new();
        for row in rows {
            let identity = row.clone().into_identity()?;
            map.entry(row.user_id).or_default().push(identity);
        }
        Ok(map)
    }

    async fn load_user(&self, row: UserRow) -> AuthResult<User> {
        let identities = self.load_identities(&[row.user_id]).await?;
        let provider_ids = identities.into_values().next().unwrap_or_default();
        row.into_user(provider_ids)
    }

    /// Find the user owning a given external identity
    async fn find_by_identity(
        &self,
        provider: Provider,
        subject: &str,
    ) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.user_id, u.username, u.password_hash, u.secret,
                   u.created_at, u.updated_at
            FROM users u
            JOIN user_identities i ON i.user_id = u.user_id
            WHERE i.provider = $1 AND i.subject = $2
            "#,
        )
        .bind(provider.as_str())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    /// Insert a fresh federated user; `Ok(None)` when a concurrent caller
    /// claimed the identity first
    async fn try_create_federated(
        &self,
        provider: Provider,
        subject: &str,
    ) -> AuthResult<Option<User>> {
        let user = User::federated(provider, subject);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, username_canonical,
                               password_hash, secret, created_at, updated_at)
            VALUES ($1, NULL, NULL, NULL, NULL, $2, $3)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO user_identities (provider, subject, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (provider, subject) DO NOTHING
            "#,
        )
        .bind(provider.as_str())
        .bind(subject)
        .bind(user.user_id.as_uuid())
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            // Lost the race; the blocking insert has committed by now
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(user))
    }
}

/// Translate unique violations into store vocabulary
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return AuthError::DuplicateKey {
                constraint: db_err.constraint().unwrap_or("unknown").to_string(),
            };
        }
    }
    AuthError::Database(err)
}

// ============================================================================
// User Store Implementation
// ============================================================================

impl UserStore for PgStore {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, username_canonical,
                               password_hash, secret, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.username.as_ref().map(|n| n.original()))
        .bind(user.username.as_ref().map(|n| n.canonical()))
        .bind(user.password_hash.as_ref().map(|h| h.as_str()))
        .bind(&user.secret)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        for identity in &user.provider_ids {
            sqlx::query(
                r#"
                INSERT INTO user_identities (provider, subject, user_id, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(identity.provider.as_str())
            .bind(&identity.subject)
            .bind(user.user_id.as_uuid())
            .bind(user.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_unique_violation)?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, password_hash, secret, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, password_hash, secret, created_at, updated_at
            FROM users
            WHERE username_canonical = $1
            "#,
        )
        .bind(username.canonical())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_or_create_by_provider(
        &self,
        provider: Provider,
        subject: &str,
    ) -> AuthResult<User> {
        // Create-then-retry-on-conflict; a plain read-then-write would
        // race-create duplicate users
        for _ in 0..2 {
            if let Some(user) = self.find_by_identity(provider, subject).await? {
                return Ok(user);
            }

            if let Some(user) = self.try_create_federated(provider, subject).await? {
                tracing::info!(
                    user_id = %user.user_id,
                    provider = %provider,
                    "Created user for new federated identity"
                );
                return Ok(user);
            }
        }

        Err(AuthError::Internal(
            "find_or_create_by_provider did not converge".to_string(),
        ))
    }

    async fn set_secret(&self, user_id: &UserId, secret: &str) -> AuthResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET secret = $2, updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(secret)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn users_with_secret(&self) -> AuthResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, password_hash, secret, created_at, updated_at
            FROM users
            WHERE secret IS NOT NULL AND secret <> ''
            ORDER BY created_at, user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
        let mut identities = self.load_identities(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let provider_ids = identities.remove(&row.user_id).unwrap_or_default();
                row.into_user(provider_ids)
            })
            .collect()
    }
}

// ============================================================================
// Session Store Implementation
// ============================================================================

impl SessionStore for PgStore {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, expires_at_ms, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(session.expires_at_ms)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, user_id, expires_at_ms, created_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    username: Option<String>,
    password_hash: Option<String>,
    secret: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, provider_ids: Vec<ProviderIdentity>) -> AuthResult<User> {
        let password_hash = self
            .password_hash
            .map(UserPassword::from_phc)
            .transpose()?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            username: self.username.as_deref().map(Username::from_db),
            password_hash,
            provider_ids,
            secret: self.secret,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone, sqlx::FromRow)]
struct IdentityRow {
    provider: String,
    subject: String,
    user_id: Uuid,
}

impl IdentityRow {
    fn into_identity(self) -> AuthResult<ProviderIdentity> {
        let provider: Provider = self
            .provider
            .parse()
            .map_err(|e: crate::domain::value_object::provider::UnknownProvider| {
                AuthError::Internal(e.to_string())
            })?;
        Ok(ProviderIdentity::new(provider, self.subject))
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: Uuid,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        }
    }
}
