//! Auth (Authentication Gateway) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations, OAuth2 provider client
//! - `presentation/` - HTTP handlers, DTOs, views, router
//!
//! ## Features
//! - Local registration and login with username + password
//! - Federated sign-in via Google and Facebook (OAuth2 authorization code)
//! - Server-side sessions with cookie-based tokens
//! - Public "secrets" wall; secret submission gated behind a session
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Session tokens are HMAC-signed random ids, never derived from user data
//! - Login failures are indistinguishable between unknown-username and
//!   wrong-password (uniform error and latency shape)

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::memory::MemoryStore;
pub use infra::oauth::{OAuth2ProviderClient, OAuthSettings};
pub use infra::postgres::PgStore;
pub use presentation::router::gateway_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::memory::MemoryStore;
    pub use crate::infra::postgres::PgStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

#[cfg(test)]
mod tests;
