//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod federated;
pub mod gate;
pub mod login;
pub mod register;
pub mod secrets;
pub mod session;

// Re-exports
pub use config::AuthConfig;
pub use federated::{ResolveIdentityUseCase, VerifiedIdentity};
pub use gate::{AuthGate, AuthState};
pub use login::{LoginInput, LoginUseCase};
pub use register::{RegisterInput, RegisterUseCase};
pub use secrets::{ListSecretsUseCase, SubmitSecretUseCase};
pub use session::{EstablishedSession, SessionCodec};

use std::future::Future;
use std::time::Duration;

use crate::error::{AuthError, AuthResult};

/// Run a store call under the configured deadline.
///
/// A timeout surfaces as `Unavailable`, never as a credential failure, so
/// callers do not mis-blame the user for infrastructure trouble.
pub(crate) async fn bounded<T>(
    limit: Duration,
    fut: impl Future<Output = AuthResult<T>>,
) -> AuthResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::Unavailable("store call timed out".to_string())),
    }
}
