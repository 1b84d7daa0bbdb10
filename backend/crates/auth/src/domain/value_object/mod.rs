//! Value Objects

pub mod auth_method;
pub mod provider;
pub mod user_id;
pub mod user_password;
pub mod username;

pub use auth_method::AuthMethod;
pub use provider::{Provider, ProviderIdentity};
pub use user_id::UserId;
pub use user_password::{RawPassword, UserPassword};
pub use username::Username;
