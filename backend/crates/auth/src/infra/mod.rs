//! Infrastructure Layer
//!
//! Store implementations and the identity-provider client.

pub mod memory;
pub mod oauth;
pub mod postgres;

pub use memory::MemoryStore;
pub use oauth::{OAuth2ProviderClient, OAuthClientSettings, OAuthSettings, ProviderClient};
pub use postgres::PgStore;
