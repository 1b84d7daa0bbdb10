//! Identity Provider Value Objects
//!
//! The closed set of third-party identity providers and the
//! `(provider, subject)` pair that names one external identity.

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Supported identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[display("google")]
    Google,
    #[display("facebook")]
    Facebook,
}

impl Provider {
    /// Stable identifier used in routes and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }

    /// All supported providers.
    pub const ALL: &'static [Provider] = &[Provider::Google, Provider::Facebook];
}

/// Error returned for an unrecognized provider name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown identity provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Provider::Google),
            "facebook" => Ok(Provider::Facebook),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// One external identity: a provider plus its stable subject id.
///
/// Globally unique across all users; the store enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderIdentity {
    pub provider: Provider,
    pub subject: String,
}

impl ProviderIdentity {
    pub fn new(provider: Provider, subject: impl Into<String>) -> Self {
        Self {
            provider,
            subject: subject.into(),
        }
    }
}
