//! Authentication Method
//!
//! Tagged variant identifying how a session was established. Consumed
//! uniformly by the session codec and logging; there is no per-method
//! dispatch beyond this tag.

use std::fmt;

use super::provider::Provider;

/// How an identity was proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Username + password against the local credential store
    Local,
    /// Verified external identity from a provider
    Provider(Provider),
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Local => f.write_str("local"),
            AuthMethod::Provider(provider) => f.write_str(provider.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AuthMethod::Local.to_string(), "local");
        assert_eq!(
            AuthMethod::Provider(Provider::Facebook).to_string(),
            "facebook"
        );
    }
}
