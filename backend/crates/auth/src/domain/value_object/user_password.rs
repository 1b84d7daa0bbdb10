//! User Password Value Object
//!
//! Domain wrapper for password credential material. Delegates the
//! cryptography to `platform::password` (Argon2id, zeroization, NFKC).

use std::fmt;

use platform::crypto::random_bytes;
use platform::password::{ClearTextPassword, HashedPassword};

use crate::error::{AuthError, AuthResult};

/// Raw password from user input
///
/// Wrapper around `ClearTextPassword`; memory is zeroized on drop.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Create a new raw password with policy validation
    ///
    /// NIST SP 800-63B rules: 8 to 128 code points, no control characters,
    /// NFKC normalized.
    pub fn new(raw: String) -> AuthResult<Self> {
        let clear_text =
            ClearTextPassword::new(raw).map_err(|e| AuthError::InvalidInput(e.to_string()))?;
        Ok(Self(clear_text))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Hashed password credential, safe to store
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a raw password for storage
    ///
    /// Argon2id is deliberately expensive; run on a blocking worker from
    /// async context.
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        let hashed = raw
            .inner()
            .hash(pepper)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(Self(hashed))
    }

    /// Restore from a stored PHC string
    pub fn from_phc(s: impl Into<String>) -> AuthResult<Self> {
        HashedPassword::from_phc_string(s)
            .map(Self)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// PHC string for storage
    pub fn as_str(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Verify a raw password against this hash
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }

    /// Build a decoy credential from random material
    ///
    /// Login verifies unknown usernames against this hash so the failure
    /// path costs the same as a real wrong-password check.
    pub fn decoy(pepper: Option<&[u8]>) -> AuthResult<Self> {
        let filler = platform::crypto::to_base64(&random_bytes(24));
        let clear = ClearTextPassword::new(filler)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let hashed = clear
            .hash(pepper)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(Self(hashed))
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserPassword").field(&"[HASH]").finish()
    }
}
