//! Username Value Object
//!
//! A username is the public handle used for local login and display.
//!
//! ## Invariants
//! - 3 to 30 characters after normalization
//! - ASCII lowercase letters, digits, `_`, `.`, `-` only (canonical form)
//! - starts and ends with a letter, digit, or `_`
//! - NFKC normalization -> trim -> validation; canonical form is lowercase
//!
//! The original casing is preserved for display; uniqueness checks always
//! use the canonical form.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Minimum length for a username (in characters)
pub const USERNAME_MIN_LENGTH: usize = 3;

/// Maximum length for a username (in characters)
pub const USERNAME_MAX_LENGTH: usize = 30;

/// Error returned when username validation fails
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error("Username cannot be empty")]
    Empty,

    #[error("Username is too short ({length} chars, minimum {min})")]
    TooShort { length: usize, min: usize },

    #[error("Username is too long ({length} chars, maximum {max})")]
    TooLong { length: usize, max: usize },

    #[error("Invalid character '{char}' in username. Only a-z, 0-9, _, ., - are allowed")]
    InvalidCharacter { char: char },

    #[error("Username must start and end with a letter, digit, or _")]
    InvalidEdge,
}

/// Validated, normalized username
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username {
    /// Original user input (trimmed, NFKC normalized, preserves case)
    original: String,
    /// Canonical lowercase form for uniqueness
    canonical: String,
}

impl Username {
    /// Create a new Username from raw input.
    pub fn new(input: impl AsRef<str>) -> Result<Self, UsernameError> {
        let original: String = input.as_ref().nfkc().collect::<String>().trim().to_string();
        let canonical = original.to_lowercase();
        Self::validate(&canonical)?;
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Original username (preserves case)
    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Canonical (lowercase) username
    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Restore from stored values (already validated at creation time)
    pub fn from_db(original: &str) -> Self {
        Self {
            original: original.to_string(),
            canonical: original.to_lowercase(),
        }
    }

    fn validate(canonical: &str) -> Result<(), UsernameError> {
        if canonical.is_empty() {
            return Err(UsernameError::Empty);
        }

        let length = canonical.chars().count();
        if length < USERNAME_MIN_LENGTH {
            return Err(UsernameError::TooShort {
                length,
                min: USERNAME_MIN_LENGTH,
            });
        }
        if length > USERNAME_MAX_LENGTH {
            return Err(UsernameError::TooLong {
                length,
                max: USERNAME_MAX_LENGTH,
            });
        }

        for ch in canonical.chars() {
            if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '.' | '-')) {
                return Err(UsernameError::InvalidCharacter { char: ch });
            }
        }

        let first = canonical.chars().next().unwrap();
        let last = canonical.chars().next_back().unwrap();
        let edge_ok =
            |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_';
        if !edge_ok(first) || !edge_ok(last) {
            return Err(UsernameError::InvalidEdge);
        }

        Ok(())
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Username")
            .field("canonical", &self.canonical)
            .finish()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.canonical
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.original
    }
}
