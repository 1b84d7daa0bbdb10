//! Request DTOs
//!
//! Form bodies and query strings as the browser sends them.

use serde::Deserialize;

/// POST /register form body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

/// POST /login form body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /submit form body
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitSecretForm {
    pub secret: String,
}

/// Query parameters on the provider callback
///
/// Providers send either `code` + `state` or an `error` such as
/// `access_denied`; everything is optional so a mangled callback still
/// deserializes and can be turned into a redirect.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
