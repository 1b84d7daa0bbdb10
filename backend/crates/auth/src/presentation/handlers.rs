//! HTTP Handlers
//!
//! Thin orchestration over the use cases in `application`. Every failure
//! resolves to a redirect: back to the originating form for user error,
//! to /error when a dependency is down. Raw errors never reach the
//! browser.

use std::sync::Arc;

use axum::Form;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};

use platform::cookie::{CookieConfig, extract_cookie};
use platform::crypto::{constant_time_eq, from_base64, to_base64};

use crate::application::config::AuthConfig;
use crate::application::{
    AuthGate, ListSecretsUseCase, LoginInput, LoginUseCase, RegisterInput, RegisterUseCase,
    ResolveIdentityUseCase, SessionCodec, SubmitSecretUseCase,
};
use crate::domain::repository::{SessionStore, UserStore};
use crate::domain::value_object::{provider::Provider, user_password::UserPassword};
use crate::error::AuthError;
use crate::infra::oauth::{OAuthFlowState, ProviderClient};
use crate::presentation::dto::{LoginForm, OAuthCallbackQuery, RegisterForm, SubmitSecretForm};
use crate::presentation::views;

/// Cookie that carries the OAuth flow state between start and callback
const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// OAuth state cookie lifetime in seconds
const OAUTH_STATE_TTL_SECS: i64 = 600;

/// Shared state for gateway handlers
#[derive(Clone)]
pub struct GatewayState<R, P>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    pub store: Arc<R>,
    pub providers: Arc<P>,
    pub config: Arc<AuthConfig>,
    /// Decoy credential for uniform login failure, hashed once at startup
    pub decoy: Arc<UserPassword>,
}

// ============================================================================
// Public pages
// ============================================================================

/// GET /
pub async fn home() -> Html<String> {
    Html(views::home())
}

/// GET /error
pub async fn error_page() -> Html<String> {
    Html(views::error_page())
}

/// GET /register
pub async fn register_form() -> Html<String> {
    Html(views::register_form())
}

/// GET /login
pub async fn login_form<R, P>(State(state): State<GatewayState<R, P>>, headers: HeaderMap) -> Response
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    let gate = AuthGate::new(state.store.clone(), state.config.clone());

    match gate.authenticate(&headers).await {
        Ok(auth) if auth.is_authenticated() => Redirect::to("/secrets").into_response(),
        Ok(_) => Html(views::login_form()).into_response(),
        Err(e) => {
            // Rendering the form is always safe; don't block login on a
            // hiccup resolving the old session
            tracing::warn!(error = %e, "Session check failed on login page");
            Html(views::login_form()).into_response()
        }
    }
}

/// GET /secrets - public wall
pub async fn secrets<R, P>(State(state): State<GatewayState<R, P>>) -> Response
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    let use_case = ListSecretsUseCase::new(state.store.clone(), state.config.clone());

    match use_case.execute().await {
        Ok(users) => Html(views::secrets_wall(&users)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list secrets");
            Redirect::to("/error").into_response()
        }
    }
}

// ============================================================================
// Local authentication
// ============================================================================

/// POST /register
pub async fn register<R, P>(
    State(state): State<GatewayState<R, P>>,
    Form(form): Form<RegisterForm>,
) -> Response
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.store.clone(), state.config.clone());

    let input = RegisterInput {
        username: form.username,
        password: form.password,
    };

    match use_case.execute(input).await {
        Ok(established) => signed_in_response(&state.config, &established.token),
        Err(AuthError::UsernameTaken) => Redirect::to("/login").into_response(),
        Err(AuthError::InvalidInput(_)) => Redirect::to("/register").into_response(),
        Err(e) => failure_redirect(e, "/register"),
    }
}

/// POST /login
pub async fn login<R, P>(
    State(state): State<GatewayState<R, P>>,
    Form(form): Form<LoginForm>,
) -> Response
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.store.clone(), state.config.clone(), state.decoy.clone());

    let input = LoginInput {
        username: form.username,
        password: form.password,
    };

    match use_case.execute(input).await {
        Ok(established) => signed_in_response(&state.config, &established.token),
        Err(AuthError::InvalidCredentials) => Redirect::to("/login").into_response(),
        Err(e) => failure_redirect(e, "/login"),
    }
}

/// GET /logout
pub async fn logout<R, P>(State(state): State<GatewayState<R, P>>, headers: HeaderMap) -> Response
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    if let Some(token) = extract_cookie(&headers, &state.config.session_cookie_name) {
        let codec = SessionCodec::new(state.store.clone(), state.config.clone());
        // Clear the cookie even if the store call fails
        if let Err(e) = codec.destroy(&token).await {
            tracing::warn!(error = %e, "Failed to destroy session on logout");
        }
    }

    let cookie = session_cookie(&state.config).build_delete_cookie();
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to("/"),
    )
        .into_response()
}

// ============================================================================
// Federated authentication
// ============================================================================

/// GET /auth/{provider} - redirect to the provider's consent flow
pub async fn oauth_start<R, P>(
    State(state): State<GatewayState<R, P>>,
    Path(provider): Path<String>,
) -> Response
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    let Ok(provider) = provider.parse::<Provider>() else {
        return Redirect::to("/login").into_response();
    };

    let request = match state.providers.authorization_request(provider) {
        Ok(request) => request,
        Err(e) => return failure_redirect(e, "/login"),
    };

    let flow_state = match serde_json::to_vec(&request.state) {
        Ok(bytes) => to_base64(&bytes),
        Err(e) => return failure_redirect(AuthError::Internal(e.to_string()), "/login"),
    };

    let cookie = state_cookie(&state.config).build_set_cookie(&flow_state);
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to(&request.url),
    )
        .into_response()
}

/// GET /auth/{provider}/secrets - provider callback
pub async fn oauth_callback<R, P>(
    State(state): State<GatewayState<R, P>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Query(query): Query<OAuthCallbackQuery>,
) -> Response
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    let Ok(provider) = provider.parse::<Provider>() else {
        return Redirect::to("/login").into_response();
    };

    let clear_state = state_cookie(&state.config).build_delete_cookie();

    // Flow state must have been planted by /auth/{provider}
    let flow_state = extract_cookie(&headers, OAUTH_STATE_COOKIE)
        .and_then(|value| from_base64(&value).ok())
        .and_then(|bytes| serde_json::from_slice::<OAuthFlowState>(&bytes).ok());

    let Some(flow_state) = flow_state else {
        tracing::warn!(provider = %provider, "Callback without flow state");
        return login_redirect_clearing_state(clear_state);
    };

    if let Some(error) = &query.error {
        tracing::info!(provider = %provider, error = %error, "Provider declined the sign-in");
        return login_redirect_clearing_state(clear_state);
    }

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return login_redirect_clearing_state(clear_state);
    };

    if !constant_time_eq(returned_state.as_bytes(), flow_state.csrf_token.as_bytes()) {
        tracing::warn!(provider = %provider, "CSRF state mismatch on callback");
        return login_redirect_clearing_state(clear_state);
    }

    let identity = match state
        .providers
        .exchange_code(provider, &code, &flow_state)
        .await
    {
        Ok(identity) => identity,
        Err(e @ AuthError::Unavailable(_)) => return failure_redirect(e, "/login"),
        Err(e) => {
            tracing::warn!(provider = %provider, error = %e, "Code exchange failed");
            return login_redirect_clearing_state(clear_state);
        }
    };

    let use_case = ResolveIdentityUseCase::new(state.store.clone(), state.config.clone());

    match use_case.execute(identity).await {
        Ok(established) => {
            let session = session_cookie(&state.config).build_set_cookie(&established.token);
            (
                AppendHeaders([
                    (header::SET_COOKIE, session),
                    (header::SET_COOKIE, clear_state),
                ]),
                Redirect::to("/secrets"),
            )
                .into_response()
        }
        Err(e) => failure_redirect(e, "/login"),
    }
}

// ============================================================================
// Protected pages
// ============================================================================

/// GET /submit
pub async fn submit_form<R, P>(
    State(state): State<GatewayState<R, P>>,
    headers: HeaderMap,
) -> Response
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    let gate = AuthGate::new(state.store.clone(), state.config.clone());

    match gate.authenticate(&headers).await {
        Ok(auth) => match auth.require_authenticated() {
            Ok(_) => Html(views::submit_form()).into_response(),
            Err(_) => Redirect::to("/login").into_response(),
        },
        Err(e) => failure_redirect(e, "/login"),
    }
}

/// POST /submit
pub async fn submit_secret<R, P>(
    State(state): State<GatewayState<R, P>>,
    headers: HeaderMap,
    Form(form): Form<SubmitSecretForm>,
) -> Response
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    let gate = AuthGate::new(state.store.clone(), state.config.clone());

    let user_id = match gate.authenticate(&headers).await {
        Ok(auth) => match auth.require_authenticated() {
            Ok(user) => user.user_id,
            Err(_) => return Redirect::to("/login").into_response(),
        },
        Err(e) => return failure_redirect(e, "/login"),
    };

    let use_case = SubmitSecretUseCase::new(state.store.clone(), state.config.clone());

    match use_case.execute(&user_id, &form.secret).await {
        Ok(()) => Redirect::to("/secrets").into_response(),
        Err(AuthError::InvalidInput(_)) => Redirect::to("/submit").into_response(),
        // The user vanished mid-session; start over
        Err(AuthError::UserNotFound) => Redirect::to("/login").into_response(),
        Err(e) => failure_redirect(e, "/submit"),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn session_cookie(config: &AuthConfig) -> CookieConfig {
    CookieConfig {
        name: config.session_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(config.session_ttl_secs()),
    }
}

fn state_cookie(config: &AuthConfig) -> CookieConfig {
    CookieConfig {
        name: OAUTH_STATE_COOKIE.to_string(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(OAUTH_STATE_TTL_SECS),
    }
}

/// Successful authentication: attach the session cookie and land on the wall
fn signed_in_response(config: &AuthConfig, token: &str) -> Response {
    let cookie = session_cookie(config).build_set_cookie(token);
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to("/secrets"),
    )
        .into_response()
}

fn login_redirect_clearing_state(clear_state: String) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, clear_state)]),
        Redirect::to("/login"),
    )
        .into_response()
}

/// Route a failure to the right place: infrastructure trouble goes to the
/// generic error page, everything else back to the originating form
fn failure_redirect(err: AuthError, fallback: &str) -> Response {
    match &err {
        AuthError::Unavailable(_) | AuthError::Database(_) | AuthError::Internal(_) => {
            tracing::error!(error = %err, "Request failed on a dependency");
            Redirect::to("/error").into_response()
        }
        _ => {
            tracing::debug!(error = %err, "Request failed");
            Redirect::to(fallback).into_response()
        }
    }
}
