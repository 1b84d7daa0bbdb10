//! Gateway Router

use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use crate::application::config::AuthConfig;
use crate::domain::repository::{SessionStore, UserStore};
use crate::domain::value_object::user_password::UserPassword;
use crate::error::AuthResult;
use crate::infra::oauth::ProviderClient;
use crate::presentation::handlers::{self, GatewayState};

/// Build the gateway router over any store and provider client.
///
/// Hashes the login decoy credential once up front, so the only failure
/// mode is at startup.
pub fn gateway_router<R, P>(store: R, providers: P, config: AuthConfig) -> AuthResult<Router>
where
    R: UserStore + SessionStore + Clone + Send + Sync + 'static,
    P: ProviderClient + Clone + Send + Sync + 'static,
{
    let decoy = UserPassword::decoy(config.pepper())?;

    let state = GatewayState {
        store: Arc::new(store),
        providers: Arc::new(providers),
        config: Arc::new(config),
        decoy: Arc::new(decoy),
    };

    Ok(Router::new()
        .route("/", get(handlers::home))
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register::<R, P>),
        )
        .route(
            "/login",
            get(handlers::login_form::<R, P>).post(handlers::login::<R, P>),
        )
        .route("/logout", get(handlers::logout::<R, P>))
        .route("/auth/{provider}", get(handlers::oauth_start::<R, P>))
        .route(
            "/auth/{provider}/secrets",
            get(handlers::oauth_callback::<R, P>),
        )
        .route("/secrets", get(handlers::secrets::<R, P>))
        .route(
            "/submit",
            get(handlers::submit_form::<R, P>).post(handlers::submit_secret::<R, P>),
        )
        .route("/error", get(handlers::error_page))
        .with_state(state))
}
