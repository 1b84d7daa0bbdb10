//! Web Server Entry Point
//!
//! Application entry point and server initialization. All configuration
//! is read from the environment here, once, and handed to the gateway as
//! explicit values; nothing downstream touches the environment.
//! Uses `anyhow` for startup errors only.

use std::env;
use std::net::SocketAddr;

use auth::domain::repository::SessionStore;
use auth::infra::oauth::{OAuthClientSettings, OAuthSettings};
use auth::{AuthConfig, OAuth2ProviderClient, PgStore, gateway_router};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let store = PgStore::new(pool.clone());

    // Startup cleanup: drop expired sessions
    // Errors here should not prevent server startup
    match store.cleanup_expired().await {
        Ok(deleted) => {
            tracing::info!(sessions_deleted = deleted, "Session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
        }
    }

    // Auth configuration
    let config = build_auth_config()?;

    // Identity providers
    let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let oauth = OAuthSettings {
        google: oauth_client_from_env("GOOGLE", &base_url, "google"),
        facebook: oauth_client_from_env("FACEBOOK", &base_url, "facebook"),
    };
    if oauth.google.is_none() {
        tracing::warn!("Google sign-in is not configured (GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET)");
    }
    if oauth.facebook.is_none() {
        tracing::warn!(
            "Facebook sign-in is not configured (FACEBOOK_CLIENT_ID/FACEBOOK_CLIENT_SECRET)"
        );
    }
    let providers = OAuth2ProviderClient::new(oauth)?;

    // Build router
    let app = gateway_router(store, providers, config)?.layer(TraceLayer::new_for_http());

    // Start server
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the auth configuration from the environment.
///
/// Development builds run with a random per-process secret and an
/// insecure cookie; production requires a persistent SESSION_SECRET so
/// sessions survive restarts.
fn build_auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        let secret_b64 =
            env::var("SESSION_SECRET").expect("SESSION_SECRET must be set in production");
        let secret_bytes = platform::crypto::from_base64(&secret_b64)?;
        anyhow::ensure!(
            secret_bytes.len() == 32,
            "SESSION_SECRET must decode to exactly 32 bytes"
        );
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&secret_bytes);
        AuthConfig {
            session_secret: secret,
            ..AuthConfig::default()
        }
    };

    config.password_pepper = env::var("PASSWORD_PEPPER").ok().map(String::into_bytes);

    Ok(config)
}

/// Read one provider's OAuth client credentials from the environment.
///
/// Returns `None` when the provider is not configured; the gateway then
/// reports that provider as unavailable instead of failing at startup.
fn oauth_client_from_env(
    prefix: &str,
    base_url: &str,
    provider_path: &str,
) -> Option<OAuthClientSettings> {
    let client_id = env::var(format!("{prefix}_CLIENT_ID")).ok()?;
    let client_secret = env::var(format!("{prefix}_CLIENT_SECRET")).ok()?;

    Some(OAuthClientSettings {
        client_id,
        client_secret,
        redirect_url: format!("{base_url}/auth/{provider_path}/secrets"),
    })
}
