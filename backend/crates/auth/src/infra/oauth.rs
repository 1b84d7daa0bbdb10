//! OAuth2 Provider Client
//!
//! The wire-protocol collaborator for federated sign-in. Runs the
//! authorization-code flow (CSRF state + PKCE) against Google or Facebook
//! and reduces the outcome to a [`VerifiedIdentity`]: the provider plus
//! its stable subject id. Identity mapping happens elsewhere
//! (`application::federated`); this module never touches the stores.

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::{Deserialize, Serialize};

use crate::application::federated::VerifiedIdentity;
use crate::domain::value_object::provider::Provider;
use crate::error::{AuthError, AuthResult};

/// Per-provider client credentials, from configuration.
#[derive(Debug, Clone)]
pub struct OAuthClientSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with the provider
    pub redirect_url: String,
}

/// Credentials for every configured provider. A provider left `None`
/// reports itself as unavailable instead of failing at startup.
#[derive(Debug, Clone, Default)]
pub struct OAuthSettings {
    pub google: Option<OAuthClientSettings>,
    pub facebook: Option<OAuthClientSettings>,
}

/// Protocol endpoints and profile shape for one provider.
struct Endpoints {
    auth_url: &'static str,
    token_url: &'static str,
    userinfo_url: &'static str,
    scopes: &'static [&'static str],
    /// JSON field in the userinfo document holding the subject id
    subject_field: &'static str,
}

const fn endpoints(provider: Provider) -> Endpoints {
    match provider {
        Provider::Google => Endpoints {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo",
            scopes: &["profile"],
            subject_field: "sub",
        },
        Provider::Facebook => Endpoints {
            auth_url: "https://www.facebook.com/v19.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v19.0/oauth/access_token",
            userinfo_url: "https://graph.facebook.com/me?fields=id,name",
            scopes: &["public_profile"],
            subject_field: "id",
        },
    }
}

/// Everything the transport layer needs to start a consent flow.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Provider consent URL to redirect the visitor to
    pub url: String,
    /// Flow state to round-trip through a short-lived cookie
    pub state: OAuthFlowState,
}

/// CSRF token and PKCE verifier held between start and callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthFlowState {
    pub csrf_token: String,
    pub pkce_verifier: String,
}

/// Identity-provider client trait; faked in tests.
#[trait_variant::make(ProviderClient: Send)]
pub trait LocalProviderClient {
    /// Build the consent URL and the state to remember for the callback.
    fn authorization_request(&self, provider: Provider) -> AuthResult<AuthorizationRequest>;

    /// Exchange the callback code for a verified subject id.
    async fn exchange_code(
        &self,
        provider: Provider,
        code: &str,
        state: &OAuthFlowState,
    ) -> AuthResult<VerifiedIdentity>;
}

/// `oauth2`-crate-backed provider client
#[derive(Clone)]
pub struct OAuth2ProviderClient {
    settings: OAuthSettings,
    http: reqwest::Client,
}

impl OAuth2ProviderClient {
    pub fn new(settings: OAuthSettings) -> AuthResult<Self> {
        // Redirects must stay disabled for the token endpoint (SSRF)
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { settings, http })
    }

    fn settings_for(&self, provider: Provider) -> AuthResult<&OAuthClientSettings> {
        let settings = match provider {
            Provider::Google => self.settings.google.as_ref(),
            Provider::Facebook => self.settings.facebook.as_ref(),
        };

        settings.ok_or_else(|| {
            AuthError::Unavailable(format!("{provider} sign-in is not configured"))
        })
    }

    fn redirect_url(&self, provider: Provider) -> AuthResult<RedirectUrl> {
        let settings = self.settings_for(provider)?;
        RedirectUrl::new(settings.redirect_url.clone())
            .map_err(|e| AuthError::Internal(format!("Invalid redirect URL: {e}")))
    }

    async fn fetch_subject(&self, endpoints: &Endpoints, access_token: &str) -> AuthResult<String> {
        let profile: serde_json::Value = self
            .http
            .get(endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderExchange(format!("Profile fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AuthError::ProviderExchange(format!("Profile fetch rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::ProviderExchange(format!("Profile response invalid: {e}")))?;

        profile
            .get(endpoints.subject_field)
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                AuthError::ProviderExchange(format!(
                    "Profile response missing '{}' field",
                    endpoints.subject_field
                ))
            })
    }
}

impl ProviderClient for OAuth2ProviderClient {
    fn authorization_request(&self, provider: Provider) -> AuthResult<AuthorizationRequest> {
        let settings = self.settings_for(provider)?;
        let endpoints = endpoints(provider);

        let client = BasicClient::new(ClientId::new(settings.client_id.clone()))
            .set_client_secret(ClientSecret::new(settings.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(endpoints.auth_url.to_string())
                    .expect("provider authorization endpoint is a valid URL"),
            )
            .set_redirect_uri(self.redirect_url(provider)?);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);

        for scope in endpoints.scopes {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }

        let (url, csrf_token) = request.url();

        Ok(AuthorizationRequest {
            url: url.to_string(),
            state: OAuthFlowState {
                csrf_token: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
            },
        })
    }

    async fn exchange_code(
        &self,
        provider: Provider,
        code: &str,
        state: &OAuthFlowState,
    ) -> AuthResult<VerifiedIdentity> {
        let settings = self.settings_for(provider)?;
        let endpoints = endpoints(provider);

        let client = BasicClient::new(ClientId::new(settings.client_id.clone()))
            .set_client_secret(ClientSecret::new(settings.client_secret.clone()))
            .set_token_uri(
                TokenUrl::new(endpoints.token_url.to_string())
                    .expect("provider token endpoint is a valid URL"),
            )
            .set_redirect_uri(self.redirect_url(provider)?);

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&self.http)
            .await
            .map_err(|e| AuthError::ProviderExchange(format!("Token exchange failed: {e}")))?;

        let subject = self
            .fetch_subject(&endpoints, token.access_token().secret())
            .await?;

        Ok(VerifiedIdentity { provider, subject })
    }
}
