//! Use-case and scenario tests for the gateway core.
//!
//! Driven by the in-memory store and a canned provider client; the
//! router-level scenarios exercise the same code paths a browser would.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    AuthGate, AuthState, LoginInput, LoginUseCase, RegisterInput, RegisterUseCase,
    ResolveIdentityUseCase, SessionCodec, SubmitSecretUseCase, VerifiedIdentity,
};
use crate::domain::repository::UserStore;
use crate::domain::value_object::{
    auth_method::AuthMethod, provider::Provider, user_id::UserId, user_password::UserPassword,
    username::Username,
};
use crate::error::{AuthError, AuthResult};
use crate::infra::memory::MemoryStore;
use crate::infra::oauth::{AuthorizationRequest, OAuthFlowState, ProviderClient};

// ============================================================================
// Test fixtures
// ============================================================================

/// Provider client that skips the wire protocol and vouches for a fixed
/// subject. `code=denied` simulates a failed exchange.
#[derive(Clone)]
struct CannedProviderClient {
    subject: String,
}

impl CannedProviderClient {
    fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
        }
    }
}

impl ProviderClient for CannedProviderClient {
    fn authorization_request(&self, provider: Provider) -> AuthResult<AuthorizationRequest> {
        Ok(AuthorizationRequest {
            url: format!("https://consent.example/{provider}"),
            state: OAuthFlowState {
                csrf_token: "csrf-token".to_string(),
                pkce_verifier: "pkce-verifier".to_string(),
            },
        })
    }

    async fn exchange_code(
        &self,
        provider: Provider,
        code: &str,
        _state: &OAuthFlowState,
    ) -> AuthResult<VerifiedIdentity> {
        if code == "denied" {
            return Err(AuthError::ProviderExchange("exchange refused".to_string()));
        }
        Ok(VerifiedIdentity {
            provider,
            subject: self.subject.clone(),
        })
    }
}

fn config() -> Arc<AuthConfig> {
    Arc::new(AuthConfig::development())
}

fn decoy() -> Arc<UserPassword> {
    Arc::new(UserPassword::decoy(None).unwrap())
}

async fn register_alice(store: &Arc<MemoryStore>, config: &Arc<AuthConfig>) -> UserId {
    let use_case = RegisterUseCase::new(store.clone(), config.clone());
    use_case
        .execute(RegisterInput {
            username: "alice".to_string(),
            password: "wonderland pass".to_string(),
        })
        .await
        .unwrap()
        .user_id
}

// ============================================================================
// Password authenticator properties
// ============================================================================

mod password_auth {
    use super::*;

    #[tokio::test]
    async fn register_then_login_resolves_same_user() {
        let store = Arc::new(MemoryStore::new());
        let config = config();

        let user_id = register_alice(&store, &config).await;

        let login = LoginUseCase::new(store.clone(), config.clone(), decoy());
        let established = login
            .execute(LoginInput {
                username: "alice".to_string(),
                password: "wonderland pass".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(established.user_id, user_id);
        assert_eq!(established.method, AuthMethod::Local);

        let codec = SessionCodec::new(store, config);
        assert_eq!(
            codec.resolve(&established.token).await.unwrap(),
            Some(user_id)
        );
    }

    #[tokio::test]
    async fn register_establishes_session_immediately() {
        let store = Arc::new(MemoryStore::new());
        let config = config();

        let use_case = RegisterUseCase::new(store.clone(), config.clone());
        let established = use_case
            .execute(RegisterInput {
                username: "bob".to_string(),
                password: "some passphrase".to_string(),
            })
            .await
            .unwrap();

        // Auto-login: the token from register already resolves
        let gate = AuthGate::new(store, config);
        let state = gate.authenticate_token(&established.token).await.unwrap();
        assert!(state.is_authenticated());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_username_fail_alike() {
        let store = Arc::new(MemoryStore::new());
        let config = config();
        register_alice(&store, &config).await;

        let login = LoginUseCase::new(store.clone(), config.clone(), decoy());

        let wrong_password = login
            .execute(LoginInput {
                username: "alice".to_string(),
                password: "not her password".to_string(),
            })
            .await
            .unwrap_err();

        let unknown_user = login
            .execute(LoginInput {
                username: "mallory".to_string(),
                password: "whatever phrase".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        // Identical rendering too: nothing distinguishes the two cases
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn duplicate_username_fails_without_second_record() {
        let store = Arc::new(MemoryStore::new());
        let config = config();

        let first_id = register_alice(&store, &config).await;

        let use_case = RegisterUseCase::new(store.clone(), config.clone());
        // Same handle modulo case: still taken
        let err = use_case
            .execute(RegisterInput {
                username: "Alice".to_string(),
                password: "another passphrase".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::UsernameTaken));

        let existing = store
            .find_by_username(&Username::new("alice").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(existing.user_id, first_id);
    }
}

// ============================================================================
// Federated identity properties
// ============================================================================

mod federated {
    use super::*;

    #[tokio::test]
    async fn concurrent_find_or_create_yields_one_user() {
        let store = MemoryStore::new();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .find_or_create_by_provider(Provider::Google, "g-racy-subject")
                    .await
                    .map(|user| user.user_id)
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }

        let first = ids[0];
        assert!(ids.iter().all(|id| *id == first));
    }

    #[tokio::test]
    async fn new_identity_creates_provider_only_user() {
        let store = Arc::new(MemoryStore::new());
        let config = config();

        let resolve = ResolveIdentityUseCase::new(store.clone(), config.clone());
        let established = resolve
            .execute(VerifiedIdentity {
                provider: Provider::Google,
                subject: "g-fresh".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(established.method, AuthMethod::Provider(Provider::Google));

        let user = store
            .find_by_id(&established.user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(user.username.is_none());
        assert!(!user.has_password());
        assert_eq!(user.provider_subject(Provider::Google), Some("g-fresh"));

        // Resolving again signs in the same user, creates nothing
        let again = resolve
            .execute(VerifiedIdentity {
                provider: Provider::Google,
                subject: "g-fresh".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(again.user_id, established.user_id);
    }

    #[tokio::test]
    async fn same_subject_different_provider_is_a_different_user() {
        let store = Arc::new(MemoryStore::new());

        let google = store
            .find_or_create_by_provider(Provider::Google, "shared-subject")
            .await
            .unwrap();
        let facebook = store
            .find_or_create_by_provider(Provider::Facebook, "shared-subject")
            .await
            .unwrap();

        assert_ne!(google.user_id, facebook.user_id);
    }
}

// ============================================================================
// Gate and session properties
// ============================================================================

mod gate {
    use super::*;

    #[tokio::test]
    async fn destroyed_token_never_resolves_again() {
        let store = Arc::new(MemoryStore::new());
        let config = config();

        let codec = SessionCodec::new(store.clone(), config.clone());
        let user_id = register_alice(&store, &config).await;
        let established = codec.establish(user_id, AuthMethod::Local).await.unwrap();

        codec.destroy(&established.token).await.unwrap();

        let gate = AuthGate::new(store, config);
        let state = gate.authenticate_token(&established.token).await.unwrap();
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn garbage_token_is_anonymous_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        let gate = AuthGate::new(store, config());

        for token in ["", "garbage", "a.b", "🦀"] {
            let state = gate.authenticate_token(token).await.unwrap();
            assert!(matches!(state, AuthState::Anonymous));
        }
    }

    #[tokio::test]
    async fn session_for_vanished_user_degrades_to_anonymous() {
        let store = Arc::new(MemoryStore::new());
        let config = config();

        // A session whose user was never stored (or has been deleted)
        let codec = SessionCodec::new(store.clone(), config.clone());
        let established = codec
            .establish(UserId::new(), AuthMethod::Local)
            .await
            .unwrap();

        let gate = AuthGate::new(store, config);
        let state = gate.authenticate_token(&established.token).await.unwrap();
        assert!(matches!(state, AuthState::Anonymous));

        // The orphan session was dropped along the way
        assert_eq!(codec.resolve(&established.token).await.unwrap(), None);
    }
}

// ============================================================================
// Secret properties
// ============================================================================

mod secrets {
    use super::*;

    #[tokio::test]
    async fn submit_is_idempotent_and_listed() {
        let store = Arc::new(MemoryStore::new());
        let config = config();

        let alice = register_alice(&store, &config).await;
        let other = store
            .find_or_create_by_provider(Provider::Facebook, "fb-quiet")
            .await
            .unwrap();

        let submit = SubmitSecretUseCase::new(store.clone(), config.clone());
        submit.execute(&alice, "I like trains").await.unwrap();
        submit.execute(&alice, "I like trains").await.unwrap();

        let listed = store.users_with_secret().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_id, alice);
        assert_eq!(listed[0].secret.as_deref(), Some("I like trains"));

        // The silent user is not on the wall
        assert!(listed.iter().all(|user| user.user_id != other.user_id));
    }

    #[tokio::test]
    async fn empty_secret_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let config = config();
        let alice = register_alice(&store, &config).await;

        let submit = SubmitSecretUseCase::new(store.clone(), config.clone());
        assert!(matches!(
            submit.execute(&alice, "   ").await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn secret_for_missing_user_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let submit = SubmitSecretUseCase::new(store, config());

        assert!(matches!(
            submit.execute(&UserId::new(), "anything").await,
            Err(AuthError::UserNotFound)
        ));
    }
}

// ============================================================================
// Router scenarios
// ============================================================================

mod routes {
    use super::*;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn app() -> Router {
        crate::presentation::router::gateway_router(
            MemoryStore::new(),
            CannedProviderClient::new("g-sub-1"),
            AuthConfig::development(),
        )
        .unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// First `name=value` pair from any Set-Cookie header matching `name`
    fn cookie_pair(response: &axum::response::Response, name: &str) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or("").to_string())
            .find(|pair| pair.starts_with(&format!("{name}=")))
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn register_submit_and_read_the_wall() {
        let app = app();

        // Register alice; auto-login lands on the wall
        let response = app
            .clone()
            .oneshot(form_post(
                "/register",
                "username=alice&password=wonderland+pass",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/secrets");

        let session = cookie_pair(&response, "gateway_session").unwrap();

        // The submit page is open to her
        let response = app
            .clone()
            .oneshot(get_with_cookie("/submit", &session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // She shares a secret
        let mut request = form_post("/submit", "secret=cat+person");
        request
            .headers_mut()
            .insert(header::COOKIE, session.parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/secrets");

        // The wall shows it, even to anonymous visitors
        let response = app.clone().oneshot(get("/secrets")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("cat person"));
        // No private data beyond the shared text leaks onto the wall
        assert!(!body.contains("alice"));
    }

    #[tokio::test]
    async fn anonymous_submit_redirects_to_login() {
        let app = app();

        let response = app.clone().oneshot(get("/submit")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        let response = app
            .clone()
            .oneshot(form_post("/submit", "secret=sneaky"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn public_pages_render_anonymously() {
        let app = app();

        for uri in ["/", "/register", "/login", "/secrets", "/error"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        }
    }

    #[tokio::test]
    async fn login_page_redirects_when_already_signed_in() {
        let app = app();

        let response = app
            .clone()
            .oneshot(form_post(
                "/register",
                "username=alice&password=wonderland+pass",
            ))
            .await
            .unwrap();
        let session = cookie_pair(&response, "gateway_session").unwrap();

        let response = app
            .clone()
            .oneshot(get_with_cookie("/login", &session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/secrets");
    }

    #[tokio::test]
    async fn duplicate_registration_redirects_to_login() {
        let app = app();

        let first = app
            .clone()
            .oneshot(form_post(
                "/register",
                "username=alice&password=wonderland+pass",
            ))
            .await
            .unwrap();
        assert_eq!(location(&first), "/secrets");

        let second = app
            .clone()
            .oneshot(form_post(
                "/register",
                "username=alice&password=other+long+pass",
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&second), "/login");
    }

    #[tokio::test]
    async fn failed_login_lands_back_on_the_form() {
        let app = app();

        let response = app
            .clone()
            .oneshot(form_post("/login", "username=ghost&password=whatever+pass"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn logout_clears_the_session() {
        let app = app();

        let response = app
            .clone()
            .oneshot(form_post(
                "/register",
                "username=alice&password=wonderland+pass",
            ))
            .await
            .unwrap();
        let session = cookie_pair(&response, "gateway_session").unwrap();

        let response = app
            .clone()
            .oneshot(get_with_cookie("/logout", &session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        let cleared = cookie_pair(&response, "gateway_session").unwrap();
        assert_eq!(cleared, "gateway_session=");

        // The old token is dead
        let response = app
            .clone()
            .oneshot(get_with_cookie("/submit", &session))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");

        // Logging out again while anonymous is a quiet no-op
        let response = app.clone().oneshot(get("/logout")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn oauth_flow_signs_in_through_the_callback() {
        let app = app();

        // Start: consent redirect plus the state cookie
        let response = app.clone().oneshot(get("/auth/google")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("https://consent.example/google"));
        let state_cookie = cookie_pair(&response, "oauth_state").unwrap();

        // Callback with the matching CSRF state signs the visitor in
        let response = app
            .clone()
            .oneshot(get_with_cookie(
                "/auth/google/secrets?code=ok&state=csrf-token",
                &state_cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/secrets");
        let session = cookie_pair(&response, "gateway_session").unwrap();

        // And the session works
        let response = app
            .clone()
            .oneshot(get_with_cookie("/submit", &session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oauth_callback_rejects_bad_state() {
        let app = app();

        let response = app.clone().oneshot(get("/auth/google")).await.unwrap();
        let state_cookie = cookie_pair(&response, "oauth_state").unwrap();

        // Mismatched CSRF token
        let response = app
            .clone()
            .oneshot(get_with_cookie(
                "/auth/google/secrets?code=ok&state=not-the-token",
                &state_cookie,
            ))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");

        // Missing state cookie entirely
        let response = app
            .clone()
            .oneshot(get("/auth/google/secrets?code=ok&state=csrf-token"))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn oauth_callback_handles_provider_denial() {
        let app = app();

        let response = app.clone().oneshot(get("/auth/google")).await.unwrap();
        let state_cookie = cookie_pair(&response, "oauth_state").unwrap();

        // User hit "cancel" on the consent screen
        let response = app
            .clone()
            .oneshot(get_with_cookie(
                "/auth/google/secrets?error=access_denied",
                &state_cookie,
            ))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");

        // Exchange refused by the provider
        let response = app
            .clone()
            .oneshot(get_with_cookie(
                "/auth/google/secrets?code=denied&state=csrf-token",
                &state_cookie,
            ))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn unknown_provider_redirects_to_login() {
        let app = app();

        let response = app.clone().oneshot(get("/auth/github")).await.unwrap();
        assert_eq!(location(&response), "/login");

        let response = app
            .clone()
            .oneshot(get("/auth/github/secrets?code=ok&state=x"))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");
    }
}
