//! OAuth 2.0 authorization code flow with PKCE (S256).

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{OAuthError, Result};

/// Default timeout for the token exchange.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth client configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    /// Space-separated scope string.
    pub scope: String,
}

impl OAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: &[String],
    ) -> Self {
        Self {
            client_id: client_id.into(),
            authorize_url: authorize_url.into(),
            token_url: token_url.into(),
            redirect_uri: redirect_uri.into(),
            scope: scopes.join(" "),
        }
    }
}

/// PKCE code verifier and challenge pair.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a new PKCE challenge pair from 32 random bytes.
    pub fn generate() -> Self {
        let mut verifier_bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);
        let challenge = challenge_for(&verifier);

        Self {
            verifier,
            challenge,
        }
    }
}

/// Derive the S256 challenge for a verifier.
pub fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generate a random state string for CSRF protection.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

/// Build the authorization URL for the OAuth flow.
pub fn build_authorization_url(config: &OAuthConfig, challenge: &str, state: &str) -> String {
    let params = [
        ("response_type", "code"),
        ("client_id", &config.client_id),
        ("redirect_uri", &config.redirect_uri),
        ("scope", &config.scope),
        ("state", state),
        ("code_challenge", challenge),
        ("code_challenge_method", "S256"),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if config.authorize_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", config.authorize_url, separator, query)
}

/// Token endpoint response. Only `access_token` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    grant_type: &'a str,
    code_verifier: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Performs the authorization code exchange against a configured token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(config: OAuthConfig, timeout: Duration) -> Result<Self> {
        if config.client_id.trim().is_empty() {
            return Err(OAuthError::Config("client_id is required".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dealhook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Fresh verifier/challenge and state plus the URL to send the user to.
    pub fn begin(&self) -> (PkceChallenge, String, String) {
        let pkce = PkceChallenge::generate();
        let state = generate_state();
        let url = build_authorization_url(&self.config, &pkce.challenge, &state);
        (pkce, state, url)
    }

    /// Exchange an authorization code for a bearer token.
    ///
    /// The request is form-urlencoded. A 2xx response without an
    /// `access_token` is an [`OAuthError::InvalidResponse`].
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse> {
        let form = TokenExchangeRequest {
            client_id: &self.config.client_id,
            grant_type: "authorization_code",
            code_verifier: verifier,
            code,
            redirect_uri: &self.config.redirect_uri,
        };

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Token exchange request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = status.as_u16(), "Token exchange rejected");
            return Err(OAuthError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let raw: RawTokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(format!("Failed to parse token response: {}", e)))?;

        let access_token = raw
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OAuthError::InvalidResponse("missing access_token".to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: raw.token_type,
            expires_in: raw.expires_in,
            refresh_token: raw.refresh_token,
            scope: raw.scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(token_url: &str) -> OAuthConfig {
        OAuthConfig::new(
            "client-1",
            "https://tracker.example/oauth/authorize/",
            token_url,
            "http://localhost:3000/api/auth/redirect",
            &["user_info".to_string(), "wait_read".to_string()],
        )
    }

    #[test]
    fn test_pkce_generation() {
        let pkce = PkceChallenge::generate();
        assert_eq!(pkce.verifier.len(), 43);
        assert_eq!(pkce.challenge.len(), 43);
        assert_ne!(pkce.verifier, pkce.challenge);
        assert_eq!(pkce.challenge, challenge_for(&pkce.verifier));
    }

    #[test]
    fn test_challenge_known_vector() {
        // RFC 7636 appendix B
        assert_eq!(
            challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_state_generation() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        assert!(!a.contains('='));
    }

    #[test]
    fn test_build_authorization_url() {
        let config = test_config("https://tracker.example/oauth/token/");
        let url = build_authorization_url(&config, "chal", "st");

        assert!(url.starts_with("https://tracker.example/oauth/authorize/?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("scope=user_info%20wait_read"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fredirect"));
        assert!(url.contains("state=st"));
        assert!(url.contains("code_challenge=chal"));
        assert!(url.contains("code_challenge_method=S256"));
    }

    #[test]
    fn test_client_requires_client_id() {
        let mut config = test_config("http://localhost/token");
        config.client_id = String::new();
        assert!(matches!(OAuthClient::new(config), Err(OAuthError::Config(_))));
    }

    #[tokio::test]
    async fn test_exchange_code_sends_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token/"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("code_verifier=the-verifier"))
            .and(body_string_contains("client_id=client-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-123",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new(test_config(&format!("{}/oauth/token/", server.uri()))).unwrap();
        let tokens = client.exchange_code("the-code", "the-verifier").await.unwrap();
        assert_eq!(tokens.access_token, "tok-123");
        assert_eq!(tokens.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn test_exchange_code_missing_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
            .mount(&server)
            .await;

        let client = OAuthClient::new(test_config(&server.uri())).unwrap();
        let err = client.exchange_code("c", "v").await.unwrap_err();
        assert!(matches!(err, OAuthError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_exchange_code_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let client = OAuthClient::new(test_config(&server.uri())).unwrap();
        let err = client.exchange_code("c", "v").await.unwrap_err();
        match err {
            OAuthError::Backend { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid_grant");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_unreachable() {
        let client = OAuthClient::new(test_config("http://127.0.0.1:1/token")).unwrap();
        let err = client.exchange_code("c", "v").await.unwrap_err();
        assert!(matches!(err, OAuthError::Network(_)));
    }
}
