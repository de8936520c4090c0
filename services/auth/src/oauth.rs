//! OAuth2 integration for Google sign-in
//!
//! The authorization code flow uses PKCE. The verifier for each pending
//! sign-in is kept in Redis under the CSRF state and consumed exactly once
//! by the callback.

use anyhow::Result;
use common::cache::RedisPool;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::Deserialize;
use std::env;
use tracing::{info, warn};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// Pending sign-ins expire after ten minutes
const STATE_TTL_SECONDS: u64 = 600;

/// OAuth2 configuration for Google
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl OAuthConfig {
    /// Read the Google client from the environment
    ///
    /// Returns `None` when `GOOGLE_CLIENT_ID` is unset, which disables
    /// Google sign-in.
    ///
    /// # Environment Variables
    /// - `GOOGLE_CLIENT_ID`
    /// - `GOOGLE_CLIENT_SECRET`
    /// - `GOOGLE_REDIRECT_URL` (default: "http://localhost:3000/api/auth/google/callback")
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(client_id) = env::var("GOOGLE_CLIENT_ID") else {
            return Ok(None);
        };
        let client_secret = env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| anyhow::anyhow!("GOOGLE_CLIENT_SECRET environment variable not set"))?;
        let redirect_url = env::var("GOOGLE_REDIRECT_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api/auth/google/callback".to_string());

        Ok(Some(OAuthConfig {
            client_id,
            client_secret,
            redirect_url,
        }))
    }
}

/// Google profile returned by the userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub name: Option<String>,
}

/// OAuth2 client wrapper
#[derive(Clone)]
pub struct OAuthClient {
    client: BasicClient,
    http: reqwest::Client,
}

impl OAuthClient {
    /// Create a new OAuth2 client for Google
    pub fn new_google(config: OAuthConfig) -> Result<Self> {
        let client = BasicClient::new(
            ClientId::new(config.client_id),
            Some(ClientSecret::new(config.client_secret)),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string())?,
            Some(TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?),
        )
        .set_redirect_uri(RedirectUrl::new(config.redirect_url)?);

        Ok(Self {
            client,
            http: reqwest::Client::new(),
        })
    }

    /// Generate an authorization URL and remember its PKCE verifier
    pub async fn begin(&self, redis_pool: &RedisPool) -> Result<String> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);
        for scope in SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (auth_url, csrf_token) = request.url();

        redis_pool
            .set(
                &state_key(csrf_token.secret()),
                pkce_verifier.secret(),
                Some(STATE_TTL_SECONDS),
            )
            .await?;

        info!("Started Google sign-in");
        Ok(auth_url.to_string())
    }

    /// Finish the flow: check the state, exchange the code, fetch the profile
    ///
    /// Returns `Ok(None)` when the state is unknown or already used.
    pub async fn complete(
        &self,
        redis_pool: &RedisPool,
        code: String,
        state: &str,
    ) -> Result<Option<GoogleProfile>> {
        let Some(verifier) = redis_pool.take(&state_key(state)).await? else {
            warn!("Google callback with unknown state");
            return Ok(None);
        };

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| anyhow::anyhow!("Google code exchange failed: {}", e))?;

        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to get Google user profile: {}",
                response.status()
            ));
        }

        Ok(Some(response.json().await?))
    }
}

fn state_key(state: &str) -> String {
    format!("oauth_state:{}", state)
}
