use crate::error::TraktError;
use crate::traits::AuthProvider;
use crate::trakt::client::TraktSettings;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use traktarr_config::KeyValueStore;

pub const AUTHORIZE_URL: &str = "https://trakt.tv/oauth/authorize";

// Tokens are treated as expired this long before Trakt's own deadline
const EXPIRY_MARGIN_SECS: i64 = 120;

#[derive(Debug, Serialize, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<TokenResponse> for TokenInfo {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in - EXPIRY_MARGIN_SECS),
        }
    }
}

/// Device code handed out by `/oauth/device/code`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    /// Seconds until the code expires
    pub expires_in: u64,
    /// Seconds to wait between polls
    pub interval: u64,
}

/// Unauthenticated OAuth endpoints: device flow, code exchange, refresh and revoke.
pub struct OAuthClient {
    http: Client,
    settings: TraktSettings,
}

impl OAuthClient {
    pub fn new(settings: TraktSettings) -> Result<Self, TraktError> {
        let http = Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { http, settings })
    }

    async fn post(&self, path: &str, payload: serde_json::Value) -> Result<Response, TraktError> {
        let response = self
            .http
            .post(self.settings.url(path))
            .json(&payload)
            .header("Accept", "application/json")
            .header("trakt-api-version", "2")
            .header("trakt-api-key", &self.settings.client_id)
            .send()
            .await?;
        Ok(response)
    }

    async fn token_request(&self, payload: serde_json::Value) -> Result<TokenInfo, TraktError> {
        let response = self.post("/oauth/token", payload).await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TraktError::Auth(format!(
                "Token request failed: {} - {}",
                status, error_text
            )));
        }
        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(token.into())
    }

    pub async fn request_device_code(&self) -> Result<DeviceCode, TraktError> {
        let payload = serde_json::json!({ "client_id": self.settings.client_id });
        let response = self.post("/oauth/device/code", payload).await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TraktError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Poll once. Pending and slow-down come back as errors the caller can
    /// test with [`TraktError::is_pending`].
    pub async fn poll_device_token(&self, device_code: &str) -> Result<TokenInfo, TraktError> {
        let payload = serde_json::json!({
            "code": device_code,
            "client_id": self.settings.client_id,
            "client_secret": self.settings.client_secret,
        });
        let response = self.post("/oauth/device/token", payload).await?;

        match response.status().as_u16() {
            200 => {
                let body = response.text().await?;
                let token: TokenResponse = serde_json::from_str(&body)?;
                Ok(token.into())
            }
            400 => Err(TraktError::AuthorizationPending),
            404 => Err(TraktError::Auth("Invalid device code".to_string())),
            409 => Err(TraktError::Auth("Device code already used".to_string())),
            410 => Err(TraktError::Expired),
            418 => Err(TraktError::Denied),
            429 => Err(TraktError::SlowDown),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(TraktError::Api { status, message })
            }
        }
    }

    /// Poll at the advertised interval until the user approves, denies, or
    /// the code expires.
    pub async fn wait_for_device_token(&self, code: &DeviceCode) -> Result<TokenInfo, TraktError> {
        let deadline = Utc::now() + Duration::seconds(code.expires_in as i64);
        let mut interval = std::time::Duration::from_secs(code.interval.max(1));

        loop {
            tokio::time::sleep(interval).await;
            match self.poll_device_token(&code.device_code).await {
                Ok(token) => {
                    info!("Device code approved");
                    return Ok(token);
                }
                Err(TraktError::AuthorizationPending) => {
                    debug!("Device code still pending");
                }
                Err(TraktError::SlowDown) => {
                    interval += std::time::Duration::from_secs(1);
                    debug!("Slowing device polling to {:?}", interval);
                }
                Err(e) => return Err(e),
            }
            if Utc::now() >= deadline {
                return Err(TraktError::Expired);
            }
        }
    }

    pub fn authorization_url(&self, state: &str) -> Result<Url, TraktError> {
        Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| TraktError::Auth(format!("Invalid authorization URL: {}", e)))
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenInfo, TraktError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TraktError::Auth("Authorization code cannot be empty".to_string()));
        }
        self.token_request(serde_json::json!({
            "code": code,
            "client_id": self.settings.client_id,
            "client_secret": self.settings.client_secret,
            "redirect_uri": self.settings.redirect_uri,
            "grant_type": "authorization_code"
        }))
        .await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenInfo, TraktError> {
        self.token_request(serde_json::json!({
            "refresh_token": refresh_token,
            "client_id": self.settings.client_id,
            "client_secret": self.settings.client_secret,
            "redirect_uri": self.settings.redirect_uri,
            "grant_type": "refresh_token"
        }))
        .await
    }

    pub async fn revoke(&self, access_token: &str) -> Result<(), TraktError> {
        let response = self
            .post(
                "/oauth/revoke",
                serde_json::json!({
                    "token": access_token,
                    "client_id": self.settings.client_id,
                    "client_secret": self.settings.client_secret,
                }),
            )
            .await?;
        if !response.status().is_success() {
            return Err(TraktError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// Bearer credentials persisted in a [`KeyValueStore`].
pub struct TokenAuth {
    store: Arc<dyn KeyValueStore>,
}

impl TokenAuth {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn token_info(&self) -> Option<TokenInfo> {
        Some(TokenInfo {
            access_token: self.store.trakt_access_token()?,
            refresh_token: self.store.trakt_refresh_token().unwrap_or_default(),
            expires_at: self.store.trakt_token_expires()?,
        })
    }

    pub fn save(&self, token: &TokenInfo) -> Result<(), TraktError> {
        self.store.set_trakt_access_token(&token.access_token)?;
        self.store.set_trakt_refresh_token(&token.refresh_token)?;
        self.store.set_trakt_token_expires(token.expires_at)?;
        info!("Saved Trakt tokens (expire at {})", token.expires_at);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), TraktError> {
        self.store.clear_trakt_tokens()?;
        Ok(())
    }

    /// Exchange the stored refresh token for a new pair and persist it.
    pub async fn refresh(&self, oauth: &OAuthClient) -> Result<TokenInfo, TraktError> {
        let refresh_token = self
            .store
            .trakt_refresh_token()
            .ok_or(TraktError::NotAuthenticated)?;
        let token = oauth.refresh_token(&refresh_token).await?;
        self.save(&token)?;
        Ok(token)
    }

    /// Revoke the token server-side when signed in, then always drop it locally.
    pub async fn logout(&self, oauth: &OAuthClient) -> Result<(), TraktError> {
        if let Some(token) = self.access_token() {
            if let Err(e) = oauth.revoke(&token).await {
                warn!("Failed to revoke Trakt token: {}", e);
            }
        }
        self.clear()
    }
}

impl AuthProvider for TokenAuth {
    fn is_authenticated(&self) -> bool {
        self.store.trakt_access_token().is_some()
            && self
                .store
                .trakt_token_expires()
                .map(|expires| expires > Utc::now())
                .unwrap_or(false)
    }

    fn access_token(&self) -> Option<String> {
        if self.is_authenticated() {
            self.store.trakt_access_token()
        } else {
            None
        }
    }
}
