//! Reqwest-backed OAuth 2.0 authorisation-code exchange.
//!
//! The adapter redeems the code at the provider's token endpoint with the
//! confidential client credentials, then reads the subject and verified
//! email from the userinfo endpoint. It owns transport details only.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{TokenResponseDto, UserInfoDto};
use crate::domain::ports::{IdentityProvider, IdentityProviderError, ProviderIdentity};

/// Endpoints and client credentials registered with the provider.
#[derive(Clone)]
pub struct OAuthProviderConfig {
    /// Token endpoint that redeems authorisation codes.
    pub token_url: Url,
    /// Userinfo endpoint queried with the issued access token.
    pub userinfo_url: Url,
    /// Client identifier registered with the provider.
    pub client_id: String,
    /// Client secret; never logged.
    pub client_secret: Zeroizing<String>,
    /// Redirect URI the code was issued for.
    pub redirect_uri: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for OAuthProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthProviderConfig")
            .field("token_url", &self.token_url.as_str())
            .field("userinfo_url", &self.userinfo_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Identity provider adapter speaking the authorisation-code grant.
pub struct OAuthCodeExchange {
    client: Client,
    config: OAuthProviderConfig,
}

impl OAuthCodeExchange {
    /// Build the adapter with a client honouring `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: OAuthProviderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Token endpoint this adapter redeems codes at.
    pub fn token_url(&self) -> &Url {
        &self.config.token_url
    }

    async fn redeem(&self, code: &str) -> Result<String, IdentityProviderError> {
        let response = self
            .client
            .post(self.config.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_token_status(status, body.as_ref()));
        }
        parse_access_token(body.as_ref())
    }

    async fn fetch_identity(
        &self,
        access_token: &str,
    ) -> Result<ProviderIdentity, IdentityProviderError> {
        let response = self
            .client
            .get(self.config.userinfo_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_userinfo_status(status, body.as_ref()));
        }
        parse_identity(body.as_ref())
    }
}

#[async_trait]
impl IdentityProvider for OAuthCodeExchange {
    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, IdentityProviderError> {
        let access_token = Zeroizing::new(self.redeem(code).await?);
        let identity = self.fetch_identity(&access_token).await?;
        debug!(subject = %identity.subject, "authorisation code redeemed");
        Ok(identity)
    }
}

fn parse_access_token(body: &[u8]) -> Result<String, IdentityProviderError> {
    let decoded: TokenResponseDto = serde_json::from_slice(body).map_err(|error| {
        IdentityProviderError::unavailable(format!("invalid token response: {error}"))
    })?;
    decoded
        .into_bearer()
        .map_err(IdentityProviderError::unavailable)
}

fn parse_identity(body: &[u8]) -> Result<ProviderIdentity, IdentityProviderError> {
    let decoded: UserInfoDto = serde_json::from_slice(body).map_err(|error| {
        IdentityProviderError::unavailable(format!("invalid userinfo response: {error}"))
    })?;
    decoded
        .into_identity()
        .map_err(IdentityProviderError::rejected)
}

fn map_transport_error(error: reqwest::Error) -> IdentityProviderError {
    if error.is_timeout() {
        IdentityProviderError::unavailable(format!("request timed out: {error}"))
    } else {
        IdentityProviderError::unavailable(error.to_string())
    }
}

/// `400` and `401` from the token endpoint mean the grant itself was refused.
fn map_token_status(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    let message = status_message("token endpoint", status, body);
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
            IdentityProviderError::rejected(message)
        }
        _ => IdentityProviderError::unavailable(message),
    }
}

fn map_userinfo_status(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    let message = status_message("userinfo endpoint", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            IdentityProviderError::rejected(message)
        }
        _ => IdentityProviderError::unavailable(message),
    }
}

fn status_message(endpoint: &str, status: StatusCode, body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if preview.is_empty() {
        format!("{endpoint} returned status {}", status.as_u16())
    } else {
        format!("{endpoint} returned status {}: {preview}", status.as_u16())
    }
}
