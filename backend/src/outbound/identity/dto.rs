//! DTOs for decoding token and userinfo responses.
//!
//! Only the fields sign-in relies on are decoded; providers add plenty more.

use serde::Deserialize;

use crate::domain::EmailAddress;
use crate::domain::ports::ProviderIdentity;

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponseDto {
    pub(super) access_token: String,
    #[serde(default)]
    pub(super) token_type: Option<String>,
}

impl TokenResponseDto {
    /// Bearer access token, or a description of why it cannot be used.
    pub(super) fn into_bearer(self) -> Result<String, String> {
        match self.token_type.as_deref() {
            Some(kind) if !kind.eq_ignore_ascii_case("bearer") => {
                Err(format!("unsupported token type {kind:?}"))
            }
            _ if self.access_token.trim().is_empty() => Err("empty access token".to_owned()),
            _ => Ok(self.access_token),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UserInfoDto {
    pub(super) sub: String,
    #[serde(default)]
    pub(super) email: Option<String>,
    #[serde(default)]
    pub(super) email_verified: Option<bool>,
}

impl UserInfoDto {
    /// Provider identity. Missing or explicitly unverified emails are refused.
    pub(super) fn into_identity(self) -> Result<ProviderIdentity, String> {
        if self.sub.trim().is_empty() {
            return Err("userinfo is missing a subject".to_owned());
        }
        if self.email_verified == Some(false) {
            return Err(format!("email for subject {} is not verified", self.sub));
        }
        let raw = self
            .email
            .ok_or_else(|| format!("userinfo for subject {} has no email", self.sub))?;
        let email = EmailAddress::new(&raw).map_err(|err| err.to_string())?;
        Ok(ProviderIdentity {
            subject: self.sub,
            email,
        })
    }
}
