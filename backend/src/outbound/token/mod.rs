//! HS256 JWT implementation of the [`TokenService`] port.
//!
//! The wire payload carries the identity claim's five fields plus `iat` and
//! `exp` as Unix seconds. Expiry is compared against the instant handed to
//! [`TokenService::verify`], never the system clock, so verification is
//! deterministic under test.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::ports::{SignedToken, TokenError, TokenService};
use crate::domain::{CapabilitySet, EmailAddress, IdentityClaim, OrganizationId, Role, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    user_id: String,
    organization_id: String,
    email: String,
    role: String,
    permissions: CapabilitySet,
    iat: i64,
    exp: i64,
}

impl WireClaims {
    fn encode_claim(
        claim: &IdentityClaim,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: claim.user_id.to_string(),
            organization_id: claim.organization_id.to_string(),
            email: claim.email.to_string(),
            role: claim.role.as_str().to_owned(),
            permissions: claim.permissions,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    fn into_claim(self) -> Result<IdentityClaim, TokenError> {
        Ok(IdentityClaim {
            user_id: UserId::new(&self.user_id)
                .map_err(|err| TokenError::malformed(err.to_string()))?,
            organization_id: OrganizationId::new(&self.organization_id)
                .map_err(|err| TokenError::malformed(err.to_string()))?,
            email: EmailAddress::new(&self.email)
                .map_err(|err| TokenError::malformed(err.to_string()))?,
            role: Role::validate(&self.role)
                .map_err(|err| TokenError::malformed(err.to_string()))?,
            permissions: self.permissions,
        })
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Stateless JWT codec signed with a shared secret.
pub struct JwtTokenService {
    keys: Option<SigningKeys>,
    ttl: Duration,
}

impl JwtTokenService {
    /// Build a codec from `secret`. A missing or empty secret yields a codec
    /// that fails every call with [`TokenError::Signing`].
    #[must_use]
    pub fn new(secret: Option<&[u8]>, ttl: Duration) -> Self {
        let keys = secret.filter(|bytes| !bytes.is_empty()).map(|bytes| SigningKeys {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        });
        Self { keys, ttl }
    }

    /// Token lifetime applied at issue.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn keys(&self) -> Result<&SigningKeys, TokenError> {
        self.keys
            .as_ref()
            .ok_or_else(|| TokenError::signing("no signing key configured"))
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, claim: &IdentityClaim, now: DateTime<Utc>) -> Result<SignedToken, TokenError> {
        let keys = self.keys()?;
        let expires_at = now + self.ttl;
        let wire = WireClaims::encode_claim(claim, now, expires_at);
        let token = encode(&Header::new(Algorithm::HS256), &wire, &keys.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))?;
        Ok(SignedToken { token, expires_at })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaim, TokenError> {
        let keys = self.keys()?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = decode::<WireClaims>(token, &keys.decoding, &validation).map_err(|err| {
            debug!(error = %err, "token rejected");
            match err.kind() {
                ErrorKind::InvalidSignature => TokenError::invalid_signature(),
                _ => TokenError::malformed(err.to_string()),
            }
        })?;

        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::expired());
        }
        data.claims.into_claim()
    }
}

/// Short SHA-256 fingerprint of a signing secret, safe to log.
///
/// # Examples
/// ```
/// use inspection_backend::outbound::token::key_fingerprint;
///
/// assert_eq!(key_fingerprint(b"secret").len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(secret: &[u8]) -> String {
    let digest = Sha256::digest(secret);
    hex::encode(&digest[..8])
}
