//! Port for issuing and verifying signed identity claims.
//!
//! Tokens are self-contained: verification needs only the signing key and
//! the caller-supplied instant. There is no revocation list.

use chrono::{DateTime, Utc};

use crate::domain::IdentityClaim;

use super::define_port_error;

define_port_error! {
    /// Errors raised while issuing or verifying tokens.
    pub enum TokenError {
        /// No usable signing key, or encoding failed.
        Signing { message: String } => InternalError("token signing failed: {message}"),
        /// Expiry is at or before the verification instant.
        Expired => Unauthorized("token has expired"),
        /// Signature does not match the payload.
        InvalidSignature => Unauthorized("token signature is invalid"),
        /// Token could not be decoded into a well-formed claim.
        Malformed { message: String } => Unauthorized("token is malformed: {message}"),
    }
}

/// Encoded token plus the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    /// Compact encoded token for the `Authorization` header.
    pub token: String,
    /// First instant at which verification fails with `Expired`.
    pub expires_at: DateTime<Utc>,
}

/// Stateless token codec.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Sign `claim`, expiring a fixed lifetime after `now`.
    fn issue(&self, claim: &IdentityClaim, now: DateTime<Utc>)
    -> Result<SignedToken, TokenError>;

    /// Check the signature and expiry of `token` at `now` and decode it.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaim, TokenError>;
}
