//! Driving port for exchanging an identity-provider code for a token.
//!
//! Inbound adapters depend on this trait rather than on the provider, the
//! account store, or the token codec behind it.

use async_trait::async_trait;

use crate::domain::Error;

use super::SignedToken;

/// Sign-in use case.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignInService: Send + Sync {
    /// Exchange `code` for a signed identity token.
    async fn sign_in(&self, code: &str) -> Result<SignedToken, Error>;
}
