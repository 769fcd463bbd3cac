//! Port for the external identity provider.
//!
//! The provider turns a one-time authorisation code into a verified email.
//! Provider specifics such as endpoints, client credentials, and scopes live
//! in the adapter's own configuration.

use async_trait::async_trait;

use crate::domain::EmailAddress;

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// Provider refused the code.
        Rejected { message: String } =>
            Unauthorized("identity provider rejected code: {message}"),
        /// Provider could not be reached.
        Unavailable { message: String } =>
            ServiceUnavailable("identity provider unavailable: {message}"),
    }
}

/// Identity asserted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// Provider-scoped subject identifier.
    pub subject: String,
    /// Verified email address.
    pub email: EmailAddress,
}

/// Code exchange against an external identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorisation code for the identity it was issued to.
    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, IdentityProviderError>;
}

/// Development provider that treats the code itself as the email address.
///
/// Any code that is a valid email is accepted, so this must only back an
/// in-memory server started with the development provider switched on.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityProvider;

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, IdentityProviderError> {
        let email = EmailAddress::new(code)
            .map_err(|err| IdentityProviderError::rejected(err.to_string()))?;
        Ok(ProviderIdentity {
            subject: format!("fixture|{email}"),
            email,
        })
    }
}
