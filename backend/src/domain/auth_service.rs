//! Sign-in service.
//!
//! Exchanges an identity-provider code for a signed identity claim:
//! provider identity, then stored account, then role and permission
//! resolution, then token issue.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    IdentityProvider, IdentityProviderError, SignInService, SignedToken, TokenError, TokenService,
    UserAccountRepository,
};
use crate::domain::{Error, IdentityClaim, Role, effective_permissions};

fn map_provider_error(error: IdentityProviderError) -> Error {
    match error {
        IdentityProviderError::Rejected { message } => {
            info!(%message, "identity provider rejected sign-in code");
            Error::unauthorized("sign-in code was rejected")
        }
        other @ IdentityProviderError::Unavailable { .. } => Error::from(other),
    }
}

fn map_token_error(error: TokenError) -> Error {
    Error::internal(format!("could not issue token: {error}"))
}

/// Authentication service implementing [`SignInService`].
#[derive(Clone)]
pub struct AuthenticationService<P, U> {
    provider: Arc<P>,
    accounts: Arc<U>,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
}

impl<P, U> AuthenticationService<P, U> {
    /// Wire the service to its collaborators.
    pub fn new(
        provider: Arc<P>,
        accounts: Arc<U>,
        tokens: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            accounts,
            tokens,
            clock,
        }
    }
}

#[async_trait]
impl<P, U> SignInService for AuthenticationService<P, U>
where
    P: IdentityProvider,
    U: UserAccountRepository,
{
    async fn sign_in(&self, code: &str) -> Result<SignedToken, Error> {
        if code.trim().is_empty() {
            return Err(Error::invalid_request("sign-in code must not be empty"));
        }

        let identity = self
            .provider
            .exchange_code(code)
            .await
            .map_err(map_provider_error)?;

        let Some(account) = self
            .accounts
            .find_by_email(&identity.email)
            .await
            .map_err(Error::from)?
        else {
            info!(subject = %identity.subject, "no account for provider identity");
            return Err(Error::unauthorized("no account is registered for this identity"));
        };

        let role = Role::normalize(&account.role).map_err(|err| {
            warn!(user_id = %account.id, error = %err, "stored account role is invalid");
            Error::unauthorized("account role is not recognised")
        })?;

        let claim = IdentityClaim {
            user_id: account.id,
            organization_id: account.organization_id,
            permissions: effective_permissions(role.as_str(), account.permission_override.as_ref()),
            email: account.email,
            role,
        };

        let token = self
            .tokens
            .issue(&claim, self.clock.utc())
            .map_err(map_token_error)?;
        info!(
            user_id = %claim.user_id,
            organization_id = %claim.organization_id,
            "identity token issued"
        );
        Ok(token)
    }
}
