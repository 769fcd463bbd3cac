//! Bearer-token authentication for HTTP handlers.
//!
//! [`AuthContext`] verifies the `Authorization: Bearer` header against the
//! configured [`TokenService`](crate::domain::ports::TokenService) and hands
//! handlers the resulting identity claim. Handlers never see raw tokens.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::ports::TokenError;
use crate::domain::{
    Capability, Error, IdentityClaim, OrganizationScope, UserId, require_capability,
    scope_filter,
};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Verified caller of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext(IdentityClaim);

impl AuthContext {
    /// Wrap an already verified claim.
    pub fn new(claim: IdentityClaim) -> Self {
        Self(claim)
    }

    /// The verified claim.
    pub fn claim(&self) -> &IdentityClaim {
        &self.0
    }

    /// Calling user.
    pub fn user_id(&self) -> UserId {
        self.0.user_id
    }

    /// Tenant boundary for every storage call made on the caller's behalf.
    pub fn scope(&self) -> OrganizationScope {
        scope_filter(&self.0)
    }

    /// Fail with `403 Forbidden` unless the caller holds `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), Error> {
        require_capability(&self.0, capability)
    }
}

pub(crate) fn map_token_error(error: TokenError) -> Error {
    match error {
        TokenError::Malformed { .. } => Error::unauthorized("token is malformed"),
        other => Error::from(other),
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("authorization header is required"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid ASCII"))?;
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must carry a bearer token"))
}

fn authenticate(req: &HttpRequest) -> Result<AuthContext, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not registered"))?;
    let token = bearer_token(req)?;
    let claim = state
        .tokens
        .verify(token, state.clock.utc())
        .map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            map_token_error(err)
        })?;
    Ok(AuthContext(claim))
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
