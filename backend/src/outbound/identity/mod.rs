//! Identity provider outbound adapters.
//!
//! This module provides the HTTP implementation of the `IdentityProvider`
//! port used outside development runs.

mod dto;
mod http_provider;

pub use http_provider::{OAuthCodeExchange, OAuthProviderConfig};
