//! HTTP inbound adapter exposing the REST endpoints.

use actix_web::web;

pub mod auth;
pub mod error;
pub mod health;
pub mod state;
pub mod templates;
#[cfg(test)]
pub mod test_utils;
pub mod tokens;

pub use error::ApiResult;

/// Register every versioned API route on `cfg`.
///
/// Callers mount this under `/api/v1` and provide [`state::HttpState`] as
/// app data.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(tokens::issue_token).configure(templates::configure);
}

/// JSON extractor settings that turn body errors into domain envelopes.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(error::json_error_handler)
}
