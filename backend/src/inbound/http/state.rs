//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only ever see domain ports,
//! so they stay testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{SignInService, TemplateCommand, TemplateQuery, TokenService};

/// Parameter object bundling the port implementations.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub templates: Arc<dyn TemplateCommand>,
    pub templates_query: Arc<dyn TemplateQuery>,
    pub sign_in: Arc<dyn SignInService>,
    pub tokens: Arc<dyn TokenService>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub templates: Arc<dyn TemplateCommand>,
    pub templates_query: Arc<dyn TemplateQuery>,
    pub sign_in: Arc<dyn SignInService>,
    /// Verifies bearer tokens in [`super::auth::AuthContext`].
    pub tokens: Arc<dyn TokenService>,
    /// Instant source for token expiry checks.
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Construct state from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            templates,
            templates_query,
            sign_in,
            tokens,
            clock,
        } = ports;
        Self {
            templates,
            templates_query,
            sign_in,
            tokens,
            clock,
        }
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
