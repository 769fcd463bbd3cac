//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Duration;
use inspection_backend::domain::EmailAddress;
use inspection_backend::outbound::identity::OAuthProviderConfig;
use inspection_backend::outbound::persistence::DbPool;
use zeroize::Zeroizing;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) signing_secret: Option<Arc<Zeroizing<Vec<u8>>>>,
    pub(crate) token_ttl: Duration,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) bootstrap_admin: Option<EmailAddress>,
    pub(crate) identity_provider: Option<OAuthProviderConfig>,
    pub(crate) development_identity: bool,
}

impl ServerConfig {
    /// Construct a configuration listening on `bind_addr`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, token_ttl: Duration) -> Self {
        Self {
            bind_addr,
            signing_secret: None,
            token_ttl,
            db_pool: None,
            bootstrap_admin: None,
            identity_provider: None,
            development_identity: false,
        }
    }

    /// Attach the HS256 signing secret shared by issuer and verifier.
    #[must_use]
    pub fn with_signing_secret(mut self, secret: Option<Zeroizing<Vec<u8>>>) -> Self {
        self.signing_secret = secret.map(Arc::new);
        self
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without one, templates and accounts live in process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Seed an admin account for in-memory runs.
    #[must_use]
    pub fn with_bootstrap_admin(mut self, email: Option<EmailAddress>) -> Self {
        self.bootstrap_admin = email;
        self
    }

    /// Redeem sign-in codes at this OAuth provider.
    #[must_use]
    pub fn with_identity_provider(mut self, provider: Option<OAuthProviderConfig>) -> Self {
        self.identity_provider = provider;
        self
    }

    /// Accept bare email addresses as sign-in codes.
    ///
    /// Only honoured for in-memory runs with no provider attached.
    #[must_use]
    pub fn with_development_identity(mut self, enabled: bool) -> Self {
        self.development_identity = enabled;
        self
    }
}
