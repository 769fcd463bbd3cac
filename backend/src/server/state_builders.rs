//! Builders for HTTP state over in-memory or Diesel-backed adapters.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use inspection_backend::domain::ports::{
    FixtureIdentityProvider, IdentityProvider, IdentityProviderError, ProviderIdentity,
    TemplateRepository, TokenService, UserAccountRepository,
};
use inspection_backend::domain::{
    AuthenticationService, OrganizationId, Role, TemplateVersionManager, UserAccount, UserId,
};
use inspection_backend::inbound::http::state::{HttpState, HttpStatePorts};
use inspection_backend::outbound::identity::OAuthCodeExchange;
use inspection_backend::outbound::memory::{InMemoryTemplateRepository, InMemoryUserAccounts};
use inspection_backend::outbound::persistence::{
    DieselTemplateRepository, DieselUserAccountRepository,
};
use inspection_backend::outbound::token::JwtTokenService;

use super::ServerConfig;

/// Identity provider chosen for this process.
pub(crate) enum ConfiguredIdentityProvider {
    /// Authorisation-code exchange against the configured provider.
    OAuth(OAuthCodeExchange),
    /// Bare email codes; in-memory development runs only.
    Development(FixtureIdentityProvider),
}

#[async_trait]
impl IdentityProvider for ConfiguredIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, IdentityProviderError> {
        match self {
            Self::OAuth(provider) => provider.exchange_code(code).await,
            Self::Development(provider) => provider.exchange_code(code).await,
        }
    }
}

/// Pick the identity provider for `config`.
///
/// A configured OAuth provider always wins. The development provider is only
/// allowed when `persistent` is false and the flag is set; every other
/// combination refuses to start.
pub(crate) fn select_identity_provider(
    config: &ServerConfig,
    persistent: bool,
) -> io::Result<ConfiguredIdentityProvider> {
    if let Some(provider) = config.identity_provider.clone() {
        if config.development_identity {
            warn!("development identity provider ignored; an OAuth provider is configured");
        }
        let exchange = OAuthCodeExchange::new(provider).map_err(|err| {
            io::Error::other(format!("failed to build identity provider client: {err}"))
        })?;
        info!(token_url = %exchange.token_url(), "using OAuth identity provider");
        return Ok(ConfiguredIdentityProvider::OAuth(exchange));
    }

    match (persistent, config.development_identity) {
        (true, _) => Err(io::Error::other(
            "database-backed runs require an OAuth identity provider",
        )),
        (false, false) => Err(io::Error::other(
            "no identity provider configured; set the OAuth provider or enable the development provider",
        )),
        (false, true) => {
            warn!("development identity provider enabled; bare email addresses sign in");
            Ok(ConfiguredIdentityProvider::Development(FixtureIdentityProvider))
        }
    }
}

fn wire<R, U>(
    templates: Arc<R>,
    accounts: Arc<U>,
    provider: ConfiguredIdentityProvider,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
) -> HttpState
where
    R: TemplateRepository + 'static,
    U: UserAccountRepository + 'static,
{
    let manager = Arc::new(TemplateVersionManager::new(templates, clock.clone()));
    let sign_in = Arc::new(AuthenticationService::new(
        Arc::new(provider),
        accounts,
        tokens.clone(),
        clock.clone(),
    ));
    HttpState::new(HttpStatePorts {
        templates: manager.clone(),
        templates_query: manager,
        sign_in,
        tokens,
        clock,
    })
}

fn seeded_accounts(config: &ServerConfig) -> InMemoryUserAccounts {
    let Some(email) = config.bootstrap_admin.clone() else {
        return InMemoryUserAccounts::default();
    };
    let account = UserAccount {
        id: UserId::random(),
        organization_id: OrganizationId::random(),
        email,
        role: Role::Admin.as_str().to_owned(),
        permission_override: None,
    };
    info!(
        user_id = %account.id,
        organization_id = %account.organization_id,
        "seeded bootstrap admin account"
    );
    InMemoryUserAccounts::with_accounts([account])
}

/// Build handler state from `config`: Diesel adapters when a pool is
/// attached, in-memory adapters otherwise.
///
/// # Errors
///
/// Fails when no identity provider is allowed for this configuration.
pub(crate) fn build_http_state(config: &ServerConfig) -> io::Result<HttpState> {
    let provider = select_identity_provider(config, config.db_pool.is_some())?;
    let secret = config.signing_secret.as_deref().map(|bytes| bytes.as_slice());
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(secret, config.token_ttl));
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    Ok(match &config.db_pool {
        Some(pool) => wire(
            Arc::new(DieselTemplateRepository::new(pool.clone())),
            Arc::new(DieselUserAccountRepository::new(pool.clone())),
            provider,
            tokens,
            clock,
        ),
        None => wire(
            Arc::new(InMemoryTemplateRepository::new()),
            Arc::new(seeded_accounts(config)),
            provider,
            tokens,
            clock,
        ),
    })
}
