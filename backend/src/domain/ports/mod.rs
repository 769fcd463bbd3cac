//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod identity_provider;
mod sign_in;
mod template_command;
mod template_query;
mod template_repository;
mod token_service;
mod user_account_repository;

#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{
    FixtureIdentityProvider, IdentityProvider, IdentityProviderError, ProviderIdentity,
};
#[cfg(test)]
pub use sign_in::MockSignInService;
pub use sign_in::SignInService;
#[cfg(test)]
pub use template_command::MockTemplateCommand;
pub use template_command::{
    CreateTemplateRequest, DeleteTemplateRequest, DuplicateTemplateRequest,
    PublishTemplateVersionRequest, TemplateCommand,
};
#[cfg(test)]
pub use template_query::MockTemplateQuery;
pub use template_query::TemplateQuery;
#[cfg(test)]
pub use template_repository::MockTemplateRepository;
pub use template_repository::{TemplateRepository, TemplateRepositoryError};
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{SignedToken, TokenError, TokenService};
#[cfg(test)]
pub use user_account_repository::MockUserAccountRepository;
pub use user_account_repository::{UserAccountRepository, UserAccountRepositoryError};
