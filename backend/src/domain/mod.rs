//! Domain primitives, services, and ports.
//!
//! Purpose: hold everything that decides who may do what inside which
//! organisation, and how template lineages evolve. Nothing here knows about
//! HTTP, SQL, or JWT encodings; adapters reach the domain through `ports`.
//!
//! Public surface:
//! - Role, Capability, CapabilitySet, PermissionOverride: authorisation
//!   vocabulary.
//! - IdentityClaim, OrganizationScope: the verified caller and their tenant
//!   boundary.
//! - Template and friends: lineage rows and content validation.
//! - TemplateVersionManager, AuthenticationService: driving port
//!   implementations.
//! - Error, ErrorCode: the error payload every port returns.

pub mod auth_service;
pub mod capability;
pub mod error;
pub(crate) mod identifier;
pub mod identity;
pub mod organization;
pub mod permissions;
pub mod ports;
pub mod role;
pub mod template;
pub mod template_service;
pub mod trace_id;
pub mod user;

pub use self::auth_service::AuthenticationService;
pub use self::capability::{Capability, CapabilitySet, PermissionOverride, UnknownCapability};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identifier::IdentifierValidationError;
pub use self::identity::IdentityClaim;
pub use self::organization::{OrganizationId, OrganizationScope, OrganizationScoped, scope_filter};
pub use self::permissions::{defaults_for, effective_permissions, require_capability};
pub use self::role::{Role, RoleValidationError, has_at_least_privilege};
pub use self::template::{
    FieldsSchema, LifecycleState, Template, TemplateContent, TemplateDraft, TemplateId,
    TemplateUpdate, TemplateValidationError, default_version_notes,
};
pub use self::template_service::TemplateVersionManager;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EmailAddress, EmailValidationError, UserAccount, UserId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use inspection_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
