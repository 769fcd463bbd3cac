//! Tenant boundary primitives.
//!
//! Every entity outside the organisation table carries an
//! [`OrganizationId`]. Requests operate inside an [`OrganizationScope`]
//! derived from the verified identity claim; rows from any other
//! organisation are indistinguishable from missing rows.

use tracing::debug;

use super::identifier::define_uuid_id;
use super::IdentityClaim;

define_uuid_id! {
    /// Stable organisation (tenant) identifier.
    OrganizationId => "organization id"
}

/// Entities confined to a single organisation.
pub trait OrganizationScoped {
    /// Organisation owning the entity.
    fn organization_id(&self) -> OrganizationId;
}

/// Organisation filter applied to every storage read and write of a request.
///
/// # Examples
/// ```
/// use inspection_backend::domain::{OrganizationId, OrganizationScope};
///
/// let org = OrganizationId::random();
/// let scope = OrganizationScope::new(org);
/// assert_eq!(scope.organization_id(), org);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganizationScope(OrganizationId);

impl OrganizationScope {
    /// Scope requests to `organization_id`.
    #[must_use]
    pub const fn new(organization_id: OrganizationId) -> Self {
        Self(organization_id)
    }

    /// Organisation id to conjoin with storage predicates.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.0
    }

    /// Whether `entity` belongs to this scope.
    pub fn contains<T: OrganizationScoped + ?Sized>(&self, entity: &T) -> bool {
        entity.organization_id() == self.0
    }

    /// Keep `entity` only when it belongs to this scope.
    ///
    /// Rows from another tenant collapse to `None` so callers report them
    /// exactly like absent rows.
    pub fn admit<T: OrganizationScoped>(&self, entity: Option<T>) -> Option<T> {
        match entity {
            Some(found) if self.contains(&found) => Some(found),
            Some(found) => {
                debug!(
                    scope = %self.0,
                    owner = %found.organization_id(),
                    "cross-tenant lookup hidden as not found"
                );
                None
            }
            None => None,
        }
    }
}

/// Derive the organisation scope for a verified identity claim.
#[must_use]
pub fn scope_filter(claim: &IdentityClaim) -> OrganizationScope {
    OrganizationScope::new(claim.organization_id)
}
