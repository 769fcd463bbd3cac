//! Verified caller identity carried through a request.

use serde::{Deserialize, Serialize};

use super::{CapabilitySet, EmailAddress, OrganizationId, Role, UserId};

/// Identity established at sign-in and re-established on every token
/// verification.
///
/// Claims are built once and only read afterwards; `role` is already
/// validated and `permissions` already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// Authenticated user.
    pub user_id: UserId,
    /// Tenant the user belongs to.
    pub organization_id: OrganizationId,
    /// Login email.
    pub email: EmailAddress,
    /// Validated role.
    pub role: Role,
    /// Effective capabilities at issue time.
    pub permissions: CapabilitySet,
}
