//! Role defaults and effective permission resolution.
//!
//! A user's effective capabilities are either the role defaults or, when a
//! non-empty override is stored, the override alone. Overrides replace the
//! defaults; they are not merged, so a capability the override leaves out is
//! denied even if the role would grant it.

use tracing::debug;

use super::{Capability, CapabilitySet, Error, IdentityClaim, PermissionOverride, Role};

const VIEWER: &[Capability] = &[
    Capability::ViewOwnInspections,
    Capability::ViewAllInspections,
    Capability::ViewReports,
];

const INSPECTOR: &[Capability] = &[
    Capability::CreateInspection,
    Capability::ViewOwnInspections,
    Capability::EditInspections,
    Capability::UploadFiles,
];

const SUPERVISOR: &[Capability] = &[
    Capability::CreateInspection,
    Capability::ViewOwnInspections,
    Capability::ViewAllInspections,
    Capability::EditInspections,
    Capability::DeleteInspections,
    Capability::CreateTemplates,
    Capability::EditTemplates,
    Capability::ViewReports,
    Capability::ExportReports,
    Capability::UploadFiles,
    Capability::ManageNotifications,
];

impl CapabilitySet {
    /// Default capabilities granted to `role`.
    #[must_use]
    pub fn defaults_for(role: Role) -> Self {
        match role {
            Role::Viewer => Self::granting(VIEWER),
            Role::Inspector => Self::granting(INSPECTOR),
            Role::Supervisor => Self::granting(SUPERVISOR),
            Role::Admin => Self::all(),
        }
    }
}

/// Default capabilities for a stored role string.
///
/// Unrecognised roles fall back to the inspector table.
///
/// # Examples
/// ```
/// use inspection_backend::domain::{defaults_for, Capability};
///
/// assert!(defaults_for("admin").allows(Capability::ManageUsers));
/// assert!(!defaults_for("unknown").allows(Capability::ManageUsers));
/// assert!(defaults_for("unknown").allows(Capability::CreateInspection));
/// ```
#[must_use]
pub fn defaults_for(role: &str) -> CapabilitySet {
    let resolved = Role::validate(role).unwrap_or(Role::Inspector);
    CapabilitySet::defaults_for(resolved)
}

/// Resolve the capabilities a user holds.
///
/// A present, non-empty `stored` override wins outright; flags it does not
/// mention become `false`.
#[must_use]
pub fn effective_permissions(role: &str, stored: Option<&PermissionOverride>) -> CapabilitySet {
    match stored {
        Some(custom) if !custom.is_empty() => custom.to_capability_set(),
        _ => defaults_for(role),
    }
}

/// Fail with `Forbidden` unless `claim` carries `capability`.
pub fn require_capability(claim: &IdentityClaim, capability: Capability) -> Result<(), Error> {
    if claim.permissions.allows(capability) {
        return Ok(());
    }
    debug!(
        user_id = %claim.user_id,
        capability = %capability,
        "capability check denied"
    );
    Err(Error::forbidden(format!("missing capability {capability}"))
        .with_details(serde_json::json!({ "capability": capability.as_str() })))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{EmailAddress, ErrorCode, OrganizationId, UserId};

    fn claim_with(permissions: CapabilitySet) -> IdentityClaim {
        IdentityClaim {
            user_id: UserId::random(),
            organization_id: OrganizationId::random(),
            email: EmailAddress::new("someone@example.com").expect("valid email"),
            role: Role::Inspector,
            permissions,
        }
    }

    #[rstest]
    #[case(Role::Viewer, &[Capability::ViewOwnInspections, Capability::ViewAllInspections, Capability::ViewReports])]
    #[case(Role::Inspector, &[Capability::CreateInspection, Capability::ViewOwnInspections, Capability::EditInspections, Capability::UploadFiles])]
    fn narrow_roles_grant_exactly_their_table(
        #[case] role: Role,
        #[case] expected: &[Capability],
    ) {
        let granted: Vec<_> = CapabilitySet::defaults_for(role).granted().collect();
        assert_eq!(granted, expected.to_vec());
    }

    #[rstest]
    fn supervisor_lacks_only_admin_capabilities() {
        let set = CapabilitySet::defaults_for(Role::Supervisor);
        let denied: Vec<_> = Capability::ALL
            .iter()
            .copied()
            .filter(|capability| !set.allows(*capability))
            .collect();
        assert_eq!(
            denied,
            vec![Capability::DeleteTemplates, Capability::ManageUsers]
        );
    }

    #[rstest]
    fn admin_holds_everything() {
        assert_eq!(CapabilitySet::defaults_for(Role::Admin), CapabilitySet::all());
    }

    #[rstest]
    #[case("")]
    #[case("superuser")]
    fn unknown_role_uses_inspector_table(#[case] role: &str) {
        assert_eq!(
            defaults_for(role),
            CapabilitySet::defaults_for(Role::Inspector)
        );
    }

    #[rstest]
    fn override_replaces_defaults() {
        let mut custom = PermissionOverride::default();
        custom.set(Capability::ViewReports, true);

        let resolved = effective_permissions("admin", Some(&custom));

        assert_eq!(resolved, CapabilitySet::granting(&[Capability::ViewReports]));
        assert!(!resolved.allows(Capability::ManageUsers));
    }

    #[rstest]
    fn empty_override_falls_back_to_defaults() {
        let resolved = effective_permissions("supervisor", Some(&PermissionOverride::default()));
        assert_eq!(resolved, CapabilitySet::defaults_for(Role::Supervisor));
    }

    #[rstest]
    fn missing_override_uses_defaults() {
        assert_eq!(
            effective_permissions("viewer", None),
            CapabilitySet::defaults_for(Role::Viewer)
        );
    }

    #[rstest]
    fn require_capability_passes_when_granted() {
        let claim = claim_with(CapabilitySet::granting(&[Capability::CreateTemplates]));
        assert!(require_capability(&claim, Capability::CreateTemplates).is_ok());
    }

    #[rstest]
    fn require_capability_forbids_when_missing() {
        let claim = claim_with(CapabilitySet::defaults_for(Role::Inspector));
        let error = require_capability(&claim, Capability::CreateTemplates)
            .expect_err("inspectors cannot create templates");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }
}
