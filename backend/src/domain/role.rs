//! Role identifiers and the privilege hierarchy.
//!
//! Roles form the strict total order `viewer < inspector < supervisor <
//! admin`. Strings outside that set are rejected before they can influence
//! an authorisation decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Errors raised by [`Role::validate`] and [`Role::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleValidationError {
    /// Role string was empty where a role is required.
    #[error("role must not be empty")]
    Empty,
    /// Role string is not one of the four known roles.
    #[error("unrecognised role: {value}")]
    InvalidRole {
        /// Rejected input.
        value: String,
    },
}

/// Organisation role, ordered by privilege.
///
/// The derived `Ord` follows declaration order, which matches
/// [`Role::rank`].
///
/// # Examples
/// ```
/// use inspection_backend::domain::Role;
///
/// assert!(Role::Admin > Role::Viewer);
/// assert_eq!(Role::normalize("").expect("empty defaults"), Role::Inspector);
/// assert!(Role::normalize("root").is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only access.
    Viewer,
    /// Performs inspections.
    Inspector,
    /// Oversees inspectors and manages templates.
    Supervisor,
    /// Full administrative access.
    Admin,
}

impl Role {
    /// Every role, least privileged first.
    pub const ALL: [Self; 4] = [Self::Viewer, Self::Inspector, Self::Supervisor, Self::Admin];

    /// Role assigned when none is supplied.
    pub const DEFAULT: Self = Self::Inspector;

    /// Accept only a non-empty member of the fixed role set.
    pub fn validate(value: &str) -> Result<Self, RoleValidationError> {
        match value {
            "" => Err(RoleValidationError::Empty),
            "viewer" => Ok(Self::Viewer),
            "inspector" => Ok(Self::Inspector),
            "supervisor" => Ok(Self::Supervisor),
            "admin" => Ok(Self::Admin),
            other => Err(RoleValidationError::InvalidRole {
                value: other.to_owned(),
            }),
        }
    }

    /// Like [`Role::validate`], but empty input selects [`Role::DEFAULT`].
    pub fn normalize(value: &str) -> Result<Self, RoleValidationError> {
        if value.is_empty() {
            return Ok(Self::DEFAULT);
        }
        Self::validate(value)
    }

    /// Position in the hierarchy: viewer 0 through admin 3.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Viewer => 0,
            Self::Inspector => 1,
            Self::Supervisor => 2,
            Self::Admin => 3,
        }
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Inspector => "inspector",
            Self::Supervisor => "supervisor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)
    }
}

/// Whether role string `actual` is at least as privileged as `required`.
///
/// Authorisation checks fail closed: if either side is not a valid role the
/// answer is `false`, never an error.
///
/// # Examples
/// ```
/// use inspection_backend::domain::has_at_least_privilege;
///
/// assert!(has_at_least_privilege("admin", "viewer"));
/// assert!(!has_at_least_privilege("viewer", "admin"));
/// assert!(!has_at_least_privilege("bogus", "viewer"));
/// ```
#[must_use]
pub fn has_at_least_privilege(actual: &str, required: &str) -> bool {
    match (Role::validate(actual), Role::validate(required)) {
        (Ok(actual), Ok(required)) => actual.rank() >= required.rank(),
        _ => false,
    }
}
