//! User identity primitives and the stored account record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::identifier::define_uuid_id;
use super::{OrganizationId, OrganizationScoped, PermissionOverride};

define_uuid_id! {
    /// Stable user identifier stored as a UUID.
    UserId => "user id"
}

/// Validation errors returned by [`EmailAddress::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailValidationError {
    /// Address was blank once trimmed.
    #[error("email must not be empty")]
    Empty,
    /// Address lacked a local part, a domain, or contained whitespace.
    #[error("email must look like local@domain")]
    Malformed,
}

/// Email address, trimmed and lower-cased.
///
/// Only the shape `local@domain` is checked; deliverability is the identity
/// provider's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmailValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmailValidationError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(EmailValidationError::Malformed);
        }
        match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Self(trimmed.to_lowercase()))
            }
            _ => Err(EmailValidationError::Malformed),
        }
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Persisted user account as read by the authentication flow.
///
/// `role` stays the raw stored string: it is normalised only when a claim is
/// minted, so a corrupt row is rejected at sign-in instead of at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Account identifier.
    pub id: UserId,
    /// Owning organisation.
    pub organization_id: OrganizationId,
    /// Login email.
    pub email: EmailAddress,
    /// Stored role string.
    pub role: String,
    /// Optional per-user capability override.
    pub permission_override: Option<PermissionOverride>,
}

impl OrganizationScoped for UserAccount {
    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("  Ada@Example.COM ", "ada@example.com")]
    #[case("inspector@site.org", "inspector@site.org")]
    fn email_is_trimmed_and_lowercased(#[case] raw: &str, #[case] expected: &str) {
        let email = EmailAddress::new(raw).expect("valid email");
        assert_eq!(email.as_str(), expected);
    }

    #[rstest]
    #[case("", EmailValidationError::Empty)]
    #[case("   ", EmailValidationError::Empty)]
    #[case("no-at-sign", EmailValidationError::Malformed)]
    #[case("@example.com", EmailValidationError::Malformed)]
    #[case("ada@", EmailValidationError::Malformed)]
    #[case("a@b@c", EmailValidationError::Malformed)]
    #[case("ada lovelace@example.com", EmailValidationError::Malformed)]
    fn invalid_emails_are_rejected(#[case] raw: &str, #[case] expected: EmailValidationError) {
        assert_eq!(EmailAddress::new(raw), Err(expected));
    }

    #[rstest]
    fn user_id_round_trips_through_strings() {
        let id = UserId::random();
        let parsed = UserId::new(id.to_string()).expect("valid id");
        assert_eq!(parsed, id);
    }
}
