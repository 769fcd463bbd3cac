//! UUID-backed identifier newtypes.
//!
//! Each identifier rejects blank, padded, or non-UUID input and keeps the
//! caller's canonical string form for display and serialisation.

/// Validation errors raised when parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierValidationError {
    /// Input was empty.
    #[error("{kind} must not be empty")]
    Empty {
        /// Human-readable identifier kind.
        kind: &'static str,
    },
    /// Input was not a UUID.
    #[error("{kind} must be a valid UUID")]
    Invalid {
        /// Human-readable identifier kind.
        kind: &'static str,
    },
}

macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Parse an identifier from its string form.
            pub fn new(
                id: impl AsRef<str>,
            ) -> Result<Self, $crate::domain::identifier::IdentifierValidationError> {
                let raw = id.as_ref();
                if raw.is_empty() {
                    return Err($crate::domain::identifier::IdentifierValidationError::Empty {
                        kind: $kind,
                    });
                }
                if raw.trim() != raw {
                    return Err($crate::domain::identifier::IdentifierValidationError::Invalid {
                        kind: $kind,
                    });
                }
                ::uuid::Uuid::parse_str(raw).map(Self).map_err(|_| {
                    $crate::domain::identifier::IdentifierValidationError::Invalid { kind: $kind }
                })
            }

            /// Generate a random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::domain::identifier::IdentifierValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::domain::identifier::IdentifierValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }
    };
}

pub(crate) use define_uuid_id;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::IdentifierValidationError;

    define_uuid_id! {
        /// Identifier used only by these tests.
        SampleId => "sample id"
    }

    #[rstest]
    #[case("", IdentifierValidationError::Empty { kind: "sample id" })]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", IdentifierValidationError::Invalid { kind: "sample id" })]
    #[case("not-a-uuid", IdentifierValidationError::Invalid { kind: "sample id" })]
    fn rejects_bad_input(#[case] raw: &str, #[case] expected: IdentifierValidationError) {
        assert_eq!(SampleId::new(raw), Err(expected));
    }

    #[rstest]
    fn serde_uses_the_string_form() {
        let id = SampleId::random();
        let json = serde_json::to_string(&id).expect("serialise id");
        assert_eq!(json, format!("\"{id}\""));
        let back: SampleId = serde_json::from_str(&json).expect("deserialise id");
        assert_eq!(back, id);
    }

    #[rstest]
    fn deserialising_garbage_fails() {
        let result = serde_json::from_str::<SampleId>("\"nope\"");
        assert!(result.is_err());
    }
}
