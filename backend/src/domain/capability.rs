//! Capability catalogue, resolved capability sets, and per-user overrides.
//!
//! The catalogue is closed: [`CapabilitySet`] and [`PermissionOverride`]
//! carry one field per [`Capability`], so a set can never mention a name the
//! resolver does not know about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raised when parsing a capability name that is not in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capability: {0}")]
pub struct UnknownCapability(pub String);

macro_rules! define_capabilities {
    ($( $(#[$meta:meta])* $variant:ident => $field:ident ),* $(,)?) => {
        /// Named boolean permission.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            ToSchema,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum Capability {
            $( $(#[$meta])* $variant, )*
        }

        impl Capability {
            /// Every capability in catalogue order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Wire name of the capability.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($field),)*
                }
            }
        }

        impl FromStr for Capability {
            type Err = UnknownCapability;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($field) => Ok(Self::$variant),)*
                    other => Err(UnknownCapability(other.to_owned())),
                }
            }
        }

        /// Resolved permissions: a total map from every capability to a flag.
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
        )]
        pub struct CapabilitySet {
            $( pub $field: bool, )*
        }

        impl CapabilitySet {
            /// Whether `capability` is granted.
            #[must_use]
            pub const fn allows(&self, capability: Capability) -> bool {
                match capability {
                    $(Capability::$variant => self.$field,)*
                }
            }

            /// Set the flag for `capability`.
            pub fn set(&mut self, capability: Capability, allowed: bool) {
                match capability {
                    $(Capability::$variant => self.$field = allowed,)*
                }
            }
        }

        /// Per-user replacement for role defaults.
        ///
        /// `None` means the flag was not stored, which is distinct from an
        /// explicit `Some(false)`. Names outside the catalogue are rejected so a
        /// stored override can never decode as empty.
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(deny_unknown_fields)]
        pub struct PermissionOverride {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<bool>,
            )*
        }

        impl PermissionOverride {
            /// Stored flag for `capability`, if any.
            #[must_use]
            pub const fn get(&self, capability: Capability) -> Option<bool> {
                match capability {
                    $(Capability::$variant => self.$field,)*
                }
            }

            /// Record an explicit flag for `capability`.
            pub fn set(&mut self, capability: Capability, allowed: bool) {
                match capability {
                    $(Capability::$variant => self.$field = Some(allowed),)*
                }
            }
        }
    };
}

define_capabilities! {
    /// Start a new inspection.
    CreateInspection => create_inspection,
    /// Read inspections the user performed.
    ViewOwnInspections => view_own_inspections,
    /// Read every inspection in the organisation.
    ViewAllInspections => view_all_inspections,
    /// Modify inspections.
    EditInspections => edit_inspections,
    /// Remove inspections.
    DeleteInspections => delete_inspections,
    /// Create templates and duplicate existing ones.
    CreateTemplates => create_templates,
    /// Publish new template versions.
    EditTemplates => edit_templates,
    /// Soft-delete template versions.
    DeleteTemplates => delete_templates,
    /// Administer organisation members.
    ManageUsers => manage_users,
    /// Read reports.
    ViewReports => view_reports,
    /// Export reports.
    ExportReports => export_reports,
    /// Attach files.
    UploadFiles => upload_files,
    /// Configure notifications.
    ManageNotifications => manage_notifications,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CapabilitySet {
    /// Set with exactly `granted` enabled.
    #[must_use]
    pub fn granting(granted: &[Capability]) -> Self {
        let mut set = Self::default();
        for capability in granted {
            set.set(*capability, true);
        }
        set
    }

    /// Set with every capability enabled.
    #[must_use]
    pub fn all() -> Self {
        Self::granting(Capability::ALL)
    }

    /// Capabilities currently granted, in catalogue order.
    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .iter()
            .copied()
            .filter(|capability| self.allows(*capability))
    }
}

impl PermissionOverride {
    /// Whether no flag is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Capability::ALL
            .iter()
            .all(|capability| self.get(*capability).is_none())
    }

    /// Materialise the override; absent flags become `false`.
    #[must_use]
    pub fn to_capability_set(&self) -> CapabilitySet {
        let mut set = CapabilitySet::default();
        for capability in Capability::ALL {
            set.set(*capability, self.get(*capability).unwrap_or(false));
        }
        set
    }
}
