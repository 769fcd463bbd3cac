//! Inspection template versions and their lineage.
//!
//! A lineage is a chain of [`Template`] rows linked by `parent_template_id`.
//! The root is version 1 and its id doubles as the `lineage_id` stamped on
//! every row of the chain. At most one active row per lineage carries
//! `is_latest_version`; versions are contiguous from 1.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::identifier::define_uuid_id;
use super::{OrganizationId, OrganizationScoped, UserId};

define_uuid_id! {
    /// Template row identifier. The root row's id also names its lineage.
    TemplateId => "template id"
}

/// Validation errors raised while building template content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateValidationError {
    /// Name was blank once trimmed.
    #[error("template name must not be empty")]
    EmptyName,
    /// Schema was not a JSON array.
    #[error("fields schema must be a JSON array")]
    SchemaNotArray,
    /// Schema array had no entries.
    #[error("fields schema must define at least one field")]
    EmptySchema,
    /// A schema entry was not a JSON object.
    #[error("field {index} must be an object")]
    FieldNotObject {
        /// Position of the offending entry.
        index: usize,
    },
    /// A schema entry lacked a non-empty string `name`.
    #[error("field {index} must have a non-empty name")]
    FieldMissingName {
        /// Position of the offending entry.
        index: usize,
    },
    /// A schema entry lacked a non-empty string `type`.
    #[error("field {index} must have a non-empty type")]
    FieldMissingType {
        /// Position of the offending entry.
        index: usize,
    },
    /// Two entries shared a name.
    #[error("field name {name} is defined more than once")]
    DuplicateFieldName {
        /// Repeated field name.
        name: String,
    },
}

/// Validated list of field definitions.
///
/// Each entry is an object with non-empty, unique `name` and a non-empty
/// `type`; any other keys are carried through untouched. A schema never
/// changes once stored on a row: publishing a change creates a new version.
///
/// # Examples
/// ```
/// use inspection_backend::domain::FieldsSchema;
/// use serde_json::json;
///
/// let schema = FieldsSchema::new(json!([{ "name": "roof", "type": "text" }]))
///     .expect("valid schema");
/// assert_eq!(schema.field_names(), vec!["roof"]);
/// assert!(FieldsSchema::new(json!([])).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct FieldsSchema(Value);

impl FieldsSchema {
    /// Validate a raw schema document.
    pub fn new(raw: Value) -> Result<Self, TemplateValidationError> {
        let entries = raw
            .as_array()
            .ok_or(TemplateValidationError::SchemaNotArray)?;
        if entries.is_empty() {
            return Err(TemplateValidationError::EmptySchema);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let object = entry
                .as_object()
                .ok_or(TemplateValidationError::FieldNotObject { index })?;
            let name = non_empty_str(object.get("name"))
                .ok_or(TemplateValidationError::FieldMissingName { index })?;
            non_empty_str(object.get("type"))
                .ok_or(TemplateValidationError::FieldMissingType { index })?;
            if !seen.insert(name) {
                return Err(TemplateValidationError::DuplicateFieldName {
                    name: name.to_owned(),
                });
            }
        }

        Ok(Self(raw))
    }

    /// Borrow the schema document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.0
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("name").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

impl TryFrom<Value> for FieldsSchema {
    type Error = TemplateValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FieldsSchema> for Value {
    fn from(value: FieldsSchema) -> Self {
        value.0
    }
}

/// Whether a row is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleState {
    /// Row is visible to reads.
    Active,
    /// Row was soft-deleted and is hidden from every read.
    Deleted {
        /// Deletion instant.
        deleted_at: DateTime<Utc>,
    },
}

impl LifecycleState {
    /// Whether the row is still visible.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Deletion instant, if deleted.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { deleted_at } => Some(*deleted_at),
        }
    }
}

/// Unvalidated template content supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    /// Display name.
    pub name: String,
    /// Optional long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional grouping label.
    #[serde(default)]
    pub category: Option<String>,
    /// Raw field definitions.
    pub fields_schema: Value,
}

/// Validated template content shared by every row constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateContent {
    /// Trimmed, non-empty display name.
    pub name: String,
    /// Description; blank input is stored as `None`.
    pub description: Option<String>,
    /// Category; blank input is stored as `None`.
    pub category: Option<String>,
    /// Validated schema.
    pub fields_schema: FieldsSchema,
}

impl TemplateDraft {
    /// Validate the draft into storable content.
    pub fn validate(self) -> Result<TemplateContent, TemplateValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(TemplateValidationError::EmptyName);
        }
        Ok(TemplateContent {
            name: name.to_owned(),
            description: blank_to_none(self.description),
            category: blank_to_none(self.category),
            fields_schema: FieldsSchema::new(self.fields_schema)?,
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Partial changes applied on top of the latest version when publishing.
///
/// Absent fields carry the previous version's value forward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    /// Replacement name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement category.
    #[serde(default)]
    pub category: Option<String>,
    /// Replacement schema.
    #[serde(default)]
    pub fields_schema: Option<Value>,
}

impl TemplateUpdate {
    /// Merge this update over `base`, validating the result.
    pub fn apply_to(self, base: &Template) -> Result<TemplateContent, TemplateValidationError> {
        TemplateDraft {
            name: self.name.unwrap_or_else(|| base.name.clone()),
            description: self.description.or_else(|| base.description.clone()),
            category: self.category.or_else(|| base.category.clone()),
            fields_schema: self
                .fields_schema
                .unwrap_or_else(|| base.fields_schema.as_value().clone()),
        }
        .validate()
    }
}

/// One version row of a template lineage.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Row id.
    pub id: TemplateId,
    /// Owning organisation.
    pub organization_id: OrganizationId,
    /// Id of the lineage root (version 1).
    pub lineage_id: TemplateId,
    /// Display name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Optional grouping label.
    pub category: Option<String>,
    /// Field definitions; immutable for this row.
    pub fields_schema: FieldsSchema,
    /// Position in the lineage, starting at 1.
    pub version: u32,
    /// Immediately preceding version; `None` for the root.
    pub parent_template_id: Option<TemplateId>,
    /// Whether this row is the lineage's current version.
    pub is_latest_version: bool,
    /// Free-form notes describing the change.
    pub version_notes: Option<String>,
    /// User who created this row.
    pub created_by: UserId,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
    /// Visibility.
    pub state: LifecycleState,
}

impl Template {
    /// Start a new lineage at version 1.
    #[must_use]
    pub fn root(
        organization_id: OrganizationId,
        created_by: UserId,
        content: TemplateContent,
        now: DateTime<Utc>,
    ) -> Self {
        let id = TemplateId::random();
        Self {
            id,
            organization_id,
            lineage_id: id,
            name: content.name,
            description: content.description,
            category: content.category,
            fields_schema: content.fields_schema,
            version: 1,
            parent_template_id: None,
            is_latest_version: true,
            version_notes: None,
            created_by,
            created_at: now,
            updated_at: now,
            state: LifecycleState::Active,
        }
    }

    /// Build the row that follows `self` in its lineage.
    ///
    /// Blank or missing notes become `"Version N"`.
    #[must_use]
    pub fn successor(
        &self,
        created_by: UserId,
        content: TemplateContent,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let version = self.version.saturating_add(1);
        let version_notes =
            blank_to_none(notes).unwrap_or_else(|| default_version_notes(version));
        Self {
            id: TemplateId::random(),
            organization_id: self.organization_id,
            lineage_id: self.lineage_id,
            name: content.name,
            description: content.description,
            category: content.category,
            fields_schema: content.fields_schema,
            version,
            parent_template_id: Some(self.id),
            is_latest_version: true,
            version_notes: Some(version_notes),
            created_by,
            created_at: now,
            updated_at: now,
            state: LifecycleState::Active,
        }
    }

    /// Copy this row's content into a new lineage owned by `organization_id`.
    #[must_use]
    pub fn duplicate_into(
        &self,
        organization_id: OrganizationId,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self::root(
            organization_id,
            created_by,
            TemplateContent {
                name: self.name.clone(),
                description: self.description.clone(),
                category: self.category.clone(),
                fields_schema: self.fields_schema.clone(),
            },
            now,
        )
    }

    /// Whether the row is still visible.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Whether this row is the root of its lineage.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_template_id.is_none()
    }
}

/// Placeholder notes used when a publish supplies none.
#[must_use]
pub fn default_version_notes(version: u32) -> String {
    format!("Version {version}")
}

impl OrganizationScoped for Template {
    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

#[cfg(test)]
mod tests;
