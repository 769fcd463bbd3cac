//! Diesel row structs. Internal to the persistence adapters.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{templates, user_accounts};

/// Row read from `templates`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TemplateRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub lineage_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub fields_schema: serde_json::Value,
    pub version: i32,
    pub parent_template_id: Option<Uuid>,
    pub is_latest_version: bool,
    pub version_notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Row written to `templates`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = templates)]
pub(crate) struct NewTemplateRow<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub lineage_id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub fields_schema: &'a serde_json::Value,
    pub version: i32,
    pub parent_template_id: Option<Uuid>,
    pub is_latest_version: bool,
    pub version_notes: Option<&'a str>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Row read from `user_accounts`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserAccountRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role: String,
    pub permission_override: Option<serde_json::Value>,
}
