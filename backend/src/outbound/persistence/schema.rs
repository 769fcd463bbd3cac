//! Diesel table definitions.
//!
//! Kept in step with `backend/migrations`; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Versioned inspection templates. Every row of a lineage carries the
    /// root's id in `lineage_id`.
    templates (id) {
        id -> Uuid,
        organization_id -> Uuid,
        lineage_id -> Uuid,
        name -> Text,
        description -> Nullable<Text>,
        category -> Nullable<Text>,
        fields_schema -> Jsonb,
        /// Starts at 1; unique per lineage.
        version -> Int4,
        parent_template_id -> Nullable<Uuid>,
        /// At most one `true` per lineage (partial unique index).
        is_latest_version -> Bool,
        version_notes -> Nullable<Text>,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        /// Set when soft-deleted; `NULL` rows are active.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Accounts resolved during sign-in.
    user_accounts (id) {
        id -> Uuid,
        organization_id -> Uuid,
        /// Lower-cased, unique.
        email -> Text,
        /// Raw stored role; may be empty.
        role -> Text,
        permission_override -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}
