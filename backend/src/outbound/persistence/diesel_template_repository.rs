//! PostgreSQL-backed [`TemplateRepository`].
//!
//! Every read conjoins `deleted_at IS NULL` and, apart from
//! [`TemplateRepository::find_source`], the caller's organisation id.
//! Publishing retires the expected latest row with a guarded `UPDATE` and
//! inserts the successor inside one transaction; the partial unique index on
//! `(lineage_id) WHERE is_latest_version` backs the guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{TemplateRepository, TemplateRepositoryError};
use crate::domain::{
    FieldsSchema, LifecycleState, OrganizationId, OrganizationScope, Template, TemplateId, UserId,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{NewTemplateRow, TemplateRow};
use super::pool::{DbPool, PoolError};
use super::schema::templates;

/// Diesel implementation of [`TemplateRepository`].
#[derive(Clone)]
pub struct DieselTemplateRepository {
    pool: DbPool,
}

impl DieselTemplateRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TemplateRepositoryError {
    map_basic_pool_error(error, TemplateRepositoryError::connection)
}

fn map_diesel_error(error: DieselError) -> TemplateRepositoryError {
    map_basic_diesel_error(
        error,
        TemplateRepositoryError::query,
        TemplateRepositoryError::connection,
    )
}

/// Why a publish transaction rolled back.
enum PublishFailure {
    /// The expected row was no longer the active latest version.
    Stale,
    Database(DieselError),
}

impl From<DieselError> for PublishFailure {
    fn from(error: DieselError) -> Self {
        Self::Database(error)
    }
}

fn version_to_db(version: u32) -> Result<i32, TemplateRepositoryError> {
    i32::try_from(version)
        .map_err(|_| TemplateRepositoryError::query(format!("version {version} out of range")))
}

fn row_to_template(row: TemplateRow) -> Result<Template, TemplateRepositoryError> {
    let version = u32::try_from(row.version).map_err(|_| {
        TemplateRepositoryError::query(format!("stored version {} is negative", row.version))
    })?;
    let fields_schema = FieldsSchema::new(row.fields_schema).map_err(|err| {
        TemplateRepositoryError::query(format!("stored schema for {} is invalid: {err}", row.id))
    })?;
    let state = match row.deleted_at {
        None => LifecycleState::Active,
        Some(deleted_at) => LifecycleState::Deleted { deleted_at },
    };

    Ok(Template {
        id: TemplateId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        lineage_id: TemplateId::from_uuid(row.lineage_id),
        name: row.name,
        description: row.description,
        category: row.category,
        fields_schema,
        version,
        parent_template_id: row.parent_template_id.map(TemplateId::from_uuid),
        is_latest_version: row.is_latest_version,
        version_notes: row.version_notes,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
        state,
    })
}

fn template_to_row(template: &Template) -> Result<NewTemplateRow<'_>, TemplateRepositoryError> {
    Ok(NewTemplateRow {
        id: *template.id.as_uuid(),
        organization_id: *template.organization_id.as_uuid(),
        lineage_id: *template.lineage_id.as_uuid(),
        name: &template.name,
        description: template.description.as_deref(),
        category: template.category.as_deref(),
        fields_schema: template.fields_schema.as_value(),
        version: version_to_db(template.version)?,
        parent_template_id: template.parent_template_id.map(|id| *id.as_uuid()),
        is_latest_version: template.is_latest_version,
        version_notes: template.version_notes.as_deref(),
        created_by: *template.created_by.as_uuid(),
        created_at: template.created_at,
        updated_at: template.updated_at,
        deleted_at: template.state.deleted_at(),
    })
}

fn rows_to_templates(rows: Vec<TemplateRow>) -> Result<Vec<Template>, TemplateRepositoryError> {
    rows.into_iter().map(row_to_template).collect()
}

#[async_trait]
impl TemplateRepository for DieselTemplateRepository {
    async fn insert(&self, template: &Template) -> Result<(), TemplateRepositoryError> {
        let row = template_to_row(template)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(templates::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        scope: &OrganizationScope,
        id: &TemplateId,
    ) -> Result<Option<Template>, TemplateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TemplateRow> = templates::table
            .filter(templates::id.eq(id.as_uuid()))
            .filter(templates::organization_id.eq(scope.organization_id().as_uuid()))
            .filter(templates::deleted_at.is_null())
            .select(TemplateRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_template).transpose()
    }

    async fn find_source(
        &self,
        id: &TemplateId,
    ) -> Result<Option<Template>, TemplateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TemplateRow> = templates::table
            .filter(templates::id.eq(id.as_uuid()))
            .filter(templates::deleted_at.is_null())
            .select(TemplateRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_template).transpose()
    }

    async fn find_version(
        &self,
        scope: &OrganizationScope,
        lineage_id: &TemplateId,
        version: u32,
    ) -> Result<Option<Template>, TemplateRepositoryError> {
        let version = version_to_db(version)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TemplateRow> = templates::table
            .filter(templates::lineage_id.eq(lineage_id.as_uuid()))
            .filter(templates::version.eq(version))
            .filter(templates::organization_id.eq(scope.organization_id().as_uuid()))
            .filter(templates::deleted_at.is_null())
            .select(TemplateRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_template).transpose()
    }

    async fn find_latest(
        &self,
        scope: &OrganizationScope,
        lineage_id: &TemplateId,
    ) -> Result<Option<Template>, TemplateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TemplateRow> = templates::table
            .filter(templates::lineage_id.eq(lineage_id.as_uuid()))
            .filter(templates::is_latest_version.eq(true))
            .filter(templates::organization_id.eq(scope.organization_id().as_uuid()))
            .filter(templates::deleted_at.is_null())
            .select(TemplateRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_template).transpose()
    }

    async fn list_lineage(
        &self,
        scope: &OrganizationScope,
        lineage_id: &TemplateId,
    ) -> Result<Vec<Template>, TemplateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TemplateRow> = templates::table
            .filter(templates::lineage_id.eq(lineage_id.as_uuid()))
            .filter(templates::organization_id.eq(scope.organization_id().as_uuid()))
            .filter(templates::deleted_at.is_null())
            .order(templates::version.asc())
            .select(TemplateRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_templates(rows)
    }

    async fn list_categories(
        &self,
        scope: &OrganizationScope,
    ) -> Result<Vec<String>, TemplateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let categories: Vec<Option<String>> = templates::table
            .filter(templates::organization_id.eq(scope.organization_id().as_uuid()))
            .filter(templates::deleted_at.is_null())
            .filter(templates::category.is_not_null())
            .filter(templates::category.ne(""))
            .select(templates::category)
            .distinct()
            .order(templates::category.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(categories.into_iter().flatten().collect())
    }

    async fn publish_version(
        &self,
        expected_latest: &Template,
        next: &Template,
    ) -> Result<(), TemplateRepositoryError> {
        let next_row = template_to_row(next)?;
        let expected_id = *expected_latest.id.as_uuid();
        let expected_version = version_to_db(expected_latest.version)?;
        let lineage_id = *next.lineage_id.as_uuid();
        let retired_at = next.created_at;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction::<_, PublishFailure, _>(|conn| {
                async move {
                    let retired = diesel::update(
                        templates::table
                            .filter(templates::id.eq(expected_id))
                            .filter(templates::lineage_id.eq(lineage_id))
                            .filter(templates::version.eq(expected_version))
                            .filter(templates::is_latest_version.eq(true))
                            .filter(templates::deleted_at.is_null()),
                    )
                    .set((
                        templates::is_latest_version.eq(false),
                        templates::updated_at.eq(retired_at),
                    ))
                    .execute(conn)
                    .await?;

                    if retired == 0 {
                        return Err(PublishFailure::Stale);
                    }

                    diesel::insert_into(templates::table)
                        .values(&next_row)
                        .execute(conn)
                        .await?;
                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        let conflict = || {
            TemplateRepositoryError::version_conflict(
                expected_latest.lineage_id.to_string(),
                expected_latest.version,
            )
        };
        match outcome {
            Ok(()) => Ok(()),
            Err(PublishFailure::Stale) => {
                debug!(lineage_id = %expected_latest.lineage_id, "publish lost the latest-row swap");
                Err(conflict())
            }
            Err(PublishFailure::Database(err)) if is_unique_violation(&err) => {
                debug!(lineage_id = %expected_latest.lineage_id, "publish hit a lineage unique index");
                Err(conflict())
            }
            Err(PublishFailure::Database(err)) => Err(map_diesel_error(err)),
        }
    }

    async fn soft_delete(
        &self,
        scope: &OrganizationScope,
        id: &TemplateId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, TemplateRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changed = diesel::update(
            templates::table
                .filter(templates::id.eq(id.as_uuid()))
                .filter(templates::organization_id.eq(scope.organization_id().as_uuid()))
                .filter(templates::deleted_at.is_null()),
        )
        .set((
            templates::deleted_at.eq(Some(deleted_at)),
            templates::updated_at.eq(deleted_at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(changed > 0)
    }
}
