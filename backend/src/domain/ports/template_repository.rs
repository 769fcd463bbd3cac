//! Port for template lineage persistence.
//!
//! Reads only ever return active rows. Every read except
//! [`TemplateRepository::find_source`] is confined to an
//! [`OrganizationScope`]. [`TemplateRepository::publish_version`] is the
//! compare-and-swap boundary for a lineage's latest pointer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{OrganizationScope, Template, TemplateId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by template repository adapters.
    pub enum TemplateRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            ServiceUnavailable("template repository connection failed: {message}"),
        /// Query or mutation failed during execution.
        Query { message: String } =>
            InternalError("template repository query failed: {message}"),
        /// The lineage's latest row was no longer the one the caller read.
        VersionConflict { lineage_id: String, expected: u32 } =>
            Conflict("template lineage {lineage_id} is no longer at version {expected}"),
    }
}

/// Storage for template rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Insert a brand-new row, typically a lineage root.
    async fn insert(&self, template: &Template) -> Result<(), TemplateRepositoryError>;

    /// Active row by id within `scope`.
    async fn find_by_id(
        &self,
        scope: &OrganizationScope,
        id: &TemplateId,
    ) -> Result<Option<Template>, TemplateRepositoryError>;

    /// Active row by id in any organisation; used only to read a
    /// duplication source.
    async fn find_source(
        &self,
        id: &TemplateId,
    ) -> Result<Option<Template>, TemplateRepositoryError>;

    /// Active row holding `version` of a lineage.
    async fn find_version(
        &self,
        scope: &OrganizationScope,
        lineage_id: &TemplateId,
        version: u32,
    ) -> Result<Option<Template>, TemplateRepositoryError>;

    /// Active row flagged as the lineage's latest version.
    async fn find_latest(
        &self,
        scope: &OrganizationScope,
        lineage_id: &TemplateId,
    ) -> Result<Option<Template>, TemplateRepositoryError>;

    /// Active rows of a lineage ordered by ascending version.
    async fn list_lineage(
        &self,
        scope: &OrganizationScope,
        lineage_id: &TemplateId,
    ) -> Result<Vec<Template>, TemplateRepositoryError>;

    /// Distinct non-empty categories of active rows, sorted ascending.
    async fn list_categories(
        &self,
        scope: &OrganizationScope,
    ) -> Result<Vec<String>, TemplateRepositoryError>;

    /// Atomically retire `expected_latest` and insert `next` as the new
    /// latest row.
    ///
    /// Fails with [`TemplateRepositoryError::VersionConflict`] unless
    /// `expected_latest` is still active, still flagged latest, and still at
    /// its recorded version when the swap runs. On failure nothing is
    /// written.
    async fn publish_version(
        &self,
        expected_latest: &Template,
        next: &Template,
    ) -> Result<(), TemplateRepositoryError>;

    /// Mark one active row deleted. Returns whether a row changed.
    ///
    /// Sibling rows keep their flags.
    async fn soft_delete(
        &self,
        scope: &OrganizationScope,
        id: &TemplateId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, TemplateRepositoryError>;
}
