//! Driving port for template lineage reads.

use async_trait::async_trait;

use crate::domain::{Error, OrganizationScope, Template, TemplateId};

/// Organisation-scoped template reads. Rows outside the scope and deleted
/// rows are reported as `NotFound`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateQuery: Send + Sync {
    /// Single row by id.
    async fn get(&self, scope: OrganizationScope, template_id: TemplateId)
    -> Result<Template, Error>;

    /// Exact version of a lineage.
    async fn get_by_version(
        &self,
        scope: OrganizationScope,
        lineage_id: TemplateId,
        version: u32,
    ) -> Result<Template, Error>;

    /// Row currently flagged latest.
    async fn get_latest(
        &self,
        scope: OrganizationScope,
        lineage_id: TemplateId,
    ) -> Result<Template, Error>;

    /// Version history, oldest first.
    async fn list_versions(
        &self,
        scope: OrganizationScope,
        lineage_id: TemplateId,
    ) -> Result<Vec<Template>, Error>;

    /// Distinct categories in use, sorted.
    async fn list_categories(&self, scope: OrganizationScope) -> Result<Vec<String>, Error>;
}
