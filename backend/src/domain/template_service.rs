//! Template lineage service.
//!
//! Implements the template command and query driving ports over a
//! [`TemplateRepository`]. Lineage invariants are enforced here and at the
//! repository's compare-and-swap boundary: creation starts a lineage at
//! version 1, publishing advances it by exactly one, and a stale read never
//! produces a second latest row.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    CreateTemplateRequest, DeleteTemplateRequest, DuplicateTemplateRequest,
    PublishTemplateVersionRequest, TemplateCommand, TemplateQuery, TemplateRepository,
    TemplateRepositoryError,
};
use crate::domain::{Error, OrganizationScope, Template, TemplateId, TemplateValidationError};

fn map_repository_error(error: TemplateRepositoryError) -> Error {
    match error {
        TemplateRepositoryError::VersionConflict {
            lineage_id,
            expected,
        } => {
            warn!(%lineage_id, expected, "concurrent publish lost the race");
            Error::conflict("template lineage was modified concurrently; retry").with_details(
                json!({
                    "lineageId": lineage_id,
                    "expectedVersion": expected,
                    "code": "version_conflict",
                }),
            )
        }
        other => Error::from(other),
    }
}

fn map_validation_error(error: TemplateValidationError) -> Error {
    Error::invalid_request(format!("invalid template: {error}"))
}

fn stale_version(lineage_id: TemplateId, expected: u32, actual: u32) -> Error {
    Error::conflict("template lineage has moved on").with_details(json!({
        "lineageId": lineage_id.to_string(),
        "expectedVersion": expected,
        "actualVersion": actual,
        "code": "version_mismatch",
    }))
}

fn template_not_found(id: TemplateId) -> Error {
    Error::not_found(format!("template {id} not found"))
}

/// Whether copying `source` into `scope` reads another tenant's content.
fn crosses_tenants(source: &Template, scope: &OrganizationScope) -> bool {
    source.organization_id != scope.organization_id()
}

fn lineage_not_found(lineage_id: TemplateId) -> Error {
    Error::not_found(format!("template lineage {lineage_id} has no current version"))
}

/// Owns the lifecycle of template lineages.
#[derive(Clone)]
pub struct TemplateVersionManager<R> {
    templates: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> TemplateVersionManager<R> {
    /// Create a manager over `templates`, stamping rows with `clock`.
    pub fn new(templates: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { templates, clock }
    }
}

impl<R> TemplateVersionManager<R>
where
    R: TemplateRepository,
{
    async fn require(
        &self,
        scope: &OrganizationScope,
        id: TemplateId,
    ) -> Result<Template, Error> {
        self.templates
            .find_by_id(scope, &id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| template_not_found(id))
    }

    async fn require_latest(
        &self,
        scope: &OrganizationScope,
        lineage_id: TemplateId,
    ) -> Result<Template, Error> {
        self.templates
            .find_latest(scope, &lineage_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| lineage_not_found(lineage_id))
    }
}

#[async_trait]
impl<R> TemplateCommand for TemplateVersionManager<R>
where
    R: TemplateRepository,
{
    async fn create(&self, request: CreateTemplateRequest) -> Result<Template, Error> {
        let content = request.draft.validate().map_err(map_validation_error)?;
        let template = Template::root(
            request.scope.organization_id(),
            request.created_by,
            content,
            self.clock.utc(),
        );

        self.templates
            .insert(&template)
            .await
            .map_err(map_repository_error)?;

        info!(
            template_id = %template.id,
            organization_id = %template.organization_id,
            "template lineage created"
        );
        Ok(template)
    }

    async fn publish_new_version(
        &self,
        request: PublishTemplateVersionRequest,
    ) -> Result<Template, Error> {
        let PublishTemplateVersionRequest {
            scope,
            template_id,
            author,
            updates,
            notes,
            expected_version,
        } = request;

        let anchor = self.require(&scope, template_id).await?;
        let latest = self.require_latest(&scope, anchor.lineage_id).await?;

        if let Some(expected) = expected_version.filter(|expected| *expected != latest.version) {
            return Err(stale_version(latest.lineage_id, expected, latest.version));
        }

        let content = updates.apply_to(&latest).map_err(map_validation_error)?;
        let next = latest.successor(author, content, notes, self.clock.utc());

        self.templates
            .publish_version(&latest, &next)
            .await
            .map_err(map_repository_error)?;

        info!(
            lineage_id = %next.lineage_id,
            version = next.version,
            "template version published"
        );
        Ok(next)
    }

    async fn duplicate(&self, request: DuplicateTemplateRequest) -> Result<Template, Error> {
        let source = self
            .templates
            .find_source(&request.source_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| template_not_found(request.source_id))?;

        if crosses_tenants(&source, &request.scope) {
            warn!(
                source_id = %source.id,
                source_organization_id = %source.organization_id,
                organization_id = %request.scope.organization_id(),
                user_id = %request.created_by,
                "cross-tenant template read via duplicate"
            );
        }

        let copy = source.duplicate_into(
            request.scope.organization_id(),
            request.created_by,
            self.clock.utc(),
        );
        self.templates
            .insert(&copy)
            .await
            .map_err(map_repository_error)?;

        info!(
            source_id = %source.id,
            template_id = %copy.id,
            organization_id = %copy.organization_id,
            "template duplicated into new lineage"
        );
        Ok(copy)
    }

    async fn delete(&self, request: DeleteTemplateRequest) -> Result<(), Error> {
        let changed = self
            .templates
            .soft_delete(&request.scope, &request.template_id, self.clock.utc())
            .await
            .map_err(map_repository_error)?;
        if !changed {
            return Err(template_not_found(request.template_id));
        }
        info!(template_id = %request.template_id, "template soft-deleted");
        Ok(())
    }
}

#[async_trait]
impl<R> TemplateQuery for TemplateVersionManager<R>
where
    R: TemplateRepository,
{
    async fn get(
        &self,
        scope: OrganizationScope,
        template_id: TemplateId,
    ) -> Result<Template, Error> {
        self.require(&scope, template_id).await
    }

    async fn get_by_version(
        &self,
        scope: OrganizationScope,
        lineage_id: TemplateId,
        version: u32,
    ) -> Result<Template, Error> {
        self.templates
            .find_version(&scope, &lineage_id, version)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!(
                    "version {version} of template lineage {lineage_id} not found"
                ))
            })
    }

    async fn get_latest(
        &self,
        scope: OrganizationScope,
        lineage_id: TemplateId,
    ) -> Result<Template, Error> {
        self.require_latest(&scope, lineage_id).await
    }

    async fn list_versions(
        &self,
        scope: OrganizationScope,
        lineage_id: TemplateId,
    ) -> Result<Vec<Template>, Error> {
        let versions = self
            .templates
            .list_lineage(&scope, &lineage_id)
            .await
            .map_err(map_repository_error)?;
        if versions.is_empty() {
            return Err(Error::not_found(format!(
                "template lineage {lineage_id} not found"
            )));
        }
        Ok(versions)
    }

    async fn list_categories(&self, scope: OrganizationScope) -> Result<Vec<String>, Error> {
        self.templates
            .list_categories(&scope)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "template_service_tests.rs"]
mod tests;
