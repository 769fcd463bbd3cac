//! Driving port for template lineage mutations.
//!
//! Inbound adapters build these requests from a verified identity claim and
//! the raw payload; capability checks happen before the port is called.

use async_trait::async_trait;

use crate::domain::{
    Error, OrganizationScope, Template, TemplateDraft, TemplateId, TemplateUpdate, UserId,
};

/// Request to start a new lineage at version 1.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTemplateRequest {
    /// Tenant the new lineage belongs to.
    pub scope: OrganizationScope,
    /// Recorded as the creator of version 1.
    pub created_by: UserId,
    /// Content of version 1.
    pub draft: TemplateDraft,
}

/// Request to publish the next version of the lineage containing
/// `template_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishTemplateVersionRequest {
    /// Tenant the lineage must belong to.
    pub scope: OrganizationScope,
    /// Any row of the lineage; the lineage's latest row is the base.
    pub template_id: TemplateId,
    /// Recorded as the creator of the new version.
    pub author: UserId,
    /// Fields replacing those of the base version.
    pub updates: TemplateUpdate,
    /// Free-text release notes for the new version.
    pub notes: Option<String>,
    /// Version the caller edited. When set, a different latest version
    /// fails with `Conflict` before anything is written.
    pub expected_version: Option<u32>,
}

/// Request to copy a template into a new lineage in the caller's
/// organisation.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateTemplateRequest {
    /// Tenant receiving the copy.
    pub scope: OrganizationScope,
    /// Row whose content is copied.
    pub source_id: TemplateId,
    /// Recorded as the creator of the copy.
    pub created_by: UserId,
}

/// Request to soft-delete a single template row.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteTemplateRequest {
    /// Tenant the row must belong to.
    pub scope: OrganizationScope,
    /// Row to hide from reads.
    pub template_id: TemplateId,
}

/// Template lineage mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateCommand: Send + Sync {
    /// Create version 1 of a new lineage.
    async fn create(&self, request: CreateTemplateRequest) -> Result<Template, Error>;

    /// Publish the next version of a lineage.
    async fn publish_new_version(
        &self,
        request: PublishTemplateVersionRequest,
    ) -> Result<Template, Error>;

    /// Copy a template into a fresh lineage.
    async fn duplicate(&self, request: DuplicateTemplateRequest) -> Result<Template, Error>;

    /// Soft-delete one row.
    async fn delete(&self, request: DeleteTemplateRequest) -> Result<(), Error>;
}
