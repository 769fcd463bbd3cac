//! Template lineage HTTP handlers.
//!
//! ```text
//! POST   /api/v1/templates
//! GET    /api/v1/templates/categories
//! GET    /api/v1/templates/{id}
//! DELETE /api/v1/templates/{id}
//! POST   /api/v1/templates/{id}/versions
//! POST   /api/v1/templates/{id}/duplicate
//! GET    /api/v1/templates/lineages/{lineageId}/latest
//! GET    /api/v1/templates/lineages/{lineageId}/versions
//! GET    /api/v1/templates/lineages/{lineageId}/versions/{version}
//! ```
//!
//! Every handler scopes storage to the caller's organisation. Mutations
//! check a capability first; reads only need a verified token.

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::domain::ports::{
    CreateTemplateRequest, DeleteTemplateRequest, DuplicateTemplateRequest,
    PublishTemplateVersionRequest,
};
use crate::domain::{Capability, Error, Template, TemplateDraft, TemplateId, TemplateUpdate};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::state::HttpState;

/// Template version as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub organization_id: String,
    /// Id of version 1 of this lineage.
    #[schema(format = "uuid")]
    pub lineage_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub fields_schema: Value,
    pub version: u32,
    #[schema(format = "uuid")]
    pub parent_template_id: Option<String>,
    pub is_latest_version: bool,
    pub version_notes: Option<String>,
    #[schema(format = "uuid")]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Template> for TemplateResponse {
    fn from(value: Template) -> Self {
        Self {
            id: value.id.to_string(),
            organization_id: value.organization_id.to_string(),
            lineage_id: value.lineage_id.to_string(),
            name: value.name,
            description: value.description,
            category: value.category,
            fields_schema: value.fields_schema.into(),
            version: value.version,
            parent_template_id: value.parent_template_id.map(|id| id.to_string()),
            is_latest_version: value.is_latest_version,
            version_notes: value.version_notes,
            created_by: value.created_by.to_string(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Request payload for starting a new lineage.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Non-empty array of `{ "name", "type", ... }` field objects.
    #[schema(value_type = Vec<Object>)]
    pub fields_schema: Value,
}

impl From<CreateTemplateBody> for TemplateDraft {
    fn from(value: CreateTemplateBody) -> Self {
        Self {
            name: value.name,
            description: value.description,
            category: value.category,
            fields_schema: value.fields_schema,
        }
    }
}

/// Request payload for publishing a new version. Absent fields carry the
/// latest version's value forward.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishVersionBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub fields_schema: Option<Value>,
    /// Defaults to `"Version N"` when blank.
    #[serde(default)]
    pub version_notes: Option<String>,
    /// Version the client last read; a mismatch is rejected with 409.
    #[serde(default)]
    pub expected_version: Option<u32>,
}

impl PublishVersionBody {
    fn into_parts(self) -> (TemplateUpdate, Option<String>, Option<u32>) {
        let update = TemplateUpdate {
            name: self.name,
            description: self.description,
            category: self.category,
            fields_schema: self.fields_schema,
        };
        (update, self.version_notes, self.expected_version)
    }
}

/// Distinct categories visible to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// Path segment for a lineage version lookup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageVersionPath {
    pub lineage_id: String,
    pub version: u32,
}

fn parse_template_id(raw: &str, field: &'static str) -> Result<TemplateId, Error> {
    TemplateId::new(raw).map_err(|err| {
        Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
            "field": field,
            "value": raw,
            "code": "invalid_uuid",
            "reason": err.to_string(),
        }))
    })
}

/// Start a new template lineage at version 1.
#[utoipa::path(
    post,
    path = "/api/v1/templates",
    request_body = CreateTemplateBody,
    responses(
        (status = 201, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Invalid template", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Missing create_templates", body = Error)
    ),
    tags = ["templates"],
    operation_id = "createTemplate",
    security(("BearerToken" = []))
)]
#[post("/templates")]
pub async fn create_template(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<CreateTemplateBody>,
) -> ApiResult<HttpResponse> {
    auth.require(Capability::CreateTemplates)?;
    let template = state
        .templates
        .create(CreateTemplateRequest {
            scope: auth.scope(),
            created_by: auth.user_id(),
            draft: payload.into_inner().into(),
        })
        .await?;
    Ok(HttpResponse::Created().json(TemplateResponse::from(template)))
}

/// List distinct categories of the caller's active templates.
#[utoipa::path(
    get,
    path = "/api/v1/templates/categories",
    responses(
        (status = 200, description = "Sorted categories", body = CategoriesResponse),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["templates"],
    operation_id = "listTemplateCategories",
    security(("BearerToken" = []))
)]
#[get("/templates/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<web::Json<CategoriesResponse>> {
    let categories = state.templates_query.list_categories(auth.scope()).await?;
    Ok(web::Json(CategoriesResponse { categories }))
}

/// Fetch one template version by id.
#[utoipa::path(
    get,
    path = "/api/v1/templates/{id}",
    params(("id" = String, Path, description = "Template version id")),
    responses(
        (status = 200, description = "Template version", body = TemplateResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found in this organisation", body = Error)
    ),
    tags = ["templates"],
    operation_id = "getTemplate",
    security(("BearerToken" = []))
)]
#[get("/templates/{id}")]
pub async fn get_template(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<TemplateResponse>> {
    let id = parse_template_id(&path.into_inner(), "id")?;
    let template = state.templates_query.get(auth.scope(), id).await?;
    Ok(web::Json(template.into()))
}

/// Soft-delete one template version.
#[utoipa::path(
    delete,
    path = "/api/v1/templates/{id}",
    params(("id" = String, Path, description = "Template version id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Missing delete_templates", body = Error),
        (status = 404, description = "Not found in this organisation", body = Error)
    ),
    tags = ["templates"],
    operation_id = "deleteTemplate",
    security(("BearerToken" = []))
)]
#[delete("/templates/{id}")]
pub async fn delete_template(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    auth.require(Capability::DeleteTemplates)?;
    let template_id = parse_template_id(&path.into_inner(), "id")?;
    state
        .templates
        .delete(DeleteTemplateRequest {
            scope: auth.scope(),
            template_id,
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Publish a new version on top of the lineage's latest row.
#[utoipa::path(
    post,
    path = "/api/v1/templates/{id}/versions",
    params(("id" = String, Path, description = "Any version id of the lineage")),
    request_body = PublishVersionBody,
    responses(
        (status = 201, description = "New latest version", body = TemplateResponse),
        (status = 400, description = "Invalid update", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Missing edit_templates", body = Error),
        (status = 404, description = "Not found in this organisation", body = Error),
        (status = 409, description = "Lineage moved on; re-read and retry", body = Error)
    ),
    tags = ["templates"],
    operation_id = "publishTemplateVersion",
    security(("BearerToken" = []))
)]
#[post("/templates/{id}/versions")]
pub async fn publish_version(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    payload: web::Json<PublishVersionBody>,
) -> ApiResult<HttpResponse> {
    auth.require(Capability::EditTemplates)?;
    let template_id = parse_template_id(&path.into_inner(), "id")?;
    let (updates, notes, expected_version) = payload.into_inner().into_parts();
    let template = state
        .templates
        .publish_new_version(PublishTemplateVersionRequest {
            scope: auth.scope(),
            template_id,
            author: auth.user_id(),
            updates,
            notes,
            expected_version,
        })
        .await?;
    Ok(HttpResponse::Created().json(TemplateResponse::from(template)))
}

/// Copy a template into the caller's organisation as a new lineage.
#[utoipa::path(
    post,
    path = "/api/v1/templates/{id}/duplicate",
    params(("id" = String, Path, description = "Source template version id")),
    responses(
        (status = 201, description = "New lineage root", body = TemplateResponse),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Missing create_templates", body = Error),
        (status = 404, description = "Source not found", body = Error)
    ),
    tags = ["templates"],
    operation_id = "duplicateTemplate",
    security(("BearerToken" = []))
)]
#[post("/templates/{id}/duplicate")]
pub async fn duplicate_template(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    auth.require(Capability::CreateTemplates)?;
    let source_id = parse_template_id(&path.into_inner(), "id")?;
    let template = state
        .templates
        .duplicate(DuplicateTemplateRequest {
            scope: auth.scope(),
            source_id,
            created_by: auth.user_id(),
        })
        .await?;
    Ok(HttpResponse::Created().json(TemplateResponse::from(template)))
}

/// Latest version of a lineage.
#[utoipa::path(
    get,
    path = "/api/v1/templates/lineages/{lineageId}/latest",
    params(("lineageId" = String, Path, description = "Lineage root id")),
    responses(
        (status = 200, description = "Latest version", body = TemplateResponse),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "No active latest version", body = Error)
    ),
    tags = ["templates"],
    operation_id = "getLatestTemplateVersion",
    security(("BearerToken" = []))
)]
#[get("/templates/lineages/{lineageId}/latest")]
pub async fn get_latest(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<TemplateResponse>> {
    let lineage_id = parse_template_id(&path.into_inner(), "lineageId")?;
    let template = state
        .templates_query
        .get_latest(auth.scope(), lineage_id)
        .await?;
    Ok(web::Json(template.into()))
}

/// Every active version of a lineage, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/templates/lineages/{lineageId}/versions",
    params(("lineageId" = String, Path, description = "Lineage root id")),
    responses(
        (status = 200, description = "Versions in ascending order", body = [TemplateResponse]),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Lineage not found", body = Error)
    ),
    tags = ["templates"],
    operation_id = "listTemplateVersions",
    security(("BearerToken" = []))
)]
#[get("/templates/lineages/{lineageId}/versions")]
pub async fn list_versions(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<TemplateResponse>>> {
    let lineage_id = parse_template_id(&path.into_inner(), "lineageId")?;
    let versions = state
        .templates_query
        .list_versions(auth.scope(), lineage_id)
        .await?;
    Ok(web::Json(
        versions.into_iter().map(TemplateResponse::from).collect(),
    ))
}

/// One numbered version of a lineage.
#[utoipa::path(
    get,
    path = "/api/v1/templates/lineages/{lineageId}/versions/{version}",
    params(
        ("lineageId" = String, Path, description = "Lineage root id"),
        ("version" = u32, Path, description = "Version number, starting at 1")
    ),
    responses(
        (status = 200, description = "Template version", body = TemplateResponse),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Version not found", body = Error)
    ),
    tags = ["templates"],
    operation_id = "getTemplateVersion",
    security(("BearerToken" = []))
)]
#[get("/templates/lineages/{lineageId}/versions/{version}")]
pub async fn get_version(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<LineageVersionPath>,
) -> ApiResult<web::Json<TemplateResponse>> {
    let LineageVersionPath {
        lineage_id,
        version,
    } = path.into_inner();
    let lineage_id = parse_template_id(&lineage_id, "lineageId")?;
    let template = state
        .templates_query
        .get_by_version(auth.scope(), lineage_id, version)
        .await?;
    Ok(web::Json(template.into()))
}

/// Register the template routes in match order.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_template)
        .service(list_categories)
        .service(get_latest)
        .service(list_versions)
        .service(get_version)
        .service(publish_version)
        .service(duplicate_template)
        .service(get_template)
        .service(delete_template);
}

#[cfg(test)]
#[path = "templates_tests.rs"]
mod tests;
