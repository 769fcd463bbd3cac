//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every template, token, and health endpoint from the
//! inbound layer together with the bearer-token security scheme. Debug builds
//! serve the document at `/api-docs/openapi.json`.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::templates::{
    CategoriesResponse, CreateTemplateBody, PublishVersionBody, TemplateResponse,
};
use crate::inbound::http::tokens::{TokenRequestBody, TokenResponseBody};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Identity token issued by POST /api/v1/auth/token."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Inspection backend API",
        description = "Organisation-scoped inspection templates with role-based access."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::tokens::issue_token,
        crate::inbound::http::templates::create_template,
        crate::inbound::http::templates::list_categories,
        crate::inbound::http::templates::get_template,
        crate::inbound::http::templates::delete_template,
        crate::inbound::http::templates::publish_version,
        crate::inbound::http::templates::duplicate_template,
        crate::inbound::http::templates::get_latest,
        crate::inbound::http::templates::list_versions,
        crate::inbound::http::templates::get_version,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        TemplateResponse,
        CreateTemplateBody,
        PublishVersionBody,
        CategoriesResponse,
        TokenRequestBody,
        TokenResponseBody,
        Error,
        ErrorCode
    )),
    tags(
        (name = "templates", description = "Versioned inspection templates"),
        (name = "auth", description = "Identity token exchange"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
