//! Behavioural tests for the REST surface, from sign-in to versioned templates.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use chrono::Duration;
use inspection_backend::Trace;
use inspection_backend::domain::ports::FixtureIdentityProvider;
use inspection_backend::domain::{
    AuthenticationService, EmailAddress, OrganizationId, TemplateVersionManager, UserAccount,
    UserId,
};
use inspection_backend::inbound::http::state::{HttpState, HttpStatePorts};
use inspection_backend::inbound::http::{configure_api, json_config};
use inspection_backend::outbound::memory::{InMemoryTemplateRepository, InMemoryUserAccounts};
use inspection_backend::outbound::token::JwtTokenService;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

struct Tenant {
    organization_id: OrganizationId,
}

#[fixture]
fn acme() -> Tenant {
    Tenant {
        organization_id: OrganizationId::random(),
    }
}

fn member(tenant: &Tenant, email: &str, role: &str) -> UserAccount {
    UserAccount {
        id: UserId::random(),
        organization_id: tenant.organization_id,
        email: EmailAddress::new(email).expect("valid email"),
        role: role.to_owned(),
        permission_override: None,
    }
}

fn state_for(accounts: Vec<UserAccount>) -> HttpState {
    let clock = Arc::new(DefaultClock);
    let tokens = Arc::new(JwtTokenService::new(
        Some(&b"http-bdd-secret"[..]),
        Duration::minutes(10),
    ));
    let manager = Arc::new(TemplateVersionManager::new(
        Arc::new(InMemoryTemplateRepository::new()),
        clock.clone(),
    ));
    let sign_in = Arc::new(AuthenticationService::new(
        Arc::new(FixtureIdentityProvider),
        Arc::new(InMemoryUserAccounts::with_accounts(accounts)),
        tokens.clone(),
        clock.clone(),
    ));
    HttpState::new(HttpStatePorts {
        templates: manager.clone(),
        templates_query: manager,
        sign_in,
        tokens,
        clock,
    })
}

async fn app_for(
    accounts: Vec<UserAccount>,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state_for(accounts)))
            .app_data(json_config())
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await
}

async fn sign_in<S>(app: &S, email: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/token")
        .set_json(json!({ "code": email }))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, req).await;
    assert_eq!(body["tokenType"], "Bearer");
    format!(
        "Bearer {}",
        body["accessToken"].as_str().expect("access token")
    )
}

async fn send<S>(app: &S, req: test::TestRequest, bearer: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(app, req.insert_header((AUTHORIZATION, bearer)).to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

fn checklist() -> Value {
    json!({
        "name": "Scaffold inspection",
        "category": "Structural",
        "fieldsSchema": [{ "name": "ties_secure", "type": "boolean" }]
    })
}

#[rstest]
#[actix_web::test]
async fn supervisor_publishes_and_stale_editor_conflicts(acme: Tenant) {
    let app = app_for(vec![member(&acme, "sup@acme.test", "supervisor")]).await;
    let bearer = sign_in(&app, "sup@acme.test").await;

    let (status, created) = send(
        &app,
        test::TestRequest::post().uri("/api/v1/templates").set_json(checklist()),
        &bearer,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().expect("id").to_owned();
    assert_eq!(created["organizationId"], acme.organization_id.to_string());

    let (status, v2) = send(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/templates/{id}/versions"))
            .set_json(json!({ "versionNotes": "Add photo field", "expectedVersion": 1 })),
        &bearer,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v2["version"], 2);
    assert_eq!(v2["parentTemplateId"], id.as_str());

    let (status, error) = send(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/templates/{id}/versions"))
            .set_json(json!({ "expectedVersion": 1 })),
        &bearer,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "conflict");
    assert_eq!(error["details"]["actualVersion"], 2);
}

#[rstest]
#[actix_web::test]
async fn inspector_can_read_but_not_create(acme: Tenant) {
    let app = app_for(vec![
        member(&acme, "admin@acme.test", "admin"),
        member(&acme, "field@acme.test", "inspector"),
    ])
    .await;
    let admin = sign_in(&app, "admin@acme.test").await;
    let inspector = sign_in(&app, "field@acme.test").await;
    let (_, created) = send(
        &app,
        test::TestRequest::post().uri("/api/v1/templates").set_json(checklist()),
        &admin,
    )
    .await;
    let id = created["id"].as_str().expect("id").to_owned();

    let (status, _) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/templates/{id}")),
        &inspector,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = send(
        &app,
        test::TestRequest::post().uri("/api/v1/templates").set_json(checklist()),
        &inspector,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["code"], "forbidden");
}

#[rstest]
#[actix_web::test]
async fn other_tenants_cannot_see_templates(acme: Tenant) {
    let globex = Tenant {
        organization_id: OrganizationId::random(),
    };
    let app = app_for(vec![
        member(&acme, "admin@acme.test", "admin"),
        member(&globex, "admin@globex.test", "admin"),
    ])
    .await;
    let acme_admin = sign_in(&app, "admin@acme.test").await;
    let globex_admin = sign_in(&app, "admin@globex.test").await;
    let (_, created) = send(
        &app,
        test::TestRequest::post().uri("/api/v1/templates").set_json(checklist()),
        &acme_admin,
    )
    .await;
    let lineage = created["lineageId"].as_str().expect("lineage").to_owned();

    let (status, _) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/templates/lineages/{lineage}/latest")),
        &globex_admin,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, categories) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/templates/categories"),
        &globex_admin,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories["categories"], json!([]));
}
