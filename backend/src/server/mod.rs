//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
#[cfg(debug_assertions)]
use actix_web::HttpResponse;
use actix_web::{App, HttpServer, web};

use inspection_backend::Trace;
#[cfg(debug_assertions)]
use inspection_backend::doc::ApiDoc;
use inspection_backend::inbound::http::health::{HealthState, live, ready};
use inspection_backend::inbound::http::state::HttpState;
use inspection_backend::inbound::http::{configure_api, json_config};
#[cfg(debug_assertions)]
use utoipa::OpenApi;

#[cfg(debug_assertions)]
async fn openapi_document() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.route("/api-docs/openapi.json", web::get().to(openapi_document));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(build_http_state(&config)?);

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    //! Smoke tests for the assembled application.

    use std::net::SocketAddr;

    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::Duration;
    use inspection_backend::domain::EmailAddress;
    use inspection_backend::outbound::identity::OAuthProviderConfig;
    use reqwest::Url;
    use rstest::rstest;
    use serde_json::{Value, json};
    use zeroize::Zeroizing;

    use super::state_builders::{ConfiguredIdentityProvider, select_identity_provider};
    use super::*;

    fn base_config() -> ServerConfig {
        let addr: SocketAddr = "127.0.0.1:0".parse().expect("loopback address");
        ServerConfig::new(addr, Duration::minutes(5))
            .with_signing_secret(Some(Zeroizing::new(b"server-test-secret".to_vec())))
            .with_bootstrap_admin(Some(
                EmailAddress::new("root@example.com").expect("valid email"),
            ))
    }

    fn in_memory_config() -> ServerConfig {
        base_config().with_development_identity(true)
    }

    /// Provider on the loopback discard port, so every exchange fails fast.
    fn unreachable_provider() -> OAuthProviderConfig {
        OAuthProviderConfig {
            token_url: Url::parse("http://127.0.0.1:9/oauth/token").expect("valid url"),
            userinfo_url: Url::parse("http://127.0.0.1:9/userinfo").expect("valid url"),
            client_id: "inspection-backend".to_owned(),
            client_secret: Zeroizing::new("client-secret".to_owned()),
            redirect_uri: "http://127.0.0.1/callback".to_owned(),
            timeout: std::time::Duration::from_secs(2),
        }
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn persistent_runs_never_use_the_development_provider(#[case] development: bool) {
        let config = base_config().with_development_identity(development);

        let result = select_identity_provider(&config, true);

        let err = result.err().expect("no provider for a database-backed run");
        assert!(err.to_string().contains("OAuth identity provider"));
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn configured_provider_wins_over_the_development_flag(#[case] persistent: bool) {
        let config = in_memory_config().with_identity_provider(Some(unreachable_provider()));

        let provider = select_identity_provider(&config, persistent).expect("provider selected");

        assert!(matches!(provider, ConfiguredIdentityProvider::OAuth(_)));
    }

    #[rstest]
    fn in_memory_run_without_any_provider_refuses_to_start() {
        let result = build_http_state(&base_config());

        assert!(result.is_err());
    }

    #[rstest]
    #[actix_web::test]
    async fn bare_email_is_not_a_credential_with_a_real_provider() {
        let health = web::Data::new(HealthState::new());
        let config = base_config().with_identity_provider(Some(unreachable_provider()));
        let state = web::Data::new(build_http_state(&config).expect("state builds"));
        let app = actix_test::init_service(build_app(health, state)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/auth/token")
            .set_json(json!({ "code": "root@example.com" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[rstest]
    #[actix_web::test]
    async fn bootstrap_admin_can_sign_in_and_create_templates() {
        let health = web::Data::new(HealthState::new());
        let state = web::Data::new(build_http_state(&in_memory_config()).expect("state builds"));
        let app = actix_test::init_service(build_app(health, state)).await;

        let token_req = actix_test::TestRequest::post()
            .uri("/api/v1/auth/token")
            .set_json(json!({ "code": "root@example.com" }))
            .to_request();
        let token: Value = actix_test::call_and_read_body_json(&app, token_req).await;
        let bearer = format!(
            "Bearer {}",
            token["accessToken"].as_str().expect("access token")
        );

        let create = actix_test::TestRequest::post()
            .uri("/api/v1/templates")
            .insert_header(("Authorization", bearer))
            .set_json(json!({
                "name": "Boiler service",
                "fieldsSchema": [{ "name": "pressure", "type": "number" }]
            }))
            .to_request();
        let res = actix_test::call_service(&app, create).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        assert!(res.headers().contains_key("trace-id"));
    }

    #[rstest]
    #[actix_web::test]
    async fn probes_are_mounted_outside_the_api_scope() {
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        let state = web::Data::new(build_http_state(&in_memory_config()).expect("state builds"));
        let app = actix_test::init_service(build_app(health, state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_code_is_unauthorised() {
        let health = web::Data::new(HealthState::new());
        let state = web::Data::new(build_http_state(&in_memory_config()).expect("state builds"));
        let app = actix_test::init_service(build_app(health, state)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/auth/token")
            .set_json(json!({ "code": "stranger@example.com" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
