//! Middleware attaching a request-scoped [`TraceId`].
//!
//! A well-formed `trace-id` request header is reused so callers can
//! correlate across services; anything else gets a fresh UUID. The id is
//! in task-local scope while the handler runs and is echoed on the response.

use std::future::Future;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, error, info_span};

use crate::domain::{TRACE_ID_HEADER, TraceId};

fn inbound_trace_id(req: &ServiceRequest) -> Option<TraceId> {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.parse().ok())
}

/// Tracing middleware; wrap the whole `App` with it.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use inspection_backend::middleware::Trace;
///
/// let _app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = inbound_trace_id(&req).unwrap_or_else(TraceId::generate);
        let span = info_span!(
            "http_request",
            trace_id = %trace_id,
            method = %req.method(),
            path = %req.path()
        );
        let fut = self.service.call(req);
        Box::pin(scoped(trace_id, span, fut))
    }
}

async fn scoped<F, B>(
    trace_id: TraceId,
    span: tracing::Span,
    fut: F,
) -> Result<ServiceResponse<B>, Error>
where
    F: Future<Output = Result<ServiceResponse<B>, Error>>,
{
    TraceId::scope(trace_id, async move {
        let mut res = fut.await?;
        match HeaderValue::from_str(&trace_id.to_string()) {
            Ok(value) => {
                res.response_mut()
                    .headers_mut()
                    .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
            }
            Err(error) => {
                error!(%error, %trace_id, "failed to encode trace identifier header");
            }
        }
        Ok(res)
    }
    .instrument(span))
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    use super::*;
    use crate::domain::{ApiResult, Error as DomainError};

    async fn echo() -> HttpResponse {
        let id = TraceId::current().map(|id| id.to_string()).unwrap_or_default();
        HttpResponse::Ok().body(id)
    }

    async fn fail() -> ApiResult<HttpResponse> {
        Err(DomainError::not_found("nothing here"))
    }

    async fn call(uri: &str, inbound: Option<&str>) -> (String, Vec<u8>) {
        let app = test::init_service(
            App::new()
                .wrap(Trace)
                .route("/echo", web::get().to(echo))
                .route("/fail", web::get().to(fail)),
        )
        .await;
        let mut req = test::TestRequest::get().uri(uri);
        if let Some(value) = inbound {
            req = req.insert_header((TRACE_ID_HEADER, value));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .expect("trace id header")
            .to_str()
            .expect("ascii header")
            .to_owned();
        let body = test::read_body(res).await.to_vec();
        (header, body)
    }

    #[rstest]
    #[actix_web::test]
    async fn handler_sees_the_response_trace_id() {
        let (header, body) = call("/echo", None).await;

        assert_eq!(header.as_bytes(), body.as_slice());
    }

    #[rstest]
    #[actix_web::test]
    async fn valid_inbound_trace_id_is_reused() {
        let inbound = "6f1c1c8e-0c7e-4a4e-9a63-0d7b0f6e9a10";

        let (header, _) = call("/echo", Some(inbound)).await;

        assert_eq!(header, inbound);
    }

    #[rstest]
    #[actix_web::test]
    async fn garbage_inbound_trace_id_is_replaced() {
        let (header, _) = call("/echo", Some("not-a-uuid")).await;

        assert_ne!(header, "not-a-uuid");
        assert!(header.parse::<TraceId>().is_ok());
    }

    #[rstest]
    #[actix_web::test]
    async fn error_payload_carries_the_trace_id() {
        let (header, body) = call("/fail", None).await;

        let payload: DomainError = serde_json::from_slice(&body).expect("error payload");
        assert_eq!(payload.trace_id(), Some(header.as_str()));
    }
}
