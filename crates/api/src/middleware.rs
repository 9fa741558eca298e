use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::{info_span, Span};
use uuid::Uuid;

use crate::envelope::ErrorBody;

/// Bearer token pulled off the request, if any. Extraction only — nothing in
/// this service verifies the token.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub bearer: Option<String>,
}

#[derive(Clone)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        let value = HeaderValue::from_str(&id).ok()?;
        Some(RequestId::new(value))
    }
}

pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http().make_span_with(RequestSpan)
}

#[derive(Clone, Default)]
pub(crate) struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, req: &Request<B>) -> Span {
        let request_id_header = HeaderName::from_static("x-request-id");
        let request_id = req
            .headers()
            .get(&request_id_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri(),
            request_id = %request_id
        )
    }
}

pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::x_request_id(UuidRequestId)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

pub fn timeout_layer() -> TimeoutLayer {
    TimeoutLayer::new(Duration::from_secs(30))
}

pub async fn auth_context_middleware(mut req: Request<Body>, next: Next) -> Response {
    let bearer = bearer_token(req.headers()).ok();
    req.extensions_mut().insert(AuthContext { bearer });
    next.run(req).await
}

/// Pulls the bearer token from the `Authorization` header, with 401-scoped
/// errors for a missing header or an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, ErrorBody> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(ErrorBody::new(
            401,
            "Not Found Authorization Header",
            "auth.get_token.not_found_authorization_header",
        ));
    };
    let value = value.to_str().map_err(|_| {
        ErrorBody::new(
            401,
            "Not Found Authorization Header",
            "auth.get_token.not_found_authorization_header",
        )
    })?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim();
    if token.is_empty() {
        return Err(ErrorBody::new(
            401,
            "Not Found Token in Authorization Header",
            "auth.get_token.not_found_token",
        ));
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_authorization_header_is_a_401() {
        let error = bearer_token(&HeaderMap::new()).expect_err("missing header");
        assert_eq!(error.code, 401);
        assert_eq!(error.scope, "auth.get_token.not_found_authorization_header");
    }

    #[test]
    fn empty_bearer_token_is_a_401() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        let error = bearer_token(&headers).expect_err("empty token");
        assert_eq!(error.code, 401);
        assert_eq!(error.scope, "auth.get_token.not_found_token");
    }

    #[test]
    fn bearer_token_is_extracted_without_verification() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer opaque-token"),
        );
        assert_eq!(
            bearer_token(&headers).expect("token"),
            "opaque-token".to_string()
        );
    }
}
