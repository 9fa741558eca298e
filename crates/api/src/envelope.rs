//! Uniform response envelope:
//! `{success, status_code, data | results, error | errors, trace_id, alert?}`.
//! Outside production the full per-request error list is exposed and the
//! envelope is mirrored to Loki; in production only the top-level error is
//! serialized.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use formsrv_domain::error::DomainError;
use formsrv_infra::loki::{ErrorLabels, LokiShipper};

use crate::state::AppState;

#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub scope: String,
}

impl ErrorBody {
    pub fn new(code: u16, message: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            scope: scope.into(),
        }
    }

    pub fn from_domain(err: &DomainError) -> Self {
        Self::new(err.status_code(), err.to_string(), err.scope())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub icon: String,
}

#[derive(Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorBody>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<Alert>,
}

/// Per-request reply builder. Carries the request's trace id and the explicit
/// error list accumulated while handling it; consumed by exactly one of the
/// terminal methods.
pub struct Responder {
    production: bool,
    loki: Option<LokiShipper>,
    trace_id: Option<String>,
    method: &'static str,
    path: String,
    errors: Vec<ErrorBody>,
}

impl Responder {
    pub fn new(
        state: &AppState,
        headers: &HeaderMap,
        method: &'static str,
        path: impl Into<String>,
    ) -> Self {
        let trace_id = headers
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Self {
            production: state.config.is_production(),
            loki: state.loki.clone(),
            trace_id,
            method,
            path: path.into(),
            errors: Vec::new(),
        }
    }

    /// Records a sub-failure without ending the request.
    #[allow(dead_code)]
    pub fn push(&mut self, error: ErrorBody) {
        self.errors.push(error);
    }

    pub fn ok<T: Serialize>(self, status: StatusCode, data: T) -> Response {
        let envelope = Envelope {
            success: true,
            status_code: status.as_u16(),
            data: Some(data),
            results: None,
            error: None,
            errors: None,
            trace_id: self.trace_id,
            alert: None,
        };
        (status, Json(envelope)).into_response()
    }

    pub fn results<T: Serialize>(self, status: StatusCode, results: Vec<T>) -> Response {
        let envelope = Envelope {
            success: true,
            status_code: status.as_u16(),
            data: None,
            results: Some(results),
            error: None,
            errors: None,
            trace_id: self.trace_id,
            alert: None,
        };
        (status, Json(envelope)).into_response()
    }

    pub fn fail(mut self, error: ErrorBody) -> Response {
        self.errors.push(error.clone());
        let status = StatusCode::from_u16(error.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = Envelope::<serde_json::Value> {
            success: false,
            status_code: error.code,
            data: None,
            results: None,
            error: Some(error),
            errors: (!self.production).then_some(self.errors),
            trace_id: self.trace_id.clone(),
            alert: None,
        };

        if let Some(loki) = &self.loki {
            if let Ok(payload) = serde_json::to_value(&envelope) {
                loki.ship_error(
                    ErrorLabels {
                        trace_id: self.trace_id.clone().unwrap_or_default(),
                        method: self.method.to_string(),
                        path: self.path.clone(),
                    },
                    payload,
                );
            }
        }

        (status, Json(envelope)).into_response()
    }

    pub fn fail_domain(self, err: &DomainError) -> Response {
        self.fail(ErrorBody::from_domain(err))
    }
}
