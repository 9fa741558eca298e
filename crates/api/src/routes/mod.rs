mod answers;
mod forms;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{middleware, Router};
use serde_json::json;

use formsrv_domain::util::now_rfc3339;

use crate::envelope::Responder;
use crate::middleware as app_middleware;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/forms", post(forms::create_form).get(forms::list_forms))
        .route("/v1/forms/:id", get(forms::get_form))
        .route("/v1/forms/:id/answers", get(forms::list_form_answers))
        .route("/v1/answers", post(answers::create_answer))
        .route("/v1/answers/:id", get(answers::get_answer))
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(
            app_middleware::auth_context_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<AppState>, headers: HeaderMap) -> Response {
    Responder::new(&state, &headers, "GET", "/v1/health").ok(
        StatusCode::OK,
        json!({
            "status": "ok",
            "message": "The service is online and functioning properly.",
            "timestamp": now_rfc3339(),
        }),
    )
}
