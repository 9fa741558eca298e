use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::{Extension, Json};
use serde::Deserialize;
use validator::Validate;

use formsrv_domain::answers::{AnswerCreate, AnswerResponse, AnswerService};

use crate::envelope::{ErrorBody, Responder};
use crate::middleware::AuthContext;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerResponseDto {
    #[validate(length(min = 1))]
    pub question_id: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnswerDto {
    #[validate(length(min = 1))]
    pub form_id: String,
    #[serde(default)]
    pub user_id: String,
    #[validate(nested)]
    pub responses: Vec<AnswerResponseDto>,
}

impl CreateAnswerDto {
    /// Each response must carry a free-text answer or at least one selected
    /// value.
    fn ensure_answered(&self) -> Result<(), ErrorBody> {
        for response in &self.responses {
            if response.answer.is_empty() && response.values.is_empty() {
                return Err(ErrorBody::new(
                    422,
                    "answer or values are required",
                    validation::dto_scope::<CreateAnswerDto>(),
                ));
            }
        }
        Ok(())
    }

    fn into_command(self) -> AnswerCreate {
        AnswerCreate {
            form_id: self.form_id,
            user_id: self.user_id,
            responses: self
                .responses
                .into_iter()
                .map(|response| AnswerResponse {
                    question_id: response.question_id,
                    answer: response.answer,
                    values: response.values,
                })
                .collect(),
        }
    }
}

pub async fn create_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateAnswerDto>, JsonRejection>,
) -> Response {
    let responder = Responder::new(&state, &headers, "POST", "/v1/answers");

    let Json(dto) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return responder.fail(validation::binding_error::<CreateAnswerDto>(&rejection));
        }
    };
    if let Err(error) = validation::validate(&dto) {
        return responder.fail(error);
    }
    if let Err(error) = dto.ensure_answered() {
        return responder.fail(error);
    }

    tracing::debug!(
        form_id = %dto.form_id,
        has_token = auth.bearer.is_some(),
        "answer submission received"
    );

    let service = AnswerService::new(state.forms.clone(), state.answers.clone());
    match service.create(dto.into_command()).await {
        Ok(answer) => responder.ok(StatusCode::OK, answer),
        Err(err) => responder.fail_domain(&err),
    }
}

pub async fn get_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let responder = Responder::new(&state, &headers, "GET", "/v1/answers/:id");
    let service = AnswerService::new(state.forms.clone(), state.answers.clone());
    match service.get(&id).await {
        Ok(answer) => responder.ok(StatusCode::OK, answer),
        Err(err) => responder.fail_domain(&err),
    }
}
