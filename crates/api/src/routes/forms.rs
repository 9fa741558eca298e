use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use formsrv_domain::criteria::Page;
use formsrv_domain::forms::{FormCreate, FormService, QuestionCreate, QuestionKind};

use crate::envelope::Responder;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionDto {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFormDto {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(nested)]
    pub questions: Vec<QuestionDto>,
}

impl CreateFormDto {
    fn into_command(self) -> FormCreate {
        FormCreate {
            title: self.title,
            description: self.description,
            questions: self
                .questions
                .into_iter()
                .map(|question| QuestionCreate {
                    title: question.title,
                    description: question.description,
                    kind: question.kind,
                    required: question.required,
                    section: question.section,
                    metadata: question.metadata,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

const MAX_PAGE_LIMIT: u64 = 100;

impl PageQuery {
    fn into_page(self) -> Page {
        Page::new(
            self.offset.unwrap_or(0),
            self.limit
                .unwrap_or(Page::DEFAULT_LIMIT)
                .min(MAX_PAGE_LIMIT),
        )
    }
}

pub async fn create_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateFormDto>, JsonRejection>,
) -> Response {
    let responder = Responder::new(&state, &headers, "POST", "/v1/forms");

    let Json(dto) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return responder.fail(validation::binding_error::<CreateFormDto>(&rejection));
        }
    };
    if let Err(error) = validation::validate(&dto) {
        return responder.fail(error);
    }

    let service = FormService::new(state.forms.clone(), state.answers.clone());
    match service.create(dto.into_command()).await {
        Ok(form) => responder.ok(StatusCode::CREATED, form),
        Err(err) => responder.fail_domain(&err),
    }
}

pub async fn list_forms(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let responder = Responder::new(&state, &headers, "GET", "/v1/forms");
    let service = FormService::new(state.forms.clone(), state.answers.clone());
    match service.list().await {
        Ok(forms) => responder.results(StatusCode::OK, forms),
        Err(err) => responder.fail_domain(&err),
    }
}

pub async fn get_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let responder = Responder::new(&state, &headers, "GET", "/v1/forms/:id");
    let service = FormService::new(state.forms.clone(), state.answers.clone());
    match service.get(&id).await {
        Ok(form) => responder.ok(StatusCode::OK, form),
        Err(err) => responder.fail_domain(&err),
    }
}

pub async fn list_form_answers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Response {
    let responder = Responder::new(&state, &headers, "GET", "/v1/forms/:id/answers");
    let service = FormService::new(state.forms.clone(), state.answers.clone());
    match service.answers_for_form(&id, page.into_page()).await {
        Ok(answers) => responder.results(StatusCode::OK, answers),
        Err(err) => responder.fail_domain(&err),
    }
}
