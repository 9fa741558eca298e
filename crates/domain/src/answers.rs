use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ports::answers::AnswerRepository;
use crate::ports::forms::FormRepository;
use crate::validators::AnswerValidator;
use crate::DomainResult;

/// One submitted response: the question it answers, the free-text answer,
/// and the selected values for multi-choice kinds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnswerResponse {
    pub question_id: String,
    pub answer: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub id: String,
    pub form_id: String,
    #[serde(default)]
    pub user_id: String,
    pub responses: Vec<AnswerResponse>,
}

#[derive(Clone, Debug)]
pub struct AnswerCreate {
    pub form_id: String,
    pub user_id: String,
    pub responses: Vec<AnswerResponse>,
}

#[derive(Clone)]
pub struct AnswerService {
    forms: Arc<dyn FormRepository>,
    answers: Arc<dyn AnswerRepository>,
}

impl AnswerService {
    pub fn new(forms: Arc<dyn FormRepository>, answers: Arc<dyn AnswerRepository>) -> Self {
        Self { forms, answers }
    }

    /// Validates a submission against its form and persists it.
    ///
    /// Checks run in form order: every response must reference a question on
    /// the form, every required question must carry a non-empty answer, and
    /// any non-empty answer must satisfy its question's validator. The first
    /// failure ends the request.
    pub async fn create(&self, input: AnswerCreate) -> DomainResult<Answer> {
        let form = self
            .forms
            .find(&input.form_id)
            .await?
            .ok_or(DomainError::not_found("answers.create.form"))?;

        let known: HashSet<&str> = form
            .questions
            .iter()
            .map(|question| question.id.as_str())
            .collect();
        for response in &input.responses {
            if !known.contains(response.question_id.as_str()) {
                return Err(DomainError::validation(
                    "forms.create.answer.unknown_question",
                    format!("Unknown question: {}", response.question_id),
                ));
            }
        }

        for question in &form.questions {
            let submitted = input
                .responses
                .iter()
                .find(|response| response.question_id == question.id)
                .map(|response| response.answer.as_str())
                .unwrap_or_default();

            if question.required && submitted.is_empty() {
                tracing::debug!(question_id = %question.id, "required question unanswered");
                return Err(DomainError::validation(
                    "forms.create.answer.required",
                    format!("Question is required: {}", question.title),
                ));
            }

            if submitted.is_empty() {
                continue;
            }

            let validator = AnswerValidator::for_question(question);
            if !validator.is_valid(submitted) {
                return Err(DomainError::validation(
                    "forms.create.answer.invalid",
                    format!(
                        "Invalid answer: [{}] {}",
                        question.title,
                        validator.description()
                    ),
                ));
            }
        }

        let mut answer = Answer {
            id: String::new(),
            form_id: input.form_id,
            user_id: input.user_id,
            responses: input.responses,
        };
        answer.id = self.answers.save(&answer).await?;
        tracing::info!(answer_id = %answer.id, form_id = %answer.form_id, "answer stored");
        Ok(answer)
    }

    pub async fn get(&self, id: &str) -> DomainResult<Answer> {
        self.answers
            .find(id)
            .await?
            .ok_or(DomainError::not_found("answers.retrieve"))
    }
}
