use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::Answer;
use crate::criteria::{Criteria, Page};
use crate::error::DomainError;
use crate::ports::answers::AnswerRepository;
use crate::ports::forms::FormRepository;
use crate::util::new_question_id;
use crate::DomainResult;

/// Wire tags follow the original question taxonomy: `text`, `text-long`,
/// `text-short`, `text-email`, `radio`, `file`, `boolean`, `select`,
/// `checkbox`, `dropdown`, `date`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    Text,
    TextLong,
    TextShort,
    TextEmail,
    Radio,
    File,
    Boolean,
    Select,
    Checkbox,
    Dropdown,
    Date,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 11] = [
        QuestionKind::Text,
        QuestionKind::TextLong,
        QuestionKind::TextShort,
        QuestionKind::TextEmail,
        QuestionKind::Radio,
        QuestionKind::File,
        QuestionKind::Boolean,
        QuestionKind::Select,
        QuestionKind::Checkbox,
        QuestionKind::Dropdown,
        QuestionKind::Date,
    ];
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub required: bool,
    #[serde(default)]
    pub section: String,
    /// Free-form per-question metadata; choice kinds carry their option list
    /// under the `options` key.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Question {
    /// Option list for choice kinds, read from `metadata.options`. Non-string
    /// members are skipped.
    pub fn options(&self) -> Vec<String> {
        self.metadata
            .get("options")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Form {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
}

#[derive(Clone, Debug)]
pub struct QuestionCreate {
    pub title: String,
    pub description: String,
    pub kind: QuestionKind,
    pub required: bool,
    pub section: String,
    pub metadata: HashMap<String, Value>,
}

#[derive(Clone, Debug)]
pub struct FormCreate {
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionCreate>,
}

#[derive(Clone)]
pub struct FormService {
    forms: Arc<dyn FormRepository>,
    answers: Arc<dyn AnswerRepository>,
}

impl FormService {
    pub fn new(forms: Arc<dyn FormRepository>, answers: Arc<dyn AnswerRepository>) -> Self {
        Self { forms, answers }
    }

    /// Builds a form from the command, assigning a fresh server-generated id
    /// to every question, and persists it. Forms are immutable afterwards.
    pub async fn create(&self, input: FormCreate) -> DomainResult<Form> {
        let questions = input
            .questions
            .into_iter()
            .map(|question| Question {
                id: new_question_id(),
                title: question.title,
                description: question.description,
                kind: question.kind,
                required: question.required,
                section: question.section,
                metadata: question.metadata,
            })
            .collect();

        let mut form = Form {
            id: String::new(),
            title: input.title,
            description: input.description,
            questions,
        };

        form.id = self.forms.save(&form).await?;
        tracing::info!(form_id = %form.id, "form created");
        Ok(form)
    }

    pub async fn list(&self) -> DomainResult<Vec<Form>> {
        self.forms.find_all().await
    }

    pub async fn get(&self, id: &str) -> DomainResult<Form> {
        self.forms
            .find(id)
            .await?
            .ok_or(DomainError::not_found("forms.retrieve"))
    }

    /// Answers submitted against a form, newest page first is not guaranteed;
    /// ordering follows the store.
    pub async fn answers_for_form(&self, form_id: &str, page: Page) -> DomainResult<Vec<Answer>> {
        let criteria = Criteria::field_equals("form_id", form_id);
        self.answers.matching(&criteria, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_kind_tags_round_trip() {
        for kind in QuestionKind::ALL {
            let tag = serde_json::to_value(kind).expect("serialize");
            let back: QuestionKind = serde_json::from_value(tag).expect("deserialize");
            assert_eq!(kind, back);
        }
        assert_eq!(
            serde_json::to_value(QuestionKind::TextEmail).expect("serialize"),
            json!("text-email")
        );
    }

    #[test]
    fn unknown_kind_tag_is_rejected() {
        let result: Result<QuestionKind, _> = serde_json::from_value(json!("matrix"));
        assert!(result.is_err());
    }

    #[test]
    fn options_reads_string_members_only() {
        let question = Question {
            id: "q1".to_string(),
            title: "Pick one".to_string(),
            description: String::new(),
            kind: QuestionKind::Radio,
            required: true,
            section: String::new(),
            metadata: HashMap::from([("options".to_string(), json!(["yes", "no", 3]))]),
        };
        assert_eq!(question.options(), vec!["yes", "no"]);
    }

    #[test]
    fn options_default_to_empty() {
        let question = Question {
            id: "q1".to_string(),
            title: "Pick one".to_string(),
            description: String::new(),
            kind: QuestionKind::Radio,
            required: false,
            section: String::new(),
            metadata: HashMap::new(),
        };
        assert!(question.options().is_empty());
    }
}
