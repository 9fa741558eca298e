//! In-process repositories backing the `memory` data backend, used by the
//! API tests and local development without a MongoDB instance. Criteria are
//! evaluated in process with the same AND semantics as the stores.

use std::collections::HashMap;
use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use formsrv_domain::answers::Answer;
use formsrv_domain::criteria::{Criteria, Filter, FilterOperator, FilterValue, Page};
use formsrv_domain::error::DomainError;
use formsrv_domain::forms::Form;
use formsrv_domain::ports::answers::AnswerRepository;
use formsrv_domain::ports::forms::FormRepository;
use formsrv_domain::ports::BoxFuture;
use formsrv_domain::DomainResult;

#[derive(Clone, Default)]
pub struct InMemoryFormRepository {
    store: Arc<RwLock<HashMap<String, Form>>>,
}

impl InMemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAnswerRepository {
    store: Arc<RwLock<HashMap<String, Answer>>>,
}

impl InMemoryAnswerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn filter_matches(actual: Option<String>, filter: &Filter) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    match (&filter.operator, &filter.value) {
        (FilterOperator::Equal, FilterValue::Text(value)) => actual == *value,
        (FilterOperator::Equal, FilterValue::Int(value)) => {
            actual.parse::<i64>().is_ok_and(|parsed| parsed == *value)
        }
        (FilterOperator::NotEqual, FilterValue::Text(value)) => actual != *value,
        (FilterOperator::NotEqual, FilterValue::Int(value)) => {
            actual.parse::<i64>().map_or(true, |parsed| parsed != *value)
        }
        (FilterOperator::GreaterThan, FilterValue::Int(value)) => {
            actual.parse::<i64>().is_ok_and(|parsed| parsed > *value)
        }
        (FilterOperator::GreaterEqual, FilterValue::Int(value)) => {
            actual.parse::<i64>().is_ok_and(|parsed| parsed >= *value)
        }
        (FilterOperator::LessThan, FilterValue::Int(value)) => {
            actual.parse::<i64>().is_ok_and(|parsed| parsed < *value)
        }
        (FilterOperator::LessEqual, FilterValue::Int(value)) => {
            actual.parse::<i64>().is_ok_and(|parsed| parsed <= *value)
        }
        (FilterOperator::GreaterThan, FilterValue::Text(value)) => actual > *value,
        (FilterOperator::GreaterEqual, FilterValue::Text(value)) => actual >= *value,
        (FilterOperator::LessThan, FilterValue::Text(value)) => actual < *value,
        (FilterOperator::LessEqual, FilterValue::Text(value)) => actual <= *value,
        (FilterOperator::Like, FilterValue::Text(value)) => {
            actual.to_lowercase().contains(&value.to_lowercase())
        }
        (FilterOperator::NotLike, FilterValue::Text(value)) => {
            !actual.to_lowercase().contains(&value.to_lowercase())
        }
        (FilterOperator::In, FilterValue::List(values)) => {
            values.iter().any(|value| *value == actual)
        }
        (FilterOperator::NotIn, FilterValue::List(values)) => {
            !values.iter().any(|value| *value == actual)
        }
        _ => false,
    }
}

fn criteria_matches<F>(fields: F, criteria: &Criteria) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    criteria
        .filters()
        .iter()
        .all(|filter| filter_matches(fields(&filter.field), filter))
}

fn form_field(form: &Form, field: &str) -> Option<String> {
    match field {
        "_id" | "id" => Some(form.id.clone()),
        "title" => Some(form.title.clone()),
        "description" => Some(form.description.clone()),
        _ => None,
    }
}

fn answer_field(answer: &Answer, field: &str) -> Option<String> {
    match field {
        "_id" | "id" => Some(answer.id.clone()),
        "form_id" => Some(answer.form_id.clone()),
        "user_id" => Some(answer.user_id.clone()),
        _ => None,
    }
}

fn paginate<T>(mut items: Vec<T>, page: Page) -> Vec<T> {
    let offset = page.offset.min(items.len() as u64) as usize;
    let mut items = items.split_off(offset);
    if page.limit > 0 {
        items.truncate(page.limit as usize);
    }
    items
}

impl FormRepository for InMemoryFormRepository {
    fn save(&self, form: &Form) -> BoxFuture<'_, DomainResult<String>> {
        let mut form = form.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let id = if form.id.is_empty() {
                ObjectId::new().to_hex()
            } else {
                form.id.clone()
            };
            form.id = id.clone();
            store.write().await.insert(id.clone(), form);
            Ok(id)
        })
    }

    fn find(&self, id: &str) -> BoxFuture<'_, DomainResult<Option<Form>>> {
        let id = id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&id).cloned()) })
    }

    fn find_all(&self) -> BoxFuture<'_, DomainResult<Vec<Form>>> {
        let store = self.store.clone();
        Box::pin(async move {
            let mut forms: Vec<Form> = store.read().await.values().cloned().collect();
            forms.sort_by(|left, right| left.id.cmp(&right.id));
            Ok(forms)
        })
    }

    fn matching(&self, criteria: &Criteria, page: Page) -> BoxFuture<'_, DomainResult<Vec<Form>>> {
        let criteria = criteria.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut forms: Vec<Form> = store
                .read()
                .await
                .values()
                .filter(|form| criteria_matches(|field| form_field(form, field), &criteria))
                .cloned()
                .collect();
            forms.sort_by(|left, right| left.id.cmp(&right.id));
            Ok(paginate(forms, page))
        })
    }

    fn update_fields(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> BoxFuture<'_, DomainResult<Form>> {
        let id = id.to_string();
        let fields = fields.clone();
        let store = self.store.clone();
        Box::pin(async move {
            if fields.is_empty() {
                return Err(DomainError::validation(
                    "memory.forms.update_fields",
                    "no fields to update",
                ));
            }
            let mut store = store.write().await;
            let form = store
                .get_mut(&id)
                .ok_or(DomainError::not_found("memory.forms.update_fields"))?;
            for (key, value) in &fields {
                match (key.as_str(), value.as_str()) {
                    ("title", Some(title)) => form.title = title.to_string(),
                    ("description", Some(description)) => {
                        form.description = description.to_string();
                    }
                    _ => {}
                }
            }
            Ok(form.clone())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let id = id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or(DomainError::not_found("memory.forms.delete"))
        })
    }
}

impl AnswerRepository for InMemoryAnswerRepository {
    fn save(&self, answer: &Answer) -> BoxFuture<'_, DomainResult<String>> {
        let mut answer = answer.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let id = if answer.id.is_empty() {
                ObjectId::new().to_hex()
            } else {
                answer.id.clone()
            };
            answer.id = id.clone();
            store.write().await.insert(id.clone(), answer);
            Ok(id)
        })
    }

    fn find(&self, id: &str) -> BoxFuture<'_, DomainResult<Option<Answer>>> {
        let id = id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&id).cloned()) })
    }

    fn matching(
        &self,
        criteria: &Criteria,
        page: Page,
    ) -> BoxFuture<'_, DomainResult<Vec<Answer>>> {
        let criteria = criteria.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut answers: Vec<Answer> = store
                .read()
                .await
                .values()
                .filter(|answer| criteria_matches(|field| answer_field(answer, field), &criteria))
                .cloned()
                .collect();
            answers.sort_by(|left, right| left.id.cmp(&right.id));
            Ok(paginate(answers, page))
        })
    }

    fn update_fields(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> BoxFuture<'_, DomainResult<Answer>> {
        let id = id.to_string();
        let fields = fields.clone();
        let store = self.store.clone();
        Box::pin(async move {
            if fields.is_empty() {
                return Err(DomainError::validation(
                    "memory.answers.update_fields",
                    "no fields to update",
                ));
            }
            let mut store = store.write().await;
            let answer = store
                .get_mut(&id)
                .ok_or(DomainError::not_found("memory.answers.update_fields"))?;
            for (key, value) in &fields {
                match (key.as_str(), value.as_str()) {
                    ("form_id", Some(form_id)) => answer.form_id = form_id.to_string(),
                    ("user_id", Some(user_id)) => answer.user_id = user_id.to_string(),
                    _ => {}
                }
            }
            Ok(answer.clone())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let id = id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or(DomainError::not_found("memory.answers.delete"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer_for_form(form_id: &str) -> Answer {
        Answer {
            id: String::new(),
            form_id: form_id.to_string(),
            user_id: "user-1".to_string(),
            responses: Vec::new(),
        }
    }

    #[tokio::test]
    async fn save_assigns_an_id_and_find_returns_the_stored_answer() {
        let repo = InMemoryAnswerRepository::new();
        let id = repo
            .save(&answer_for_form("form-a"))
            .await
            .expect("save answer");
        assert!(!id.is_empty());

        let stored = repo.find(&id).await.expect("find").expect("stored");
        assert_eq!(stored.id, id);
        assert_eq!(stored.form_id, "form-a");
    }

    #[tokio::test]
    async fn matching_filters_by_form_id_and_paginates() {
        let repo = InMemoryAnswerRepository::new();
        for _ in 0..3 {
            repo.save(&answer_for_form("form-a")).await.expect("save");
        }
        repo.save(&answer_for_form("form-b")).await.expect("save");

        let criteria = Criteria::field_equals("form_id", "form-a");
        let all = repo
            .matching(&criteria, Page::default())
            .await
            .expect("matching");
        assert_eq!(all.len(), 3);

        let first_page = repo
            .matching(&criteria, Page::new(0, 2))
            .await
            .expect("matching");
        assert_eq!(first_page.len(), 2);

        let second_page = repo
            .matching(&criteria, Page::new(2, 2))
            .await
            .expect("matching");
        assert_eq!(second_page.len(), 1);
    }

    #[tokio::test]
    async fn update_fields_returns_the_post_update_answer() {
        let repo = InMemoryAnswerRepository::new();
        let id = repo.save(&answer_for_form("form-a")).await.expect("save");

        let mut fields = Map::new();
        fields.insert("user_id".to_string(), Value::String("user-9".to_string()));
        let updated = repo.update_fields(&id, &fields).await.expect("update");
        assert_eq!(updated.user_id, "user-9");

        let missing = repo
            .update_fields("no-such-id", &fields)
            .await
            .expect_err("unknown id");
        assert_eq!(missing.status_code(), 404);

        let empty = repo
            .update_fields(&id, &Map::new())
            .await
            .expect_err("empty update");
        assert_eq!(empty.status_code(), 400);
    }

    #[tokio::test]
    async fn delete_distinguishes_missing_ids() {
        let repo = InMemoryAnswerRepository::new();
        let id = repo.save(&answer_for_form("form-a")).await.expect("save");

        repo.delete(&id).await.expect("delete");
        let err = repo.delete(&id).await.expect_err("already deleted");
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn not_in_excludes_listed_users() {
        let repo = InMemoryAnswerRepository::new();
        let mut flagged = answer_for_form("form-a");
        flagged.user_id = "user-2".to_string();
        repo.save(&answer_for_form("form-a")).await.expect("save");
        repo.save(&flagged).await.expect("save");

        let criteria = Criteria::new(vec![Filter::new(
            "user_id",
            FilterOperator::NotIn,
            vec!["user-2".to_string()],
        )]);
        let kept = repo
            .matching(&criteria, Page::default())
            .await
            .expect("matching");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].user_id, "user-1");
    }
}
