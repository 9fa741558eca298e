use serde_json::{Map, Value};

use crate::answers::Answer;
use crate::criteria::{Criteria, Page};
use crate::ports::BoxFuture;
use crate::DomainResult;

pub trait AnswerRepository: Send + Sync {
    /// Persists the submission and returns its store-assigned identifier.
    fn save(&self, answer: &Answer) -> BoxFuture<'_, DomainResult<String>>;

    fn find(&self, id: &str) -> BoxFuture<'_, DomainResult<Option<Answer>>>;

    fn matching(&self, criteria: &Criteria, page: Page)
        -> BoxFuture<'_, DomainResult<Vec<Answer>>>;

    /// Applies a partial field update and returns the post-update answer.
    /// Unknown ids fail distinctly as not-found.
    fn update_fields(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> BoxFuture<'_, DomainResult<Answer>>;

    fn delete(&self, id: &str) -> BoxFuture<'_, DomainResult<()>>;
}
