use serde_json::{Map, Value};

use crate::criteria::{Criteria, Page};
use crate::forms::Form;
use crate::ports::BoxFuture;
use crate::DomainResult;

pub trait FormRepository: Send + Sync {
    /// Persists the form and returns its store-assigned identifier.
    fn save(&self, form: &Form) -> BoxFuture<'_, DomainResult<String>>;

    fn find(&self, id: &str) -> BoxFuture<'_, DomainResult<Option<Form>>>;

    fn find_all(&self) -> BoxFuture<'_, DomainResult<Vec<Form>>>;

    fn matching(&self, criteria: &Criteria, page: Page) -> BoxFuture<'_, DomainResult<Vec<Form>>>;

    /// Applies a partial field update and returns the post-update form.
    /// Unknown ids fail distinctly as not-found.
    fn update_fields(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> BoxFuture<'_, DomainResult<Form>>;

    fn delete(&self, id: &str) -> BoxFuture<'_, DomainResult<()>>;
}
