mod answers;
mod forms;
mod memory;

pub use answers::*;
pub use forms::*;
pub use memory::*;

use formsrv_domain::error::DomainError;
use formsrv_domain::DomainResult;
use mongodb::bson::Document;
use mongodb::error::{Error, ErrorKind, WriteFailure};
use serde_json::{Map, Value};

/// Duplicate-key write failures surface as conflicts; everything else from
/// the driver is a scoped persistence error.
pub(crate) fn map_mongo_error(err: Error, scope: &'static str) -> DomainError {
    if is_duplicate_key(&err) {
        return DomainError::conflict(scope, format!("duplicate key: {err}"));
    }
    DomainError::persistence(scope, err.to_string())
}

const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(err: &Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .iter()
            .flatten()
            .any(|write| write.code == DUPLICATE_KEY_CODE),
        _ => false,
    }
}

/// `$set` document for a partial-field update.
pub(crate) fn fields_to_update_document(
    fields: &Map<String, Value>,
    scope: &'static str,
) -> DomainResult<Document> {
    let mut document = Document::new();
    for (key, value) in fields {
        let value = mongodb::bson::to_bson(value)
            .map_err(|err| DomainError::persistence(scope, err.to_string()))?;
        document.insert(key.clone(), value);
    }
    Ok(document)
}
