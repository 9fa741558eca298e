use axum::extract::rejection::JsonRejection;
use validator::Validate;

use crate::envelope::ErrorBody;

/// DTO validation scope, e.g. `dto.validate.CreateFormDto`.
pub fn dto_scope<T>() -> String {
    let name = std::any::type_name::<T>()
        .rsplit("::")
        .next()
        .unwrap_or("dto");
    format!("dto.validate.{name}")
}

pub fn validate<T: Validate>(value: &T) -> Result<(), ErrorBody> {
    value
        .validate()
        .map_err(|err| ErrorBody::new(422, err.to_string(), dto_scope::<T>()))
}

pub fn binding_error<T>(rejection: &JsonRejection) -> ErrorBody {
    ErrorBody::new(422, rejection.body_text(), dto_scope::<T>())
}
