pub mod answers;
pub mod criteria;
pub mod error;
pub mod forms;
pub mod ports;
pub mod util;
pub mod validators;

pub type DomainResult<T> = Result<T, error::DomainError>;
