use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Missing, non-numeric or non-positive input field.
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error("cannot divide by zero {field}")]
    DivisionByZero { field: &'static str },
    #[error("non-finite value in {field}")]
    NonFinite { field: String },
    #[error("need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("model not fitted")]
    ModelNotFitted,
    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Input problems the caller can fix, as opposed to model-state failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::Validation { .. }
                | DomainError::DivisionByZero { .. }
                | DomainError::NonFinite { .. }
        )
    }
}
