use backend_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        if err.is_client_error() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_become_bad_requests() {
        let err: AppError = DomainError::validation("sale_price", "Invalid sale price").into();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Invalid sale price"));

        let err: AppError = DomainError::DivisionByZero { field: "land_area" }.into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn model_state_errors_are_internal() {
        let err: AppError = DomainError::ModelNotFitted.into();
        assert!(matches!(err, AppError::Internal(_)));
        let err: AppError = DomainError::SchemaMismatch("width".to_string()).into();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
