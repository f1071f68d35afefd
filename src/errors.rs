use actix_web::{
    http::StatusCode,
    HttpResponse,
    HttpResponseBuilder,
    ResponseError,
};
use serde_json::json;
use thiserror::Error;

use sorrel_activitypub::authentication::AuthenticationError;
use sorrel_activitypub::errors::{HandlerError, ValidationError};
use sorrel_federation::fetch::FetchError;
use sorrel_models::database::DatabaseError;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    AuthError(&'static str),

    #[error("permission error")]
    PermissionError,

    #[error("{0} not found")]
    NotFoundError(&'static str),

    #[error("method not supported")]
    MethodNotSupported,

    #[error("internal error")]
    InternalError,
}

impl From<ValidationError> for HttpError {
    fn from(error: ValidationError) -> Self {
        Self::ValidationError(error.to_string())
    }
}

impl From<DatabaseError> for HttpError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(object_type) => {
                Self::NotFoundError(object_type)
            },
            DatabaseError::AlreadyExists(object_type) => {
                Self::ValidationError(format!("{} already exists", object_type))
            },
            other_error => {
                log::error!("database error: {}", other_error);
                Self::InternalError
            },
        }
    }
}

impl From<HandlerError> for HttpError {
    fn from(error: HandlerError) -> Self {
        match error {
            HandlerError::LocalObject => {
                Self::ValidationError("local object".to_string())
            },
            HandlerError::FetchError(FetchError::NotFound(_)) => {
                Self::NotFoundError("object")
            },
            HandlerError::FetchError(fetch_error) => {
                log::warn!("fetcher error: {}", fetch_error);
                Self::InternalError
            },
            HandlerError::ValidationError(message) => {
                Self::ValidationError(message)
            },
            HandlerError::DatabaseError(database_error) => {
                database_error.into()
            },
            HandlerError::UnsupportedActivity(_) => {
                Self::MethodNotSupported
            },
        }
    }
}

impl From<AuthenticationError> for HttpError {
    fn from(error: AuthenticationError) -> Self {
        match error {
            AuthenticationError::DatabaseError(DatabaseError::NotFound(_)) => {
                Self::AuthError("signer not found")
            },
            AuthenticationError::DatabaseError(database_error) => {
                database_error.into()
            },
            _ => Self::AuthError("invalid signature"),
        }
    }
}

impl ResponseError for HttpError {
    fn error_response(&self) -> HttpResponse {
        HttpResponseBuilder::new(self.status_code())
            .json(json!({"error": self.to_string()}))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthError(_) => StatusCode::UNAUTHORIZED,
            Self::PermissionError => StatusCode::FORBIDDEN,
            Self::NotFoundError(_) => StatusCode::NOT_FOUND,
            Self::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            HttpError::ValidationError("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST,
        );
        assert_eq!(
            HttpError::AuthError("test").status_code(),
            StatusCode::UNAUTHORIZED,
        );
        assert_eq!(
            HttpError::NotFoundError("post").status_code(),
            StatusCode::NOT_FOUND,
        );
        assert_eq!(
            HttpError::MethodNotSupported.status_code(),
            StatusCode::METHOD_NOT_ALLOWED,
        );
    }

    #[test]
    fn test_unsupported_activity_maps_to_405() {
        let handler_error =
            HandlerError::UnsupportedActivity("Like".to_string());
        let http_error = HttpError::from(handler_error);
        assert_eq!(http_error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
