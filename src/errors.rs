use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use derive_more::derive::{Display, Error as DeriveMoreError};

#[derive(Debug, Error)]
pub enum AppError{
    #[error("Cant bind to the Socket")]
    SocketBind,
    #[error("Cant connect to the DB")]
    DbConnect,
    #[error("Cant start the server")]
    ServerStart,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal Server Error")]
    Database(#[from] sqlx::Error),
    #[error("Internal Server Error")]
    Internal,
}

#[derive(Debug, Display, DeriveMoreError, Serialize, Deserialize)]
#[display("{}", message)]
pub struct CustomError{
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CustomError{
    pub fn new(message: impl Into<String>) -> Self{
        CustomError{message: message.into(), error: None}
    }
}

impl ResponseError for CustomError{}

impl AppError {
    // the underlying cause is exposed outside production mode only
    fn detail(&self) -> Option<String> {
        let detail = match self {
            AppError::Database(e) => Some(e.to_string()),
            _ => None,
        };

        match std::env::var("RUN_MODE").as_deref() {
            Ok("production") => None,
            _ => detail,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("{:?}", self);
        }

        HttpResponse::build(self.status_code()).json(CustomError{
            message: self.to_string(),
            error: self.detail(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::SocketBind
            | AppError::DbConnect
            | AppError::ServerStart
            | AppError::Database(_)
            | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy(){
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::Internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_detail_is_omitted_when_absent(){
        let body = serde_json::to_string(&CustomError::new("Course not found")).unwrap();
        assert_eq!(body, r#"{"message":"Course not found"}"#);
    }
}
