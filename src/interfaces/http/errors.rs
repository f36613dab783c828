use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::domain::error::AppError;

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::ParseError(_) | AppError::AuthError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageError(_)
            | AppError::DatabaseError(_)
            | AppError::IoError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::ValidationError(errors) => builder.json(errors),
            AppError::Unauthorized(msg) => builder.json(json!({ "detail": msg })),
            AppError::ParseError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg)
            | AppError::StorageError(msg)
            | AppError::DatabaseError(msg)
            | AppError::IoError(msg)
            | AppError::Internal(msg) => builder.json(json!({ "error": msg })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_validation_error_is_field_map() {
        let (status, body) = body_json(AppError::field("file", "No file was submitted.")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "file": ["No file was submitted."] }));
    }

    #[actix_web::test]
    async fn test_unauthorized_uses_detail() {
        let (status, body) = body_json(AppError::Unauthorized("Invalid token.".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid token.");
    }

    #[actix_web::test]
    async fn test_storage_error_is_server_error() {
        let (status, body) = body_json(AppError::StorageError("disk full".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "disk full");
    }
}
