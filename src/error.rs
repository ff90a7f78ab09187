use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RollcallError {
    #[error("{0}")]
    Validation(String),

    #[error("no token provided")]
    AuthMissing,

    #[error("invalid token")]
    AuthInvalid,

    #[error("wrong password")]
    WrongPassword,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(#[from] SqlxError),

    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl RollcallError {
    pub fn validation(msg: impl Into<String>) -> Self {
        RollcallError::Validation(msg.into())
    }
}

impl IntoResponse for RollcallError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            RollcallError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RollcallError::AuthMissing => (StatusCode::UNAUTHORIZED, self.to_string()),
            RollcallError::WrongPassword => (StatusCode::UNAUTHORIZED, self.to_string()),
            RollcallError::AuthInvalid => (StatusCode::FORBIDDEN, self.to_string()),
            RollcallError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            RollcallError::Database(_)
            | RollcallError::Hash(_)
            | RollcallError::Token(_)
            | RollcallError::Csv(_)
            | RollcallError::Xlsx(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: message })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}
