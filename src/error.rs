use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Shown for every classification failure. The raw oracle output never reaches the user.
pub const REPHRASE_MESSAGE: &str =
    "I couldn't make sense of that. Try rephrasing, or use /help for examples.";

pub const ORACLE_DOWN_MESSAGE: &str =
    "The assistant is unavailable right now. Please try again in a moment.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Classification response is not valid JSON: {0}")]
    ClassificationParse(String),

    #[error("Classification payload violates its schema: {0}")]
    ClassificationSchema(String),

    #[error("Classification type is missing or unknown: {0}")]
    ClassificationUnknownType(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Text safe to hand back to the end user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthorized => self.to_string(),
            AppError::ClassificationParse(_)
            | AppError::ClassificationSchema(_)
            | AppError::ClassificationUnknownType(_) => REPHRASE_MESSAGE.into(),
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::OracleUnavailable(_) => ORACLE_DOWN_MESSAGE.into(),
            AppError::Database(_) | AppError::Internal(_) => {
                "Something went wrong. Please try again.".into()
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::ClassificationParse(_)
            | AppError::ClassificationSchema(_)
            | AppError::ClassificationUnknownType(_)
            | AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::OracleUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(e) => tracing::error!(error = %e, "Database error"),
            AppError::Internal(e) => tracing::error!(error = %e, "Internal error"),
            AppError::OracleUnavailable(e) => tracing::warn!(error = %e, "Oracle unavailable"),
            _ => {}
        }

        let body = json!({
            "error": {
                "message": self.user_message(),
                "code": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
