//! Unified application error model and HTTP mapping.
//! Every handler returns `AppResult<T>`; the error side renders as
//! `{"status":"error","code":...,"message":...}` with the matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::storage::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    Validation { code: String, message: String },
    Auth { code: String, message: String },
    NotFound { code: String, message: String },
    TooLarge { code: String, message: String },
    Unavailable { code: String, message: String },
    Storage { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Validation { code, .. }
            | AppError::Auth { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::TooLarge { code, .. }
            | AppError::Unavailable { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::Auth { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::TooLarge { message, .. }
            | AppError::Unavailable { message, .. }
            | AppError::Storage { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn validation(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Validation { code: code.into(), message: msg.into() } }
    pub fn not_found(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn too_large(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::TooLarge { code: code.into(), message: msg.into() } }
    pub fn unavailable(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Unavailable { code: code.into(), message: msg.into() } }
    pub fn storage(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Storage { code: code.into(), message: msg.into() } }
    pub fn internal(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// The only authentication error the API ever reports. Nothing about which
    /// half of the credential pair was wrong leaks out.
    pub fn unauthorized() -> Self {
        AppError::Auth { code: "unauthorized".into(), message: "invalid credentials".into() }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::NotFound { .. } => 404,
            AppError::TooLarge { .. } => 413,
            AppError::Unavailable { .. } => 503,
            AppError::Storage { .. } => 500,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => AppError::unavailable("storage_unavailable", err.to_string()),
            StoreError::Backend(_) | StoreError::Corrupt(_) => AppError::storage("storage_error", err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(target: "vertocraft::api", code = self.code_str(), "{}", self.message());
        }
        let body = serde_json::json!({
            "status": "error",
            "code": self.code_str(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
