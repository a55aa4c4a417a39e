// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::plan::PlanError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Run {0} was imported from Strava and cannot be modified")]
    ImportedRun(i64),

    #[error("Training plan error: {0}")]
    PlanLoad(#[from] PlanError),

    #[error("Strava credential error: {0}")]
    Credential(String),

    #[error("Strava API error: {0}")]
    RemoteFetch(String),

    #[error("Strava integration is not configured")]
    StravaNotConfigured,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the failure is transient and the user may simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Credential(_) | AppError::RemoteFetch(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::ImportedRun(_) => {
                (StatusCode::CONFLICT, "imported_run", Some(self.to_string()))
            }
            AppError::PlanLoad(err) => {
                tracing::error!(error = %err, "Training plan error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "plan_error",
                    Some(err.to_string()),
                )
            }
            AppError::Credential(msg) => (
                StatusCode::UNAUTHORIZED,
                "strava_credential",
                Some(msg.clone()),
            ),
            AppError::RemoteFetch(msg) => {
                (StatusCode::BAD_GATEWAY, "strava_error", Some(msg.clone()))
            }
            AppError::StravaNotConfigured => {
                (StatusCode::SERVICE_UNAVAILABLE, "strava_not_configured", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            retryable,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
