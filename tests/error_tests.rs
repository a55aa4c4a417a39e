// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use running_log::error::AppError;
use running_log::services::PlanError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_retryable_errors() {
    assert!(AppError::Credential("refresh rejected".to_string()).is_retryable());
    assert!(AppError::RemoteFetch("timed out".to_string()).is_retryable());
}

#[test]
fn test_non_retryable_errors() {
    assert!(!AppError::Validation("bad".to_string()).is_retryable());
    assert!(!AppError::NotFound("Run 1".to_string()).is_retryable());
    assert!(!AppError::ImportedRun(1).is_retryable());
    assert!(!AppError::StravaNotConfigured.is_retryable());
    assert!(!AppError::Database("locked".to_string()).is_retryable());
}

#[tokio::test]
async fn test_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED, "unauthorized"),
        (
            AppError::Validation("x".to_string()),
            StatusCode::BAD_REQUEST,
            "validation_error",
        ),
        (
            AppError::NotFound("Run 9".to_string()),
            StatusCode::NOT_FOUND,
            "not_found",
        ),
        (AppError::ImportedRun(9), StatusCode::CONFLICT, "imported_run"),
        (
            AppError::PlanLoad(PlanError::Parse("bad yaml".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR,
            "plan_error",
        ),
        (
            AppError::Credential("x".to_string()),
            StatusCode::UNAUTHORIZED,
            "strava_credential",
        ),
        (
            AppError::RemoteFetch("x".to_string()),
            StatusCode::BAD_GATEWAY,
            "strava_error",
        ),
        (
            AppError::StravaNotConfigured,
            StatusCode::SERVICE_UNAVAILABLE,
            "strava_not_configured",
        ),
        (
            AppError::Database("x".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
        ),
    ];

    for (err, status, code) in cases {
        let (actual_status, body) = render(err).await;
        assert_eq!(actual_status, status, "{code}");
        assert_eq!(body["error"], code);
    }
}

#[tokio::test]
async fn test_retryable_flag_in_body() {
    let (_, body) = render(AppError::RemoteFetch("Strava rate limit exceeded".to_string())).await;
    assert_eq!(body["retryable"], true);
    assert_eq!(body["details"], "Strava rate limit exceeded");

    let (_, body) = render(AppError::NotFound("Run 3".to_string())).await;
    assert!(body.get("retryable").is_none());
}

#[tokio::test]
async fn test_internal_details_not_exposed() {
    let (status, body) = render(AppError::Database("disk I/O error at /var/db".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("details").is_none());

    let (_, body) = render(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}

#[test]
fn test_validation_errors_convert() {
    use validator::Validate;

    #[derive(Validate)]
    struct Input {
        #[validate(range(min = 1))]
        days: u32,
    }

    let err: AppError = Input { days: 0 }.validate().unwrap_err().into();
    assert!(matches!(err, AppError::Validation(_)));
}
