// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::application::use_cases::audit_use_case::AuditUseCaseError;
use crate::application::use_cases::geo_grid_use_case::GeoGridUseCaseError;
use crate::application::use_cases::scan_use_case::ScanUseCaseError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// 应用错误类型
///
/// 统一把用例层错误转换为 HTTP 状态码和 `{"error": ...}` 响应体，
/// 存储和队列错误只记录日志，不向调用方暴露细节
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    retry_after_seconds: Option<i64>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            retry_after_seconds: None,
        }
    }

    fn internal(detail: impl std::fmt::Display) -> Self {
        error!("Request failed: {}", detail);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        let mut response = (self.status, body).into_response();
        if let Some(seconds) = self.retry_after_seconds {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<AuditUseCaseError> for AppError {
    fn from(err: AuditUseCaseError) -> Self {
        match err {
            AuditUseCaseError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            AuditUseCaseError::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            AuditUseCaseError::Forbidden => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            AuditUseCaseError::InvalidStatus(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            AuditUseCaseError::RateLimited {
                retry_after_seconds,
                ..
            } => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: err.to_string(),
                retry_after_seconds: Some(retry_after_seconds),
            },
            AuditUseCaseError::Repository(_) | AuditUseCaseError::Queue(_) => Self::internal(err),
        }
    }
}

impl From<ScanUseCaseError> for AppError {
    fn from(err: ScanUseCaseError) -> Self {
        match err {
            ScanUseCaseError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            ScanUseCaseError::NotFound | ScanUseCaseError::PageNotFound => {
                Self::new(StatusCode::NOT_FOUND, err.to_string())
            }
            ScanUseCaseError::Forbidden => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            ScanUseCaseError::Repository(_) | ScanUseCaseError::Queue(_) => Self::internal(err),
        }
    }
}

impl From<GeoGridUseCaseError> for AppError {
    fn from(err: GeoGridUseCaseError) -> Self {
        match err {
            GeoGridUseCaseError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            GeoGridUseCaseError::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            GeoGridUseCaseError::Forbidden => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            GeoGridUseCaseError::Repository(_) | GeoGridUseCaseError::Queue(_) => Self::internal(err),
        }
    }
}
