//! API error type
//!
//! Every handler failure ends up as an [`ApiError`]: an HTTP status plus the
//! JSON [`ErrorResponse`] body.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use tracing::error;

use crate::access::Denial;
use crate::models::ErrorResponse;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, code: &str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                code: Some(code.to_string()),
                fields: None,
            },
        }
    }

    pub fn not_found(error: impl Into<String>, code: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, code)
    }

    pub fn bad_request(error: impl Into<String>, code: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, code)
    }

    pub fn conflict(error: impl Into<String>, code: &str) -> Self {
        Self::new(StatusCode::CONFLICT, error, code)
    }

    pub fn unauthorized(error: impl Into<String>, code: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error, code)
    }

    pub fn forbidden(error: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, error, "FORBIDDEN")
    }

    /// Validation failure with per-field messages
    pub fn validation(fields: BTreeMap<String, Vec<String>>) -> Self {
        let mut err = Self::bad_request("Validation failed", "VALIDATION_ERROR");
        err.body.fields = Some(fields);
        err
    }

    /// Validation failure on a single field
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(name.to_string(), vec![message.into()]);
        Self::validation(fields)
    }

    pub fn database(err: DbErr) -> Self {
        error!("Database error: {}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database error",
            "DATABASE_ERROR",
        )
    }

    pub fn code(&self) -> Option<&str> {
        self.body.code.as_deref()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::MissingRole => Self::forbidden(denial.to_string()),
            Denial::NotOwner => Self::bad_request(denial.to_string(), "ORDER_NOT_OWNED"),
            Denial::OrderFinished => Self::bad_request(denial.to_string(), "ORDER_FINISHED"),
        }
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (path, err) in report.iter() {
            let name = path.to_string();
            let name = if name.is_empty() {
                "body".to_string()
            } else {
                name
            };
            fields.entry(name).or_default().push(err.message().to_string());
        }
        Self::validation(fields)
    }
}
