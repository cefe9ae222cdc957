use axum::{
    Json,
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    auth::AuthError,
    guard::GuardError,
    pagination::PageError,
    password::HashError,
    providers::ProviderError,
    repository::RepoError,
};

/// Message returned for every upstream failure. Provider and database details
/// stay in the logs.
pub const GENERIC_FAILURE: &str = "Something went wrong! Please try again later...";

/// AppError
///
/// The boundary error type. Every handler returns `Result<_, AppError>`, and this is
/// the only place a failure is translated into an HTTP status.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),
    /// Missing account, section, article, or a page beyond range.
    #[error("{0}")]
    NotFound(String),
    /// No session, or a session of the wrong role.
    #[error("{0}")]
    Unauthorized(String),
    /// The caller may not act on this resource (e.g. another writer's article).
    #[error("{0}")]
    Forbidden(String),
    /// Duplicate email, banned account, subscribers-only content, and similar.
    #[error("{0}")]
    BusinessRule(String),
    /// Hashing, store, or provider failure. Not locally recoverable.
    #[error("{context}")]
    Upstream {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn rule(msg: impl Into<String>) -> Self {
        Self::BusinessRule(msg.into())
    }

    pub fn upstream<E>(context: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream {
            context,
            source: Box::new(source),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Forbidden(_) | AppError::BusinessRule(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match self {
            AppError::Upstream { context, source } => {
                tracing::error!(error = %source, "{context}");
                GENERIC_FAILURE.to_string()
            }
            other => other.to_string(),
        };
        ApiResponse::<()>::failure(status, msg).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        AppError::upstream("store operation failed", err)
    }
}

impl From<HashError> for AppError {
    fn from(err: HashError) -> Self {
        AppError::upstream("password hashing failed", err)
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::upstream("external provider call failed", err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailNotFound => AppError::NotFound(err.to_string()),
            AuthError::IncorrectPassword | AuthError::NotVerified | AuthError::Banned => {
                AppError::BusinessRule(err.to_string())
            }
            AuthError::Store(e) => e.into(),
            AuthError::Hash(e) => e.into(),
        }
    }
}

impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Store(e) => e.into(),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::InvalidPage | PageError::InvalidLimit => {
                AppError::Validation(err.to_string())
            }
            PageError::ZeroPage | PageError::ZeroLimit | PageError::OutOfRange => {
                AppError::NotFound(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// ApiResponse
///
/// The `{statusCode, data?, msg?}` envelope every endpoint answers with.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            data: Some(data),
            msg: None,
        }
    }

    pub fn ok_with(data: T, msg: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            data: Some(data),
            msg: Some(msg.into()),
        }
    }

    pub fn created(data: T, msg: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::CREATED.as_u16(),
            data: Some(data),
            msg: Some(msg.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            data: None,
            msg: Some(msg.into()),
        }
    }

    fn failure(status: StatusCode, msg: String) -> Self {
        Self {
            status_code: status.as_u16(),
            data: None,
            msg: Some(msg),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
