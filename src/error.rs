use std::net::SocketAddr;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("item {0} not found")]
    NotFound(u64),
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Item not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

/// Failures of the HTTP listener worker.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to spawn listener thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to build async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("listener terminated: {0}")]
    Serve(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TrayError {
    #[error("invalid tray icon: {0}")]
    Icon(#[from] tray_icon::BadIcon),
    #[error("failed to build tray menu: {0}")]
    Menu(#[from] tray_icon::menu::Error),
    #[error("failed to build tray icon: {0}")]
    Build(#[from] tray_icon::Error),
}
