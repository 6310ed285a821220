//! Error types for stagegate-service

use crate::session::SessionError;
use crate::views;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use stagegate_core::{ErrorClass, GateError, PassphraseError, StoreError};
use thiserror::Error;
use tracing::{error, info, warn};

/// Startup errors. Any of these halts the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("passphrase source error: {0}")]
    Passphrase(#[from] PassphraseError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("content catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for service startup
pub type ServiceResult<T> = Result<T, ServiceError>;

pub fn status_for(err: &GateError) -> StatusCode {
    match err.class() {
        ErrorClass::Input => StatusCode::BAD_REQUEST,
        ErrorClass::Generation => StatusCode::SERVICE_UNAVAILABLE,
        ErrorClass::Store => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorClass::Tampering => StatusCode::FORBIDDEN,
        ErrorClass::Content => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Logs a request failure at the severity its class calls for and renders
/// the error view.
pub fn error_response(err: &GateError, static_prefix: &str) -> Response {
    let class = err.class();
    match class {
        ErrorClass::Input => info!(kind = err.label(), "rejected form input"),
        ErrorClass::Tampering => {
            warn!(security = true, kind = err.label(), error = %err, "tampering detected")
        }
        ErrorClass::Generation | ErrorClass::Store | ErrorClass::Content => {
            error!(class = class.name(), kind = err.label(), error = %err, "request failed")
        }
    }

    (status_for(err), Html(views::error_page(err, static_prefix))).into_response()
}

/// A failed gate operation on its way out as an HTTP response.
#[derive(Debug)]
pub struct GateFailure {
    pub error: GateError,
    pub static_prefix: String,
}

impl GateFailure {
    pub fn new(error: GateError, static_prefix: impl Into<String>) -> Self {
        Self {
            error,
            static_prefix: static_prefix.into(),
        }
    }
}

impl IntoResponse for GateFailure {
    fn into_response(self) -> Response {
        error_response(&self.error, &self.static_prefix)
    }
}
