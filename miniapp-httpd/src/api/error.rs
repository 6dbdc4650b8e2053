use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failure talking to the address store.
#[derive(Debug, thiserror::Error)]
pub enum Backend {
    /// Storage error.
    #[error(transparent)]
    Storage(#[from] miniapp::storage::Error),

    /// The blocking storage task didn't complete.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors relating to the HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing, unconfigured or wrong API key.
    #[error("Unauthorized - Invalid or missing x-api-key header")]
    Unauthorized,

    /// The request body has no string `address` field.
    #[error("Address is required and must be a string")]
    InvalidShape,

    /// The submitted address isn't an Ethereum address.
    #[error("Invalid Ethereum address format")]
    InvalidFormat,

    /// The address is already in the list.
    #[error("Address already exists")]
    Conflict,

    /// The address is not in the list.
    #[error("Address not found")]
    NotFound,

    /// The store failed. The message is what the caller gets to see.
    #[error("{0}")]
    Internal(&'static str, #[source] Backend),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::InvalidShape | Error::InvalidFormat => StatusCode::BAD_REQUEST,
            Error::Conflict => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Internal(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if let Error::Internal(msg, cause) = &self {
            tracing::error!("{msg}: {cause}");
        }
        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}

/// Response sent when a handler panics.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown cause");

    tracing::error!("Handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}
