//! Error taxonomy shared by the core and the HTTP layer.
//!
//! `AppError` is what handlers return; it renders as JSON with a status code.
//! `ProviderError` never reaches a caller: the orchestrator, the game engine
//! and the community module convert it into fallback content.

use axum::{
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  /// Unknown level/format key or an incomplete instruction table.
  #[error("{0}")]
  Configuration(String),

  /// A remote generation or media call failed. Always recovered locally.
  #[error("provider failure: {0}")]
  Provider(#[from] ProviderError),

  /// Missing challenge, explanation or thread.
  #[error("{0}")]
  NotFound(String),

  /// Missing or malformed request field.
  #[error("{0}")]
  Validation(String),

  /// Store I/O or (de)serialization of a stored record.
  #[error("storage failure: {0}")]
  Storage(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("provider HTTP {status}: {message}")]
  Http { status: u16, message: String },

  #[error("transport error: {0}")]
  Transport(String),

  #[error("unexpected provider payload: {0}")]
  Decode(String),

  #[error("provider returned an empty response")]
  Empty,

  #[error("{0} is not supported by this provider")]
  Unsupported(&'static str),
}

impl From<reqwest::Error> for ProviderError {
  fn from(err: reqwest::Error) -> Self {
    ProviderError::Transport(err.to_string())
  }
}

impl From<serde_json::Error> for AppError {
  fn from(err: serde_json::Error) -> Self {
    AppError::Storage(err.to_string())
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    AppError::Storage(err.to_string())
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(err: validator::ValidationErrors) -> Self {
    AppError::Validation(err.to_string())
  }
}

impl From<JsonRejection> for AppError {
  fn from(rejection: JsonRejection) -> Self {
    AppError::Validation(rejection.body_text())
  }
}

impl From<QueryRejection> for AppError {
  fn from(rejection: QueryRejection) -> Self {
    AppError::Validation(rejection.body_text())
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      AppError::Configuration(msg) => (StatusCode::BAD_REQUEST, msg),
      AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
      AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
      AppError::Provider(err) => {
        tracing::error!(target: "lumen_backend", error = %err, "Provider error escaped to the HTTP layer");
        (StatusCode::BAD_GATEWAY, "Upstream provider unavailable".to_string())
      }
      AppError::Storage(msg) => {
        tracing::error!(target: "lumen_backend", error = %msg, "Storage error");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
      }
    };

    (status, Json(json!({ "success": false, "error": message }))).into_response()
  }
}
