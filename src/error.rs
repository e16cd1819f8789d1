use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::route_table::RouteTableError;

/// Per-request failures. Every variant ends the request; nothing is retried.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("no route or asset for '{path}'")]
  RouteNotFound { path: String },

  #[error("upstream unreachable for '{path}': {message}")]
  UpstreamUnreachable { path: String, message: String },

  #[error("upstream did not answer '{path}' within {timeout:?}")]
  UpstreamTimeout { path: String, timeout: Duration },

  #[error("upstream sent an unusable response for '{path}': {message}")]
  UpstreamBadResponse { path: String, message: String },

  #[error("request body for '{path}' exceeds {limit} bytes")]
  PayloadTooLarge { path: String, limit: usize },

  #[error("failed reading request body for '{path}': {message}")]
  RequestBody { path: String, message: String },
}

impl GatewayError {
  pub fn path(&self) -> &str {
    match self {
      GatewayError::RouteNotFound { path }
      | GatewayError::UpstreamUnreachable { path, .. }
      | GatewayError::UpstreamTimeout { path, .. }
      | GatewayError::UpstreamBadResponse { path, .. }
      | GatewayError::PayloadTooLarge { path, .. }
      | GatewayError::RequestBody { path, .. } => path,
    }
  }

  /// Builds the error from a failed `send`, connect failures (connect timeouts
  /// included) count as unreachable.
  pub fn from_send(path: &str, err: reqwest::Error, timeout: Option<Duration>) -> GatewayError {
    let path = String::from(path);

    if err.is_connect() {
      GatewayError::UpstreamUnreachable {
        path,
        message: err.to_string(),
      }
    } else if err.is_timeout() {
      GatewayError::UpstreamTimeout {
        path,
        timeout: timeout.unwrap_or_default(),
      }
    } else {
      GatewayError::UpstreamBadResponse {
        path,
        message: err.to_string(),
      }
    }
  }

  fn body(&self) -> serde_json::Value {
    let error = self.status_code().canonical_reason().unwrap_or("Error");

    match self {
      GatewayError::RouteNotFound { path } => json!({ "error": error, "path": path }),
      other => json!({
        "error": error,
        "path": other.path(),
        "message": other.to_string(),
      }),
    }
  }
}

impl ResponseError for GatewayError {
  fn status_code(&self) -> StatusCode {
    match self {
      GatewayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
      GatewayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
      GatewayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
      GatewayError::UpstreamBadResponse { .. } => StatusCode::BAD_GATEWAY,
      GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
      GatewayError::RequestBody { .. } => StatusCode::BAD_REQUEST,
    }
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code()).json(self.body())
  }
}

/// Startup failures; the gateway refuses to bind when any of these occur.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid upstream origin '{origin}': {reason}")]
  InvalidOrigin { origin: String, reason: String },

  #[error("cannot read route file '{file}': {source}")]
  RouteFile {
    file: String,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid CORS origin '{0}'")]
  InvalidCorsOrigin(String),

  #[error(transparent)]
  RouteTable(#[from] RouteTableError),

  #[error("cannot build upstream client: {0}")]
  HttpClient(#[from] reqwest::Error),
}

impl From<ConfigError> for std::io::Error {
  fn from(err: ConfigError) -> Self {
    std::io::Error::new(std::io::ErrorKind::Other, err)
  }
}
