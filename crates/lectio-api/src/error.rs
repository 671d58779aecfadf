//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lectio_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden")]
  Forbidden,

  #[error("invalid email or PIN")]
  InvalidCredentials,

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  /// Store, hashing or token-signing failure. Logged, never shown.
  #[error("upstream error: {0}")]
  Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn upstream(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    ApiError::Upstream(Box::new(e))
  }

  /// Classify a store failure by the domain error it carries, if any.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.as_domain() {
      Some(domain) => Self::classify(domain),
      None => Self::upstream(e),
    }
  }

  fn classify(e: &lectio_core::Error) -> Self {
    use lectio_core::Error as E;
    let msg = e.to_string();
    match e {
      E::InvalidCredentials => ApiError::InvalidCredentials,
      E::WrongCurrentPin
      | E::InvalidNewPin(_)
      | E::Validation(_)
      | E::UnknownCountry(_) => ApiError::BadRequest(msg),
      E::EmailTaken => ApiError::Conflict(msg),
      E::UserNotFound(_)
      | E::BookNotFound(_)
      | E::MessageNotFound(_)
      | E::ExpenseNotFound(_) => ApiError::NotFound(msg),
    }
  }
}

impl From<lectio_core::Error> for ApiError {
  fn from(e: lectio_core::Error) -> Self {
    Self::classify(&e)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
      ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Upstream(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
