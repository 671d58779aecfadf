//! Error types for `lectio-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Login failure. The message never says which of email or PIN was wrong.
  #[error("invalid email or PIN")]
  InvalidCredentials,

  #[error("current PIN is incorrect")]
  WrongCurrentPin,

  #[error("invalid new PIN: {0}")]
  InvalidNewPin(&'static str),

  #[error("{0}")]
  Validation(String),

  #[error("email already registered")]
  EmailTaken,

  #[error("unknown country: {0:?}")]
  UnknownCountry(String),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("book not found: {0}")]
  BookNotFound(Uuid),

  #[error("message not found: {0}")]
  MessageNotFound(Uuid),

  #[error("expense not found: {0}")]
  ExpenseNotFound(Uuid),
}

impl Error {
  /// Shorthand for a [`Error::Validation`] with a formatted message.
  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
