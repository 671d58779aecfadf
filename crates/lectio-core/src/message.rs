//! Contact messages and the admin notification log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, user::validate_email};

/// Maximum length, in characters, of a notification's message.
pub const NOTIFICATION_MESSAGE_MAX: usize = 200;

// ─── Contact messages ────────────────────────────────────────────────────────

/// A message left through the public contact form. Only `read` ever changes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
  pub message_id: Uuid,
  pub name:       String,
  pub email:      String,
  pub subject:    String,
  pub body:       String,
  pub read:       bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContactMessage {
  pub name:    String,
  pub email:   String,
  pub subject: String,
  #[serde(alias = "message")]
  pub body:    String,
}

impl NewContactMessage {
  pub fn validate(&self) -> Result<()> {
    let blank = [
      ("name", &self.name),
      ("email", &self.email),
      ("subject", &self.subject),
      ("message", &self.body),
    ]
    .into_iter()
    .filter(|(_, v)| v.trim().is_empty())
    .map(|(k, _)| k)
    .collect::<Vec<_>>();
    if !blank.is_empty() {
      return Err(Error::Validation(format!("missing fields: {}", blank.join(", "))));
    }
    validate_email(self.email.trim())
  }
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
  Sent,
  NoRecipients,
}

/// One admin send action. Immutable once recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub notification_id: Uuid,
  pub title:           String,
  pub message:         String,
  pub sent_at:         DateTime<Utc>,
  /// Opted-in users at the moment of sending.
  pub recipient_count: u64,
  pub status:          NotificationStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
  pub title:   String,
  #[serde(alias = "body")]
  pub message: String,
}

impl NewNotification {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() || self.message.trim().is_empty() {
      return Err(Error::validation("title and message are required"));
    }
    if self.message.chars().count() > NOTIFICATION_MESSAGE_MAX {
      return Err(Error::Validation(format!(
        "message must be at most {NOTIFICATION_MESSAGE_MAX} characters"
      )));
    }
    Ok(())
  }

  /// The status a send with `recipient_count` recipients is logged with.
  pub fn status_for(recipient_count: u64) -> NotificationStatus {
    if recipient_count == 0 {
      NotificationStatus::NoRecipients
    } else {
      NotificationStatus::Sent
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn contact_requires_every_field() {
    let msg = NewContactMessage {
      name:    "".into(),
      email:   "reader@example.com".into(),
      subject: "Hello".into(),
      body:    " ".into(),
    };
    let Err(Error::Validation(text)) = msg.validate() else { panic!() };
    assert!(text.contains("name") && text.contains("message"), "{text}");
  }

  #[test]
  fn contact_checks_email_shape() {
    let msg = NewContactMessage {
      name:    "Reader".into(),
      email:   "not-an-email".into(),
      subject: "Hello".into(),
      body:    "Hi".into(),
    };
    assert!(msg.validate().is_err());
  }

  #[test]
  fn notification_message_is_short() {
    let long = NewNotification { title: "News".into(), message: "x".repeat(201) };
    assert!(long.validate().is_err());
    let fine = NewNotification { title: "News".into(), message: "é".repeat(200) };
    assert!(fine.validate().is_ok());
  }

  #[test]
  fn zero_recipients_is_recorded_as_such() {
    assert_eq!(NewNotification::status_for(0), NotificationStatus::NoRecipients);
    assert_eq!(NewNotification::status_for(3), NotificationStatus::Sent);
  }
}
