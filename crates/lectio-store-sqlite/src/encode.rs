//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with microsecond precision so
//! they sort lexically. Dates are ISO 8601. Enums are stored as their serde
//! names. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use lectio_core::{
  billing::{Country, Currency, PaymentMethodKind},
  book::{Book, Genre},
  finance::{Expense, ExpenseCategory},
  message::{ContactMessage, Notification, NotificationStatus},
  progress::{ProgressStatus, ReadingProgress},
  user::{Profile, Role, Sex, SubscriptionStatus, User},
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The store's clock, truncated to the precision that survives a round trip.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Store a unit-variant enum under its serde name, e.g. `"payment_issue"`.
pub fn encode_enum<T: Serialize>(value: &T) -> Result<String> {
  match serde_json::to_value(value)? {
    serde_json::Value::String(s) => Ok(s),
    other => Err(Error::Decode(format!("not a unit variant: {other}"))),
  }
}

pub fn decode_enum<T: DeserializeOwned>(s: &str) -> Result<T> {
  serde_json::from_value(serde_json::Value::String(s.to_owned()))
    .map_err(|_| Error::Decode(format!("unknown variant {s:?}")))
}

fn decode_opt_enum<T: DeserializeOwned>(s: Option<String>) -> Result<Option<T>> {
  s.as_deref().map(decode_enum).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, email, pin_hash, role, first_name, \
  last_name, country, birth_date, sex, subscription_status, currency, \
  payment_method_id, payment_method_kind, notifications_opt_in, created_at, \
  last_login_at, pin_changed_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:              String,
  pub email:                String,
  pub pin_hash:             String,
  pub role:                 String,
  pub first_name:           String,
  pub last_name:            String,
  pub country:              String,
  pub birth_date:           Option<String>,
  pub sex:                  Option<String>,
  pub subscription_status:  String,
  pub currency:             String,
  pub payment_method_id:    Option<String>,
  pub payment_method_kind:  Option<String>,
  pub notifications_opt_in: bool,
  pub created_at:           String,
  pub last_login_at:        Option<String>,
  pub pin_changed_at:       Option<String>,
}

impl RawUser {
  /// Columns in [`USER_COLUMNS`] order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:              row.get(0)?,
      email:                row.get(1)?,
      pin_hash:             row.get(2)?,
      role:                 row.get(3)?,
      first_name:           row.get(4)?,
      last_name:            row.get(5)?,
      country:              row.get(6)?,
      birth_date:           row.get(7)?,
      sex:                  row.get(8)?,
      subscription_status:  row.get(9)?,
      currency:             row.get(10)?,
      payment_method_id:    row.get(11)?,
      payment_method_kind:  row.get(12)?,
      notifications_opt_in: row.get(13)?,
      created_at:           row.get(14)?,
      last_login_at:        row.get(15)?,
      pin_changed_at:       row.get(16)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:              decode_uuid(&self.user_id)?,
      email:                self.email,
      pin_hash:             self.pin_hash,
      role:                 decode_enum::<Role>(&self.role)?,
      profile:              Profile {
        first_name: self.first_name,
        last_name:  self.last_name,
        country:    decode_enum::<Country>(&self.country)?,
        birth_date: self.birth_date.as_deref().map(decode_date).transpose()?,
        sex:        decode_opt_enum::<Sex>(self.sex)?,
      },
      subscription_status:  decode_enum::<SubscriptionStatus>(&self.subscription_status)?,
      currency:             decode_enum::<Currency>(&self.currency)?,
      payment_method_id:    self.payment_method_id,
      payment_method_kind:  decode_opt_enum::<PaymentMethodKind>(self.payment_method_kind)?,
      notifications_opt_in: self.notifications_opt_in,
      created_at:           decode_dt(&self.created_at)?,
      last_login_at:        decode_opt_dt(self.last_login_at)?,
      pin_changed_at:       decode_opt_dt(self.pin_changed_at)?,
    })
  }
}

pub const BOOK_COLUMNS: &str = "book_id, title, author, genre, summary, \
  content_url, published_at, published, ranking, created_at, updated_at";

/// Raw values read directly from a `books` row.
pub struct RawBook {
  pub book_id:      String,
  pub title:        String,
  pub author:       String,
  pub genre:        Option<String>,
  pub summary:      String,
  pub content_url:  String,
  pub published_at: Option<String>,
  pub published:    bool,
  pub ranking:      Option<i32>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawBook {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      book_id:      row.get(0)?,
      title:        row.get(1)?,
      author:       row.get(2)?,
      genre:        row.get(3)?,
      summary:      row.get(4)?,
      content_url:  row.get(5)?,
      published_at: row.get(6)?,
      published:    row.get(7)?,
      ranking:      row.get(8)?,
      created_at:   row.get(9)?,
      updated_at:   row.get(10)?,
    })
  }

  pub fn into_book(self) -> Result<Book> {
    Ok(Book {
      book_id:      decode_uuid(&self.book_id)?,
      title:        self.title,
      author:       self.author,
      genre:        decode_opt_enum::<Genre>(self.genre)?,
      summary:      self.summary,
      content_url:  self.content_url,
      published_at: decode_opt_dt(self.published_at)?,
      published:    self.published,
      ranking:      self.ranking,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

pub const PROGRESS_COLUMNS: &str = "user_id, book_id, status, percent, \
  last_chapter, last_position, started_at, completed_at, updated_at";

/// Raw values read directly from a `reading_progress` row.
pub struct RawProgress {
  pub user_id:       String,
  pub book_id:       String,
  pub status:        String,
  pub percent:       f64,
  pub last_chapter:  Option<String>,
  pub last_position: i64,
  pub started_at:    String,
  pub completed_at:  Option<String>,
  pub updated_at:    String,
}

impl RawProgress {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      book_id:       row.get(1)?,
      status:        row.get(2)?,
      percent:       row.get(3)?,
      last_chapter:  row.get(4)?,
      last_position: row.get(5)?,
      started_at:    row.get(6)?,
      completed_at:  row.get(7)?,
      updated_at:    row.get(8)?,
    })
  }

  pub fn into_progress(self) -> Result<ReadingProgress> {
    Ok(ReadingProgress {
      user_id:       decode_uuid(&self.user_id)?,
      book_id:       decode_uuid(&self.book_id)?,
      status:        decode_enum::<ProgressStatus>(&self.status)?,
      percent:       self.percent,
      last_chapter:  self.last_chapter,
      last_position: self.last_position,
      started_at:    decode_dt(&self.started_at)?,
      completed_at:  decode_opt_dt(self.completed_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const MESSAGE_COLUMNS: &str =
  "message_id, name, email, subject, body, read, created_at";

/// Raw values read directly from a `contact_messages` row.
pub struct RawMessage {
  pub message_id: String,
  pub name:       String,
  pub email:      String,
  pub subject:    String,
  pub body:       String,
  pub read:       bool,
  pub created_at: String,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id: row.get(0)?,
      name:       row.get(1)?,
      email:      row.get(2)?,
      subject:    row.get(3)?,
      body:       row.get(4)?,
      read:       row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_message(self) -> Result<ContactMessage> {
    Ok(ContactMessage {
      message_id: decode_uuid(&self.message_id)?,
      name:       self.name,
      email:      self.email,
      subject:    self.subject,
      body:       self.body,
      read:       self.read,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str =
  "notification_id, title, message, sent_at, recipient_count, status";

/// Raw values read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub title:           String,
  pub message:         String,
  pub sent_at:         String,
  pub recipient_count: i64,
  pub status:          String,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      title:           row.get(1)?,
      message:         row.get(2)?,
      sent_at:         row.get(3)?,
      recipient_count: row.get(4)?,
      status:          row.get(5)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      title:           self.title,
      message:         self.message,
      sent_at:         decode_dt(&self.sent_at)?,
      recipient_count: u64::try_from(self.recipient_count)
        .map_err(|_| Error::Decode(format!("recipient_count {}", self.recipient_count)))?,
      status:          decode_enum::<NotificationStatus>(&self.status)?,
    })
  }
}

pub const EXPENSE_COLUMNS: &str = "expense_id, amount, currency, date, \
  category, country, vat_amount, description, created_at";

/// Raw values read directly from an `expenses` row.
pub struct RawExpense {
  pub expense_id:  String,
  pub amount:      i64,
  pub currency:    String,
  pub date:        String,
  pub category:    String,
  pub country:     String,
  pub vat_amount:  i64,
  pub description: String,
  pub created_at:  String,
}

impl RawExpense {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      expense_id:  row.get(0)?,
      amount:      row.get(1)?,
      currency:    row.get(2)?,
      date:        row.get(3)?,
      category:    row.get(4)?,
      country:     row.get(5)?,
      vat_amount:  row.get(6)?,
      description: row.get(7)?,
      created_at:  row.get(8)?,
    })
  }

  pub fn into_expense(self) -> Result<Expense> {
    Ok(Expense {
      expense_id:  decode_uuid(&self.expense_id)?,
      amount:      self.amount,
      currency:    decode_enum::<Currency>(&self.currency)?,
      date:        decode_date(&self.date)?,
      category:    decode_enum::<ExpenseCategory>(&self.category)?,
      country:     decode_enum::<Country>(&self.country)?,
      vat_amount:  self.vat_amount,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn enums_use_serde_names() {
    assert_eq!(encode_enum(&SubscriptionStatus::PaymentIssue).unwrap(), "payment_issue");
    assert_eq!(encode_enum(&Currency::Chf).unwrap(), "CHF");
    assert_eq!(encode_enum(&Country::Suisse).unwrap(), "Suisse");
    assert_eq!(decode_enum::<Genre>("sf").unwrap(), Genre::Sf);
    assert!(decode_enum::<Genre>("western").is_err());
  }

  #[test]
  fn timestamps_sort_lexically() {
    let a = decode_dt("2026-03-01T10:00:00.000000Z").unwrap();
    let b = a + chrono::Duration::microseconds(1);
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }
}
