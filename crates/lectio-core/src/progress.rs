//! Reading progress, one row per (user, book).
//!
//! Status only moves forward: `not_started → in_progress → completed`.
//! Checkpoints overwrite the position fields without touching the status, and
//! are accepted even when the reader scrolls backwards. Every transition is a
//! pure function of the previous row so the store can apply it inside a single
//! transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
  NotStarted,
  InProgress,
  Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
  pub user_id:       Uuid,
  pub book_id:       Uuid,
  pub status:        ProgressStatus,
  /// 0–100, as last reported by the reader.
  pub percent:       f64,
  pub last_chapter:  Option<String>,
  /// Scroll or byte offset to resume from.
  pub last_position: i64,
  pub started_at:    DateTime<Utc>,
  pub completed_at:  Option<DateTime<Utc>>,
  pub updated_at:    DateTime<Utc>,
}

/// A periodic save of the reader's position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
  #[serde(rename = "progressPercent")]
  pub percent:       f64,
  pub last_chapter:  Option<String>,
  #[serde(default)]
  pub last_position: i64,
}

impl Checkpoint {
  pub fn validate(&self) -> Result<()> {
    if !self.percent.is_finite() || !(0.0..=100.0).contains(&self.percent) {
      return Err(Error::validation("progressPercent must be between 0 and 100"));
    }
    if self.last_position < 0 {
      return Err(Error::validation("lastPosition must not be negative"));
    }
    Ok(())
  }
}

/// Something the reader did to a book.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
  StartOrResume,
  Checkpoint(Checkpoint),
  Complete,
}

impl ReadingProgress {
  fn fresh(user_id: Uuid, book_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      user_id,
      book_id,
      status: ProgressStatus::InProgress,
      percent: 0.0,
      last_chapter: None,
      last_position: 0,
      started_at: now,
      completed_at: None,
      updated_at: now,
    }
  }

  /// Apply `event` to the existing row for (`user_id`, `book_id`), if any.
  ///
  /// A missing row is created `in_progress` at position 0, whatever the event.
  /// Applying the same checkpoint twice yields the same row apart from
  /// `updated_at`.
  pub fn apply(
    existing: Option<Self>,
    user_id: Uuid,
    book_id: Uuid,
    event: &ProgressEvent,
    now: DateTime<Utc>,
  ) -> Self {
    let mut row = existing.unwrap_or_else(|| Self::fresh(user_id, book_id, now));

    match event {
      ProgressEvent::StartOrResume => {
        if row.status == ProgressStatus::NotStarted {
          row.status = ProgressStatus::InProgress;
          row.started_at = now;
          row.updated_at = now;
        }
        // Resuming an in-progress or completed book changes nothing.
      }
      ProgressEvent::Checkpoint(cp) => {
        row.percent = cp.percent;
        row.last_chapter = cp.last_chapter.clone();
        row.last_position = cp.last_position;
        row.updated_at = now;
      }
      ProgressEvent::Complete => {
        row.status = ProgressStatus::Completed;
        row.percent = 100.0;
        row.completed_at.get_or_insert(now);
        row.updated_at = now;
      }
    }
    row
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn ids() -> (Uuid, Uuid) { (Uuid::new_v4(), Uuid::new_v4()) }

  fn cp(percent: f64, chapter: &str, position: i64) -> ProgressEvent {
    ProgressEvent::Checkpoint(Checkpoint {
      percent,
      last_chapter: Some(chapter.into()),
      last_position: position,
    })
  }

  #[test]
  fn start_creates_in_progress_at_zero() {
    let (u, b) = ids();
    let row = ReadingProgress::apply(None, u, b, &ProgressEvent::StartOrResume, Utc::now());
    assert_eq!(row.status, ProgressStatus::InProgress);
    assert_eq!(row.last_position, 0);
    assert_eq!(row.percent, 0.0);
  }

  #[test]
  fn resume_keeps_position_and_status() {
    let (u, b) = ids();
    let t0 = Utc::now();
    let row = ReadingProgress::apply(None, u, b, &cp(42.0, "ch3", 9000), t0);
    let later = t0 + Duration::minutes(5);
    let resumed = ReadingProgress::apply(
      Some(row.clone()),
      u,
      b,
      &ProgressEvent::StartOrResume,
      later,
    );
    assert_eq!(resumed, row);
  }

  #[test]
  fn not_started_row_moves_to_in_progress() {
    let (u, b) = ids();
    let mut row = ReadingProgress::fresh(u, b, Utc::now());
    row.status = ProgressStatus::NotStarted;
    let row = ReadingProgress::apply(Some(row), u, b, &ProgressEvent::StartOrResume, Utc::now());
    assert_eq!(row.status, ProgressStatus::InProgress);
  }

  #[test]
  fn checkpoint_accepts_regression_and_keeps_status() {
    let (u, b) = ids();
    let now = Utc::now();
    let row = ReadingProgress::apply(None, u, b, &cp(60.0, "ch6", 6000), now);
    let row = ReadingProgress::apply(Some(row), u, b, &ProgressEvent::Complete, now);
    let row = ReadingProgress::apply(Some(row), u, b, &cp(10.0, "ch1", 100), now);
    assert_eq!(row.status, ProgressStatus::Completed);
    assert_eq!(row.percent, 10.0);
    assert_eq!(row.last_chapter.as_deref(), Some("ch1"));
  }

  #[test]
  fn duplicate_checkpoint_is_idempotent() {
    let (u, b) = ids();
    let now = Utc::now();
    let once = ReadingProgress::apply(None, u, b, &cp(33.0, "ch2", 1234), now);
    let twice = ReadingProgress::apply(Some(once.clone()), u, b, &cp(33.0, "ch2", 1234), now);
    assert_eq!(once, twice);
  }

  #[test]
  fn complete_forces_hundred_percent() {
    let (u, b) = ids();
    let now = Utc::now();
    for start in [0.0, 12.5, 99.9, 100.0] {
      let row = ReadingProgress::apply(None, u, b, &cp(start, "x", 1), now);
      let row = ReadingProgress::apply(Some(row), u, b, &ProgressEvent::Complete, now);
      assert_eq!(row.status, ProgressStatus::Completed);
      assert_eq!(row.percent, 100.0);
    }
  }

  #[test]
  fn completed_at_is_kept_from_first_completion() {
    let (u, b) = ids();
    let t0 = Utc::now();
    let row = ReadingProgress::apply(None, u, b, &ProgressEvent::Complete, t0);
    let row = ReadingProgress::apply(
      Some(row),
      u,
      b,
      &ProgressEvent::Complete,
      t0 + Duration::days(1),
    );
    assert_eq!(row.completed_at, Some(t0));
  }

  #[test]
  fn checkpoint_validation() {
    let ok = Checkpoint { percent: 50.0, last_chapter: None, last_position: 10 };
    assert!(ok.validate().is_ok());
    let over = Checkpoint { percent: 100.5, ..ok.clone() };
    assert!(over.validate().is_err());
    let nan = Checkpoint { percent: f64::NAN, ..ok.clone() };
    assert!(nan.validate().is_err());
    let negative = Checkpoint { last_position: -1, ..ok };
    assert!(negative.validate().is_err());
  }
}
