//! Admin dashboard rollups, computed from whole-table reads.

use serde::Serialize;

use crate::{
  book::Book,
  message::ContactMessage,
  progress::{ProgressStatus, ReadingProgress},
  user::{Role, SubscriptionStatus, User},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCounts {
  pub active:        u64,
  pub pending:       u64,
  pub cancelled:     u64,
  pub payment_issue: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubStats {
  /// Subscribers only; administrators are not counted.
  pub users_total:          u64,
  pub subscriptions:        SubscriptionCounts,
  pub notification_opt_ins: u64,
  pub books_total:          u64,
  pub books_published:      u64,
  pub readings_in_progress: u64,
  pub readings_completed:   u64,
  pub unread_messages:      u64,
}

pub fn rollup(
  users: &[User],
  books: &[Book],
  progress: &[ReadingProgress],
  messages: &[ContactMessage],
) -> ClubStats {
  let mut stats = ClubStats::default();

  for user in users.iter().filter(|u| u.role == Role::User) {
    stats.users_total += 1;
    if user.notifications_opt_in {
      stats.notification_opt_ins += 1;
    }
    let counter = match user.subscription_status {
      SubscriptionStatus::Active => &mut stats.subscriptions.active,
      SubscriptionStatus::Pending => &mut stats.subscriptions.pending,
      SubscriptionStatus::Cancelled => &mut stats.subscriptions.cancelled,
      SubscriptionStatus::PaymentIssue => &mut stats.subscriptions.payment_issue,
    };
    *counter += 1;
  }

  stats.books_total = books.len() as u64;
  stats.books_published = books.iter().filter(|b| b.published).count() as u64;

  for row in progress {
    match row.status {
      ProgressStatus::InProgress => stats.readings_in_progress += 1,
      ProgressStatus::Completed => stats.readings_completed += 1,
      ProgressStatus::NotStarted => {}
    }
  }

  stats.unread_messages = messages.iter().filter(|m| !m.read).count() as u64;
  stats
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn message(read: bool) -> ContactMessage {
    ContactMessage {
      message_id: Uuid::new_v4(),
      name:       "R".into(),
      email:      "r@example.com".into(),
      subject:    "s".into(),
      body:       "b".into(),
      read,
      created_at: Utc::now(),
    }
  }

  fn progress(status: ProgressStatus) -> ReadingProgress {
    let now = Utc::now();
    ReadingProgress {
      user_id: Uuid::new_v4(),
      book_id: Uuid::new_v4(),
      status,
      percent: 0.0,
      last_chapter: None,
      last_position: 0,
      started_at: now,
      completed_at: None,
      updated_at: now,
    }
  }

  #[test]
  fn empty_club_is_all_zeroes() {
    assert_eq!(rollup(&[], &[], &[], &[]), ClubStats::default());
  }

  #[test]
  fn counts_readings_and_unread_messages() {
    let rows = [
      progress(ProgressStatus::InProgress),
      progress(ProgressStatus::InProgress),
      progress(ProgressStatus::Completed),
      progress(ProgressStatus::NotStarted),
    ];
    let msgs = [message(false), message(true), message(false)];
    let stats = rollup(&[], &[], &rows, &msgs);
    assert_eq!(stats.readings_in_progress, 2);
    assert_eq!(stats.readings_completed, 1);
    assert_eq!(stats.unread_messages, 2);
  }
}
