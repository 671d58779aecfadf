//! The `ClubStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `lectio-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend,
//! and receives the store handle from whoever starts the process.

use std::future::Future;

use uuid::Uuid;

use crate::{
  book::{Book, BookDraft},
  finance::{Expense, Month, NewExpense},
  message::{ContactMessage, NewContactMessage, NewNotification, Notification},
  progress::{ProgressEvent, ReadingProgress},
  user::{NewUser, SubscriptionStatus, User},
};

// ─── Error classification ────────────────────────────────────────────────────

/// Error type of a [`ClubStore`] backend.
///
/// Backends wrap domain failures (duplicate email, unknown id) together with
/// their own I/O errors; `as_domain` lets callers tell the two apart.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain error carried by this failure, if it is one.
  fn as_domain(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Lectio store backend.
///
/// Every method is a single atomic unit as far as callers are concerned;
/// concurrent calls never observe a half-applied write.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ClubStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails with [`crate::Error::EmailTaken`] if the
  /// (normalised) email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look a user up by email; the argument is normalised by the store.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// All users, oldest first.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Replace the stored PIN hash and stamp `pin_changed_at`.
  fn set_pin_hash(
    &self,
    id: Uuid,
    pin_hash: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Stamp `last_login_at` with the current time.
  fn record_login(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn set_subscription_status(
    &self,
    id: Uuid,
    status: SubscriptionStatus,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Move every user linked to `payment_method_id` to `status`. Returns the
  /// updated users (possibly none).
  fn set_status_by_payment_method<'a>(
    &'a self,
    payment_method_id: &'a str,
    status: SubscriptionStatus,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  fn set_notifications_opt_in(
    &self,
    id: Uuid,
    enabled: bool,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Books ─────────────────────────────────────────────────────────────

  fn create_book(
    &self,
    draft: BookDraft,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  fn get_book(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Book>, Self::Error>> + Send + '_;

  /// Overwrite every editable field of a book.
  fn update_book(
    &self,
    id: Uuid,
    draft: BookDraft,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  /// Books ordered by publication date, newest first, undated last.
  /// With `published_only`, drafts are never returned.
  fn list_books(
    &self,
    published_only: bool,
  ) -> impl Future<Output = Result<Vec<Book>, Self::Error>> + Send + '_;

  // ── Reading progress ──────────────────────────────────────────────────

  /// Apply `event` to the (user, book) row, creating it if needed, as one
  /// transaction. See [`ReadingProgress::apply`].
  fn record_progress(
    &self,
    user_id: Uuid,
    book_id: Uuid,
    event: ProgressEvent,
  ) -> impl Future<Output = Result<ReadingProgress, Self::Error>> + Send + '_;

  fn get_progress(
    &self,
    user_id: Uuid,
    book_id: Uuid,
  ) -> impl Future<Output = Result<Option<ReadingProgress>, Self::Error>> + Send + '_;

  /// Progress rows, most recently updated first; all users when `user_id`
  /// is `None`.
  fn list_progress(
    &self,
    user_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<ReadingProgress>, Self::Error>> + Send + '_;

  // ── Contact messages ──────────────────────────────────────────────────

  fn add_message(
    &self,
    input: NewContactMessage,
  ) -> impl Future<Output = Result<ContactMessage, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_messages(
    &self,
  ) -> impl Future<Output = Result<Vec<ContactMessage>, Self::Error>> + Send + '_;

  /// Idempotent; fails with [`crate::Error::MessageNotFound`].
  fn mark_message_read(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<ContactMessage, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Snapshot the number of opted-in users and append one log entry, in a
  /// single transaction.
  fn record_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_notifications(
    &self,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  // ── Expenses ──────────────────────────────────────────────────────────

  fn add_expense(
    &self,
    input: NewExpense,
  ) -> impl Future<Output = Result<Expense, Self::Error>> + Send + '_;

  /// Overwrite an expense; fails with [`crate::Error::ExpenseNotFound`].
  fn update_expense(
    &self,
    id: Uuid,
    input: NewExpense,
  ) -> impl Future<Output = Result<Expense, Self::Error>> + Send + '_;

  /// Expenses by date, optionally restricted to one month.
  fn list_expenses(
    &self,
    month: Option<Month>,
  ) -> impl Future<Output = Result<Vec<Expense>, Self::Error>> + Send + '_;

  /// Fails with [`crate::Error::ExpenseNotFound`].
  fn delete_expense(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
