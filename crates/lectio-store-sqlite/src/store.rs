//! [`SqliteStore`], the SQLite implementation of [`ClubStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use lectio_core::{
  book::{Book, BookDraft},
  finance::{Expense, Month, NewExpense},
  message::{ContactMessage, NewContactMessage, NewNotification, Notification},
  progress::{ProgressEvent, ReadingProgress},
  store::ClubStore,
  user::{NewUser, SubscriptionStatus, User, normalize_email},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    BOOK_COLUMNS, EXPENSE_COLUMNS, MESSAGE_COLUMNS, NOTIFICATION_COLUMNS,
    PROGRESS_COLUMNS, RawBook, RawExpense, RawMessage, RawNotification,
    RawProgress, RawUser, USER_COLUMNS, encode_date, encode_dt, encode_enum,
    encode_uuid, now,
  },
  schema::SCHEMA,
};

type Params = Vec<Value>;

/// Carry one of our own errors out of a `Connection::call` closure.
fn other(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

fn dt_value(dt: Option<DateTime<Utc>>) -> Value { dt.map(encode_dt).into() }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lectio store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls are
/// serialised on the connection's thread, so each method body runs without
/// interleaving with any other.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an empty in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run one statement and return the number of affected rows.
  async fn execute(&self, sql: String, params: Params) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(params))?))
      .await?;
    Ok(changed)
  }

  /// Run a query and decode every row.
  async fn select<R, T>(
    &self,
    sql: String,
    params: Params,
    from_row: fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
    decode: fn(R) -> Result<T>,
  ) -> Result<Vec<T>>
  where
    R: Send + 'static,
  {
    let raws: Vec<R> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(decode).collect()
  }

  async fn users_where(&self, clause: &str, params: Params) -> Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users {clause}");
    self.select(sql, params, RawUser::from_row, RawUser::into_user).await
  }

  /// Fetch a user that is known to exist, or report it missing.
  async fn existing_user(&self, id: Uuid) -> Result<User> {
    self
      .get_user(id)
      .await?
      .ok_or(Error::Core(lectio_core::Error::UserNotFound(id)))
  }

  /// Apply an UPDATE to one user row and return the fresh record.
  async fn update_user(&self, id: Uuid, set: &str, mut params: Params) -> Result<User> {
    params.push(encode_uuid(id).into());
    let sql = format!("UPDATE users SET {set} WHERE user_id = ?{}", params.len());
    if self.execute(sql, params).await? == 0 {
      return Err(lectio_core::Error::UserNotFound(id).into());
    }
    self.existing_user(id).await
  }

  async fn messages_where(&self, clause: &str, params: Params) -> Result<Vec<ContactMessage>> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM contact_messages {clause}");
    self.select(sql, params, RawMessage::from_row, RawMessage::into_message).await
  }

  async fn expenses_where(&self, clause: &str, params: Params) -> Result<Vec<Expense>> {
    let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses {clause}");
    self.select(sql, params, RawExpense::from_row, RawExpense::into_expense).await
  }

  fn book_params(draft: &BookDraft) -> Result<Params> {
    Ok(vec![
      draft.title.trim().to_owned().into(),
      draft.author.trim().to_owned().into(),
      draft.genre.as_ref().map(encode_enum).transpose()?.into(),
      draft.summary.clone().into(),
      draft.content_url.trim().to_owned().into(),
      dt_value(draft.published_at),
      draft.published.into(),
      draft.ranking.into(),
    ])
  }

  fn expense_params(input: &NewExpense) -> Result<Params> {
    Ok(vec![
      input.amount.into(),
      encode_enum(&input.currency)?.into(),
      encode_date(input.date).into(),
      encode_enum(&input.category)?.into(),
      encode_enum(&input.country)?.into(),
      input.vat_amount.into(),
      input.description.clone().into(),
    ])
  }
}

// ─── ClubStore impl ──────────────────────────────────────────────────────────

impl ClubStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:              Uuid::new_v4(),
      email:                normalize_email(&input.email),
      pin_hash:             input.pin_hash,
      role:                 input.role,
      currency:             input.profile.country.currency(),
      profile:              input.profile,
      subscription_status:  input.subscription_status,
      payment_method_id:    input.payment_method_id,
      payment_method_kind:  input.payment_method_kind,
      notifications_opt_in: input.notifications_opt_in,
      created_at:           now(),
      last_login_at:        None,
      pin_changed_at:       None,
    };

    let params: Params = vec![
      encode_uuid(user.user_id).into(),
      user.email.clone().into(),
      user.pin_hash.clone().into(),
      encode_enum(&user.role)?.into(),
      user.profile.first_name.clone().into(),
      user.profile.last_name.clone().into(),
      encode_enum(&user.profile.country)?.into(),
      user.profile.birth_date.map(encode_date).into(),
      user.profile.sex.as_ref().map(encode_enum).transpose()?.into(),
      encode_enum(&user.subscription_status)?.into(),
      encode_enum(&user.currency)?.into(),
      user.payment_method_id.clone().into(),
      user.payment_method_kind.as_ref().map(encode_enum).transpose()?.into(),
      user.notifications_opt_in.into(),
      encode_dt(user.created_at).into(),
    ];
    let sql = format!(
      "INSERT INTO users ({USER_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, NULL, NULL)"
    );

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(&sql, rusqlite::params_from_iter(params)) {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(lectio_core::Error::EmailTaken.into());
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let users = self
      .users_where("WHERE user_id = ?1", vec![encode_uuid(id).into()])
      .await?;
    Ok(users.into_iter().next())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let users = self
      .users_where("WHERE email = ?1", vec![normalize_email(email).into()])
      .await?;
    Ok(users.into_iter().next())
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    self.users_where("ORDER BY created_at ASC", vec![]).await
  }

  async fn set_pin_hash(&self, id: Uuid, pin_hash: String) -> Result<User> {
    self
      .update_user(
        id,
        "pin_hash = ?1, pin_changed_at = ?2",
        vec![pin_hash.into(), encode_dt(now()).into()],
      )
      .await
  }

  async fn record_login(&self, id: Uuid) -> Result<User> {
    self
      .update_user(id, "last_login_at = ?1", vec![encode_dt(now()).into()])
      .await
  }

  async fn set_subscription_status(
    &self,
    id: Uuid,
    status: SubscriptionStatus,
  ) -> Result<User> {
    self
      .update_user(id, "subscription_status = ?1", vec![encode_enum(&status)?.into()])
      .await
  }

  async fn set_status_by_payment_method(
    &self,
    payment_method_id: &str,
    status: SubscriptionStatus,
  ) -> Result<Vec<User>> {
    let pm = payment_method_id.to_owned();
    self
      .execute(
        "UPDATE users SET subscription_status = ?1 WHERE payment_method_id = ?2".to_owned(),
        vec![encode_enum(&status)?.into(), pm.clone().into()],
      )
      .await?;
    self.users_where("WHERE payment_method_id = ?1", vec![pm.into()]).await
  }

  async fn set_notifications_opt_in(&self, id: Uuid, enabled: bool) -> Result<User> {
    self
      .update_user(id, "notifications_opt_in = ?1", vec![enabled.into()])
      .await
  }

  // ── Books ─────────────────────────────────────────────────────────────────

  async fn create_book(&self, draft: BookDraft) -> Result<Book> {
    let id = Uuid::new_v4();
    let at = encode_dt(now());
    let mut params = vec![encode_uuid(id).into()];
    params.extend(Self::book_params(&draft)?);
    params.push(at.clone().into());
    params.push(at.into());

    self
      .execute(
        format!(
          "INSERT INTO books ({BOOK_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params,
      )
      .await?;

    self
      .get_book(id)
      .await?
      .ok_or(Error::Core(lectio_core::Error::BookNotFound(id)))
  }

  async fn get_book(&self, id: Uuid) -> Result<Option<Book>> {
    let books = self
      .select(
        format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = ?1"),
        vec![encode_uuid(id).into()],
        RawBook::from_row,
        RawBook::into_book,
      )
      .await?;
    Ok(books.into_iter().next())
  }

  async fn update_book(&self, id: Uuid, draft: BookDraft) -> Result<Book> {
    let mut params = Self::book_params(&draft)?;
    params.push(encode_dt(now()).into());
    params.push(encode_uuid(id).into());

    let changed = self
      .execute(
        "UPDATE books SET
           title = ?1, author = ?2, genre = ?3, summary = ?4, content_url = ?5,
           published_at = ?6, published = ?7, ranking = ?8, updated_at = ?9
         WHERE book_id = ?10"
          .to_owned(),
        params,
      )
      .await?;
    if changed == 0 {
      return Err(lectio_core::Error::BookNotFound(id).into());
    }

    self
      .get_book(id)
      .await?
      .ok_or(Error::Core(lectio_core::Error::BookNotFound(id)))
  }

  async fn list_books(&self, published_only: bool) -> Result<Vec<Book>> {
    let filter = if published_only { "WHERE published = 1" } else { "" };
    self
      .select(
        format!(
          "SELECT {BOOK_COLUMNS} FROM books {filter}
           ORDER BY published_at IS NULL, published_at DESC, created_at DESC"
        ),
        vec![],
        RawBook::from_row,
        RawBook::into_book,
      )
      .await
  }

  // ── Reading progress ──────────────────────────────────────────────────────

  async fn record_progress(
    &self,
    user_id: Uuid,
    book_id: Uuid,
    event: ProgressEvent,
  ) -> Result<ReadingProgress> {
    let at = now();
    let select_sql = format!(
      "SELECT {PROGRESS_COLUMNS} FROM reading_progress
       WHERE user_id = ?1 AND book_id = ?2"
    );
    let upsert_sql = format!(
      "INSERT INTO reading_progress ({PROGRESS_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
       ON CONFLICT (user_id, book_id) DO UPDATE SET
         status        = excluded.status,
         percent       = excluded.percent,
         last_chapter  = excluded.last_chapter,
         last_position = excluded.last_position,
         started_at    = excluded.started_at,
         completed_at  = excluded.completed_at,
         updated_at    = excluded.updated_at"
    );

    let row = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (uid, bid) = (encode_uuid(user_id), encode_uuid(book_id));

        let existing = tx
          .query_row(&select_sql, rusqlite::params![uid, bid], RawProgress::from_row)
          .optional()?
          .map(RawProgress::into_progress)
          .transpose()
          .map_err(other)?;

        let row = ReadingProgress::apply(existing, user_id, book_id, &event, at);

        tx.execute(
          &upsert_sql,
          rusqlite::params![
            uid,
            bid,
            encode_enum(&row.status).map_err(other)?,
            row.percent,
            row.last_chapter,
            row.last_position,
            encode_dt(row.started_at),
            row.completed_at.map(encode_dt),
            encode_dt(row.updated_at),
          ],
        )?;
        tx.commit()?;
        Ok(row)
      })
      .await?;

    Ok(row)
  }

  async fn get_progress(&self, user_id: Uuid, book_id: Uuid) -> Result<Option<ReadingProgress>> {
    let rows = self
      .select(
        format!(
          "SELECT {PROGRESS_COLUMNS} FROM reading_progress
           WHERE user_id = ?1 AND book_id = ?2"
        ),
        vec![encode_uuid(user_id).into(), encode_uuid(book_id).into()],
        RawProgress::from_row,
        RawProgress::into_progress,
      )
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn list_progress(&self, user_id: Option<Uuid>) -> Result<Vec<ReadingProgress>> {
    let (filter, params): (&str, Params) = match user_id {
      Some(id) => ("WHERE user_id = ?1", vec![encode_uuid(id).into()]),
      None => ("", vec![]),
    };
    self
      .select(
        format!(
          "SELECT {PROGRESS_COLUMNS} FROM reading_progress {filter}
           ORDER BY updated_at DESC"
        ),
        params,
        RawProgress::from_row,
        RawProgress::into_progress,
      )
      .await
  }

  // ── Contact messages ──────────────────────────────────────────────────────

  async fn add_message(&self, input: NewContactMessage) -> Result<ContactMessage> {
    let message = ContactMessage {
      message_id: Uuid::new_v4(),
      name:       input.name.trim().to_owned(),
      email:      normalize_email(&input.email),
      subject:    input.subject.trim().to_owned(),
      body:       input.body,
      read:       false,
      created_at: now(),
    };

    self
      .execute(
        format!("INSERT INTO contact_messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)"),
        vec![
          encode_uuid(message.message_id).into(),
          message.name.clone().into(),
          message.email.clone().into(),
          message.subject.clone().into(),
          message.body.clone().into(),
          encode_dt(message.created_at).into(),
        ],
      )
      .await?;
    Ok(message)
  }

  async fn list_messages(&self) -> Result<Vec<ContactMessage>> {
    self.messages_where("ORDER BY created_at DESC", vec![]).await
  }

  async fn mark_message_read(&self, id: Uuid) -> Result<ContactMessage> {
    let id_str = encode_uuid(id);
    self
      .execute(
        "UPDATE contact_messages SET read = 1 WHERE message_id = ?1".to_owned(),
        vec![id_str.clone().into()],
      )
      .await?;
    self
      .messages_where("WHERE message_id = ?1", vec![id_str.into()])
      .await?
      .into_iter()
      .next()
      .ok_or(Error::Core(lectio_core::Error::MessageNotFound(id)))
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn record_notification(&self, input: NewNotification) -> Result<Notification> {
    let id = Uuid::new_v4();
    let sent_at = now();
    let insert_sql = format!(
      "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    );

    let notification = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let count: i64 = tx.query_row(
          "SELECT COUNT(*) FROM users WHERE notifications_opt_in = 1 AND role = 'user'",
          [],
          |r| r.get(0),
        )?;
        let recipient_count = count.max(0) as u64;
        let notification = Notification {
          notification_id: id,
          title: input.title.trim().to_owned(),
          message: input.message.trim().to_owned(),
          sent_at,
          recipient_count,
          status: NewNotification::status_for(recipient_count),
        };
        tx.execute(
          &insert_sql,
          rusqlite::params![
            encode_uuid(notification.notification_id),
            notification.title,
            notification.message,
            encode_dt(notification.sent_at),
            count,
            encode_enum(&notification.status).map_err(other)?,
          ],
        )?;
        tx.commit()?;
        Ok(notification)
      })
      .await?;

    Ok(notification)
  }

  async fn list_notifications(&self) -> Result<Vec<Notification>> {
    self
      .select(
        format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY sent_at DESC"),
        vec![],
        RawNotification::from_row,
        RawNotification::into_notification,
      )
      .await
  }

  // ── Expenses ──────────────────────────────────────────────────────────────

  async fn add_expense(&self, input: NewExpense) -> Result<Expense> {
    let id = Uuid::new_v4();
    let mut params = vec![encode_uuid(id).into()];
    params.extend(Self::expense_params(&input)?);
    params.push(encode_dt(now()).into());

    self
      .execute(
        format!("INSERT INTO expenses ({EXPENSE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params,
      )
      .await?;

    self
      .expenses_where("WHERE expense_id = ?1", vec![encode_uuid(id).into()])
      .await?
      .into_iter()
      .next()
      .ok_or(Error::Core(lectio_core::Error::ExpenseNotFound(id)))
  }

  async fn update_expense(&self, id: Uuid, input: NewExpense) -> Result<Expense> {
    let mut params = Self::expense_params(&input)?;
    params.push(encode_uuid(id).into());

    let changed = self
      .execute(
        "UPDATE expenses SET
           amount = ?1, currency = ?2, date = ?3, category = ?4, country = ?5,
           vat_amount = ?6, description = ?7
         WHERE expense_id = ?8"
          .to_owned(),
        params,
      )
      .await?;
    if changed == 0 {
      return Err(lectio_core::Error::ExpenseNotFound(id).into());
    }

    self
      .expenses_where("WHERE expense_id = ?1", vec![encode_uuid(id).into()])
      .await?
      .into_iter()
      .next()
      .ok_or(Error::Core(lectio_core::Error::ExpenseNotFound(id)))
  }

  async fn list_expenses(&self, month: Option<Month>) -> Result<Vec<Expense>> {
    match month {
      Some(m) => {
        self
          .expenses_where(
            "WHERE date >= ?1 AND date < ?2 ORDER BY date ASC, created_at ASC",
            vec![
              encode_date(m.first_day()).into(),
              encode_date(m.next_first_day()).into(),
            ],
          )
          .await
      }
      None => {
        self
          .expenses_where("ORDER BY date ASC, created_at ASC", vec![])
          .await
      }
    }
  }

  async fn delete_expense(&self, id: Uuid) -> Result<()> {
    let changed = self
      .execute(
        "DELETE FROM expenses WHERE expense_id = ?1".to_owned(),
        vec![encode_uuid(id).into()],
      )
      .await?;
    if changed == 0 {
      return Err(lectio_core::Error::ExpenseNotFound(id).into());
    }
    Ok(())
  }
}
