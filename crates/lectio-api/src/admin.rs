//! Admin console: users, stats and the contact inbox.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/users` | Oldest first |
//! | `GET`  | `/admin/users/{id}` | 404 if not found |
//! | `PUT`  | `/admin/users/{id}/status` | Body: `{"status":"payment_issue"}` |
//! | `POST` | `/admin/users/{id}/reset-pin` | Returns the new plaintext PIN, once |
//! | `GET`  | `/admin/stats` | See [`ClubStats`] |
//! | `GET`  | `/admin/messages` | Newest first |
//! | `PUT`  | `/admin/messages/{id}/read` | Idempotent |

use axum::{
  Json,
  extract::{Path, State},
};
use lectio_core::{
  message::ContactMessage,
  pin::ADMIN_PIN_LEN,
  stats::{ClubStats, rollup},
  store::ClubStore,
  user::{Role, SubscriptionStatus, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  credentials::{hash_pin, random_pin, verify_pin},
  error::{ApiError, Result},
};

// ─── Users ───────────────────────────────────────────────────────────────────

/// `GET /admin/users`
pub async fn list_users<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<User>>>
where
  S: ClubStore,
{
  let users = state.store.list_users().await.map_err(ApiError::from_store)?;
  Ok(Json(users))
}

async fn find_user<S: ClubStore>(store: &S, id: Uuid) -> Result<User> {
  store
    .get_user(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("user not found: {id}")))
}

/// `GET /admin/users/{id}`
pub async fn get_user<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>>
where
  S: ClubStore,
{
  Ok(Json(find_user(state.store.as_ref(), id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: SubscriptionStatus,
}

/// `PUT /admin/users/{id}/status`
pub async fn set_status<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<User>>
where
  S: ClubStore,
{
  let user = state
    .store
    .set_subscription_status(id, body.status)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(user_id = %id, status = ?body.status, "subscription status set");
  Ok(Json(user))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPinResponse {
  pub user_id: Uuid,
  pub email:   String,
  /// Shown once; only the hash is kept.
  pub pin:     String,
}

/// `POST /admin/users/{id}/reset-pin`
///
/// Every call generates a new PIN, so the previous one stops working.
pub async fn reset_pin<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ResetPinResponse>>
where
  S: ClubStore,
{
  let user = find_user(state.store.as_ref(), id).await?;

  let len = match user.role {
    Role::User => state.config.reset_pin_length,
    Role::Admin => state.config.reset_pin_length.max(*ADMIN_PIN_LEN.start()),
  };
  let pin = loop {
    let candidate = random_pin(len);
    if !verify_pin(&candidate, &user.pin_hash) {
      break candidate;
    }
  };

  let hash = hash_pin(&pin).map_err(ApiError::upstream)?;
  let user = state
    .store
    .set_pin_hash(id, hash)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(user_id = %id, "PIN reset by admin");
  Ok(Json(ResetPinResponse { user_id: user.user_id, email: user.email, pin }))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// `GET /admin/stats`
pub async fn stats<S>(State(state): State<AppState<S>>) -> Result<Json<ClubStats>>
where
  S: ClubStore,
{
  let store = state.store.as_ref();
  let users = store.list_users().await.map_err(ApiError::from_store)?;
  let books = store.list_books(false).await.map_err(ApiError::from_store)?;
  let progress = store.list_progress(None).await.map_err(ApiError::from_store)?;
  let messages = store.list_messages().await.map_err(ApiError::from_store)?;
  Ok(Json(rollup(&users, &books, &progress, &messages)))
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// `GET /admin/messages`
pub async fn list_messages<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<ContactMessage>>>
where
  S: ClubStore,
{
  let messages = state.store.list_messages().await.map_err(ApiError::from_store)?;
  Ok(Json(messages))
}

/// `PUT /admin/messages/{id}/read`
pub async fn mark_read<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ContactMessage>>
where
  S: ClubStore,
{
  let message = state
    .store
    .mark_message_read(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(message))
}
