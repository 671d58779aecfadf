//! Handlers for the caller's own account under `/me`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | The caller's user record |
//! | `PUT`  | `/me/change-pin` | Body: `{"currentPin":"…","newPin":"…"}` |
//! | `PUT`  | `/me/notifications` | Body: `{"enabled":true}` |
//! | `POST` | `/me/cancel` | Subscription becomes `cancelled` |

use axum::{Extension, Json, extract::State};
use lectio_core::{
  pin::validate_new_pin,
  store::ClubStore,
  user::{SubscriptionStatus, User},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::Identity,
  credentials::{hash_pin, verify_pin},
  error::{ApiError, Result},
};

/// The caller's current record. A token for a vanished user is treated as
/// invalid.
async fn current_user<S: ClubStore>(state: &AppState<S>, identity: &Identity) -> Result<User> {
  state
    .store
    .get_user(identity.user_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(ApiError::Unauthorized)
}

/// `GET /me`
pub async fn show<S>(
  State(state): State<AppState<S>>,
  Extension(identity): Extension<Identity>,
) -> Result<Json<User>>
where
  S: ClubStore,
{
  Ok(Json(current_user(&state, &identity).await?))
}

// ─── Change PIN ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePinBody {
  pub current_pin:          String,
  pub new_pin:              String,
  /// Checked only when the client sends it.
  pub new_pin_confirmation: Option<String>,
}

/// `PUT /me/change-pin`
///
/// A wrong current PIN leaves the stored hash untouched. The new hash is
/// computed with a fresh salt on every call, so retries are harmless.
pub async fn change_pin<S>(
  State(state): State<AppState<S>>,
  Extension(identity): Extension<Identity>,
  Json(body): Json<ChangePinBody>,
) -> Result<Json<Value>>
where
  S: ClubStore,
{
  let user = current_user(&state, &identity).await?;

  if !verify_pin(&body.current_pin, &user.pin_hash) {
    return Err(lectio_core::Error::WrongCurrentPin.into());
  }
  validate_new_pin(user.role, &body.new_pin)?;
  if body
    .new_pin_confirmation
    .as_deref()
    .is_some_and(|c| c != body.new_pin)
  {
    return Err(ApiError::BadRequest(
      "newPin and newPinConfirmation do not match".into(),
    ));
  }

  let hash = hash_pin(&body.new_pin).map_err(ApiError::upstream)?;
  state
    .store
    .set_pin_hash(user.user_id, hash)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(user_id = %user.user_id, "PIN changed");
  Ok(Json(json!({ "success": true })))
}

// ─── Preferences ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NotificationsBody {
  pub enabled: bool,
}

/// `PUT /me/notifications`
pub async fn set_notifications<S>(
  State(state): State<AppState<S>>,
  Extension(identity): Extension<Identity>,
  Json(body): Json<NotificationsBody>,
) -> Result<Json<User>>
where
  S: ClubStore,
{
  let user = state
    .store
    .set_notifications_opt_in(identity.user_id, body.enabled)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(user))
}

/// `POST /me/cancel`
pub async fn cancel<S>(
  State(state): State<AppState<S>>,
  Extension(identity): Extension<Identity>,
) -> Result<Json<User>>
where
  S: ClubStore,
{
  let user = state
    .store
    .set_subscription_status(identity.user_id, SubscriptionStatus::Cancelled)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(user_id = %user.user_id, "subscription cancelled");
  Ok(Json(user))
}
