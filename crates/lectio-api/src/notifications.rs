//! Admin notification log.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/notifications` | Newest first |
//! | `POST` | `/admin/notifications` | Body: `{"title":"…","message":"…"}`; returns 201 |
//!
//! Sending records the number of opted-in readers at that instant. Delivery
//! itself happens elsewhere.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use lectio_core::{
  message::{NewNotification, Notification},
  store::ClubStore,
};

use crate::{
  AppState,
  error::{ApiError, Result},
};

/// `GET /admin/notifications`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Notification>>>
where
  S: ClubStore,
{
  let log = state.store.list_notifications().await.map_err(ApiError::from_store)?;
  Ok(Json(log))
}

/// `POST /admin/notifications`
pub async fn send<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewNotification>,
) -> Result<impl IntoResponse>
where
  S: ClubStore,
{
  body.validate()?;
  let notification = state
    .store
    .record_notification(body)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    notification_id = %notification.notification_id,
    recipients = notification.recipient_count,
    "notification logged",
  );
  Ok((StatusCode::CREATED, Json(notification)))
}
