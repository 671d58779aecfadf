//! `POST /contact`, the public contact form.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use lectio_core::{message::NewContactMessage, store::ClubStore};
use serde_json::json;

use crate::{
  AppState,
  error::{ApiError, Result},
};

/// Body: `{"name","email","subject","message"}`; returns 201.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewContactMessage>,
) -> Result<impl IntoResponse>
where
  S: ClubStore,
{
  body.validate()?;
  let message = state.store.add_message(body).await.map_err(ApiError::from_store)?;
  tracing::info!(message_id = %message.message_id, "contact message received");
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "messageId": message.message_id })),
  ))
}
