//! Payment-processor events at `POST /webhooks/payments`.
//!
//! The body is taken raw so that a signature check placed in front of this
//! route sees the exact bytes the processor sent. Parsing is lenient: only
//! the event `type` and `data.object.payment_method` are read, and event
//! types we do not act on are acknowledged and ignored.

use axum::{Json, extract::State};
use bytes::Bytes;
use lectio_core::{store::ClubStore, user::SubscriptionStatus};
use serde_json::{Value, json};

use crate::{
  AppState,
  error::{ApiError, Result},
};

/// The subscription status an event moves linked users to, if any.
pub fn status_for_event(event_type: &str) -> Option<SubscriptionStatus> {
  match event_type {
    "invoice.payment_failed" => Some(SubscriptionStatus::PaymentIssue),
    "invoice.paid" => Some(SubscriptionStatus::Active),
    "customer.subscription.deleted" => Some(SubscriptionStatus::Cancelled),
    _ => None,
  }
}

/// `POST /webhooks/payments`; always `{"received":true}` for valid JSON.
pub async fn payments<S>(
  State(state): State<AppState<S>>,
  body: Bytes,
) -> Result<Json<Value>>
where
  S: ClubStore,
{
  let event: Value = serde_json::from_slice(&body)
    .map_err(|e| ApiError::BadRequest(format!("invalid webhook payload: {e}")))?;

  let event_type = event.get("type").and_then(Value::as_str).unwrap_or_default();
  let payment_method = event
    .pointer("/data/object/payment_method")
    .and_then(Value::as_str);

  match (status_for_event(event_type), payment_method) {
    (Some(status), Some(pm)) => {
      let users = state
        .store
        .set_status_by_payment_method(pm, status)
        .await
        .map_err(ApiError::from_store)?;
      tracing::info!(event_type, updated = users.len(), status = ?status, "payment event applied");
    }
    (Some(_), None) => {
      tracing::warn!(event_type, "payment event without payment method ignored");
    }
    (None, _) => {
      tracing::debug!(event_type, "payment event ignored");
    }
  }

  Ok(Json(json!({ "received": true })))
}
