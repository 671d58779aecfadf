//! `POST /register`: the backend half of two-phase registration.
//!
//! The client has already tokenized a card or SEPA mandate with the payment
//! processor; this endpoint validates the profile, links the opaque
//! `paymentMethodId` and creates an active subscription. Nothing is charged
//! before the configured billing start date.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{NaiveDate, Utc};
use lectio_core::{
  billing::{Country, PaymentMethodKind, Pricing},
  pin::validate_pin_pair,
  store::ClubStore,
  user::{NewUser, Profile, Role, Sex, SubscriptionStatus, User, validate_email},
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  credentials::hash_pin,
  error::{ApiError, Result},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
  pub first_name:           String,
  pub last_name:            String,
  pub email:                String,
  pub pin:                  String,
  pub pin_confirmation:     String,
  pub birth_date:           NaiveDate,
  pub country:              String,
  pub sex:                  Option<Sex>,
  pub payment_method_id:    Option<String>,
  pub payment_method_kind:  Option<PaymentMethodKind>,
  #[serde(default)]
  pub notifications_opt_in: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
  pub success:           bool,
  pub user:              User,
  pub pricing:           Pricing,
  pub billing_starts_on: NaiveDate,
}

impl RegisterBody {
  /// Check every field and return the parsed country and payment reference.
  fn validate(&self, today: NaiveDate) -> lectio_core::Result<(Country, String)> {
    if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
      return Err(lectio_core::Error::validation("firstName and lastName are required"));
    }
    validate_email(self.email.trim())?;
    validate_pin_pair(&self.pin, &self.pin_confirmation)?;
    if self.birth_date >= today {
      return Err(lectio_core::Error::validation("birthDate must be in the past"));
    }
    let country: Country = self.country.parse()?;
    let payment_method_id = self
      .payment_method_id
      .as_deref()
      .map(str::trim)
      .filter(|id| !id.is_empty())
      .ok_or_else(|| lectio_core::Error::validation("paymentMethodId is required"))?;
    Ok((country, payment_method_id.to_owned()))
  }
}

/// `POST /register`; returns 201 with the created user and the price tier.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse>
where
  S: ClubStore,
{
  let (country, payment_method_id) = body.validate(Utc::now().date_naive())?;
  let pin_hash = hash_pin(&body.pin).map_err(ApiError::upstream)?;

  let user = state
    .store
    .create_user(NewUser {
      email: body.email,
      pin_hash,
      role: Role::User,
      profile: Profile {
        first_name: body.first_name.trim().to_owned(),
        last_name: body.last_name.trim().to_owned(),
        country,
        birth_date: Some(body.birth_date),
        sex: body.sex,
      },
      subscription_status: SubscriptionStatus::Active,
      payment_method_id: Some(payment_method_id),
      payment_method_kind: Some(body.payment_method_kind.unwrap_or_default()),
      notifications_opt_in: body.notifications_opt_in,
    })
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(
    user_id = %user.user_id,
    country = %country,
    currency = %user.currency,
    "registered subscriber",
  );

  Ok((
    StatusCode::CREATED,
    Json(RegisterResponse {
      success: true,
      user,
      pricing: country.pricing(),
      billing_starts_on: state.config.billing_starts_on,
    }),
  ))
}
