//! Users and their credentials.
//!
//! A user owns a hashed PIN, exactly one role, a profile and a subscription
//! status. The PIN hash is never serialised.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  billing::{Country, Currency, PaymentMethodKind},
};

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
  Active,
  Pending,
  Cancelled,
  PaymentIssue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
  Female,
  Male,
  Other,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub first_name: String,
  pub last_name:  String,
  pub country:    Country,
  pub birth_date: Option<NaiveDate>,
  pub sex:        Option<Sex>,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A persisted account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub user_id:              Uuid,
  pub email:                String,
  /// Argon2 PHC string.
  #[serde(skip)]
  pub pin_hash:             String,
  pub role:                 Role,
  #[serde(flatten)]
  pub profile:              Profile,
  pub subscription_status:  SubscriptionStatus,
  pub currency:             Currency,
  pub payment_method_id:    Option<String>,
  pub payment_method_kind:  Option<PaymentMethodKind>,
  pub notifications_opt_in: bool,
  pub created_at:           DateTime<Utc>,
  pub last_login_at:        Option<DateTime<Utc>>,
  pub pin_changed_at:       Option<DateTime<Utc>>,
}

impl User {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Input to [`crate::store::ClubStore::create_user`].
/// `user_id` and `created_at` are assigned by the store; the currency is
/// derived from the profile's country.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:                String,
  pub pin_hash:             String,
  pub role:                 Role,
  pub profile:              Profile,
  pub subscription_status:  SubscriptionStatus,
  pub payment_method_id:    Option<String>,
  pub payment_method_kind:  Option<PaymentMethodKind>,
  pub notifications_opt_in: bool,
}

// ─── Email ───────────────────────────────────────────────────────────────────

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// A deliberately loose shape check: one `@`, a non-empty local part and a
/// dotted domain.
pub fn validate_email(email: &str) -> Result<()> {
  let invalid = || Error::validation("email is not a valid address");
  let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
  if local.is_empty()
    || domain.contains('@')
    || email.chars().any(char::is_whitespace)
  {
    return Err(invalid());
  }
  match domain.rsplit_once('.') {
    Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
    _ => Err(invalid()),
  }
}
