//! Signed session tokens (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lectio_core::user::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub:   Uuid,
  pub email: String,
  pub role:  Role,
  pub iat:   i64,
  pub exp:   i64,
}

/// Signing and verification keys derived from the server secret.
pub struct TokenKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl:      Duration,
}

impl TokenKeys {
  pub fn new(secret: &[u8], ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      ttl,
    }
  }

  /// Issue a token for `user`, valid for the configured TTL.
  pub fn issue(&self, user: &User) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let claims = Claims {
      sub:   user.user_id,
      email: user.email.clone(),
      role:  user.role,
      iat:   now.timestamp(),
      exp:   (now + self.ttl).timestamp(),
    };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
  }

  /// Check signature and expiry, returning the claims.
  pub fn verify(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    Ok(jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)?.claims)
  }
}

#[cfg(test)]
mod tests {
  use lectio_core::{
    billing::Country,
    user::{Profile, SubscriptionStatus},
  };

  use super::*;

  fn user(role: Role) -> User {
    User {
      user_id:              Uuid::new_v4(),
      email:                "anne@example.com".into(),
      pin_hash:             String::new(),
      role,
      profile:              Profile {
        first_name: "Anne".into(),
        last_name:  "Reader".into(),
        country:    Country::France,
        birth_date: None,
        sex:        None,
      },
      subscription_status:  SubscriptionStatus::Active,
      currency:             Country::France.currency(),
      payment_method_id:    None,
      payment_method_kind:  None,
      notifications_opt_in: false,
      created_at:           Utc::now(),
      last_login_at:        None,
      pin_changed_at:       None,
    }
  }

  #[test]
  fn token_round_trips_identity() {
    let keys = TokenKeys::new(b"secret", Duration::hours(1));
    let admin = user(Role::Admin);
    let claims = keys.verify(&keys.issue(&admin).unwrap()).unwrap();
    assert_eq!(claims.sub, admin.user_id);
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.exp - claims.iat, 3600);
  }

  #[test]
  fn expired_token_is_rejected() {
    let keys = TokenKeys::new(b"secret", Duration::hours(-2));
    let token = keys.issue(&user(Role::User)).unwrap();
    assert!(keys.verify(&token).is_err());
  }

  #[test]
  fn foreign_signature_is_rejected() {
    let ours = TokenKeys::new(b"secret", Duration::hours(1));
    let theirs = TokenKeys::new(b"other", Duration::hours(1));
    let token = theirs.issue(&user(Role::User)).unwrap();
    assert!(ours.verify(&token).is_err());
    assert!(ours.verify("not.a.token").is_err());
  }
}
