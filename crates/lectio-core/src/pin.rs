//! PIN format rules.
//!
//! End users log in with exactly four digits. Administrators use a longer PIN
//! of six to twelve digits. Hashing and verification live with the caller;
//! this module only decides whether a plaintext PIN is well-formed.

use crate::{Error, Result, user::Role};

/// Length of an end-user PIN.
pub const USER_PIN_LEN: usize = 4;

/// Inclusive length bounds of an administrator PIN.
pub const ADMIN_PIN_LEN: std::ops::RangeInclusive<usize> = 6..=12;

fn all_digits(pin: &str) -> bool {
  !pin.is_empty() && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Check that `pin` is acceptable as a new PIN for an account with `role`.
pub fn validate_new_pin(role: Role, pin: &str) -> Result<()> {
  if !all_digits(pin) {
    return Err(Error::InvalidNewPin("PIN must contain digits only"));
  }
  match role {
    Role::User if pin.len() != USER_PIN_LEN => {
      Err(Error::InvalidNewPin("PIN must be exactly 4 digits"))
    }
    Role::Admin if !ADMIN_PIN_LEN.contains(&pin.len()) => {
      Err(Error::InvalidNewPin("admin PIN must be 6 to 12 digits"))
    }
    _ => Ok(()),
  }
}

/// Registration-time check: a 4-digit PIN typed twice identically.
pub fn validate_pin_pair(pin: &str, confirmation: &str) -> Result<()> {
  if !all_digits(pin) || pin.len() != USER_PIN_LEN {
    return Err(Error::validation("pin must be exactly 4 digits"));
  }
  if pin != confirmation {
    return Err(Error::validation("pin and pinConfirmation do not match"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn user_pin_is_four_digits() {
    assert!(validate_new_pin(Role::User, "0421").is_ok());
    assert!(validate_new_pin(Role::User, "042").is_err());
    assert!(validate_new_pin(Role::User, "04211").is_err());
    assert!(validate_new_pin(Role::User, "04a1").is_err());
    assert!(validate_new_pin(Role::User, "").is_err());
  }

  #[test]
  fn admin_pin_is_longer() {
    assert!(validate_new_pin(Role::Admin, "1234").is_err());
    assert!(validate_new_pin(Role::Admin, "123456").is_ok());
    assert!(validate_new_pin(Role::Admin, "123456789012").is_ok());
    assert!(validate_new_pin(Role::Admin, "1234567890123").is_err());
  }

  #[test]
  fn registration_pair_must_match() {
    assert!(validate_pin_pair("1234", "1234").is_ok());
    assert!(matches!(
      validate_pin_pair("1234", "1243"),
      Err(Error::Validation(_))
    ));
    assert!(validate_pin_pair("12345", "12345").is_err());
  }
}
