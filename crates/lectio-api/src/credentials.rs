//! PIN hashing and generation.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand_core::{OsRng, RngCore as _};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("argon2 error: {0}")]
pub struct HashError(String);

/// Hash `pin` with a fresh salt into an argon2 PHC string.
pub fn hash_pin(pin: &str) -> Result<String, HashError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(pin.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| HashError(e.to_string()))
}

/// Verified against when no account matches, so that login costs one argon2
/// run either way. Same parameters as [`hash_pin`]; the digest is all zeros.
pub const UNKNOWN_USER_PIN_HASH: &str =
  "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// `false` for a wrong PIN and for an unparseable hash alike.
pub fn verify_pin(pin: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .map(|parsed| Argon2::default().verify_password(pin.as_bytes(), &parsed).is_ok())
    .unwrap_or(false)
}

/// A uniformly random numeric PIN of `len` digits, from the OS RNG.
pub fn random_pin(len: usize) -> String {
  // Largest multiple of 10 below u32::MAX; values above it would bias the
  // low digits.
  const LIMIT: u32 = u32::MAX - u32::MAX % 10;
  let mut pin = String::with_capacity(len);
  while pin.len() < len {
    let n = OsRng.next_u32();
    if n < LIMIT {
      pin.push(char::from(b'0' + (n % 10) as u8));
    }
  }
  pin
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let hash = hash_pin("0421").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_pin("0421", &hash));
    assert!(!verify_pin("0422", &hash));
  }

  #[test]
  fn hashes_are_salted() {
    assert_ne!(hash_pin("0421").unwrap(), hash_pin("0421").unwrap());
  }

  #[test]
  fn unknown_user_hash_is_a_real_argon2_check() {
    assert!(PasswordHash::new(UNKNOWN_USER_PIN_HASH).is_ok());
    assert!(!verify_pin("0421", UNKNOWN_USER_PIN_HASH));
    assert!(!verify_pin("", UNKNOWN_USER_PIN_HASH));
  }

  #[test]
  fn garbage_hash_never_verifies() {
    assert!(!verify_pin("0421", "not-a-phc-string"));
  }

  #[test]
  fn random_pins_are_digits_of_requested_length() {
    for len in [4, 6, 12] {
      let pin = random_pin(len);
      assert_eq!(pin.len(), len);
      assert!(pin.bytes().all(|b| b.is_ascii_digit()));
    }
  }
}
