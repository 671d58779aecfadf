//! Countries, currencies and the subscription price tiers they select.
//!
//! The country given at registration fixes the user's currency and monthly
//! price. No charge is executed by this system; the processor only hands back
//! an opaque payment-method reference which is stored on the user record.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Currency ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
  Eur,
  Chf,
}

impl Currency {
  pub fn code(self) -> &'static str {
    match self {
      Self::Eur => "EUR",
      Self::Chf => "CHF",
    }
  }
}

impl fmt::Display for Currency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

// ─── Country ─────────────────────────────────────────────────────────────────

/// A country in which the club sells subscriptions. Each one is also a VAT
/// bucket for the finance summary.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Country {
  France,
  Belgique,
  Luxembourg,
  Monaco,
  Suisse,
}

impl Country {
  pub const ALL: [Country; 5] = [
    Self::France,
    Self::Belgique,
    Self::Luxembourg,
    Self::Monaco,
    Self::Suisse,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::France => "France",
      Self::Belgique => "Belgique",
      Self::Luxembourg => "Luxembourg",
      Self::Monaco => "Monaco",
      Self::Suisse => "Suisse",
    }
  }

  /// The price tier a subscriber from this country pays.
  pub fn pricing(self) -> Pricing {
    match self {
      Self::France | Self::Monaco => Pricing::new(Currency::Eur, 999, 2000),
      Self::Belgique => Pricing::new(Currency::Eur, 999, 2100),
      Self::Luxembourg => Pricing::new(Currency::Eur, 999, 1700),
      Self::Suisse => Pricing::new(Currency::Chf, 1090, 810),
    }
  }

  pub fn currency(self) -> Currency { self.pricing().currency }
}

impl fmt::Display for Country {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Country {
  type Err = Error;

  /// Case-insensitive; accepts the English names as aliases.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "france" => Ok(Self::France),
      "belgique" | "belgium" => Ok(Self::Belgique),
      "luxembourg" => Ok(Self::Luxembourg),
      "monaco" => Ok(Self::Monaco),
      "suisse" | "switzerland" | "schweiz" => Ok(Self::Suisse),
      _ => Err(Error::UnknownCountry(s.to_owned())),
    }
  }
}

// ─── Pricing ─────────────────────────────────────────────────────────────────

/// A monthly subscription price, VAT included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
  pub currency:      Currency,
  /// Minor units (cents / centimes).
  pub monthly_price: i64,
  /// VAT rate in basis points (2000 = 20 %).
  pub vat_rate_bp:   i64,
}

impl Pricing {
  pub const fn new(currency: Currency, monthly_price: i64, vat_rate_bp: i64) -> Self {
    Self { currency, monthly_price, vat_rate_bp }
  }

  /// The VAT share contained in one monthly price.
  pub fn vat_portion(&self) -> i64 { vat_included(self.monthly_price, self.vat_rate_bp) }
}

/// VAT contained in a VAT-inclusive `amount` at `rate_bp`, rounded half up.
pub fn vat_included(amount: i64, rate_bp: i64) -> i64 {
  let denominator = 10_000 + rate_bp;
  (amount * rate_bp + denominator / 2) / denominator
}

// ─── Payment method ──────────────────────────────────────────────────────────

/// The kind of payment method the processor tokenized for the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
  #[default]
  Card,
  SepaDebit,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn country_parsing_is_lenient() {
    assert_eq!("Suisse".parse::<Country>().unwrap(), Country::Suisse);
    assert_eq!(" switzerland ".parse::<Country>().unwrap(), Country::Suisse);
    assert_eq!("BELGIUM".parse::<Country>().unwrap(), Country::Belgique);
    assert!(matches!(
      "Atlantis".parse::<Country>(),
      Err(Error::UnknownCountry(_))
    ));
  }

  #[test]
  fn switzerland_is_billed_in_chf() {
    assert_eq!(Country::Suisse.currency(), Currency::Chf);
    for c in Country::ALL.into_iter().filter(|c| *c != Country::Suisse) {
      assert_eq!(c.currency(), Currency::Eur, "{c}");
    }
  }

  #[test]
  fn vat_portion_rounds_half_up() {
    // 9.99 at 20 %: 999 * 2000 / 12000 = 166.5
    assert_eq!(vat_included(999, 2000), 167);
    // 10.90 at 8.1 %: 1090 * 810 / 10810 = 81.67
    assert_eq!(Country::Suisse.pricing().vat_portion(), 82);
    assert_eq!(vat_included(0, 2000), 0);
  }
}
