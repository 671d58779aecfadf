//! Expense bookkeeping and the monthly finance summary.
//!
//! The summary is derived on every request and never stored. All amounts are
//! integer minor units in the bucket's currency; currencies are never mixed.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone as _, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  billing::{Country, Currency},
  user::{SubscriptionStatus, User},
};

// ─── Month ───────────────────────────────────────────────────────────────────

/// A calendar month, the period of a finance summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Month {
  pub year:  i32,
  pub month: u32,
}

impl Month {
  pub fn new(year: i32, month: u32) -> Result<Self> {
    NaiveDate::from_ymd_opt(year, month, 1)
      .map(|_| Self { year, month })
      .ok_or_else(|| Error::validation("month must be 1-12 with a valid year"))
  }

  pub fn of(date: NaiveDate) -> Self { Self { year: date.year(), month: date.month() } }

  pub fn first_day(&self) -> NaiveDate {
    NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
  }

  /// First day of the following month.
  pub fn next_first_day(&self) -> NaiveDate {
    let (y, m) = if self.month == 12 {
      (self.year + 1, 1)
    } else {
      (self.year, self.month + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(NaiveDate::MAX)
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    date >= self.first_day() && date < self.next_first_day()
  }

  /// The instant the month ends (exclusive).
  pub fn end(&self) -> DateTime<Utc> {
    let midnight = self.next_first_day().and_hms_opt(0, 0, 0).unwrap_or_default();
    Utc.from_utc_datetime(&midnight)
  }
}

// ─── Expenses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
  Hosting,
  Marketing,
  Licensing,
  PaymentFees,
  Other,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
  pub expense_id:  Uuid,
  /// Minor units, VAT included.
  pub amount:      i64,
  pub currency:    Currency,
  pub date:        NaiveDate,
  pub category:    ExpenseCategory,
  /// Tax bucket for the deductible VAT.
  pub country:     Country,
  pub vat_amount:  i64,
  pub description: String,
  pub created_at:  DateTime<Utc>,
}

/// Largest amount one expense may carry, in minor units. Keeps every monthly
/// sum far inside `i64`.
pub const MAX_EXPENSE_AMOUNT: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
  pub amount:      i64,
  pub currency:    Currency,
  pub date:        NaiveDate,
  pub category:    ExpenseCategory,
  pub country:     Country,
  #[serde(default)]
  pub vat_amount:  i64,
  #[serde(default)]
  pub description: String,
}

impl NewExpense {
  pub fn validate(&self) -> Result<()> {
    if self.amount <= 0 {
      return Err(Error::validation("amount must be positive"));
    }
    if self.amount > MAX_EXPENSE_AMOUNT {
      return Err(Error::Validation(format!(
        "amount must not exceed {MAX_EXPENSE_AMOUNT}"
      )));
    }
    if self.vat_amount < 0 || self.vat_amount > self.amount {
      return Err(Error::validation("vatAmount must be between 0 and amount"));
    }
    if self.currency != self.country.currency() {
      return Err(Error::Validation(format!(
        "expenses in {} are booked in {}",
        self.country,
        self.country.currency()
      )));
    }
    Ok(())
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Net result of a period.
///
/// Revenue and expenses are VAT-inclusive. VAT collected on sales is owed to
/// the tax authority, so it is subtracted; VAT paid on expenses is recovered,
/// so it is added back:
///
/// `net = revenue - expenses - vat_collected + vat_deductible`
pub fn net_profit(revenue: i64, expenses: i64, vat_collected: i64, vat_deductible: i64) -> i64 {
  revenue - expenses - vat_collected + vat_deductible
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencySummary {
  pub subscribers:    u64,
  pub revenue:        i64,
  pub expenses:       i64,
  pub vat_collected:  i64,
  pub vat_deductible: i64,
  pub net:            i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryVat {
  pub country:        Country,
  pub currency:       Currency,
  pub vat_collected:  i64,
  pub vat_deductible: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
  pub year:           i32,
  pub month:          u32,
  pub by_currency:    BTreeMap<Currency, CurrencySummary>,
  pub vat_by_country: Vec<CountryVat>,
}

/// Build the summary for `month` from all users and the expenses on record.
///
/// Revenue counts one monthly price for every user whose subscription is
/// active and whose account existed before the month ended. Expenses outside
/// `month` are ignored.
pub fn summarize(month: Month, users: &[User], expenses: &[Expense]) -> FinanceSummary {
  let mut by_currency: BTreeMap<Currency, CurrencySummary> = [Currency::Eur, Currency::Chf]
    .into_iter()
    .map(|c| (c, CurrencySummary::default()))
    .collect();
  let mut by_country: BTreeMap<Country, (i64, i64)> =
    Country::ALL.into_iter().map(|c| (c, (0, 0))).collect();

  let end = month.end();
  for user in users
    .iter()
    .filter(|u| u.subscription_status == SubscriptionStatus::Active)
    .filter(|u| !u.is_admin())
    .filter(|u| u.created_at < end)
  {
    let pricing = user.profile.country.pricing();
    let vat = pricing.vat_portion();
    let bucket = by_currency.entry(pricing.currency).or_default();
    bucket.subscribers += 1;
    bucket.revenue += pricing.monthly_price;
    bucket.vat_collected += vat;
    by_country.entry(user.profile.country).or_default().0 += vat;
  }

  for expense in expenses.iter().filter(|e| month.contains(e.date)) {
    let bucket = by_currency.entry(expense.currency).or_default();
    bucket.expenses += expense.amount;
    bucket.vat_deductible += expense.vat_amount;
    by_country.entry(expense.country).or_default().1 += expense.vat_amount;
  }

  for bucket in by_currency.values_mut() {
    bucket.net = net_profit(
      bucket.revenue,
      bucket.expenses,
      bucket.vat_collected,
      bucket.vat_deductible,
    );
  }

  let vat_by_country = by_country
    .into_iter()
    .map(|(country, (vat_collected, vat_deductible))| CountryVat {
      country,
      currency: country.currency(),
      vat_collected,
      vat_deductible,
    })
    .collect();

  FinanceSummary { year: month.year, month: month.month, by_currency, vat_by_country }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::user::{Profile, Role};

  fn user(country: Country, status: SubscriptionStatus, created: DateTime<Utc>) -> User {
    User {
      user_id:              Uuid::new_v4(),
      email:                format!("{}@example.com", Uuid::new_v4()),
      pin_hash:             String::new(),
      role:                 Role::User,
      profile:              Profile {
        first_name: "A".into(),
        last_name:  "B".into(),
        country,
        birth_date: None,
        sex:        None,
      },
      subscription_status:  status,
      currency:             country.currency(),
      payment_method_id:    Some("pm_test".into()),
      payment_method_kind:  None,
      notifications_opt_in: false,
      created_at:           created,
      last_login_at:        None,
      pin_changed_at:       None,
    }
  }

  fn expense(amount: i64, vat: i64, country: Country, date: NaiveDate) -> Expense {
    Expense {
      expense_id:  Uuid::new_v4(),
      amount,
      currency:    country.currency(),
      date,
      category:    ExpenseCategory::Hosting,
      country,
      vat_amount:  vat,
      description: String::new(),
      created_at:  Utc::now(),
    }
  }

  fn march() -> Month { Month::new(2026, 3).unwrap() }

  fn in_march() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap() }

  #[test]
  fn net_profit_sign_convention() {
    assert_eq!(net_profit(1000, 300, 167, 50), 1000 - 300 - 167 + 50);
    assert_eq!(net_profit(0, 100, 0, 20), -80);
    assert_eq!(net_profit(0, 0, 0, 0), 0);
  }

  #[test]
  fn swiss_subscriber_is_counted_in_chf_only() {
    let users = [user(Country::Suisse, SubscriptionStatus::Active, in_march())];
    let summary = summarize(march(), &users, &[]);

    let chf = &summary.by_currency[&Currency::Chf];
    assert_eq!(chf.subscribers, 1);
    assert_eq!(chf.revenue, 1090);
    assert_eq!(chf.vat_collected, 82);

    let eur = &summary.by_currency[&Currency::Eur];
    assert_eq!(eur.revenue, 0);
    assert_eq!(eur.subscribers, 0);
  }

  #[test]
  fn only_active_accounts_existing_by_month_end_count() {
    let april = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
    let users = [
      user(Country::France, SubscriptionStatus::Active, in_march()),
      user(Country::France, SubscriptionStatus::Cancelled, in_march()),
      user(Country::France, SubscriptionStatus::PaymentIssue, in_march()),
      user(Country::France, SubscriptionStatus::Active, april),
    ];
    let summary = summarize(march(), &users, &[]);
    assert_eq!(summary.by_currency[&Currency::Eur].subscribers, 1);
    assert_eq!(summary.by_currency[&Currency::Eur].revenue, 999);
  }

  #[test]
  fn expenses_are_filtered_by_month_and_bucketed() {
    let d = |m, day| NaiveDate::from_ymd_opt(2026, m, day).unwrap();
    let expenses = [
      expense(12_000, 2_000, Country::France, d(3, 1)),
      expense(5_000, 0, Country::France, d(3, 31)),
      expense(7_000, 500, Country::Suisse, d(3, 15)),
      expense(99_999, 9_999, Country::France, d(4, 1)),
    ];
    let users = [user(Country::Belgique, SubscriptionStatus::Active, in_march())];
    let summary = summarize(march(), &users, &expenses);

    let eur = &summary.by_currency[&Currency::Eur];
    assert_eq!(eur.expenses, 17_000);
    assert_eq!(eur.vat_deductible, 2_000);
    // 9.99 at 21 %: 999 * 2100 / 12100 = 173.4
    assert_eq!(eur.vat_collected, 173);
    assert_eq!(eur.net, net_profit(999, 17_000, 173, 2_000));

    let chf = &summary.by_currency[&Currency::Chf];
    assert_eq!(chf.expenses, 7_000);
    assert_eq!(chf.net, net_profit(0, 7_000, 0, 500));

    let fr = summary
      .vat_by_country
      .iter()
      .find(|c| c.country == Country::France)
      .unwrap();
    assert_eq!(fr.vat_deductible, 2_000);
    let be = summary
      .vat_by_country
      .iter()
      .find(|c| c.country == Country::Belgique)
      .unwrap();
    assert_eq!(be.vat_collected, 173);
  }

  #[test]
  fn month_bounds() {
    assert!(Month::new(2026, 13).is_err());
    assert!(Month::new(2026, 0).is_err());
    let dec = Month::new(2025, 12).unwrap();
    assert_eq!(dec.next_first_day(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    assert!(dec.contains(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
    assert!(!dec.contains(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
  }

  #[test]
  fn expense_validation() {
    let ok = NewExpense {
      amount:      1_000,
      currency:    Currency::Chf,
      date:        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
      category:    ExpenseCategory::Licensing,
      country:     Country::Suisse,
      vat_amount:  81,
      description: "rights".into(),
    };
    assert!(ok.validate().is_ok());
    assert!(NewExpense { currency: Currency::Eur, ..ok.clone() }.validate().is_err());
    assert!(NewExpense { amount: 0, ..ok.clone() }.validate().is_err());
    assert!(NewExpense { vat_amount: 2_000, ..ok.clone() }.validate().is_err());
    assert!(
      NewExpense { amount: MAX_EXPENSE_AMOUNT, ..ok.clone() }
        .validate()
        .is_ok()
    );
    assert!(
      NewExpense { amount: MAX_EXPENSE_AMOUNT + 1, ..ok }
        .validate()
        .is_err()
    );
  }

  #[test]
  fn oversized_expense_is_rejected_before_it_can_skew_the_summary() {
    let huge = NewExpense {
      amount:      i64::MAX / 2 + 1,
      currency:    Currency::Eur,
      date:        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
      category:    ExpenseCategory::Hosting,
      country:     Country::France,
      vat_amount:  0,
      description: String::new(),
    };
    assert!(matches!(huge.validate(), Err(Error::Validation(_))));

    let d = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let expenses = [
      expense(MAX_EXPENSE_AMOUNT, MAX_EXPENSE_AMOUNT, Country::France, d),
      expense(MAX_EXPENSE_AMOUNT, MAX_EXPENSE_AMOUNT, Country::France, d),
    ];
    let summary = summarize(march(), &[], &expenses);
    let eur = &summary.by_currency[&Currency::Eur];
    assert_eq!(eur.expenses, 2 * MAX_EXPENSE_AMOUNT);
    assert_eq!(eur.net, 0);
  }
}
