//! Fixed-point currency values.
//!
//! [Amount] is the strictly positive value moved by a transaction and
//! [Balance] is the non-negative value held by an account. Both hold an exact
//! number of cents, are stored in SQLite as integers and are serialized as
//! decimal strings with two decimal places, e.g. `"150.00"`.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::Error;

/// The number of decimal places used for currency.
const CURRENCY_SCALE: u32 = 2;

fn decimal_from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, CURRENCY_SCALE)
}

/// A positive amount of money with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    cents: i64,
}

impl Amount {
    /// Create an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if `value` is zero or negative, has more
    /// than two decimal places, or is too large to be stored.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value <= Decimal::ZERO {
            return Err(Error::Validation(
                "Amount must be greater than zero".to_owned(),
            ));
        }

        if value.normalize().scale() > CURRENCY_SCALE {
            return Err(Error::Validation(
                "Amount must have at most two decimal places".to_owned(),
            ));
        }

        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(|cents| Self { cents })
            .ok_or_else(|| Error::Validation("Amount is too large".to_owned()))
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// The amount as a decimal with two decimal places.
    pub fn value(&self) -> Decimal {
        decimal_from_cents(self.cents)
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let value = Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map_err(|_| Error::Validation("Invalid amount format".to_owned()))?;

        Amount::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.value(), serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Amount::new(value).map_err(de::Error::custom)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let cents = i64::column_result(value)?;

        if cents <= 0 {
            return Err(FromSqlError::OutOfRange(cents));
        }

        Ok(Self { cents })
    }
}

/// The money held by an account. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Balance {
    cents: i64,
}

impl Balance {
    /// An empty balance.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Create a balance from a whole number of cents.
    ///
    /// Returns `None` if `cents` is negative.
    pub fn from_cents(cents: i64) -> Option<Self> {
        (cents >= 0).then_some(Self { cents })
    }

    /// The balance as a whole number of cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// The balance as a decimal with two decimal places.
    pub fn value(&self) -> Decimal {
        decimal_from_cents(self.cents)
    }

    /// Whether the balance can cover `amount`.
    pub fn covers(&self, amount: Amount) -> bool {
        self.cents >= amount.cents
    }

    /// The balance after adding `amount`, or `None` on overflow.
    pub fn deposit(self, amount: Amount) -> Option<Self> {
        self.cents
            .checked_add(amount.cents)
            .map(|cents| Self { cents })
    }

    /// The balance after removing `amount`, or `None` if the balance does not
    /// cover `amount`.
    pub fn withdraw(self, amount: Amount) -> Option<Self> {
        if !self.covers(amount) {
            return None;
        }

        Some(Self {
            cents: self.cents - amount.cents,
        })
    }
}

impl Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.value(), serializer)
    }
}

impl ToSql for Balance {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents))
    }
}

impl FromSql for Balance {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let cents = i64::column_result(value)?;

        Balance::from_cents(cents).ok_or(FromSqlError::OutOfRange(cents))
    }
}


#[cfg(test)]
mod balance_tests {
    use rust_decimal_macros::dec;

    use crate::money::{Amount, Balance};

    fn amount(value: &str) -> Amount {
        value.parse().unwrap()
    }

    #[test]
    fn from_cents_rejects_negative_values() {
        assert_eq!(Balance::from_cents(-1), None);
    }

    #[test]
    fn deposit_adds_amount() {
        let balance = Balance::from_cents(10_000).unwrap();

        let got = balance.deposit(amount("50.00")).unwrap();

        assert_eq!(got.value(), dec!(150.00));
    }

    #[test]
    fn deposit_fails_on_overflow() {
        let balance = Balance::from_cents(i64::MAX).unwrap();

        assert_eq!(balance.deposit(amount("0.01")), None);
    }

    #[test]
    fn withdraw_removes_amount() {
        let balance = Balance::from_cents(10_000).unwrap();

        let got = balance.withdraw(amount("100.00")).unwrap();

        assert_eq!(got, Balance::zero());
    }

    #[test]
    fn withdraw_fails_when_balance_does_not_cover_amount() {
        let balance = Balance::from_cents(5_000).unwrap();

        assert_eq!(balance.withdraw(amount("75.00")), None);
    }

    #[test]
    fn serializes_zero_with_two_decimal_places() {
        assert_eq!(serde_json::to_string(&Balance::zero()).unwrap(), "\"0.00\"");
    }
}
