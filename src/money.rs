//! A fixed-point money type for balances and transaction amounts.
//!
//! Amounts are stored in SQLite as decimal text so that a balance read back
//! from the database is exactly the value that was written.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money.
///
/// Serializes to and from a JSON number. JSON numbers go through `f64`, so
/// only about 15 significant digits survive the trip over HTTP. Values stored
/// in SQLite keep their full precision.
///
/// Arithmetic is checked only: there is no `+` or `-`, so an amount too large
/// for a [Decimal] is reported to the caller instead of panicking.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// No money at all.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wrap a decimal value.
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whether the amount is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// `self + rhs`, or `None` if the result does not fit.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// `self - rhs`, or `None` if the result does not fit.
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(_) => value
                .as_str()?
                .parse()
                .map_err(|error| FromSqlError::Other(Box::new(error))),
            ValueRef::Integer(integer) => Ok(Money(Decimal::from(integer))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::Money;

    #[test]
    fn is_negative_excludes_zero() {
        assert!(!Money::ZERO.is_negative());
        assert!(!Money::new(dec!(0.01)).is_negative());
        assert!(Money::new(dec!(-0.01)).is_negative());
    }

    #[test]
    fn arithmetic_is_exact() {
        let total = Money::new(dec!(0.1)).checked_add(Money::new(dec!(0.2)));

        assert_eq!(total, Some(Money::new(dec!(0.3))));
        assert_eq!(
            Money::new(dec!(0.3)).checked_sub(Money::new(dec!(0.3))),
            Some(Money::ZERO)
        );
    }

    #[test]
    fn overflow_is_none() {
        let max = Money::new(Decimal::MAX);

        assert_eq!(max.checked_add(Money::new(dec!(1))), None);
        assert_eq!(Money::new(Decimal::MIN).checked_sub(Money::new(dec!(1))), None);
        assert_eq!(max.checked_sub(max), Some(Money::ZERO));
    }

    #[test]
    fn serializes_as_json_number() {
        let json = serde_json::to_string(&Money::new(dec!(12.5))).unwrap();

        assert_eq!(json, "12.5");
    }

    #[test]
    fn everyday_amounts_keep_their_cents_in_json() {
        let want = Money::new(dec!(12345678901.23));

        let json = serde_json::to_string(&want).unwrap();
        let got: Money = serde_json::from_str(&json).unwrap();

        assert_eq!(json, "12345678901.23");
        assert_eq!(got, want);
    }

    #[test]
    fn deserializes_json_number() {
        let money: Money = serde_json::from_str("12.34").unwrap();

        assert_eq!(money, Money::new(dec!(12.34)));
    }

    #[test]
    fn sqlite_round_trip_preserves_value() {
        let connection = Connection::open_in_memory().unwrap();
        let want = Money::new(dec!(1234.56));

        let got: Money = connection
            .query_row("SELECT ?1", [want], |row| row.get(0))
            .unwrap();

        assert_eq!(want, got);
    }

    #[test]
    fn reads_integer_columns() {
        let connection = Connection::open_in_memory().unwrap();

        let got: Money = connection
            .query_row("SELECT 42", [], |row| row.get(0))
            .unwrap();

        assert_eq!(got, Money::new(dec!(42)));
    }
}
