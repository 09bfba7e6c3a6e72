//! Amount type for handling quantities that may be written with thousands separators.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include commas, e.g. `1,250` as it is displayed by a formatted sheet cell.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a quantity or a sum of money.
///
/// Whether the value was written with thousands separators is remembered so that a value read
/// from the sheet is displayed the way it was found. Formatting is considered significant for the
/// purposes of equality, so for numeric comparisons, use [`Amount::value`].
///
/// # Examples
///
/// ```
/// # use stock_log::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("1,250").unwrap();
/// let b = Amount::from_str("1250").unwrap();
/// assert_eq!(a.to_string(), "1,250");
/// assert_eq!(b.to_string(), "1250");
/// assert_eq!(a.value(), b.value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
    commas: bool,
}

impl Amount {
    /// Creates a new Amount from a Decimal value, displayed without separators.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            commas: false,
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Returns true if the amount is below zero. Negative zero is not negative.
    pub fn is_negative(&self) -> bool {
        !self.value.is_zero() && self.value.is_sign_negative()
    }

    /// The value as it should be sent to the sheet: a JSON number, integral when possible.
    pub(crate) fn to_json(self) -> serde_json::Value {
        let normalized = self.value.normalize();
        if normalized.scale() == 0 {
            if let Some(i) = normalized.to_i64() {
                return serde_json::Value::from(i);
            }
        }
        normalized
            .to_f64()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(normalized.to_string()))
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // An empty cell means zero
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let without_commas = trimmed.replace(',', "");
        let commas = without_commas.len() < trimmed.len();

        // Decimal::from_str rejects exponents, which sheets use for very large numbers
        let value = Decimal::from_str(&without_commas)
            .or_else(|_| Decimal::from_scientific(&without_commas))
            .map_err(AmountError)?;
        Ok(Amount { value, commas })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.commas {
            let sign = if self.is_negative() { "-" } else { "" };
            write!(f, "{sign}{}", group_thousands(self.value.abs()))
        } else {
            write!(f, "{}", self.value.normalize())
        }
    }
}

/// Writes `value` with a comma between each group of three integer digits. The fraction is kept
/// exactly as stored, scale included.
fn group_thousands(value: Decimal) -> String {
    let digits = value.to_string();
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits.as_str(), None),
    };
    let mut grouped = String::with_capacity(digits.len() + integer.len() / 3);
    for (ix, ch) in integer.chars().enumerate() {
        if ix > 0 && (integer.len() - ix) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    /// Accepts both strings, as we write them, and JSON numbers, as MCP clients tend to send them.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a string containing a number")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Amount, E> {
        Decimal::try_from(v).map(Amount::new).map_err(E::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
