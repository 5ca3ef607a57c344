//! Euro prices with decimal arithmetic.
//!
//! Catalog documents are schema-on-read: a price may arrive as a JSON number,
//! as a string typed by hand in the database console, or not at all.
//! [`Price::from_document`] turns any of those into a non-negative amount no
//! larger than [`Price::MAX_LISTED`]. Sums and line totals saturate instead of
//! overflowing.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Longest numeric prefix, the way a browser's `parseFloat` reads it.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("leading number pattern is valid")
});

/// A non-negative amount in euros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero euros.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Highest price a catalog document can carry.
    pub const MAX_LISTED: Self = Self(Decimal::from_parts(1_000_000, 0, 0, false, 0));

    /// Upper bound of every computed amount.
    pub const MAX: Self = Self(Decimal::MAX);

    /// Create a price, clamping negative amounts to zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        if amount.is_sign_negative() {
            Self::ZERO
        } else {
            Self(amount)
        }
    }

    /// Whole euros, handy for range bounds and tests.
    #[must_use]
    pub fn from_euros(euros: u32) -> Self {
        Self(Decimal::from(euros))
    }

    /// Coerce a raw document field into a price.
    ///
    /// - numbers are taken as-is
    /// - strings are read up to the first character that cannot continue a
    ///   number (`"12.5 EUR"` is 12.5)
    /// - anything else, including a missing field, is zero
    /// - amounts above [`Price::MAX_LISTED`] are capped to it
    #[must_use]
    pub fn from_document(value: Option<&serde_json::Value>) -> Self {
        let parsed = match value {
            Some(serde_json::Value::Number(n)) => parse_decimal(&n.to_string()),
            Some(serde_json::Value::String(s)) => parse_leading(s),
            _ => None,
        };
        parsed.map_or(Self::ZERO, Self::new).min(Self::MAX_LISTED)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display, e.g. `19.99€`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:.2}€", self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.0.checked_add(rhs.0).map_or(Self::MAX, Self)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.0.checked_mul(Decimal::from(rhs)).map_or(Self::MAX, Self)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

fn parse_leading(s: &str) -> Option<Decimal> {
    let m = LEADING_NUMBER.find(s.trim_start())?;
    parse_decimal(m.as_str())
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim_start_matches('+');
    if s.contains(['e', 'E']) {
        return Decimal::from_scientific(s).ok();
    }
    let s = s.trim_end_matches('.');
    match s.strip_prefix('.') {
        Some(frac) => Decimal::from_str(&format!("0.{frac}")).ok(),
        None => match s.strip_prefix("-.") {
            Some(frac) => Decimal::from_str(&format!("-0.{frac}")).ok(),
            None => Decimal::from_str(s).ok(),
        },
    }
}
