//! # Money Module
//!
//! Provides the `Money` type for handling Kenyan shilling amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The mobile shell used to total the cart as                            │
//! │    cart.reduce((sum, item) => sum + item.quantity * item.price, 0)     │
//! │  which is float math on prices like "57.30":                           │
//! │    3 × 57.3 = 171.89999999999998  ❌ WRONG!                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    3 × 5730 cents = 17190 cents = KES 171.90                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Three Representations
//! ```text
//! API price field     "120.00"        ──► Money::parse_decimal
//! In memory           Money(12000)    (cents)
//! API payload field   "120"           ◄── Money::to_api_string
//! Screen              "KES 120.00"    ◄── Display
//! ```
//!
//! ## Usage
//! ```rust
//! use dairy_core::money::Money;
//!
//! let price = Money::parse_decimal("57.30").unwrap();
//! let line = price * 3;
//! assert_eq!(line.cents(), 17190);
//! assert_eq!(line.to_string(), "KES 171.90");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (hundredths of a Kenyan shilling).
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction never wraps, totals can be compared freely
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serde as cents**: stored and exported to TypeScript as an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use dairy_core::money::Money;
    ///
    /// let price = Money::from_cents(5730); // KES 57.30
    /// assert_eq!(price.cents(), 5730);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole shillings.
    #[inline]
    pub const fn from_shillings(shillings: i64) -> Self {
        Money(shillings * 100)
    }

    /// Parses a decimal amount as the API sends it (`"120.00"`, `"57.3"`, `"60"`).
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - At most two fractional digits
    /// - Surrounding whitespace is ignored
    ///
    /// ## Example
    /// ```rust
    /// use dairy_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("120.00").unwrap().cents(), 12000);
    /// assert_eq!(Money::parse_decimal("57.3").unwrap().cents(), 5730);
    /// assert!(Money::parse_decimal("12.345").is_err());
    /// assert!(Money::parse_decimal("abc").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> CoreResult<Self> {
        let malformed = |reason: &str| CoreError::Malformed {
            what: "amount".to_string(),
            reason: format!("'{}' {}", input, reason),
        };

        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(malformed("is empty"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed("is not a number"));
        }
        if frac.len() > 2 {
            return Err(malformed("has more than two decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| malformed("is out of range"))?
        };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| malformed("is not a number"))? * 10,
            _ => frac.parse().map_err(|_| malformed("is not a number"))?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(|| malformed("is out of range"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-shilling portion (truncated toward zero).
    #[inline]
    pub const fn shillings(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use dairy_core::money::Money;
    ///
    /// let unit_price = Money::from_shillings(60);
    /// assert_eq!(unit_price.multiply_quantity(3), Money::from_shillings(180));
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }

    /// Renders the amount for request payloads the way a JavaScript number
    /// prints: no trailing zeros, and no decimal point for whole amounts.
    ///
    /// ## Example
    /// ```rust
    /// use dairy_core::money::Money;
    ///
    /// assert_eq!(Money::from_shillings(240).to_api_string(), "240");
    /// assert_eq!(Money::from_cents(24050).to_api_string(), "240.5");
    /// assert_eq!(Money::from_cents(24055).to_api_string(), "240.55");
    /// ```
    pub fn to_api_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let shillings = self.shillings().abs();
        let cents = self.cents_part().abs();
        match (cents, cents % 10) {
            (0, _) => format!("{sign}{shillings}"),
            (_, 0) => format!("{sign}{shillings}.{}", cents / 10),
            _ => format!("{sign}{shillings}.{cents:02}"),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display matches the `en-KE` currency format the screens show.
///
/// ```text
/// Money(124000)  →  "KES 1,240.00"
/// Money(-550)    →  "-KES 5.50"
/// ```
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.shillings().abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}KES {}.{:02}", sign, grouped, self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Multiplication by quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// Serde adapter for API fields that carry amounts as decimal strings.
///
/// Deserializes `"120.00"`, `"57.3"` and bare JSON numbers; serializes with two
/// decimals. Use with `#[serde(with = "dairy_core::money::decimal_string")]`.
pub mod decimal_string {
    use super::Money;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        let sign = if money.cents() < 0 { "-" } else { "" };
        serializer.serialize_str(&format!(
            "{}{}.{:02}",
            sign,
            money.shillings().abs(),
            money.cents_part()
        ))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Money;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal amount as a string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
            Money::parse_decimal(v).map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
            v.checked_mul(100)
                .map(Money::from_cents)
                .ok_or_else(|| E::custom("amount out of range"))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
            i64::try_from(v)
                .map_err(|_| E::custom("amount out of range"))
                .and_then(|v| self.visit_i64(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
            if !v.is_finite() {
                return Err(E::custom("amount is not finite"));
            }
            Ok(Money::from_cents((v * 100.0).round() as i64))
        }
    }
}

/// Serializes an amount as a bare JSON number for request bodies: `240` for
/// whole amounts, `240.5` otherwise.
///
/// Use with `#[serde(serialize_with = "dairy_core::money::api_number::serialize")]`.
pub mod api_number {
    use super::Money;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        if money.cents_part() == 0 {
            serializer.serialize_i64(money.shillings())
        } else {
            serializer.serialize_f64(money.cents() as f64 / 100.0)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize, serde::Serialize)]
    struct PriceField {
        #[serde(with = "decimal_string")]
        price: Money,
    }

    #[test]
    fn test_decimal_string_wire_format() {
        let parsed: PriceField = serde_json::from_str(r#"{"price":"120.00"}"#).unwrap();
        assert_eq!(parsed.price, Money::from_shillings(120));

        let parsed: PriceField = serde_json::from_str(r#"{"price":75}"#).unwrap();
        assert_eq!(parsed.price, Money::from_shillings(75));

        let parsed: PriceField = serde_json::from_str(r#"{"price":57.3}"#).unwrap();
        assert_eq!(parsed.price.cents(), 5730);

        assert!(serde_json::from_str::<PriceField>(r#"{"price":"free"}"#).is_err());

        let json = serde_json::to_string(&PriceField {
            price: Money::from_cents(24050),
        })
        .unwrap();
        assert_eq!(json, r#"{"price":"240.50"}"#);
    }

    #[test]
    fn test_api_number_body_field() {
        #[derive(serde::Serialize)]
        struct Body {
            #[serde(serialize_with = "api_number::serialize")]
            payable: Money,
        }

        let json = serde_json::to_string(&Body {
            payable: Money::from_shillings(240),
        })
        .unwrap();
        assert_eq!(json, r#"{"payable":240}"#);

        let json = serde_json::to_string(&Body {
            payable: Money::from_cents(24050),
        })
        .unwrap();
        assert_eq!(json, r#"{"payable":240.5}"#);
    }

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(5730);
        assert_eq!(money.cents(), 5730);
        assert_eq!(money.shillings(), 57);
        assert_eq!(money.cents_part(), 30);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("120.00").unwrap().cents(), 12000);
        assert_eq!(Money::parse_decimal(" 60 ").unwrap().cents(), 6000);
        assert_eq!(Money::parse_decimal("0.5").unwrap().cents(), 50);
        assert_eq!(Money::parse_decimal(".75").unwrap().cents(), 75);
        assert_eq!(Money::parse_decimal("-5.50").unwrap().cents(), -550);

        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal(".").is_err());
        assert!(Money::parse_decimal("1.234").is_err());
        assert!(Money::parse_decimal("1,000").is_err());
        assert!(Money::parse_decimal("KES 10").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(124000).to_string(), "KES 1,240.00");
        assert_eq!(Money::from_cents(5730).to_string(), "KES 57.30");
        assert_eq!(Money::from_cents(0).to_string(), "KES 0.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-KES 5.50");
        assert_eq!(Money::from_shillings(1_234_567).to_string(), "KES 1,234,567.00");
    }

    #[test]
    fn test_api_string() {
        assert_eq!(Money::from_shillings(240).to_api_string(), "240");
        assert_eq!(Money::from_cents(24050).to_api_string(), "240.5");
        assert_eq!(Money::from_cents(5).to_api_string(), "0.05");
        assert_eq!(Money::zero().to_api_string(), "0");
    }

    #[test]
    fn test_api_string_drops_trailing_zero() {
        assert_eq!(Money::from_cents(20550).to_api_string(), "205.5");
        assert_eq!(Money::from_cents(20555).to_api_string(), "205.55");
        assert_eq!(Money::from_cents(20510).to_api_string(), "205.1");
        assert_eq!(Money::from_cents(-550).to_api_string(), "-5.5");
        assert!(!Money::from_cents(20550).to_api_string().ends_with('0'));
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    /// 3 × 57.30 is the case the float-based screen total got wrong.
    #[test]
    fn test_no_float_drift() {
        let price = Money::parse_decimal("57.30").unwrap();
        assert_eq!((price * 3).to_api_string(), "171.9");
    }
}
