//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12, 2)` and carried as [`Decimal`] so that
//! sorting and comparisons never suffer from binary floating point rounding.
//! On the wire they are plain JSON numbers (`"price": 50`), which is what the
//! storefront pages render directly.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount is NaN, infinite, or outside the decimal range.
    #[error("price must be a finite number")]
    NotFinite,
}

/// A non-negative catalog price in the store currency (AFN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn from_i64(amount: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::from(amount))
    }

    /// Create a price from a floating point amount (as decoded from JSON).
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotFinite` for NaN/infinite input and
    /// `PriceError::Negative` for amounts below zero.
    pub fn from_f64(amount: f64) -> Result<Self, PriceError> {
        let amount = Decimal::from_f64(amount).ok_or(PriceError::NotFinite)?;
        Self::new(amount.normalize())
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract().is_zero()
            && let Some(whole) = self.0.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Price::from_i64(-1), Err(PriceError::Negative));
        assert_eq!(Price::from_f64(-0.01), Err(PriceError::Negative));
    }

    #[test]
    fn test_zero_is_valid() {
        assert!(Price::from_i64(0).is_ok());
        assert!(Price::from_f64(-0.0).is_ok());
    }

    #[test]
    fn test_rejects_non_finite() {
        assert_eq!(Price::from_f64(f64::NAN), Err(PriceError::NotFinite));
        assert_eq!(Price::from_f64(f64::INFINITY), Err(PriceError::NotFinite));
    }

    #[test]
    fn test_serializes_whole_amount_as_integer() {
        let json = serde_json::to_string(&Price::from_i64(50).unwrap()).unwrap();
        assert_eq!(json, "50");
    }

    #[test]
    fn test_serializes_fraction_as_float() {
        let json = serde_json::to_string(&Price::from_f64(19.99).unwrap()).unwrap();
        assert_eq!(json, "19.99");
    }

    #[test]
    fn test_ordering() {
        assert!(Price::from_i64(10).unwrap() < Price::from_f64(10.5).unwrap());
    }
}
