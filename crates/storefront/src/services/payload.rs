//! Decoding of JSON request bodies.
//!
//! Bodies arrive as loosely typed JSON objects. Each field is looked up as a
//! [`Field`] so that an absent key, an explicit `null`, and a value can be told
//! apart, then decoded with one of the `decode_*` functions. Every decoder
//! reports exactly one [`ErrorCode`].

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use kandahar_core::{CategoryId, Price, ProductId, SessionId, Slug, SlugError};

use super::error::{ErrorCode, ServiceError};

/// Upper bound of a `NUMERIC(12, 2)` price.
fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// A JSON object request body.
#[derive(Debug, Clone, Default)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Wrap a decoded body.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::InvalidBody` if the body is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ServiceError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ErrorCode::InvalidBody.into()),
        }
    }

    /// Look up a field by its wire name.
    #[must_use]
    pub fn field(&self, key: &str) -> Field<'_> {
        match self.0.get(key) {
            None => Field::Absent,
            Some(Value::Null) => Field::Null,
            Some(value) => Field::Present(value),
        }
    }
}

/// One field of a [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Absent,
    Null,
    Present(&'a Value),
}

impl<'a> Field<'a> {
    /// A field the caller must supply; absent and `null` are `missing`.
    ///
    /// # Errors
    ///
    /// Returns `missing` or the decoder's error.
    pub fn required<T>(
        self,
        missing: ErrorCode,
        decode: impl FnOnce(&'a Value) -> Result<T, ErrorCode>,
    ) -> Result<T, ErrorCode> {
        match self {
            Self::Absent | Self::Null => Err(missing),
            Self::Present(value) => decode(value),
        }
    }

    /// A field that may be left out; absent and `null` both yield `None`.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error.
    pub fn optional<T>(
        self,
        decode: impl FnOnce(&'a Value) -> Result<T, ErrorCode>,
    ) -> Result<Option<T>, ErrorCode> {
        match self {
            Self::Absent | Self::Null => Ok(None),
            Self::Present(value) => decode(value).map(Some),
        }
    }

    /// A patch of a `NOT NULL` column: absent leaves it alone, `null` is
    /// rejected with `invalid`.
    ///
    /// # Errors
    ///
    /// Returns `invalid` for `null` or the decoder's error.
    pub fn non_null<T>(
        self,
        invalid: ErrorCode,
        decode: impl FnOnce(&'a Value) -> Result<T, ErrorCode>,
    ) -> Result<Option<T>, ErrorCode> {
        match self {
            Self::Absent => Ok(None),
            Self::Null => Err(invalid),
            Self::Present(value) => decode(value).map(Some),
        }
    }

    /// A patch of a nullable column: absent leaves it alone, `null` clears it.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error.
    pub fn nullable<T>(
        self,
        decode: impl FnOnce(&'a Value) -> Result<Option<T>, ErrorCode>,
    ) -> Result<Option<Option<T>>, ErrorCode> {
        match self {
            Self::Absent => Ok(None),
            Self::Null => Ok(Some(None)),
            Self::Present(value) => decode(value).map(Some),
        }
    }
}

/// Longest accepted `name`, matching `VARCHAR(255)`.
pub const NAME_MAX_CHARS: usize = 255;

/// Longest accepted `ageRange`, matching `VARCHAR(100)`.
pub const AGE_RANGE_MAX_CHARS: usize = 100;

/// Reject text longer than `max_chars` characters with `code`.
fn bounded(text: String, max_chars: usize, code: ErrorCode) -> Result<String, ErrorCode> {
    if text.chars().count() > max_chars {
        return Err(code);
    }
    Ok(text)
}

/// A trimmed, non-empty string.
///
/// # Errors
///
/// Returns `code` for non-strings and blank strings.
pub fn decode_text(value: &Value, code: ErrorCode) -> Result<String, ErrorCode> {
    match value.as_str().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_owned()),
        _ => Err(code),
    }
}

/// A trimmed string where blank means "no value".
///
/// # Errors
///
/// Returns `code` for non-strings.
pub fn decode_optional_text(value: &Value, code: ErrorCode) -> Result<Option<String>, ErrorCode> {
    let text = value.as_str().ok_or(code)?.trim();
    Ok((!text.is_empty()).then(|| text.to_owned()))
}

/// A display name. Blank or non-string input is `blank`; names longer than
/// [`NAME_MAX_CHARS`] are `ErrorCode::InvalidName`.
///
/// # Errors
///
/// Returns `blank` or `ErrorCode::InvalidName`.
pub fn decode_name(value: &Value, blank: ErrorCode) -> Result<String, ErrorCode> {
    bounded(decode_text(value, blank)?, NAME_MAX_CHARS, ErrorCode::InvalidName)
}

/// An optional age range of at most [`AGE_RANGE_MAX_CHARS`] characters.
///
/// # Errors
///
/// Returns `ErrorCode::InvalidAgeRange` for non-strings and over-long text.
pub fn decode_age_range(value: &Value) -> Result<Option<String>, ErrorCode> {
    decode_optional_text(value, ErrorCode::InvalidAgeRange)?
        .map(|text| bounded(text, AGE_RANGE_MAX_CHARS, ErrorCode::InvalidAgeRange))
        .transpose()
}

/// A slug. Blank or non-string input is `blank`; over-long input is
/// `ErrorCode::InvalidSlug`.
///
/// # Errors
///
/// Returns `blank` or `ErrorCode::InvalidSlug`.
pub fn decode_slug(value: &Value, blank: ErrorCode) -> Result<Slug, ErrorCode> {
    let raw = value.as_str().ok_or(blank)?;
    Slug::parse(raw).map_err(|e| match e {
        SlugError::Empty => blank,
        SlugError::TooLong { .. } => ErrorCode::InvalidSlug,
    })
}

/// A non-negative price given as a JSON number or numeric string, rounded to
/// cents.
///
/// # Errors
///
/// Returns `ErrorCode::InvalidPrice` for anything else, negative amounts,
/// and amounts beyond the column range.
pub fn decode_price(value: &Value) -> Result<Price, ErrorCode> {
    let amount = match value {
        Value::Number(n) => match n.as_i64() {
            Some(whole) => Decimal::from(whole),
            None => {
                let float = n.as_f64().ok_or(ErrorCode::InvalidPrice)?;
                Price::from_f64(float)
                    .map_err(|_| ErrorCode::InvalidPrice)?
                    .amount()
            }
        },
        Value::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| ErrorCode::InvalidPrice)?,
        _ => return Err(ErrorCode::InvalidPrice),
    };

    let amount = amount.round_dp(2);
    if amount > max_price() {
        return Err(ErrorCode::InvalidPrice);
    }
    Price::new(amount).map_err(|_| ErrorCode::InvalidPrice)
}

/// A stock count. Fractions are truncated and numeric strings accepted.
///
/// # Errors
///
/// Returns `ErrorCode::InvalidStock` for non-numeric input or values outside
/// the `INTEGER` range.
pub fn decode_stock(value: &Value) -> Result<i32, ErrorCode> {
    let whole = match value {
        Value::Number(n) => match n.as_i64() {
            Some(whole) => whole,
            None => truncate(n.as_f64()).ok_or(ErrorCode::InvalidStock)?,
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(whole) => whole,
                Err(_) => truncate(s.parse::<f64>().ok()).ok_or(ErrorCode::InvalidStock)?,
            }
        }
        _ => return Err(ErrorCode::InvalidStock),
    };
    i32::try_from(whole).map_err(|_| ErrorCode::InvalidStock)
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(float: Option<f64>) -> Option<i64> {
    let float = float?.trunc();
    // i64::MAX is not exactly representable; stay well inside the range
    (float.is_finite() && float.abs() < 9.0e18).then(|| float as i64)
}

/// A boolean flag, also accepting the strings `"true"` and `"false"`.
///
/// # Errors
///
/// Returns `ErrorCode::InvalidFeatured` for anything else.
pub fn decode_featured(value: &Value) -> Result<bool, ErrorCode> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        _ => Err(ErrorCode::InvalidFeatured),
    }
}

/// An ordered list of image URLs.
///
/// # Errors
///
/// Returns `ErrorCode::InvalidImages` unless the value is an array of strings.
pub fn decode_images(value: &Value) -> Result<Vec<String>, ErrorCode> {
    value
        .as_array()
        .ok_or(ErrorCode::InvalidImages)?
        .iter()
        .map(|url| url.as_str().map(str::to_owned).ok_or(ErrorCode::InvalidImages))
        .collect()
}

/// A positive integer id given as a JSON number or numeric string.
fn decode_positive_i32(value: &Value) -> Option<i32> {
    let id = match value {
        Value::Number(n) => i32::try_from(n.as_i64()?).ok()?,
        Value::String(s) => s.trim().parse::<i32>().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}

/// A category reference. `0` and `""` mean "no category".
///
/// # Errors
///
/// Returns `ErrorCode::InvalidCategoryId` for anything that is not an id.
pub fn decode_category_id(value: &Value) -> Result<Option<CategoryId>, ErrorCode> {
    match value {
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(None),
        _ => decode_positive_i32(value)
            .map(|id| Some(CategoryId::new(id)))
            .ok_or(ErrorCode::InvalidCategoryId),
    }
}

/// A product reference.
///
/// # Errors
///
/// Returns `ErrorCode::InvalidProductId` for anything that is not an id.
pub fn decode_product_id(value: &Value) -> Result<ProductId, ErrorCode> {
    decode_positive_i32(value)
        .map(ProductId::new)
        .ok_or(ErrorCode::InvalidProductId)
}

/// A cart session token.
///
/// # Errors
///
/// Returns `ErrorCode::MissingSessionId` for blank, non-string, or over-long
/// tokens.
pub fn decode_session_id(value: &Value) -> Result<SessionId, ErrorCode> {
    value
        .as_str()
        .and_then(|raw| SessionId::parse(raw).ok())
        .ok_or(ErrorCode::MissingSessionId)
}

/// A cart quantity: a whole JSON number of at least 1. `2.0` counts as whole.
///
/// # Errors
///
/// Returns `ErrorCode::InvalidQuantity` otherwise.
pub fn decode_quantity(value: &Value) -> Result<i32, ErrorCode> {
    let Value::Number(n) = value else {
        return Err(ErrorCode::InvalidQuantity);
    };
    let whole = match n.as_i64() {
        Some(whole) => Some(whole),
        None => n
            .as_f64()
            .filter(|float| float.fract() == 0.0)
            .and_then(|float| truncate(Some(float))),
    };
    whole
        .and_then(|q| i32::try_from(q).ok())
        .filter(|q| *q >= 1)
        .ok_or(ErrorCode::InvalidQuantity)
}
