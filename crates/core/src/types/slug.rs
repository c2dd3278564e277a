//! URL-safe catalog identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input is empty after trimming.
    #[error("slug cannot be empty")]
    Empty,
    /// The input is too long for the `slug` column.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A unique, URL-safe identifier for a category or product.
///
/// Slugs are normalized on parse: surrounding whitespace is trimmed and the
/// value is lowercased, so `" WiFi "` and `"wifi"` are the same slug.
///
/// ## Examples
///
/// ```
/// use kandahar_core::Slug;
///
/// assert_eq!(Slug::parse("  WiFi-Routers ").unwrap().as_str(), "wifi-routers");
/// assert!(Slug::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum length, matching `VARCHAR(255)`.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `Slug` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or its lowercase form
    /// is longer than [`Slug::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SlugError::Empty);
        }

        // Lowercasing can add characters, so measure the stored form
        let lowered = trimmed.to_lowercase();
        if lowered.chars().count() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(lowered))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Stored slugs were normalized on the way in
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
