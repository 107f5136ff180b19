//! Mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains something other than ASCII digits.
    #[error("phone number must contain digits only")]
    NonDigit,
    /// Fewer digits than a full mobile number.
    #[error("phone number must be at least {min} digits")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// More digits than any dialable number.
    #[error("phone number must be at most {max} digits")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A customer's mobile number, used as the login handle.
///
/// ## Constraints
///
/// - ASCII digits only (no `+`, spaces or dashes)
/// - Length: 10-15 digits
///
/// ## Examples
///
/// ```
/// use scooter_support_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("9876543210").unwrap();
/// assert_eq!(phone.last_four(), "3210");
/// assert_eq!(phone.default_display_name(), "User 3210");
///
/// assert!(PhoneNumber::parse("").is_err());
/// assert!(PhoneNumber::parse("987654321").is_err());   // too short
/// assert!(PhoneNumber::parse("98765-43210").is_err()); // not digits
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum number of digits.
    pub const MIN_LENGTH: usize = 10;
    /// Maximum number of digits (E.164 limit).
    pub const MAX_LENGTH: usize = 15;

    /// Parse a `PhoneNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains non-digits, or has
    /// fewer than 10 or more than 15 digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }

        if s.len() < Self::MIN_LENGTH {
            return Err(PhoneError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(PhoneError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The last four digits.
    #[must_use]
    pub fn last_four(&self) -> &str {
        // Always ASCII and at least MIN_LENGTH long, so the slice is on a char boundary.
        self.0.get(self.0.len() - 4..).unwrap_or(&self.0)
    }

    /// Display name given to a freshly created profile.
    #[must_use]
    pub fn default_display_name(&self) -> String {
        format!("User {}", self.last_four())
    }

    /// Masked form for logs, e.g. `******3210`.
    #[must_use]
    pub fn redacted(&self) -> String {
        format!("{}{}", "*".repeat(self.0.len() - 4), self.last_four())
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for PhoneNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PhoneNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for PhoneNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
