//! Prices and the scooter catalog, using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a USD price from a whole number of cents.
    #[must_use]
    pub fn usd_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2), CurrencyCode::USD)
    }

    /// This price multiplied by a quantity, in the same currency.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    INR,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::INR => "₹",
        }
    }
}

/// Scooter models available to order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "scooter_model", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ScooterModel {
    MsClassic,
    MsSport,
    MsElectric,
    MsPremium,
}

impl ScooterModel {
    /// Every model in the catalog.
    pub const ALL: &'static [Self] = &[
        Self::MsClassic,
        Self::MsSport,
        Self::MsElectric,
        Self::MsPremium,
    ];

    /// The canonical `snake_case` spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MsClassic => "ms_classic",
            Self::MsSport => "ms_sport",
            Self::MsElectric => "ms_electric",
            Self::MsPremium => "ms_premium",
        }
    }

    /// Catalog label, e.g. "MS Sport".
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MsClassic => "MS Classic",
            Self::MsSport => "MS Sport",
            Self::MsElectric => "MS Electric",
            Self::MsPremium => "MS Premium",
        }
    }

    /// Catalog unit price.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        let cents = match self {
            Self::MsClassic => 129_999,
            Self::MsSport => 159_999,
            Self::MsElectric => 189_999,
            Self::MsPremium => 229_999,
        };
        Price::new(Decimal::from_parts(cents, 0, 0, false, 2), CurrencyCode::USD)
    }
}

impl fmt::Display for ScooterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScooterModel {
    type Err = crate::types::status::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| crate::types::status::ParseEnumError {
                kind: "scooter model",
                value: s.to_owned(),
            })
    }
}
