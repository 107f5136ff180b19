//! Status and classification enums for profiles, tickets and orders.
//!
//! Every enum serializes as `snake_case`, which is also its database and
//! command-line spelling.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `ALL`, `Display` and `FromStr` from a variant/name table.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The canonical `snake_case` spelling.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Role of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Customer,
    /// May manage the question catalog.
    Admin,
}

string_enum!(UserRole, "user role", {
    Customer => "customer",
    Admin => "admin",
});

/// Support ticket category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Battery,
    Mechanical,
    Safety,
    General,
}

string_enum!(TicketCategory, "ticket category", {
    Battery => "battery",
    Mechanical => "mechanical",
    Safety => "safety",
    General => "general",
});

impl TicketCategory {
    /// Human-readable title shown above the category's questions.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Battery => "Battery Issues",
            Self::Mechanical => "Mechanical Problems",
            Self::Safety => "Safety Concerns",
            Self::General => "General Questions",
        }
    }
}

/// Support ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

string_enum!(TicketPriority, "ticket priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

/// Support ticket lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

string_enum!(TicketStatus, "ticket status", {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
});

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_status_in_progress_spelling() {
        assert_eq!(TicketStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            "in_progress".parse::<TicketStatus>().unwrap(),
            TicketStatus::InProgress
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);
        assert_eq!(TicketStatus::default(), TicketStatus::Open);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(UserRole::default(), UserRole::Customer);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = "electrical".parse::<TicketCategory>().unwrap_err();
        assert_eq!(err.kind, "ticket category");
        assert_eq!(err.to_string(), "invalid ticket category: electrical");
    }

    #[test]
    fn test_serde_matches_display() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
