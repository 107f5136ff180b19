//! Support ticket types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scooter_support_core::{IdentityId, TicketCategory, TicketId, TicketPriority, TicketStatus};

use crate::error::{PortalError, Result, ValidationErrors};

/// Minimum title length, in characters.
pub const MIN_TITLE_CHARS: usize = 5;
/// Minimum description length, in characters.
pub const MIN_DESCRIPTION_CHARS: usize = 10;
/// Pre-filled titles are cut to this many characters.
pub const MAX_PREFILLED_TITLE_CHARS: usize = 100;

/// A stored support ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: TicketId,
    /// Owning identity.
    pub customer_id: IdentityId,
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    /// Blob store path of the single attachment, if any.
    pub attachment_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// The support form as the user is filling it in.
///
/// Fields are kept as raw strings so an unknown category or priority can be
/// reported inline instead of being unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketForm {
    pub title: String,
    pub description: String,
    /// Empty until the user picks one.
    pub category: String,
    pub priority: String,
}

impl Default for TicketForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: String::new(),
            priority: TicketPriority::default().as_str().to_owned(),
        }
    }
}

impl TicketForm {
    /// Form pre-filled from a predefined question.
    ///
    /// The title is the question cut to 100 characters; the description is
    /// the full question.
    #[must_use]
    pub fn from_question(text: &str, category: &str) -> Self {
        Self {
            title: text.chars().take(MAX_PREFILLED_TITLE_CHARS).collect(),
            description: text.to_owned(),
            category: category.to_owned(),
            ..Self::default()
        }
    }

    /// Check every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::Validation` with one message per failing field.
    pub fn validate(&self) -> Result<ValidTicket> {
        let mut errors = ValidationErrors::new();

        if self.title.chars().count() < MIN_TITLE_CHARS {
            errors.add(
                "title",
                format!("Title must be at least {MIN_TITLE_CHARS} characters"),
            );
        }
        if self.description.chars().count() < MIN_DESCRIPTION_CHARS {
            errors.add(
                "description",
                format!("Description must be at least {MIN_DESCRIPTION_CHARS} characters"),
            );
        }

        let category = self.category.parse::<TicketCategory>().ok();
        if category.is_none() {
            errors.add("category", "Please select a category");
        }

        let priority = if self.priority.is_empty() {
            Some(TicketPriority::default())
        } else {
            self.priority.parse::<TicketPriority>().ok()
        };
        if priority.is_none() {
            errors.add("priority", "Please select a priority");
        }

        match (category, priority) {
            (Some(category), Some(priority)) if errors.is_empty() => Ok(ValidTicket {
                title: self.title.clone(),
                description: self.description.clone(),
                category,
                priority,
            }),
            _ => Err(PortalError::Validation(errors)),
        }
    }
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTicket {
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
}

/// Row handed to the ticket store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub customer_id: IdentityId,
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub attachment_path: Option<String>,
}

impl NewTicket {
    /// An `open` ticket from a validated form.
    #[must_use]
    pub fn open(
        customer_id: IdentityId,
        ticket: ValidTicket,
        attachment_path: Option<String>,
    ) -> Self {
        Self {
            customer_id,
            title: ticket.title,
            description: ticket.description,
            category: ticket.category,
            priority: ticket.priority,
            status: TicketStatus::Open,
            attachment_path,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> TicketForm {
        TicketForm {
            title: "Battery not charging".to_string(),
            description: "It stopped charging after 2 days".to_string(),
            category: "battery".to_string(),
            priority: "medium".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let ticket = valid_form().validate().unwrap();
        assert_eq!(ticket.category, TicketCategory::Battery);
        assert_eq!(ticket.priority, TicketPriority::Medium);
    }

    #[test]
    fn test_title_of_four_chars_rejected() {
        let form = TicketForm {
            title: "Help".to_string(),
            ..valid_form()
        };
        let Err(PortalError::Validation(errors)) = form.validate() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("title"), Some("Title must be at least 5 characters"));
        assert_eq!(errors.get("description"), None);
    }

    #[test]
    fn test_title_length_counts_characters() {
        let form = TicketForm {
            title: "ééééé".to_string(),
            ..valid_form()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_all_failures_collected() {
        let form = TicketForm {
            title: String::new(),
            description: "short".to_string(),
            category: String::new(),
            priority: "critical".to_string(),
        };
        let Err(PortalError::Validation(errors)) = form.validate() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.iter().count(), 4);
        assert_eq!(errors.get("category"), Some("Please select a category"));
        assert_eq!(errors.get("priority"), Some("Please select a priority"));
    }

    #[test]
    fn test_empty_priority_defaults_to_medium() {
        let form = TicketForm {
            priority: String::new(),
            ..valid_form()
        };
        assert_eq!(form.validate().unwrap().priority, TicketPriority::Medium);
    }

    #[test]
    fn test_from_question_truncates_title() {
        let text = "x".repeat(150);
        let form = TicketForm::from_question(&text, "general");
        assert_eq!(form.title.chars().count(), 100);
        assert_eq!(form.description, text);
        assert_eq!(form.category, "general");
        assert_eq!(form.priority, "medium");
    }

    #[test]
    fn test_new_ticket_is_open() {
        let ticket = NewTicket::open(IdentityId::random(), valid_form().validate().unwrap(), None);
        assert_eq!(ticket.status, TicketStatus::Open);
    }
}
