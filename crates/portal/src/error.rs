//! Unified error handling with Sentry integration.
//!
//! Every collaborator call is caught at its operation boundary and converted
//! into a [`PortalError`]. Front ends match on the variant to decide whether
//! to re-render inline errors, redirect to login, or show a dismissible
//! notification. Server-class errors are captured to Sentry via
//! [`PortalError::report`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use scooter_support_core::{IdentityId, PhoneError};

use crate::db::RepositoryError;
use crate::storage::StorageError;

/// Field-level validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    /// An empty set of errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The message for a field, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Iterate over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(())` when empty, otherwise a [`PortalError::Validation`].
    ///
    /// # Errors
    ///
    /// Returns `PortalError::Validation` carrying these errors if any were recorded.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PortalError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// One or more form fields failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// No identity could be resolved; the user must log in.
    #[error("not logged in")]
    Unauthenticated,

    /// Transient network or server failure.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Attachment rejected locally before any upload attempt.
    #[error("file too large: {size} bytes (max {max})")]
    FileTooLarge {
        /// Size of the rejected file.
        size: u64,
        /// Configured maximum.
        max: u64,
    },

    /// The attachment upload failed; nothing was submitted.
    #[error("attachment upload failed: {0}")]
    Upload(String),

    /// The phone number is already bound to a different identity.
    #[error("this mobile number is already registered to another account")]
    DuplicatePhone,

    /// Identity resolution could not create or adopt an identity.
    #[error("could not establish identity: {0}")]
    IdentityCreation(String),

    /// Phone number failed to parse.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// Passcode was not six digits.
    #[error("passcode must be exactly 6 digits")]
    InvalidOtp,

    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A submission is already pending on this workflow.
    #[error("a submission is already in progress")]
    SubmissionInFlight,

    /// The requested action is not valid in the current state.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        /// Current state name.
        from: &'static str,
        /// Attempted action.
        action: &'static str,
    },

    /// Tab- or device-local storage failed.
    #[error("local storage error: {0}")]
    LocalStorage(#[from] StorageError),
}

impl PortalError {
    /// Whether re-invoking the same action may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_)
                | Self::Upload(_)
                | Self::IdentityCreation(_)
                | Self::SubmissionInFlight
                | Self::LocalStorage(_)
        )
    }

    /// Whether the front end should send the user back to login.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Whether this is a server-class failure worth capturing.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_)
                | Self::Upload(_)
                | Self::IdentityCreation(_)
                | Self::LocalStorage(_)
        )
    }

    /// Log the error and capture server-class failures to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::warn!(error = %self, "Operation rejected");
        }
    }
}

impl From<RepositoryError> for PortalError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record".to_owned()),
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}

/// Result type alias for `PortalError`.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Set the Sentry user context from a resolved identity.
///
/// Call this after successful login to associate errors with the customer.
pub fn set_sentry_user(identity: IdentityId) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(identity.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the customer.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of workflow
/// transitions leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_error_display() {
        let err = PortalError::FileTooLarge {
            size: 11 * 1024 * 1024,
            max: 10 * 1024 * 1024,
        };
        assert_eq!(
            err.to_string(),
            "file too large: 11534336 bytes (max 10485760)"
        );

        let err = PortalError::InvalidTransition {
            from: "selecting a question",
            action: "submit",
        };
        assert_eq!(err.to_string(), "cannot submit while selecting a question");
    }

    #[test]
    fn test_validation_errors_first_message_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "Title must be at least 5 characters");
        errors.add("title", "ignored");
        errors.add("description", "Description must be at least 10 characters");

        assert_eq!(errors.get("title"), Some("Title must be at least 5 characters"));
        assert_eq!(
            errors.to_string(),
            "description: Description must be at least 10 characters; title: Title must be at least 5 characters"
        );
    }

    #[test]
    fn test_validation_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add("quantity", "Quantity must be between 1 and 10");
        assert!(matches!(
            errors.into_result(),
            Err(PortalError::Validation(_))
        ));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(PortalError::BackendUnavailable("timeout".to_string()).is_retryable());
        assert!(PortalError::Upload("503".to_string()).is_retryable());
        assert!(!PortalError::Unauthenticated.is_retryable());
        assert!(!PortalError::DuplicatePhone.is_retryable());
        assert!(PortalError::Unauthenticated.requires_login());
    }

    #[test]
    fn test_repository_error_conversion() {
        assert!(matches!(
            PortalError::from(RepositoryError::NotFound),
            PortalError::NotFound(_)
        ));
        assert!(matches!(
            PortalError::from(RepositoryError::Unavailable("down".to_string())),
            PortalError::BackendUnavailable(_)
        ));
    }
}
