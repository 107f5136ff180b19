//! Customer profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scooter_support_core::{IdentityId, PhoneNumber, UserRole};

/// A customer profile, keyed by its stable identity.
///
/// Created on the first successful phone login and mutated by profile edits.
/// Never deleted by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    /// Stable identity id, shared across sessions and devices.
    pub id: IdentityId,
    /// Login phone number. Unique across profiles when present.
    pub mobile_number: Option<PhoneNumber>,
    /// Name shown in the portal.
    pub display_name: Option<String>,
    /// Customer or admin.
    pub role: UserRole,
    /// Whether the profile may log in.
    pub is_active: bool,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Row inserted on first phone resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    /// Identity derived from the new anonymous session.
    pub id: IdentityId,
    /// The phone that was resolved.
    pub mobile_number: PhoneNumber,
    /// `"User " + last four digits`.
    pub display_name: String,
}

impl NewProfile {
    /// Profile for a phone seen for the first time.
    #[must_use]
    pub fn for_phone(id: IdentityId, mobile_number: PhoneNumber) -> Self {
        let display_name = mobile_number.default_display_name();
        Self {
            id,
            mobile_number,
            display_name,
        }
    }
}

/// Fields written by a profile edit. `None` clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New display name.
    pub display_name: Option<String>,
    /// New login phone number.
    pub mobile_number: Option<PhoneNumber>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_display_name() {
        let phone = PhoneNumber::parse("9876543210").unwrap();
        let profile = NewProfile::for_phone(IdentityId::random(), phone);
        assert_eq!(profile.display_name, "User 3210");
    }
}
