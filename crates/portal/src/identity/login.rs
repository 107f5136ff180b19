//! Simulated passcode login.
//!
//! No code is sent or checked: requesting a passcode only waits a moment,
//! and any six digits are accepted. The real work is the phone resolution
//! that runs on verify.

use std::time::Duration;

use tracing::instrument;

use scooter_support_core::PhoneNumber;

use super::{IdentityResolver, ResolvedIdentity};
use crate::backend::{AuthBackend, ProfileStore};
use crate::error::{PortalError, Result, add_breadcrumb, set_sentry_user};

/// Passcode length.
pub const OTP_LEN: usize = 6;

/// Where the login screen is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    EnteringPhone,
    EnteringOtp { phone: PhoneNumber },
}

impl LoginState {
    const fn name(&self) -> &'static str {
        match self {
            Self::EnteringPhone => "entering a phone number",
            Self::EnteringOtp { .. } => "entering a passcode",
        }
    }
}

/// The two-step phone then passcode login.
pub struct LoginFlow<'a, A, P> {
    resolver: IdentityResolver<'a, A, P>,
    otp_delay: Duration,
    state: LoginState,
}

impl<'a, A, P> LoginFlow<'a, A, P>
where
    A: AuthBackend,
    P: ProfileStore,
{
    /// Start at the phone step. `otp_delay` simulates sending the code.
    #[must_use]
    pub const fn new(resolver: IdentityResolver<'a, A, P>, otp_delay: Duration) -> Self {
        Self {
            resolver,
            otp_delay,
            state: LoginState::EnteringPhone,
        }
    }

    /// Current step.
    #[must_use]
    pub const fn state(&self) -> &LoginState {
        &self.state
    }

    /// Accept a phone number and "send" a passcode.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidPhone` if the number does not parse, or
    /// `PortalError::InvalidTransition` if a passcode was already requested.
    #[instrument(skip_all)]
    pub async fn request_otp(&mut self, phone: &str) -> Result<()> {
        if !matches!(self.state, LoginState::EnteringPhone) {
            return Err(self.invalid("request a passcode"));
        }
        let phone = PhoneNumber::parse(phone)?;
        tokio::time::sleep(self.otp_delay).await;

        tracing::info!(phone = %phone.redacted(), "Passcode sent");
        self.state = LoginState::EnteringOtp { phone };
        Ok(())
    }

    /// "Send" the passcode again.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidTransition` unless a passcode was requested.
    pub async fn resend_otp(&mut self) -> Result<()> {
        let LoginState::EnteringOtp { phone } = &self.state else {
            return Err(self.invalid("resend a passcode"));
        };
        tokio::time::sleep(self.otp_delay).await;
        tracing::info!(phone = %phone.redacted(), "Passcode resent");
        Ok(())
    }

    /// Go back to the phone step.
    pub fn change_number(&mut self) {
        self.state = LoginState::EnteringPhone;
    }

    /// Accept the passcode and resolve the phone to an identity.
    ///
    /// On failure the flow stays at the passcode step so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidOtp` unless `code` is exactly six ASCII
    /// digits (no backend call is made), `PortalError::InvalidTransition`
    /// before a passcode was requested, or whatever phone resolution returns.
    #[instrument(skip_all)]
    pub async fn verify(&mut self, code: &str) -> Result<ResolvedIdentity> {
        let LoginState::EnteringOtp { phone } = &self.state else {
            return Err(self.invalid("verify a passcode"));
        };
        if code.len() != OTP_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PortalError::InvalidOtp);
        }

        let resolved = self.resolver.resolve_from_phone(phone).await?;
        set_sentry_user(resolved.id);
        add_breadcrumb("auth", "Logged in", None);

        self.state = LoginState::EnteringPhone;
        Ok(resolved)
    }

    fn invalid(&self, action: &'static str) -> PortalError {
        PortalError::InvalidTransition {
            from: self.state.name(),
            action,
        }
    }
}
