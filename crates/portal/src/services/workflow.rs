//! The support request state machine.
//!
//! ```text
//! SelectingQuestion --select--> FillingForm --submit ok--> Submitted
//!        ^                        |    ^  |                    |
//!        +---------back-----------+    +--+ submit failed      |
//!        +-------------------------restart---------------------+
//! ```
//!
//! State lives only in the workflow instance. At most one submission runs
//! at a time; a second `submit` while one is pending is rejected.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::instrument;

use crate::backend::{AuthBackend, BlobStore, ProfileStore, TicketStore};
use crate::error::{PortalError, Result, ValidationErrors, add_breadcrumb};
use crate::models::{Attachment, SupportTicket, TicketForm};

use super::TicketSubmission;

/// Where the user is in the support flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    SelectingQuestion,
    FillingForm {
        form: TicketForm,
        /// Field errors from the last failed submit.
        errors: ValidationErrors,
    },
    Submitted {
        ticket: SupportTicket,
    },
}

impl WorkflowState {
    const fn name(&self) -> &'static str {
        match self {
            Self::SelectingQuestion => "selecting a question",
            Self::FillingForm { .. } => "filling the form",
            Self::Submitted { .. } => "submitted",
        }
    }

    fn filling(form: TicketForm) -> Self {
        Self::FillingForm {
            form,
            errors: ValidationErrors::new(),
        }
    }
}

struct Inner {
    state: WorkflowState,
    busy: bool,
}

/// Clears the busy flag when the submission ends, even if it is dropped.
struct BusyGuard<'g> {
    inner: &'g Mutex<Inner>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .busy = false;
    }
}

/// One support request, from question to submitted ticket.
pub struct SupportWorkflow<'a, A, P, T, B> {
    tickets: &'a TicketSubmission<'a, A, P, T, B>,
    inner: Mutex<Inner>,
}

impl<'a, A, P, T, B> SupportWorkflow<'a, A, P, T, B>
where
    A: AuthBackend,
    P: ProfileStore,
    T: TicketStore,
    B: BlobStore,
{
    /// Start at question selection.
    #[must_use]
    pub const fn new(tickets: &'a TicketSubmission<'a, A, P, T, B>) -> Self {
        Self {
            tickets,
            inner: Mutex::new(Inner {
                state: WorkflowState::SelectingQuestion,
                busy: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        self.lock().state.clone()
    }

    /// Whether a submission is pending.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    fn transition(
        &self,
        action: &'static str,
        allowed: impl FnOnce(&WorkflowState) -> bool,
        next: impl FnOnce(&WorkflowState) -> WorkflowState,
    ) -> Result<()> {
        let mut inner = self.lock();
        if inner.busy {
            return Err(PortalError::SubmissionInFlight);
        }
        if !allowed(&inner.state) {
            return Err(PortalError::InvalidTransition {
                from: inner.state.name(),
                action,
            });
        }
        inner.state = next(&inner.state);
        add_breadcrumb("support", action, None);
        Ok(())
    }

    /// Pick a predefined question; title and description are pre-filled.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless selecting a question.
    pub fn select_predefined_question(&self, text: &str, category: &str) -> Result<()> {
        self.transition(
            "select a question",
            |s| matches!(s, WorkflowState::SelectingQuestion),
            |_| WorkflowState::filling(TicketForm::from_question(text, category)),
        )
    }

    /// Write a question from scratch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless selecting a question.
    pub fn select_custom_question(&self) -> Result<()> {
        self.transition(
            "ask a custom question",
            |s| matches!(s, WorkflowState::SelectingQuestion),
            |_| WorkflowState::filling(TicketForm::default()),
        )
    }

    /// Discard the form and go back to question selection.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless filling the form, or
    /// `SubmissionInFlight` while a submission is pending.
    pub fn back(&self) -> Result<()> {
        self.transition(
            "go back",
            |s| matches!(s, WorkflowState::FillingForm { .. }),
            |_| WorkflowState::SelectingQuestion,
        )
    }

    /// Start another request after a successful submission.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless submitted.
    pub fn restart(&self) -> Result<()> {
        self.transition(
            "restart",
            |s| matches!(s, WorkflowState::Submitted { .. }),
            |_| WorkflowState::SelectingQuestion,
        )
    }

    /// Submit the form.
    ///
    /// On success the workflow moves to `Submitted`. On any failure it stays
    /// in `FillingForm` with `form` kept, and with field errors when
    /// validation failed, ready for another attempt.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionInFlight` if another submit is pending,
    /// `InvalidTransition` unless filling the form, or whatever the ticket
    /// submission returns.
    #[instrument(skip_all)]
    pub async fn submit(
        &self,
        form: TicketForm,
        attachment: Option<&Attachment>,
    ) -> Result<SupportTicket> {
        let _busy = {
            let mut inner = self.lock();
            if inner.busy {
                return Err(PortalError::SubmissionInFlight);
            }
            if !matches!(inner.state, WorkflowState::FillingForm { .. }) {
                return Err(PortalError::InvalidTransition {
                    from: inner.state.name(),
                    action: "submit",
                });
            }
            inner.busy = true;
            inner.state = WorkflowState::filling(form.clone());
            BusyGuard { inner: &self.inner }
        };

        let result = self.tickets.submit(&form, attachment).await;

        let mut inner = self.lock();
        match &result {
            Ok(ticket) => {
                inner.state = WorkflowState::Submitted {
                    ticket: ticket.clone(),
                };
            }
            Err(PortalError::Validation(errors)) => {
                inner.state = WorkflowState::FillingForm {
                    form,
                    errors: errors.clone(),
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "Submission failed, form kept for retry");
            }
        }
        drop(inner);
        result
    }
}
