//! Portal operations built on the collaborators and the resolved identity.
//!
//! # Services
//!
//! - `attachments` - Size check and upload of a single ticket attachment
//! - `tickets` - Ticket submission and listing
//! - `orders` - Order placement and listing
//! - `workflow` - The question, form, submitted state machine
//! - `profile` - Viewing and editing the customer's profile
//! - `questions` - Predefined question catalog and its management

pub mod attachments;
pub mod orders;
pub mod profile;
pub mod questions;
pub mod tickets;
pub mod workflow;

pub use attachments::{AttachmentUploader, DEFAULT_MAX_ATTACHMENT_BYTES, check_size};
pub use orders::OrderSubmission;
pub use profile::ProfileService;
pub use questions::QuestionService;
pub use tickets::TicketSubmission;
pub use workflow::{SupportWorkflow, WorkflowState};
