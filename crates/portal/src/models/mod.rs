//! Domain models for the support portal.
//!
//! Row types returned by the collaborator stores, the form types the front
//! end fills in, and the validated/insertable types in between.

pub mod attachment;
pub mod order;
pub mod profile;
pub mod question;
pub mod ticket;

pub use attachment::Attachment;
pub use order::{NewOrder, Order, OrderForm, ValidOrder};
pub use profile::{CustomerIdentity, NewProfile, ProfileUpdate};
pub use question::{Question, QuestionCategory, QuestionInput};
pub use ticket::{NewTicket, SupportTicket, TicketForm, ValidTicket};
