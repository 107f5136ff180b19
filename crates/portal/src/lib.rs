//! MS-Scooter Support Portal library.
//!
//! Reconciles phone-number logins with backend-issued anonymous sessions and
//! drives the support submission workflow on top of that identity.
//!
//! # Layers
//!
//! - [`backend`] - Collaborator traits (auth, profile, ticket, order, blob, question stores)
//! - [`storage`] - Tab- and device-scoped key/value storage
//! - [`identity`] - Identity context, resolver and the simulated OTP login flow
//! - [`services`] - Attachment upload, ticket/order submission, workflow, profile, questions
//! - [`db`] / [`blob`] - `PostgreSQL` and filesystem implementations of the collaborators
//! - [`memory`] - In-memory collaborators for tests

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod memory;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod telemetry;

pub use error::{PortalError, Result, ValidationErrors};
