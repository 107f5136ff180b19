//! MS-Scooter Support Core - Shared domain types.
//!
//! This crate provides the types shared by every support portal component:
//! - `portal` - Identity resolution, support workflow and submissions
//! - `cli` - Command-line front end and database migrations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no
//! network clients. Postgres encoding is opt-in via the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, phone numbers, prices, statuses and the scooter catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
