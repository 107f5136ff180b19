//! Core types for the support portal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod phone;
pub mod price;
pub mod status;

pub use id::*;
pub use phone::{PhoneError, PhoneNumber};
pub use price::{Price, ScooterModel};
pub use status::*;
