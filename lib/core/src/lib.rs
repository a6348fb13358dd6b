//! Core types shared across the B2B storefront crates.
//!
//! This crate provides the identifier newtypes for records owned by the
//! external commerce backend, plus the `Result` alias used at async seams.

pub mod error;
pub mod id;

pub use error::{ParseIdError, Result};
pub use id::{CompanyId, CustomerGroupId, CustomerId};
