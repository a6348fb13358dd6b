//! Error handling foundation for the B2B storefront.
//!
//! Crates define their own error enums and surface them as
//! `Result<T, TheirError>`, which wraps the enum in a rootcause `Report`.

use rootcause::Report;
use std::fmt;

/// Result whose error is a rootcause `Report` over context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}
