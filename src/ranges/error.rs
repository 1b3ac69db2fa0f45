//! Errors raised while obtaining and interpreting CIDR text

use thiserror::Error;

/// Raw CIDR text could not be obtained from a source
///
/// `origin` is the URL, file path or lookup identifier that failed.
#[derive(Debug, Error)]
#[error("Could not read cidrs from {origin}: {cause}")]
pub struct RangeIngestionError {
    pub origin: String,
    pub cause: String,
}

impl RangeIngestionError {
    pub fn new(origin: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            cause: cause.into(),
        }
    }
}

/// Text is not a usable address or CIDR
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeParseError {
    /// Neither an address nor `address/prefix`
    #[error("Not an address or CIDR: {input}")]
    InvalidAddress { input: String },

    /// Prefix length is not a number or is too long for the family
    #[error("Invalid prefix length in {input}: {prefix}")]
    InvalidPrefix { input: String, prefix: String },

    /// Materializing the range would exceed the caller's cap
    #[error("{input} holds {count} addresses, more than the limit of {limit}")]
    TooLarge { input: String, count: u128, limit: u128 },
}
