//! CIDR ingestion and address enumeration
//!
//! ## Module Organization
//!
//! - `extract` - pattern scan of free text for IPv4 CIDR strings
//! - `source` - lookup service / URL / file sources and their classification
//! - `enumerate` - address counting and listing for both families
//! - `error` - ingestion and parse errors

mod enumerate;
mod error;
mod extract;
mod source;

pub use enumerate::{
    AddressFamily, NetworkRange, count_addresses, to_address_list, to_address_list_bounded,
};
pub use error::{RangeIngestionError, RangeParseError};
pub use extract::extract_cidrs;
pub use source::{RangeSource, RangeSourceDescriptor};
