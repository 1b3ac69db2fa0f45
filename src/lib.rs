//! edgefeed: inputs for edge-endpoint probing
//!
//! This library supplies the two things an edge prober needs before it can start:
//! the set of addresses to test and a working Xray binary to test them with.
//!
//! ## Module Organization
//!
//! - `ranges` - CIDR ingestion (lookup service, URL, file) and address enumeration
//! - `download` - Xray release location, bounded download, extraction and caching
//! - `proxy` - proxy config templating and local port allocation used by probers
//! - `config` - explicit configuration passed into every component

pub mod config;
pub mod download;
pub mod proxy;
pub mod ranges;

pub use config::{FeedConfig, RangesConfig, ReleaseConfig};
pub use download::{
    AcquisitionError, AcquisitionOutcome, AcquisitionState, Acquirer, ArtifactLocator,
    ArtifactRequest, CachedBinary, DownloadError, ExtractionError, Located, PlatformDescriptor,
    UnsupportedPlatformError,
};
pub use ranges::{
    NetworkRange, RangeIngestionError, RangeParseError, RangeSource, RangeSourceDescriptor,
    count_addresses, extract_cidrs, to_address_list,
};
