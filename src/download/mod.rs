//! Xray release download and installation
//!
//! This module locates the platform-specific Xray release archive, downloads
//! it under a dual timeout and installs the executable into a cache directory.
//!
//! ## Module Organization
//!
//! - `platform` - platform descriptor and host detection
//! - `locate` - release URL and cache path resolution
//! - `github` - GitHub API interaction for release discovery
//! - `fetch` - bounded archive download
//! - `extract` - executable extraction and installation
//! - `core` - acquisition orchestration and state reporting

mod core;
mod error;
mod extract;
mod fetch;
mod github;
mod locate;
mod platform;

pub use self::core::{AcquisitionOutcome, AcquisitionState, Acquirer};
pub use error::{AcquisitionError, DownloadError, ExtractionError, UnsupportedPlatformError};
pub use extract::install_binary;
pub use fetch::fetch_archive;
pub use github::{GitHubAsset, GitHubRelease, ReleaseLookupError, get_latest_release};
pub use locate::{ArtifactLocator, ArtifactRequest, CachedBinary, Located};
pub use platform::PlatformDescriptor;
