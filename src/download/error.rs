//! Error types for locating, downloading and installing the Xray binary

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::platform::PlatformDescriptor;

/// Platform is not in the configured supported set
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("System {platform} not supported")]
pub struct UnsupportedPlatformError {
    pub platform: PlatformDescriptor,
}

/// Bounded archive download failed
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The whole operation ran past its total budget
    #[error("Download of {url} exceeded the overall timeout of {}s", .budget.as_secs_f64())]
    OverallTimeout { url: String, budget: Duration },

    /// A single network attempt (connect, headers, or one body read) was too slow
    #[error("Download of {url} stalled longer than {}s in a single attempt", .ceiling.as_secs_f64())]
    AttemptTooSlow { url: String, ceiling: Duration },

    #[error("Download of {url} failed: {source}")]
    TransportFailure {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for URL: {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Failed to write archive to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Whether retrying the same download may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DownloadError::AttemptTooSlow { .. } | DownloadError::TransportFailure { .. }
        )
    }
}

/// Binary could not be taken out of the downloaded archive
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Archive {} is unreadable or corrupt: {reason}", .archive.display())]
    CorruptArchive { archive: PathBuf, reason: String },

    #[error("Archive {} has no entry named {entry}", .archive.display())]
    MissingEntry { archive: PathBuf, entry: String },

    /// Reading the archive or writing the installed binary failed
    #[error("I/O error on {} while installing binary: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any failure of the combined locate, download and install flow
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatformError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
