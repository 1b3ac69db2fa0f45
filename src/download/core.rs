//! Acquisition flow: cache check, bounded download, extraction

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use tempfile::{NamedTempFile, TempPath};
use tokio::sync::mpsc;

use super::error::{AcquisitionError, DownloadError, UnsupportedPlatformError};
use super::extract::install_binary;
use super::fetch::fetch_archive;
use super::locate::{ArtifactLocator, ArtifactRequest, Located};
use crate::config::ReleaseConfig;

/// Where an acquisition currently stands
///
/// `NotChecked → (CacheHit | NeedsDownload → Downloading → Downloaded →
/// Extracting → Installed)`, with `Failed` reachable from any step. Nothing
/// is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionState {
    NotChecked,
    CacheHit,
    NeedsDownload,
    Downloading,
    Downloaded,
    Extracting,
    Installed,
    Failed(String),
}

/// Result of a best-effort acquisition
#[derive(Debug)]
pub enum AcquisitionOutcome {
    /// Binary is available at this path
    Ready(PathBuf),
    /// Download or extraction failed; the caller may carry on without a binary
    Skipped(AcquisitionError),
}

/// Runs the locate → fetch → install flow for one request at a time
pub struct Acquirer {
    locator: ArtifactLocator,
    progress_tx: Option<mpsc::Sender<AcquisitionState>>,
    progress_disabled: AtomicBool,
}

impl Acquirer {
    pub fn new(config: &ReleaseConfig) -> Self {
        Self {
            locator: ArtifactLocator::new(config),
            progress_tx: None,
            progress_disabled: AtomicBool::new(false),
        }
    }

    /// Report every state transition on `tx` (best effort, never blocks)
    pub fn with_progress(mut self, tx: mpsc::Sender<AcquisitionState>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    fn report(&self, state: AcquisitionState) {
        let Some(tx) = &self.progress_tx else {
            return;
        };
        if self.progress_disabled.load(Ordering::Relaxed) {
            return;
        }
        if let Err(e) = tx.try_send(state)
            && matches!(e, mpsc::error::TrySendError::Closed(_))
        {
            warn!("Progress channel closed, continuing acquisition without updates");
            self.progress_disabled.store(true, Ordering::Relaxed);
        }
    }

    /// Make sure the requested binary is installed and return its path
    ///
    /// A binary already present in the cache is returned without any network
    /// access, whatever version it is.
    pub async fn acquire(&self, request: &ArtifactRequest) -> Result<PathBuf, AcquisitionError> {
        self.report(AcquisitionState::NotChecked);
        let result = self.run(request).await;
        if let Err(e) = &result {
            self.report(AcquisitionState::Failed(e.to_string()));
        }
        result
    }

    async fn run(&self, request: &ArtifactRequest) -> Result<PathBuf, AcquisitionError> {
        let (url, version, staging_path, final_path) = match self.locator.locate(request)? {
            Located::Cached(binary) => {
                self.report(AcquisitionState::CacheHit);
                return Ok(binary.path);
            }
            Located::NeedsDownload {
                url,
                version,
                staging_path,
                final_path,
            } => (url, version, staging_path, final_path),
        };
        self.report(AcquisitionState::NeedsDownload);

        info!("Downloading xray {} for {}...", version, request.platform);
        self.report(AcquisitionState::Downloading);
        let staged = reserve_staging(&staging_path).await?;
        let bytes = fetch_archive(
            &url,
            &staged,
            request.total_timeout,
            request.max_attempt_latency,
        )
        .await?;
        info!("Downloaded xray archive ({} bytes)", bytes);
        self.report(AcquisitionState::Downloaded);

        self.report(AcquisitionState::Extracting);
        let archive = staged.to_path_buf();
        let platform = request.platform.clone();
        let installed =
            tokio::task::spawn_blocking(move || install_binary(&archive, &platform, &final_path))
                .await??;

        self.report(AcquisitionState::Installed);
        Ok(installed)
    }

    /// Like [`Acquirer::acquire`], but download and extraction failures are
    /// returned as [`AcquisitionOutcome::Skipped`] instead of an error
    ///
    /// An unsupported platform is still an error: there is nothing to retry.
    pub async fn acquire_best_effort(
        &self,
        request: &ArtifactRequest,
    ) -> Result<AcquisitionOutcome, UnsupportedPlatformError> {
        match self.acquire(request).await {
            Ok(path) => Ok(AcquisitionOutcome::Ready(path)),
            Err(AcquisitionError::UnsupportedPlatform(e)) => Err(e),
            Err(e) => {
                error!("Failed to acquire xray for {}: {}", request.platform, e);
                Ok(AcquisitionOutcome::Skipped(e))
            }
        }
    }
}

/// Reserve an archive file next to `staging_path` that belongs to this acquisition only
///
/// Concurrent acquisitions of the same platform each get their own file. It is
/// removed when the returned path is dropped, whether the install succeeded,
/// failed, or the future was cancelled.
async fn reserve_staging(staging_path: &Path) -> Result<TempPath, DownloadError> {
    let io_err = |e: std::io::Error| DownloadError::Io {
        path: staging_path.to_path_buf(),
        source: e,
    };

    let staging_dir = staging_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    tokio::fs::create_dir_all(staging_dir).await.map_err(io_err)?;

    let prefix = staging_path
        .file_stem()
        .map(|stem| format!("{}.", stem.to_string_lossy()))
        .unwrap_or_default();
    let staged = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".zip")
        .tempfile_in(staging_dir)
        .map(NamedTempFile::into_temp_path)
        .map_err(io_err)?;
    debug!("Staging archive at {}", staged.display());
    Ok(staged)
}
