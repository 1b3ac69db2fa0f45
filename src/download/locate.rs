//! Release URL and cache path resolution

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

use super::error::UnsupportedPlatformError;
use super::platform::PlatformDescriptor;
use crate::config::ReleaseConfig;

/// What the caller wants installed, and how long fetching it may take
#[derive(Debug, Clone)]
pub struct ArtifactRequest {
    pub platform: PlatformDescriptor,
    /// Pinned release version; `None` means the configured latest supported one
    pub version: Option<String>,
    pub cache_dir: PathBuf,
    pub total_timeout: Duration,
    pub max_attempt_latency: Duration,
}

impl ArtifactRequest {
    /// Request for `platform` using the cache dir and timeouts from `config`
    pub fn from_config(config: &ReleaseConfig, platform: PlatformDescriptor) -> Self {
        Self {
            platform,
            version: None,
            cache_dir: config.cache_dir(),
            total_timeout: config.total_timeout(),
            max_attempt_latency: config.max_attempt_latency(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }
}

/// An installed binary; its presence on disk is the only cache signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBinary {
    pub path: PathBuf,
}

/// Outcome of [`ArtifactLocator::locate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Cached(CachedBinary),
    NeedsDownload {
        url: String,
        version: String,
        /// Where the archive is staged; each acquisition uses a uniquely named sibling
        staging_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Resolves where a release archive lives and where its binary is cached
///
/// Never touches the network.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    release_base_url: String,
    org: String,
    project: String,
    asset_prefix: String,
    latest_version: String,
    supported: Vec<PlatformDescriptor>,
}

impl ArtifactLocator {
    pub fn new(config: &ReleaseConfig) -> Self {
        Self {
            release_base_url: config.release_base_url.trim_end_matches('/').to_string(),
            org: config.org.clone(),
            project: config.project.clone(),
            asset_prefix: config.asset_prefix.clone(),
            latest_version: config.latest_version.clone(),
            supported: config.supported.clone(),
        }
    }

    pub fn ensure_supported(
        &self,
        platform: &PlatformDescriptor,
    ) -> Result<(), UnsupportedPlatformError> {
        if self.supported.contains(platform) {
            Ok(())
        } else {
            Err(UnsupportedPlatformError {
                platform: platform.clone(),
            })
        }
    }

    /// `<cache_dir>/xray-<platform>[.exe]`
    pub fn final_path(&self, cache_dir: &Path, platform: &PlatformDescriptor) -> PathBuf {
        let mut name = format!("xray-{}", platform.slug());
        if platform.is_windows() {
            name.push_str(".exe");
        }
        cache_dir.join(name)
    }

    /// `<base>/<org>/<project>/releases/download/v<version>/<prefix>-<platform>.zip`
    pub fn archive_url(&self, version: &str, platform: &PlatformDescriptor) -> String {
        let version = version.strip_prefix('v').unwrap_or(version);
        format!(
            "{}/{}/{}/releases/download/v{}/{}-{}.zip",
            self.release_base_url,
            self.org,
            self.project,
            version,
            self.asset_prefix,
            platform.slug()
        )
    }

    pub fn locate(&self, request: &ArtifactRequest) -> Result<Located, UnsupportedPlatformError> {
        self.ensure_supported(&request.platform)?;

        let final_path = self.final_path(&request.cache_dir, &request.platform);
        if final_path.exists() {
            info!("Binary file already exists: {}", final_path.display());
            return Ok(Located::Cached(CachedBinary { path: final_path }));
        }

        let version = request
            .version
            .clone()
            .unwrap_or_else(|| self.latest_version.clone());
        let url = self.archive_url(&version, &request.platform);
        let staging_path = request
            .cache_dir
            .join(".staging")
            .join(format!("{}.zip", request.platform.slug()));

        debug!("{} needs download from {}", final_path.display(), url);
        Ok(Located::NeedsDownload {
            url,
            version,
            staging_path,
            final_path,
        })
    }
}
