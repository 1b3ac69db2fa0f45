use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::download::PlatformDescriptor;

/// Top‑level configuration, handed to each component at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub ranges: RangesConfig,
    #[serde(default)]
    pub release: ReleaseConfig,
}

/// Where CIDR ranges come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangesConfig {
    /// Lookup service base, `<base>/asn/<ASN>/` is appended per identifier
    pub lookup_base_url: String,
    /// ASNs used when the caller does not name any
    pub default_asns: Vec<String>,
    pub timeout_secs: u64,
}

/// Where the Xray release comes from and how long fetching it may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    pub release_base_url: String,
    pub api_base_url: String,
    pub org: String,
    pub project: String,
    /// Archive name prefix, e.g. `Xray` in `Xray-linux-64.zip`
    pub asset_prefix: String,
    /// Version used when a request does not pin one
    pub latest_version: String,
    pub supported: Vec<PlatformDescriptor>,
    pub cache_dir: Option<String>,
    pub total_timeout_secs: u64,
    pub max_attempt_latency_secs: u64,
}

impl Default for RangesConfig {
    fn default() -> Self {
        Self {
            lookup_base_url: "https://asnlookup.com".into(),
            default_asns: vec!["AS13335".into(), "AS209242".into()],
            timeout_secs: 10,
        }
    }
}

impl RangesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ReleaseConfig {
    fn default_supported() -> Vec<PlatformDescriptor> {
        [
            ("linux", "64", ""),
            ("linux", "32", ""),
            ("linux", "arm64", "v8a"),
            ("linux", "arm32", "v7a"),
            ("linux", "arm32", "v6"),
            ("macos", "64", ""),
            ("macos", "arm64", "v8a"),
            ("windows", "64", ""),
            ("windows", "32", ""),
            ("windows", "arm64", "v8a"),
            ("freebsd", "64", ""),
            ("android", "arm64", "v8a"),
        ]
        .into_iter()
        .map(|(os, arch, abi)| PlatformDescriptor::new(os, arch, abi))
        .collect()
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }

    pub fn max_attempt_latency(&self) -> Duration {
        Duration::from_secs(self.max_attempt_latency_secs)
    }

    /// Cache directory for installed binaries
    ///
    /// Falls back to the user cache dir, then to `./bin` when no home is known.
    pub fn cache_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .map(|d| d.join("edgefeed").join("bin"))
                .unwrap_or_else(|| PathBuf::from("bin")),
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            release_base_url: "https://github.com".into(),
            api_base_url: "https://api.github.com".into(),
            org: "XTLS".into(),
            project: "Xray-core".into(),
            asset_prefix: "Xray".into(),
            latest_version: "1.8.4".into(),
            supported: ReleaseConfig::default_supported(),
            cache_dir: None,
            total_timeout_secs: 300,
            max_attempt_latency_secs: 20,
        }
    }
}

impl FeedConfig {
    /// Default on-disk location: `<config_dir>/edgefeed/edgefeed.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dir.join("edgefeed").join("edgefeed.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load the config at `path`, writing the defaults there first if it does not exist
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("Config not found at {}, creating default configuration", path.display());
            Self::default().save(path)?;
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let body = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, body)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }
}
