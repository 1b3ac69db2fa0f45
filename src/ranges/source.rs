//! Where CIDR text comes from: lookup service, arbitrary URL, or local file

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info};
use reqwest::StatusCode;
use url::Url;

use super::error::RangeIngestionError;
use super::extract::extract_cidrs;
use crate::config::RangesConfig;

/// One way of obtaining raw CIDR strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSourceDescriptor {
    /// ASN identifiers resolved through the lookup service, in order
    LookupService { identifiers: Vec<String> },
    RemoteUrl { url: String },
    LocalFile { path: PathBuf },
}

impl RangeSourceDescriptor {
    /// Decide whether `path_or_url` is a URL or a local file
    ///
    /// URL syntax is checked first, so a URL is never read from disk even if
    /// a file of the same name exists.
    pub fn classify(path_or_url: &str) -> Result<Self, RangeIngestionError> {
        if is_url(path_or_url) {
            Ok(Self::RemoteUrl {
                url: path_or_url.to_string(),
            })
        } else if Path::new(path_or_url).is_file() {
            Ok(Self::LocalFile {
                path: PathBuf::from(path_or_url),
            })
        } else {
            error!("{path_or_url} is neither a valid URL nor a file path");
            Err(RangeIngestionError::new(
                path_or_url,
                "neither a valid URL nor a file path",
            ))
        }
    }
}

// `C:\ranges.txt` parses with scheme `c` but has no authority or base path.
fn is_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| !url.cannot_be_a_base())
        .unwrap_or(false)
}

/// Fetches raw CIDR strings from the configured lookup service, URLs and files
pub struct RangeSource {
    client: reqwest::Client,
    lookup_base_url: String,
    default_asns: Vec<String>,
}

impl RangeSource {
    pub fn new(config: &RangesConfig) -> Result<Self, RangeIngestionError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("edgefeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RangeIngestionError::new("http client", e.to_string()))?;

        Ok(Self {
            client,
            lookup_base_url: config.lookup_base_url.trim_end_matches('/').to_string(),
            default_asns: config.default_asns.clone(),
        })
    }

    /// `<lookup base>/asn/<ASN>/`
    pub fn lookup_url(&self, identifier: &str) -> String {
        format!("{}/asn/{}/", self.lookup_base_url, identifier)
    }

    /// Obtain CIDRs from whichever source `descriptor` names
    pub async fn fetch(
        &self,
        descriptor: &RangeSourceDescriptor,
        timeout: Duration,
    ) -> Result<Vec<String>, RangeIngestionError> {
        match descriptor {
            RangeSourceDescriptor::LookupService { identifiers } => {
                self.from_lookup_service(identifiers, timeout).await
            }
            RangeSourceDescriptor::RemoteUrl { url } => self.from_url(url, timeout).await,
            RangeSourceDescriptor::LocalFile { path } => Self::from_file(path),
        }
    }

    /// Scrape the lookup service page of every identifier and concatenate the results
    ///
    /// An empty `identifiers` slice uses the configured default ASNs. The first
    /// failing identifier aborts the whole call; no partial list is returned.
    pub async fn from_lookup_service(
        &self,
        identifiers: &[String],
        timeout: Duration,
    ) -> Result<Vec<String>, RangeIngestionError> {
        let identifiers = if identifiers.is_empty() {
            &self.default_asns
        } else {
            identifiers
        };

        let mut cidrs = Vec::new();
        for asn in identifiers {
            let found = self.from_url(&self.lookup_url(asn), timeout).await?;
            debug!("{} ranges announced by {}", found.len(), asn);
            cidrs.extend(found);
        }
        Ok(cidrs)
    }

    /// GET `url` and extract every CIDR-looking substring of the body
    ///
    /// Zero matches is a valid, empty result.
    pub async fn from_url(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, RangeIngestionError> {
        let fail = |cause: String| {
            error!("Could not read cidrs from url {url}: {cause}");
            RangeIngestionError::new(url, cause)
        };
        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                format!("timed out after {}s", timeout.as_secs_f64())
            } else {
                e.to_string()
            }
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| fail(transport(e)))?;

        if response.status() != StatusCode::OK {
            return Err(fail(format!("status code: {}", response.status().as_u16())));
        }

        let body = response.text().await.map_err(|e| fail(transport(e)))?;
        let cidrs = extract_cidrs(&body);
        info!("Read {} cidrs from {}", cidrs.len(), url);
        Ok(cidrs)
    }

    /// Read one CIDR token per line, without any shape check
    ///
    /// Trailing blank lines are dropped; a file with no lines left is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Vec<String>, RangeIngestionError> {
        let path = path.as_ref();
        let origin = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|e| {
            error!("Could not read cidrs from file {origin}: {e}");
            RangeIngestionError::new(&origin, e.to_string())
        })?;

        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        if lines.is_empty() {
            return Err(RangeIngestionError::new(origin, "file contains no cidrs"));
        }
        Ok(lines)
    }

    /// Read CIDRs from `path_or_url`, a URL or an existing file
    pub async fn resolve(
        &self,
        path_or_url: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, RangeIngestionError> {
        let descriptor = RangeSourceDescriptor::classify(path_or_url)?;
        self.fetch(&descriptor, timeout).await
    }
}
