//! GitHub release API interaction

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// GitHub release metadata from API
#[derive(Deserialize, Debug)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

/// GitHub release asset metadata
#[derive(Deserialize, Debug)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
}

impl GitHubRelease {
    /// Tag without its `v` prefix
    pub fn version(&self) -> &str {
        self.tag_name.strip_prefix('v').unwrap_or(&self.tag_name)
    }
}

#[derive(Debug, Error)]
pub enum ReleaseLookupError {
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error for {repo}: HTTP {status}")]
    BadStatus { repo: String, status: u16 },
}

/// Fetch the latest release of `<org>/<project>`
pub async fn get_latest_release(
    api_base_url: &str,
    org: &str,
    project: &str,
) -> Result<GitHubRelease, ReleaseLookupError> {
    let url = format!(
        "{}/repos/{}/{}/releases/latest",
        api_base_url.trim_end_matches('/'),
        org,
        project
    );

    let client = reqwest::Client::builder()
        .user_agent(concat!("edgefeed/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = client.get(&url).send().await?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(ReleaseLookupError::BadStatus {
            repo: format!("{org}/{project}"),
            status: response.status().as_u16(),
        });
    }

    let release: GitHubRelease = response.json().await?;
    Ok(release)
}
