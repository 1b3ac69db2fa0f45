//! Release archive download under a total budget and a per-attempt ceiling

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use log::{debug, info};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use super::error::DownloadError;

/// Download `url` to `staging_path`
///
/// `total_timeout` bounds the whole operation including redirects.
/// `max_attempt_latency` bounds each network step on its own: connecting,
/// waiting for response headers, and every single body read. The bytes are
/// written to a temporary file next to `staging_path` and renamed into place
/// only once complete, so a failed or cancelled download leaves nothing at
/// `staging_path`.
///
/// Returns the number of bytes written.
pub async fn fetch_archive(
    url: &str,
    staging_path: &Path,
    total_timeout: Duration,
    max_attempt_latency: Duration,
) -> Result<u64, DownloadError> {
    match timeout(
        total_timeout,
        fetch_with_attempt_ceiling(url, staging_path, max_attempt_latency),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(DownloadError::OverallTimeout {
            url: url.to_string(),
            budget: total_timeout,
        }),
    }
}

async fn fetch_with_attempt_ceiling(
    url: &str,
    staging_path: &Path,
    ceiling: Duration,
) -> Result<u64, DownloadError> {
    let too_slow = || DownloadError::AttemptTooSlow {
        url: url.to_string(),
        ceiling,
    };
    let transport = |e: reqwest::Error| {
        if e.is_timeout() {
            too_slow()
        } else {
            DownloadError::TransportFailure {
                url: url.to_string(),
                source: e,
            }
        }
    };
    let write_err = |e: std::io::Error| DownloadError::Io {
        path: staging_path.to_path_buf(),
        source: e,
    };

    let client = reqwest::Client::builder()
        .connect_timeout(ceiling)
        .user_agent(concat!("edgefeed/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(transport)?;

    info!("Downloading xray archive from {url}");
    let response = match timeout(ceiling, client.get(url).send()).await {
        Ok(sent) => sent.map_err(transport)?,
        Err(_) => return Err(too_slow()),
    };

    if !response.status().is_success() {
        return Err(DownloadError::BadStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let staging_dir = staging_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    tokio::fs::create_dir_all(staging_dir).await.map_err(write_err)?;

    // Removed on drop unless persisted, including when the outer timeout cancels us.
    let staged = NamedTempFile::new_in(staging_dir).map_err(write_err)?;
    let mut file = tokio::fs::File::from_std(staged.as_file().try_clone().map_err(write_err)?);

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    loop {
        let chunk = match timeout(ceiling, stream.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => return Err(transport(e)),
            Ok(None) => break,
            Err(_) => return Err(too_slow()),
        };
        file.write_all(&chunk).await.map_err(write_err)?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    staged.persist(staging_path).map_err(|e| write_err(e.error))?;
    debug!("Wrote {} bytes to {}", downloaded, staging_path.display());
    Ok(downloaded)
}
