//! Integration tests for the xray acquisition flow against a local release server

mod common;

use std::path::Path;
use std::time::Duration;

use common::{Route, StubServer, zip_bytes};
use edgefeed::config::ReleaseConfig;
use edgefeed::download::{
    AcquisitionError, AcquisitionOutcome, AcquisitionState, Acquirer, ArtifactRequest,
    DownloadError, ExtractionError, PlatformDescriptor, fetch_archive,
};
use tokio::sync::mpsc;

const LINUX_ARCHIVE: &str = "/XTLS/Xray-core/releases/download/v1.8.4/Xray-linux-64.zip";
const WINDOWS_ARCHIVE: &str = "/XTLS/Xray-core/releases/download/v1.8.4/Xray-windows-64.zip";

fn release_config(server: &StubServer) -> ReleaseConfig {
    ReleaseConfig {
        release_base_url: server.base_url().to_string(),
        api_base_url: server.base_url().to_string(),
        ..ReleaseConfig::default()
    }
}

fn request(cache_dir: &Path, platform: PlatformDescriptor) -> ArtifactRequest {
    ArtifactRequest {
        platform,
        version: None,
        cache_dir: cache_dir.to_path_buf(),
        total_timeout: Duration::from_secs(10),
        max_attempt_latency: Duration::from_secs(5),
    }
}

fn linux() -> PlatformDescriptor {
    PlatformDescriptor::new("linux", "64", "")
}

fn drain(rx: &mut mpsc::Receiver<AcquisitionState>) -> Vec<AcquisitionState> {
    let mut states = Vec::new();
    while let Ok(state) = rx.try_recv() {
        states.push(state);
    }
    states
}

fn leftover_files(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn second_acquisition_is_served_from_cache() {
    let archive = zip_bytes(&[("README.md", b"docs"), ("xray", b"\x7fELF xray")]);
    let server = StubServer::start(vec![(LINUX_ARCHIVE, Route::ok(archive))]).await;
    let cache = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::channel(32);
    let acquirer = Acquirer::new(&release_config(&server)).with_progress(tx);
    let req = request(cache.path(), linux());

    let first = acquirer.acquire(&req).await.unwrap();
    assert_eq!(first, cache.path().join("xray-linux-64"));
    assert_eq!(std::fs::read(&first).unwrap(), b"\x7fELF xray");
    assert_eq!(server.hits(), 1);
    assert_eq!(
        drain(&mut rx),
        vec![
            AcquisitionState::NotChecked,
            AcquisitionState::NeedsDownload,
            AcquisitionState::Downloading,
            AcquisitionState::Downloaded,
            AcquisitionState::Extracting,
            AcquisitionState::Installed,
        ]
    );

    let second = acquirer.acquire(&req).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(server.hits(), 1);
    assert_eq!(
        drain(&mut rx),
        vec![AcquisitionState::NotChecked, AcquisitionState::CacheHit]
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&first).unwrap().permissions().mode();
        assert_eq!(mode & 0o110, 0o110);
        assert_eq!(mode & 0o002, 0);
    }

    // staged archive is cleaned up once installed
    assert!(leftover_files(&cache.path().join(".staging")).is_empty());
}

#[tokio::test]
async fn windows_binary_gets_exe_suffix() {
    let archive = zip_bytes(&[("xray.exe", b"MZ")]);
    let server = StubServer::start(vec![(WINDOWS_ARCHIVE, Route::ok(archive))]).await;
    let cache = tempfile::tempdir().unwrap();
    let acquirer = Acquirer::new(&release_config(&server));

    let path = acquirer
        .acquire(&request(cache.path(), PlatformDescriptor::new("windows", "64", "")))
        .await
        .unwrap();
    assert_eq!(path, cache.path().join("xray-windows-64.exe"));
}

#[tokio::test]
async fn unsupported_platform_makes_no_request() {
    let server = StubServer::start(vec![]).await;
    let cache = tempfile::tempdir().unwrap();
    let acquirer = Acquirer::new(&release_config(&server));
    let req = request(cache.path(), PlatformDescriptor::new("haiku", "64", ""));

    let err = acquirer.acquire(&req).await.unwrap_err();
    assert!(matches!(err, AcquisitionError::UnsupportedPlatform(_)));

    // still fatal in best-effort mode
    assert!(acquirer.acquire_best_effort(&req).await.is_err());
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn missing_release_is_skipped_in_best_effort_mode() {
    let server = StubServer::start(vec![]).await;
    let cache = tempfile::tempdir().unwrap();
    let acquirer = Acquirer::new(&release_config(&server));

    let outcome = acquirer
        .acquire_best_effort(&request(cache.path(), linux()))
        .await
        .unwrap();
    match outcome {
        AcquisitionOutcome::Skipped(AcquisitionError::Download(DownloadError::BadStatus {
            status,
            ..
        })) => assert_eq!(status, 404),
        other => panic!("expected a skipped acquisition, got {other:?}"),
    }
    assert!(!cache.path().join("xray-linux-64").exists());
}

#[tokio::test]
async fn slow_attempt_is_distinguished_from_overall_timeout() {
    let archive = zip_bytes(&[("xray", b"bin")]);
    let server = StubServer::start(vec![(
        LINUX_ARCHIVE,
        Route::ok(archive).delayed(Duration::from_millis(1500)),
    )])
    .await;
    let cache = tempfile::tempdir().unwrap();
    let acquirer = Acquirer::new(&release_config(&server));

    let mut req = request(cache.path(), linux());
    req.max_attempt_latency = Duration::from_millis(200);
    req.total_timeout = Duration::from_secs(10);
    let err = acquirer.acquire(&req).await.unwrap_err();
    match err {
        AcquisitionError::Download(e @ DownloadError::AttemptTooSlow { .. }) => {
            assert!(e.is_retryable())
        }
        other => panic!("expected AttemptTooSlow, got {other:?}"),
    }

    let mut req = request(cache.path(), linux());
    req.max_attempt_latency = Duration::from_secs(10);
    req.total_timeout = Duration::from_millis(300);
    let err = acquirer.acquire(&req).await.unwrap_err();
    match err {
        AcquisitionError::Download(e @ DownloadError::OverallTimeout { .. }) => {
            assert!(!e.is_retryable())
        }
        other => panic!("expected OverallTimeout, got {other:?}"),
    }

    assert!(!cache.path().join("xray-linux-64").exists());
}

#[tokio::test]
async fn stalled_body_leaves_no_partial_file() {
    let archive = zip_bytes(&[("xray", b"bin")]);
    let server = StubServer::start(vec![(
        LINUX_ARCHIVE,
        Route::ok(archive).stalled_body(Duration::from_millis(1500)),
    )])
    .await;
    let staging_dir = tempfile::tempdir().unwrap();
    let staging_path = staging_dir.path().join("linux-64.zip");

    let err = fetch_archive(
        &server.url(LINUX_ARCHIVE),
        &staging_path,
        Duration::from_secs(10),
        Duration::from_millis(200),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DownloadError::AttemptTooSlow { .. }));
    assert!(leftover_files(staging_dir.path()).is_empty());
}

#[tokio::test]
async fn fetch_writes_the_staging_file() {
    let archive = zip_bytes(&[("xray", b"bin")]);
    let len = archive.len() as u64;
    let server = StubServer::start(vec![(LINUX_ARCHIVE, Route::ok(archive.clone()))]).await;
    let staging_dir = tempfile::tempdir().unwrap();
    let staging_path = staging_dir.path().join("nested").join("linux-64.zip");

    let written = fetch_archive(
        &server.url(LINUX_ARCHIVE),
        &staging_path,
        Duration::from_secs(10),
        Duration::from_secs(5),
    )
    .await
    .unwrap();

    assert_eq!(written, len);
    assert_eq!(std::fs::read(&staging_path).unwrap(), archive);
}

#[tokio::test]
async fn archive_without_binary_is_an_extraction_error() {
    let archive = zip_bytes(&[("LICENSE", b"MPL-2.0")]);
    let server = StubServer::start(vec![(LINUX_ARCHIVE, Route::ok(archive))]).await;
    let cache = tempfile::tempdir().unwrap();
    let acquirer = Acquirer::new(&release_config(&server));
    let (tx, mut rx) = mpsc::channel(32);
    let acquirer = acquirer.with_progress(tx);

    let err = acquirer.acquire(&request(cache.path(), linux())).await.unwrap_err();
    assert!(matches!(
        err,
        AcquisitionError::Extraction(ExtractionError::MissingEntry { .. })
    ));
    assert!(matches!(
        drain(&mut rx).last(),
        Some(AcquisitionState::Failed(_))
    ));
    assert!(leftover_files(&cache.path().join(".staging")).is_empty());
    assert!(leftover_files(cache.path()).iter().all(|f| f == ".staging"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acquisitions_share_one_cache() {
    let archive = zip_bytes(&[("xray", b"\x7fELF concurrent")]);
    let server = StubServer::start(vec![(LINUX_ARCHIVE, Route::ok(archive))]).await;
    let cfg = release_config(&server);
    let cache = tempfile::tempdir().unwrap();

    let tasks: Vec<_> = (0..12)
        .map(|_| {
            let cfg = cfg.clone();
            let request = request(cache.path(), linux());
            tokio::spawn(async move { Acquirer::new(&cfg).acquire(&request).await })
        })
        .collect();

    let expected = cache.path().join("xray-linux-64");
    for task in tasks {
        let path = task.await.unwrap().unwrap();
        assert_eq!(path, expected);
    }
    assert_eq!(std::fs::read(&expected).unwrap(), b"\x7fELF concurrent");
    assert!(leftover_files(&cache.path().join(".staging")).is_empty());
}

#[tokio::test]
async fn pinned_version_changes_the_url() {
    let archive = zip_bytes(&[("xray", b"old")]);
    let server = StubServer::start(vec![(
        "/XTLS/Xray-core/releases/download/v1.7.5/Xray-linux-64.zip",
        Route::ok(archive),
    )])
    .await;
    let cache = tempfile::tempdir().unwrap();
    let acquirer = Acquirer::new(&release_config(&server));

    let path = acquirer
        .acquire(&request(cache.path(), linux()).with_version("1.7.5"))
        .await
        .unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"old");
}
