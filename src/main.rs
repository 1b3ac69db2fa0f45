mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use edgefeed::download::{self, AcquisitionOutcome};
use edgefeed::proxy::{self, ProxyParams};
use edgefeed::ranges::{self, RangeSource, RangeSourceDescriptor};
use edgefeed::{Acquirer, ArtifactRequest, FeedConfig, PlatformDescriptor};

fn main() {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(real_main()) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn real_main() -> Result<()> {
    let args = cli::Args::parse();

    let cfg_path = match args.config {
        Some(path) => path,
        None => FeedConfig::default_path()?,
    };
    let cfg = FeedConfig::load_or_init(&cfg_path)?;
    info!("Using config from: {}", cfg_path.display());

    match args.sub {
        cli::Cmd::Ranges {
            source,
            asn,
            list,
            limit,
        } => run_ranges(&cfg, &source, asn, list, limit).await,
        cli::Cmd::Xray {
            platform,
            version,
            cache_dir,
            best_effort,
        } => run_xray(&cfg, platform, version, cache_dir, best_effort).await,
        cli::Cmd::Release => run_release(&cfg).await,
        cli::Cmd::ProxyConfig {
            template,
            edge_ip,
            remote_port,
            user_id,
            host,
            path,
            sni,
            out_dir,
        } => {
            let template = std::fs::read_to_string(&template)
                .with_context(|| format!("Failed to read template {}", template.display()))?;
            let params = ProxyParams {
                edge_ip,
                local_port: proxy::allocate_free_port()?,
                remote_port,
                user_id,
                sni: sni.unwrap_or_else(|| host.clone()),
                ws_header_host: host,
                ws_header_path: path,
            };
            let written = proxy::write_config(&template, &params, &out_dir)?;
            println!("{} (local port {})", written.display(), params.local_port);
            Ok(())
        }
    }
}

async fn run_ranges(
    cfg: &FeedConfig,
    sources: &[String],
    asns: Vec<String>,
    list: bool,
    limit: u64,
) -> Result<()> {
    let source = RangeSource::new(&cfg.ranges)?;
    let timeout = cfg.ranges.timeout();

    let mut descriptors = Vec::new();
    if !asns.is_empty() || sources.is_empty() {
        descriptors.push(RangeSourceDescriptor::LookupService { identifiers: asns });
    }
    for s in sources {
        descriptors.push(RangeSourceDescriptor::classify(s)?);
    }

    let mut cidrs = Vec::new();
    for descriptor in &descriptors {
        cidrs.extend(source.fetch(descriptor, timeout).await?);
    }

    if list {
        for cidr in &cidrs {
            for ip in ranges::to_address_list_bounded(cidr, u128::from(limit))? {
                println!("{ip}");
            }
        }
        return Ok(());
    }

    let mut total: u128 = 0;
    for cidr in &cidrs {
        let count = ranges::count_addresses(cidr)?;
        total = total.saturating_add(count);
        println!("{cidr}\t{count}");
    }
    println!("{} ranges, {} addresses", cidrs.len(), total);
    Ok(())
}

async fn run_xray(
    cfg: &FeedConfig,
    platform: cli::PlatformArgs,
    version: Option<String>,
    cache_dir: Option<std::path::PathBuf>,
    best_effort: bool,
) -> Result<()> {
    let platform = match (platform.os, platform.arch) {
        (Some(os), Some(arch)) => PlatformDescriptor::new(os, arch, platform.abi),
        _ => PlatformDescriptor::detect()?,
    };

    let mut request = ArtifactRequest::from_config(&cfg.release, platform);
    if let Some(version) = version {
        request = request.with_version(version);
    }
    if let Some(dir) = cache_dir {
        request = request.with_cache_dir(dir);
    }

    let acquirer = Acquirer::new(&cfg.release);
    if best_effort {
        match acquirer.acquire_best_effort(&request).await? {
            AcquisitionOutcome::Ready(path) => print_binary(&path),
            AcquisitionOutcome::Skipped(reason) => {
                warn!("Continuing without xray binary: {reason}");
            }
        }
    } else {
        let path = acquirer
            .acquire(&request)
            .await
            .context("Failed to acquire xray binary")?;
        print_binary(&path);
    }
    Ok(())
}

fn print_binary(path: &Path) {
    println!("{}", path.display());
}

async fn run_release(cfg: &FeedConfig) -> Result<()> {
    let release = download::get_latest_release(
        &cfg.release.api_base_url,
        &cfg.release.org,
        &cfg.release.project,
    )
    .await
    .context("Failed to get release info")?;

    println!("latest upstream:  {}", release.version());
    println!("configured:       {}", cfg.release.latest_version);
    for asset in release.assets.iter().filter(|a| a.name.ends_with(".zip")) {
        println!("  {}\t{} bytes", asset.name, asset.size);
    }
    Ok(())
}
