use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Address ranges and xray binaries for edge probing")]
pub struct Args {
    /// Path to configuration file (default: <config dir>/edgefeed/edgefeed.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub sub: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Resolve CIDR sources and print ranges with address counts
    Ranges {
        /// URL or file to read CIDRs from (repeatable)
        #[arg(long, short = 's')]
        source: Vec<String>,

        /// ASN to look up (repeatable); configured defaults when neither this nor --source is given
        #[arg(long)]
        asn: Vec<String>,

        /// Print every address instead of per-range counts
        #[arg(long)]
        list: bool,

        /// Refuse to list a single range holding more addresses than this
        #[arg(long, default_value_t = 1 << 20)]
        limit: u64,
    },
    /// Ensure the xray binary is cached and print its path
    Xray {
        #[command(flatten)]
        platform: PlatformArgs,

        /// Release version (default: configured latest supported version)
        #[arg(long)]
        version: Option<String>,

        /// Cache directory for installed binaries
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Report a failed download instead of exiting with an error
        #[arg(long)]
        best_effort: bool,
    },
    /// Show the latest upstream release next to the configured version
    Release,
    /// Render a proxy config for one edge address on a free local port
    ProxyConfig {
        /// Template containing the PORTPORT, IP.IP.IP.IP, ... placeholders
        #[arg(long)]
        template: PathBuf,

        #[arg(long)]
        edge_ip: String,

        #[arg(long, default_value_t = 443)]
        remote_port: u16,

        #[arg(long)]
        user_id: String,

        #[arg(long)]
        host: String,

        #[arg(long, default_value = "/")]
        path: String,

        /// TLS server name (default: same as --host)
        #[arg(long)]
        sni: Option<String>,

        /// Directory the config file is written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

/// Target platform; all three default to the running host
#[derive(ClapArgs, Debug)]
pub struct PlatformArgs {
    #[arg(long, requires = "arch")]
    pub os: Option<String>,

    #[arg(long, requires = "os")]
    pub arch: Option<String>,

    #[arg(long, default_value = "")]
    pub abi: String,
}
