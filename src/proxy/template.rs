//! Proxy (xray/v2ray) config generation from a placeholder template

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Values substituted into a proxy config template
#[derive(Debug, Clone)]
pub struct ProxyParams {
    /// Edge address under test, replaces `IP.IP.IP.IP`
    pub edge_ip: String,
    /// Local inbound port, replaces `PORTPORT`
    pub local_port: u16,
    /// Remote port on the edge, replaces `CFPORTCFPORT`
    pub remote_port: u16,
    /// Client id, replaces `IDID`
    pub user_id: String,
    /// Websocket `Host` header, replaces `HOSTHOST`
    pub ws_header_host: String,
    /// Websocket path, replaces `ENDPOINTENDPOINT`
    pub ws_header_path: String,
    /// TLS server name, replaces `RANDOMHOST`
    pub sni: String,
}

/// Fill every placeholder of `template`
pub fn render_config(template: &str, params: &ProxyParams) -> String {
    template
        .replace("PORTPORT", &params.local_port.to_string())
        .replace("IP.IP.IP.IP", &params.edge_ip)
        .replace("CFPORTCFPORT", &params.remote_port.to_string())
        .replace("IDID", &params.user_id)
        .replace("HOSTHOST", &params.ws_header_host)
        .replace("ENDPOINTENDPOINT", &params.ws_header_path)
        .replace("RANDOMHOST", &params.sni)
}

/// Render `template` and write it to `<config_dir>/config-<edge_ip>.json`
pub fn write_config(template: &str, params: &ProxyParams, config_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create config dir {}", config_dir.display()))?;

    // IPv6 colons are not valid in Windows file names
    let file_name = format!("config-{}.json", params.edge_ip.replace(':', "_"));
    let config_path = config_dir.join(file_name);
    fs::write(&config_path, render_config(template, params))
        .with_context(|| format!("Failed to write proxy config {}", config_path.display()))?;

    Ok(config_path)
}
