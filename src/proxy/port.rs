use std::net::{Ipv4Addr, TcpListener};

use anyhow::{Context, Result};

/// Ask the OS for a currently unused local TCP port
///
/// The port is released before returning, so another process may still take it.
pub fn allocate_free_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .context("Failed to bind an ephemeral local port")?;
    let port = listener
        .local_addr()
        .context("Failed to read the bound local address")?
        .port();
    Ok(port)
}
