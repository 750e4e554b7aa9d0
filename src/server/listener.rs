use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{AddressFamily, ServerConfig};

/// Loopback unless internet access is allowed, in which case every interface.
pub fn bind_address(family: AddressFamily, internet: bool, port: u16) -> SocketAddr {
    let ip = match (family, internet) {
        (AddressFamily::Inet, false) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        (AddressFamily::Inet, true) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        (AddressFamily::Inet6, false) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        (AddressFamily::Inet6, true) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    SocketAddr::new(ip, port)
}

pub async fn bind(cfg: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr = bind_address(cfg.family, cfg.internet, cfg.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to open server on {}", addr))?;

    info!(address = %listener.local_addr()?, "Listening");
    Ok(listener)
}
