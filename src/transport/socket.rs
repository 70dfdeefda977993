//! Low-level socket creation.

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::warn;

use super::TransportConfig;
use crate::error::{Result, TransportError};

/// Socket configuration options.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub send_buffer_size: usize,
    pub recv_buffer_size: usize,
    pub reuse_addr: bool,
}

impl SocketConfig {
    /// Create from transport config.
    pub fn from_transport_config(config: &TransportConfig) -> Self {
        Self {
            send_buffer_size: config.send_buffer_size,
            recv_buffer_size: config.recv_buffer_size,
            reuse_addr: config.reuse_addr,
        }
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self::from_transport_config(&TransportConfig::default())
    }
}

/// Create a bound, non-blocking UDP socket.
pub fn create_udp_socket(addr: SocketAddr, config: &SocketConfig) -> Result<Socket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| TransportError::SocketError(e.to_string()))?;

    configure_socket(&socket, config)?;

    socket.bind(&addr.into()).map_err(|e| TransportError::BindFailed {
        addr,
        reason: e.to_string(),
    })?;

    socket
        .set_nonblocking(true)
        .map_err(|e| TransportError::SocketError(e.to_string()))?;

    Ok(socket)
}

/// Create a bound, listening, non-blocking TCP socket.
pub fn create_tcp_listener(addr: SocketAddr, config: &SocketConfig) -> Result<Socket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| TransportError::SocketError(e.to_string()))?;

    configure_socket(&socket, config)?;

    socket.bind(&addr.into()).map_err(|e| TransportError::BindFailed {
        addr,
        reason: e.to_string(),
    })?;

    socket.listen(1024).map_err(|e| TransportError::BindFailed {
        addr,
        reason: e.to_string(),
    })?;

    socket
        .set_nonblocking(true)
        .map_err(|e| TransportError::SocketError(e.to_string()))?;

    Ok(socket)
}

/// Apply common socket options. Buffer sizing is best-effort.
fn configure_socket(socket: &Socket, config: &SocketConfig) -> Result<()> {
    if config.reuse_addr {
        socket
            .set_reuse_address(true)
            .map_err(|e| TransportError::SocketError(e.to_string()))?;
    }

    if let Err(e) = socket.set_send_buffer_size(config.send_buffer_size) {
        warn!("Failed to set send buffer size: {}", e);
    }
    if let Err(e) = socket.set_recv_buffer_size(config.recv_buffer_size) {
        warn!("Failed to set recv buffer size: {}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_udp_socket() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let socket = create_udp_socket(addr, &SocketConfig::default()).unwrap();
        let local = socket.local_addr().unwrap().as_socket().unwrap();
        assert_ne!(local.port(), 0);
    }

    #[test]
    fn test_create_tcp_listener() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let socket = create_tcp_listener(addr, &SocketConfig::default()).unwrap();
        let local = socket.local_addr().unwrap().as_socket().unwrap();
        assert_ne!(local.port(), 0);
    }

    #[test]
    fn test_bind_conflict_reports_address() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let first = create_tcp_listener(addr, &SocketConfig::default()).unwrap();
        let bound = first.local_addr().unwrap().as_socket().unwrap();

        let config = SocketConfig {
            reuse_addr: false,
            ..SocketConfig::default()
        };
        let err = create_tcp_listener(bound, &config).unwrap_err();
        assert!(err.to_string().contains(&bound.port().to_string()));
    }
}
