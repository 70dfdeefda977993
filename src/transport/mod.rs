//! Transport layer for Bkknet.
//!
//! The UDP endpoint owns the protocol socket: an asynchronous receive loop
//! feeding the parser stage, and an ordered send queue that serializes every
//! outbound datagram. The TCP listener is a raw byte log sink with no
//! protocol semantics.

mod socket;
mod tcp;
mod udp;

pub use socket::{create_tcp_listener, create_udp_socket, SocketConfig};
pub use tcp::TcpLogSink;
pub use udp::UdpEndpoint;

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Default maximum size of one datagram (receive buffer and send limit).
pub const MAX_DATAGRAM_SIZE: usize = 4096;

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Maximum datagram size; larger send requests are rejected.
    #[serde(default = "default_max_datagram")]
    pub max_datagram_size: usize,

    /// Send buffer size in bytes.
    #[serde(default = "default_send_buffer")]
    pub send_buffer_size: usize,

    /// Receive buffer size in bytes.
    #[serde(default = "default_recv_buffer")]
    pub recv_buffer_size: usize,

    /// Enable SO_REUSEADDR.
    #[serde(default = "default_reuse_addr")]
    pub reuse_addr: bool,
}

fn default_max_datagram() -> usize {
    MAX_DATAGRAM_SIZE
}
fn default_send_buffer() -> usize {
    256 * 1024
}
fn default_recv_buffer() -> usize {
    256 * 1024
}
fn default_reuse_addr() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_datagram_size: default_max_datagram(),
            send_buffer_size: default_send_buffer(),
            recv_buffer_size: default_recv_buffer(),
            reuse_addr: default_reuse_addr(),
        }
    }
}

/// One received datagram together with its sender.
///
/// Created per inbound datagram and destroyed after one full pipeline pass;
/// there is no session object for UDP.
#[derive(Debug, Clone)]
pub struct Datagram {
    /// Exactly the received bytes, never the full receive buffer.
    pub data: Vec<u8>,
    /// Sender endpoint; the correlation key for "who do I answer".
    pub peer: SocketAddr,
}

/// One pending outbound datagram, owned by the send queue while enqueued.
#[derive(Debug)]
pub struct SendRequest {
    /// Encoded frame bytes.
    pub data: Vec<u8>,
    /// Destination endpoint.
    pub dest: SocketAddr,
}
