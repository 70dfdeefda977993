//! TCP raw byte log sink.
//!
//! Accepts connections on the agent port and trace-logs whatever bytes
//! arrive. It never parses or validates the protocol; it exists purely as a
//! diagnostic sink alongside the UDP control plane.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace};

use super::{SocketConfig, TransportConfig};
use crate::error::{Result, TransportError};
use crate::protocol::hex_dump;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Listening TCP log sink.
pub struct TcpLogSink {
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
}

impl TcpLogSink {
    /// Bind the listener.
    ///
    /// Must be called within a tokio runtime.
    pub fn bind(addr: SocketAddr, config: &TransportConfig) -> Result<Self> {
        let socket_config = SocketConfig::from_transport_config(config);
        let std_socket = super::socket::create_tcp_listener(addr, &socket_config)?;

        let std_listener: std::net::TcpListener = std_socket.into();
        let listener = TcpListener::from_std(std_listener).map_err(|e| {
            TransportError::BindFailed {
                addr,
                reason: e.to_string(),
            }
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::SocketError(e.to_string()))?;

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            listener,
            local_addr,
            shutdown_tx,
        })
    }

    /// Get the bound local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get a handle that stops the accept loop when triggered.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the accept loop until shutdown. Each session is served on its own
    /// task.
    pub async fn run(self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let session_id = NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst);
                        info!("TCP[{}] Session started from {}", session_id, peer);
                        tokio::spawn(run_session(session_id, stream));
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                    }
                },
                _ = shutdown_rx.recv() => break,
            }
        }

        debug!("TCP log sink stopped");
    }
}

/// Read and log raw bytes until the peer disconnects.
async fn run_session(session_id: u64, mut stream: TcpStream) {
    let mut buf = vec![0u8; 4096];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                info!("TCP[{}] Session closed by peer", session_id);
                break;
            }
            Ok(len) => {
                trace!("TCP[{}] RX {} bytes: {}", session_id, len, hex_dump(&buf[..len]));
            }
            Err(e) => {
                info!("TCP[{}] {}", session_id, e);
                break;
            }
        }
    }
}
