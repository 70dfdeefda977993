//! UDP endpoint: receive loop and ordered send queue.
//!
//! The endpoint exclusively owns the protocol socket. Receiving re-arms
//! immediately after handing each datagram to the parser stage, so parsing
//! never blocks the next receive. Sending is serialized through a FIFO
//! queue drained by a single task: exactly one send is in flight at a time,
//! and responses leave the socket in the order their send requests were
//! accepted, even when requests originate from concurrently-executing
//! dispatch operations.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::UdpSocket as TokioUdpSocket;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, trace, warn};

use super::{Datagram, SendRequest, SocketConfig, TransportConfig};
use crate::error::{Result, TransportError};
use crate::protocol::hex_dump;

/// UDP transport endpoint.
pub struct UdpEndpoint {
    socket: Arc<TokioUdpSocket>,
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    receiving: AtomicBool,
    max_datagram_size: usize,
    send_tx: mpsc::UnboundedSender<SendRequest>,
    shutdown_tx: broadcast::Sender<()>,
}

impl UdpEndpoint {
    /// Bind to a local address and start the send queue drain task.
    ///
    /// Must be called within a tokio runtime.
    pub fn bind(addr: SocketAddr, config: &TransportConfig) -> Result<Self> {
        let socket_config = SocketConfig::from_transport_config(config);
        let std_socket = super::socket::create_udp_socket(addr, &socket_config)?;

        let socket = TokioUdpSocket::from_std(std_socket.into()).map_err(|e| {
            TransportError::BindFailed {
                addr,
                reason: e.to_string(),
            }
        })?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| TransportError::SocketError(e.to_string()))?;

        let socket = Arc::new(socket);
        let running = Arc::new(AtomicBool::new(true));
        let (send_tx, send_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = broadcast::channel(1);

        Self::spawn_send_queue(
            Arc::clone(&socket),
            Arc::clone(&running),
            send_rx,
            shutdown_tx.subscribe(),
        );

        Ok(Self {
            socket,
            local_addr,
            running,
            receiving: AtomicBool::new(false),
            max_datagram_size: config.max_datagram_size,
            send_tx,
            shutdown_tx,
        })
    }

    /// Get the bound local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start the receive loop, forwarding each datagram to `tx`.
    ///
    /// Each forwarded [`Datagram`] holds exactly the received bytes. The
    /// loop re-arms immediately; it never waits for downstream processing.
    pub fn start_receive(&self, tx: mpsc::UnboundedSender<Datagram>) {
        if self.receiving.swap(true, Ordering::SeqCst) {
            return;
        }

        let socket = Arc::clone(&self.socket);
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let max = self.max_datagram_size;

        tokio::spawn(async move {
            let mut buf = vec![0u8; max];

            loop {
                tokio::select! {
                    result = socket.recv_from(&mut buf) => match result {
                        Ok((len, peer)) => {
                            trace!(
                                "Received {} bytes from {}: {}",
                                len,
                                peer,
                                hex_dump(&buf[..len])
                            );

                            let datagram = Datagram {
                                data: buf[..len].to_vec(),
                                peer,
                            };
                            if tx.send(datagram).is_err() {
                                debug!("Parser stage gone, stopping receive loop");
                                break;
                            }
                        }
                        Err(e) => {
                            if running.load(Ordering::SeqCst) {
                                error!("Receive failed: {}", e);
                            }
                            break;
                        }
                    },
                    _ = shutdown_rx.recv() => break,
                }
            }

            debug!("Receive loop stopped");
        });
    }

    /// Enqueue one datagram for ordered transmission.
    ///
    /// Rejects oversized buffers and sends after [`stop`](Self::stop);
    /// otherwise the request is appended to the FIFO queue and transmitted
    /// after everything already queued.
    pub fn send(&self, data: Vec<u8>, dest: SocketAddr) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            warn!("Transport stopped, dropping {} byte send to {}", data.len(), dest);
            return Err(TransportError::Stopped.into());
        }

        if data.len() > self.max_datagram_size {
            error!(
                "Datagram too large to send: {} bytes (max {})",
                data.len(),
                self.max_datagram_size
            );
            return Err(TransportError::SendTooLarge {
                size: data.len(),
                max: self.max_datagram_size,
            }
            .into());
        }

        trace!("Queueing {} bytes to {}: {}", data.len(), dest, hex_dump(&data));

        self.send_tx
            .send(SendRequest { data, dest })
            .map_err(|_| TransportError::Stopped)?;

        Ok(())
    }

    /// Stop the endpoint: receive loop exits, queued sends are dropped with
    /// a warning, an in-flight send completes gracefully.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
        debug!("UDP endpoint on {} stopped", self.local_addr);
    }

    /// Single consumer of the send queue. One entry is popped and fully
    /// transmitted (success or failure) before the next is looked at; a send
    /// error neither retries the entry nor halts the queue.
    fn spawn_send_queue(
        socket: Arc<TokioUdpSocket>,
        running: Arc<AtomicBool>,
        mut send_rx: mpsc::UnboundedReceiver<SendRequest>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    request = send_rx.recv() => match request {
                        Some(request) => {
                            if !running.load(Ordering::SeqCst) {
                                warn!("Transport stopped, dropping queued send to {}", request.dest);
                                continue;
                            }

                            match socket.send_to(&request.data, request.dest).await {
                                Ok(sent) => {
                                    trace!("Sent {} bytes to {}", sent, request.dest);
                                }
                                Err(e) => {
                                    // Best-effort delivery: log and move on.
                                    error!("Send to {} failed: {}", request.dest, e);
                                }
                            }
                        }
                        None => break,
                    },
                    _ = shutdown_rx.recv() => {
                        while let Ok(request) = send_rx.try_recv() {
                            warn!("Dropping queued send to {} on shutdown", request.dest);
                        }
                        break;
                    }
                }
            }

            debug!("Send queue stopped");
        });
    }
}
