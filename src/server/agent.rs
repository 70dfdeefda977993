//! Agent wiring and lifecycle.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dispatch::MessageManager;
use crate::error::Result;
use crate::identity::DeviceInfo;
use crate::parser::FrameParser;
use crate::transport::{TcpLogSink, UdpEndpoint};
use crate::util;

/// The running control-plane agent.
///
/// Owns the UDP endpoint and the pipeline stage tasks. The one-directional
/// data flow is fixed at construction:
/// receive loop → parser → dispatcher → send queue.
pub struct Agent {
    udp: Arc<UdpEndpoint>,
    tcp_shutdown: Option<broadcast::Sender<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Agent {
    /// Bind the transports, wire the pipeline stages, and start listening.
    pub fn start(config: &Config) -> Result<Self> {
        let listen_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.agent.port);

        let udp = Arc::new(UdpEndpoint::bind(listen_addr, &config.transport)?);

        let (datagram_tx, datagram_rx) = mpsc::unbounded_channel();
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (response_tx, mut response_rx) = mpsc::unbounded_channel();

        let mut tasks = Vec::new();

        tasks.push(tokio::spawn(
            FrameParser::new().run(datagram_rx, message_tx),
        ));

        let device = DeviceInfo::new(&config.agent.main_cfg_file);
        tasks.push(tokio::spawn(
            MessageManager::new(device, response_tx).run(message_rx),
        ));

        // Forward dispatcher responses into the ordered send queue. Rejected
        // sends (oversized, stopped) are already logged by the endpoint.
        let send_udp = Arc::clone(&udp);
        tasks.push(tokio::spawn(async move {
            while let Some(request) = response_rx.recv().await {
                let _ = send_udp.send(request.data, request.dest);
            }
            debug!("Response forwarder stopped");
        }));

        udp.start_receive(datagram_tx);

        let tcp_shutdown = if config.agent.tcp_log_sink {
            match TcpLogSink::bind(listen_addr, &config.transport) {
                Ok(sink) => {
                    let shutdown = sink.shutdown_handle();
                    tasks.push(tokio::spawn(sink.run()));
                    Some(shutdown)
                }
                Err(e) => {
                    warn!("TCP log sink unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        info!(
            "Server listening on {}:{}",
            util::host_ip_address(),
            config.agent.port
        );

        Ok(Self {
            udp,
            tcp_shutdown,
            tasks,
        })
    }

    /// Bound UDP address (useful when the configured port is 0 in tests).
    pub fn local_addr(&self) -> SocketAddr {
        self.udp.local_addr()
    }

    /// Stop the transports; pipeline stages drain and exit as their input
    /// channels close.
    pub fn stop(&self) {
        self.udp.stop();
        if let Some(ref shutdown) = self.tcp_shutdown {
            let _ = shutdown.send(());
        }
    }

    /// Stop and wait for all stage tasks to finish.
    pub async fn shutdown(mut self) {
        self.stop();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        info!("Server stopped");
    }
}
