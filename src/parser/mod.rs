//! Message parser stage.
//!
//! Turns one raw datagram into a validated [`Frame`] or a logged rejection.
//! The stage drains its input channel on a single task, so decode side
//! effects (logging in particular) never interleave between datagrams. A
//! rejected datagram is dropped with no state retained; it cannot affect the
//! datagrams around it.

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::protocol::{hex_dump, Frame};
use crate::transport::Datagram;

/// One parsed inbound message with its sender.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub frame: Frame,
    pub peer: SocketAddr,
}

/// Single-consumer parser stage.
#[derive(Debug, Default)]
pub struct FrameParser;

impl FrameParser {
    pub fn new() -> Self {
        Self
    }

    /// Decode and validate one datagram.
    ///
    /// Returns `None` on any decode failure; the failure is logged and the
    /// datagram dropped. Exactly one decode attempt per datagram.
    pub fn parse_datagram(&self, data: &[u8], peer: SocketAddr) -> Option<Frame> {
        match Frame::decode(data) {
            Ok(frame) => {
                trace!(
                    "Valid message parsed - CMD: {:#04x}, SERIAL NUMBER: {}, STATUS: {:#04x}, \
                     DATALEN: {}, PAYLOAD: {}",
                    frame.command,
                    frame.serial_number,
                    frame.status,
                    frame.payload_len,
                    hex_dump(&frame.payload)
                );
                Some(frame)
            }
            Err(e) => {
                warn!("Parse error from {}: {}", peer, e);
                None
            }
        }
    }

    /// Drain the datagram channel until the transport closes it, forwarding
    /// each valid frame downstream.
    pub async fn run(
        self,
        mut datagrams: mpsc::UnboundedReceiver<Datagram>,
        messages: mpsc::UnboundedSender<InboundMessage>,
    ) {
        while let Some(datagram) = datagrams.recv().await {
            if let Some(frame) = self.parse_datagram(&datagram.data, datagram.peer) {
                if messages
                    .send(InboundMessage {
                        frame,
                        peer: datagram.peer,
                    })
                    .is_err()
                {
                    break;
                }
            }
        }

        debug!("Parser stage stopped");
    }
}
