//! Command dispatcher (message manager).
//!
//! Maps a command code to its handler and builds the response frame. The
//! command set is closed: unknown codes are logged and silently ignored,
//! with no error response defined by the protocol. Identity and host
//! network info are queried fresh on every request because both can change
//! while the agent is running.
//!
//! Like the parser, the dispatcher drains its input channel on a single
//! task, which makes the identity file read and interface enumeration safe
//! without additional locking.

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::{Error, ProtocolError, Result};
use crate::identity::DeviceInfo;
use crate::parser::InboundMessage;
use crate::protocol::{Frame, CMD_IP_REQUEST, CMD_IP_RESPONSE};
use crate::transport::SendRequest;
use crate::util;

/// Device type tag reported in identity responses.
const DEVICE_TYPE: &str = "Bkk320";

/// Protocol/software version string reported in identity responses.
const PROTOCOL_VERSION: &str = "0.0.0.0";

/// Recognized commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Request for device identity and network info.
    IpRequest,
}

impl Command {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            CMD_IP_REQUEST => Some(Self::IpRequest),
            _ => None,
        }
    }
}

/// Command dispatcher owning device identity access.
pub struct MessageManager {
    device: DeviceInfo,
    responses: mpsc::UnboundedSender<SendRequest>,
}

impl MessageManager {
    /// Create a dispatcher that emits response bytes on `responses`.
    pub fn new(device: DeviceInfo, responses: mpsc::UnboundedSender<SendRequest>) -> Self {
        debug!("Message manager initialized");
        Self { device, responses }
    }

    /// Process one inbound message.
    ///
    /// Every handler failure is caught here: one malformed or failing
    /// message never affects processing of subsequent messages.
    pub fn process_message(&self, message: &InboundMessage) {
        if let Err(e) = self.dispatch(message) {
            error!("Message processing failed: {}", e);
        }
    }

    fn dispatch(&self, message: &InboundMessage) -> Result<()> {
        let frame = &message.frame;

        // Defense in depth: the codec enforces this, but a frame constructed
        // elsewhere may not have.
        if frame.payload_len as usize != frame.payload.len() {
            return Err(ProtocolError::DataLengthMismatch {
                declared: frame.payload_len as usize,
                actual: frame.payload.len(),
            }
            .into());
        }

        match Command::from_u8(frame.command) {
            Some(Command::IpRequest) => self.handle_ip_request(message),
            None => {
                warn!("Unknown command: {:#04x}", frame.command);
                Ok(())
            }
        }
    }

    /// Answer an IP_REQUEST with the device identity document.
    ///
    /// Identity and network fields are best-effort: empty or zero values
    /// still produce a response.
    fn handle_ip_request(&self, message: &InboundMessage) -> Result<()> {
        let serial_number = self.device.serial_number();

        let document = serde_json::json!({
            "IP": util::host_ip_address(),
            "MASK": util::host_netmask(),
            "MODE": 0,
            "Type": DEVICE_TYPE,
            "Version": PROTOCOL_VERSION,
        });
        let payload = document.to_string().into_bytes();

        let response = Frame::new(CMD_IP_RESPONSE, serial_number, 0x00, payload);

        self.responses
            .send(SendRequest {
                data: response.encode(),
                dest: message.peer,
            })
            .map_err(|_| Error::Internal("response channel closed".into()))?;

        Ok(())
    }

    /// Drain the message channel until the parser stage closes it.
    pub async fn run(self, mut messages: mpsc::UnboundedReceiver<InboundMessage>) {
        while let Some(message) = messages.recv().await {
            self.process_message(&message);
        }

        debug!("Dispatcher stage stopped");
    }
}
