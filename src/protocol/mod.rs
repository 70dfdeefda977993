//! Wire protocol for the Bkk320 control plane.
//!
//! Defines the frame format, the CRC16 integrity checksum, and the
//! encode/decode contract between raw datagrams and [`Frame`].
//!
//! ## Frame Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Command (1) │ Serial Number (2) │ Status (1) │ Payload Len (4)  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                     Payload (Payload Len)                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Checksum (2)                                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-byte fields are little-endian. The checksum is a CRC16 over every
//! byte preceding it. One datagram carries exactly one frame; there is no
//! reassembly across datagrams.

mod frame;

pub use frame::Frame;

use crc::{Crc, CRC_16_MCRF4XX};

/// Minimum frame size in bytes (all fixed fields, empty payload).
pub const MIN_FRAME_SIZE: usize = 10;

/// Offset of the payload within a frame (after the fixed header fields).
pub const PAYLOAD_OFFSET: usize = 8;

/// Size of the trailing checksum field.
pub const CHECKSUM_SIZE: usize = 2;

/// Command code: request for device identity and network info.
pub const CMD_IP_REQUEST: u8 = 0xF6;

/// Command code: identity response carrying a JSON document.
pub const CMD_IP_RESPONSE: u8 = 0xF7;

// Poly 0x1021, init 0xFFFF, reflected in/out, no final XOR. Must match the
// checksum the deployed devices compute.
const CRC16_ALGO: Crc<u16> = Crc::<u16>::new(&CRC_16_MCRF4XX);

/// Calculate the protocol CRC16 checksum.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16_ALGO.checksum(data)
}

/// Render a byte slice as space-separated uppercase hex for diagnostics.
pub fn hex_dump(data: &[u8]) -> String {
    use std::fmt::Write;

    let mut hex = String::with_capacity(data.len() * 3);
    for byte in data {
        let _ = write!(hex, "{byte:02X} ");
    }
    hex.pop();
    hex
}
