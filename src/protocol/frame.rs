//! Frame structure and wire codec.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::ProtocolError;

use super::{crc16, CHECKSUM_SIZE, MIN_FRAME_SIZE, PAYLOAD_OFFSET};

/// One complete decoded protocol message.
///
/// `payload_len` always equals `payload.len()` for frames produced by
/// [`Frame::new`] or [`Frame::decode`]; the dispatcher re-checks the
/// invariant as defense in depth before acting on a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command opcode. Unknown values are legal to receive but have no
    /// handler.
    pub command: u8,
    /// Device identifier; request correlation or identity echo depending on
    /// context.
    pub serial_number: u16,
    /// Status/flags byte, opaque to the codec.
    pub status: u8,
    /// Declared payload byte count.
    pub payload_len: u32,
    /// Payload bytes in logical order. Opaque to the codec; command handlers
    /// interpret it (typically a UTF-8 JSON document).
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame with the length field derived from the payload.
    pub fn new(command: u8, serial_number: u16, status: u8, payload: Vec<u8>) -> Self {
        Self {
            command,
            serial_number,
            status,
            payload_len: payload.len() as u32,
            payload,
        }
    }

    /// Total encoded size in bytes.
    pub fn size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }

    /// Encode the frame to wire bytes, computing and appending the checksum.
    ///
    /// This is the only legal way to produce outbound frame bytes; handlers
    /// must never hand-roll a partial buffer.
    ///
    /// The payload is written in reverse order. The deployed device firmware
    /// reads it back-to-front, so the reversal is load-bearing for wire
    /// compatibility (see DESIGN.md).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.size()];

        buf[0] = self.command;
        LittleEndian::write_u16(&mut buf[1..3], self.serial_number);
        buf[3] = self.status;
        LittleEndian::write_u32(&mut buf[4..8], self.payload.len() as u32);

        let payload_end = PAYLOAD_OFFSET + self.payload.len();
        for (dst, src) in buf[PAYLOAD_OFFSET..payload_end]
            .iter_mut()
            .zip(self.payload.iter().rev())
        {
            *dst = *src;
        }

        let checksum = crc16(&buf[..payload_end]);
        LittleEndian::write_u16(&mut buf[payload_end..], checksum);

        buf
    }

    /// Decode a frame from one received datagram.
    ///
    /// Fails closed: any structural or checksum violation rejects the whole
    /// datagram, never a partial parse.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < MIN_FRAME_SIZE {
            return Err(ProtocolError::TooShort {
                len: buf.len(),
                min: MIN_FRAME_SIZE,
            });
        }

        let command = buf[0];
        let serial_number = LittleEndian::read_u16(&buf[1..3]);
        let status = buf[3];
        let payload_len = LittleEndian::read_u32(&buf[4..8]);

        let available = buf.len() - CHECKSUM_SIZE;
        let payload_end = PAYLOAD_OFFSET
            .checked_add(payload_len as usize)
            .filter(|&end| end <= available)
            .ok_or(ProtocolError::LengthOverflow {
                declared: payload_len as usize,
                available: available.saturating_sub(PAYLOAD_OFFSET),
            })?;

        // Wire payload is reversed relative to logical order.
        let payload: Vec<u8> = buf[PAYLOAD_OFFSET..payload_end]
            .iter()
            .rev()
            .copied()
            .collect();

        let frame_checksum = LittleEndian::read_u16(&buf[buf.len() - CHECKSUM_SIZE..]);
        let computed = crc16(&buf[..buf.len() - CHECKSUM_SIZE]);
        if computed != frame_checksum {
            return Err(ProtocolError::ChecksumMismatch {
                frame: frame_checksum,
                computed,
            });
        }

        Ok(Self {
            command,
            serial_number,
            status,
            payload_len,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CMD_IP_REQUEST, CMD_IP_RESPONSE};

    #[test]
    fn test_round_trip_empty_payload() {
        let frame = Frame::new(CMD_IP_REQUEST, 0x0000, 0x00, vec![]);
        let encoded = frame.encode();
        assert_eq!(encoded.len(), MIN_FRAME_SIZE);

        let decoded = Frame::decode(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_round_trip_with_payload() {
        let payload = br#"{"IP":"10.0.0.2","Type":"Bkk320"}"#.to_vec();
        let frame = Frame::new(CMD_IP_RESPONSE, 0x1234, 0x00, payload.clone());

        let decoded = Frame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded.payload, payload);
        assert_eq!(decoded.serial_number, 0x1234);
        assert_eq!(decoded.payload_len as usize, payload.len());
    }

    #[test]
    fn test_wire_layout_little_endian() {
        let frame = Frame::new(0x01, 0xBBAA, 0x05, vec![0x10, 0x20, 0x30]);
        let encoded = frame.encode();

        assert_eq!(encoded[0], 0x01);
        assert_eq!(&encoded[1..3], &[0xAA, 0xBB]);
        assert_eq!(encoded[3], 0x05);
        assert_eq!(&encoded[4..8], &[0x03, 0x00, 0x00, 0x00]);
        // Payload appears reversed on the wire.
        assert_eq!(&encoded[8..11], &[0x30, 0x20, 0x10]);
    }

    #[test]
    fn test_too_short_rejected() {
        for len in 0..MIN_FRAME_SIZE {
            let buf = vec![0u8; len];
            assert_eq!(
                Frame::decode(&buf),
                Err(ProtocolError::TooShort {
                    len,
                    min: MIN_FRAME_SIZE
                })
            );
        }
    }

    #[test]
    fn test_length_overflow_rejected() {
        let mut encoded = Frame::new(0x01, 0, 0, vec![0xAB; 4]).encode();
        // Claim more payload than the datagram holds.
        LittleEndian::write_u32(&mut encoded[4..8], 5);
        assert!(matches!(
            Frame::decode(&encoded),
            Err(ProtocolError::LengthOverflow {
                declared: 5,
                available: 4
            })
        ));
    }

    #[test]
    fn test_length_overflow_huge_value() {
        let mut encoded = Frame::new(0x01, 0, 0, vec![]).encode();
        LittleEndian::write_u32(&mut encoded[4..8], u32::MAX);
        assert!(matches!(
            Frame::decode(&encoded),
            Err(ProtocolError::LengthOverflow { .. })
        ));
    }

    #[test]
    fn test_checksum_single_bit_sensitivity() {
        let encoded = Frame::new(CMD_IP_REQUEST, 0x0102, 0x00, b"abc".to_vec()).encode();

        // Flipping any single bit ahead of the checksum field must reject.
        for byte in 0..encoded.len() - CHECKSUM_SIZE {
            for bit in 0..8 {
                let mut corrupt = encoded.clone();
                corrupt[byte] ^= 1 << bit;
                match Frame::decode(&corrupt) {
                    Err(ProtocolError::ChecksumMismatch { .. })
                    | Err(ProtocolError::LengthOverflow { .. }) => {}
                    other => panic!("corrupt frame accepted: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_checksum_lands_on_identical_value() {
        let frame = Frame::new(0x42, 7, 1, vec![1, 2, 3, 4]);
        assert_eq!(frame.encode(), Frame::decode(&frame.encode()).unwrap().encode());
    }
}
