//! Frame encoding
//!
//! Implements the text frame format: `$<body>*<checksum>\r\n`. The checksum
//! is the XOR of every body byte, rendered as exactly two uppercase hex
//! digits. The framing delimiters are not part of the checksum.

use super::{ProtocolError, CHECKSUM_DELIMITER, FRAME_HEAD, FRAME_TAIL};

/// XOR-reduce a buffer into a single checksum byte.
///
/// An empty buffer reduces to 0.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, byte| acc ^ byte)
}

/// Render the first byte of a buffer as two uppercase hex digits.
///
/// A byte value of 0x00 is a legitimate XOR outcome and renders as "00";
/// only an empty buffer is an error.
pub fn first_byte_hex(bytes: &[u8]) -> Result<String, ProtocolError> {
    match bytes.first() {
        Some(byte) => Ok(format!("{:02X}", byte)),
        None => Err(ProtocolError::InvalidInput("empty checksum buffer")),
    }
}

/// A framed collector command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// ASCII command body between `$` and `*`
    pub body: String,
    /// XOR checksum of the body bytes
    pub checksum: u8,
}

impl Frame {
    /// Create a frame for the given body, computing its checksum.
    pub fn new(body: impl Into<String>) -> Result<Self, ProtocolError> {
        let body = body.into();
        if body.is_empty() {
            return Err(ProtocolError::InvalidInput("empty command body"));
        }
        let checksum = checksum(body.as_bytes());
        Ok(Self { body, checksum })
    }

    /// Checksum rendered as two uppercase hex digits.
    pub fn checksum_hex(&self) -> String {
        format!("{:02X}", self.checksum)
    }

    /// Encode the frame to transmit-ready bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_size());
        bytes.push(FRAME_HEAD);
        bytes.extend_from_slice(self.body.as_bytes());
        bytes.push(CHECKSUM_DELIMITER);
        bytes.extend_from_slice(self.checksum_hex().as_bytes());
        bytes.extend_from_slice(&FRAME_TAIL);
        bytes
    }

    /// Total encoded size: `$` + body + `*` + two hex digits + CR LF.
    pub fn encoded_size(&self) -> usize {
        1 + self.body.len() + 1 + 2 + 2
    }
}
