//! Collector Text Protocol
//!
//! Implements command encoding for the HUASI line protocol spoken by
//! shape-array data collectors.
//!
//! Every command is an ASCII body of comma-separated tokens, framed as
//! `$<body>*<checksum>\r\n` with a single-byte XOR checksum rendered as two
//! uppercase hex digits. The checksum covers the body only.

pub mod command_builder;
pub mod commands;
mod error;
mod frame;

pub use command_builder::CommandBuilder;
pub use commands::{CalType, CmdOptions, CommandId, LayType, NodesTwist, TxtCommand};
pub use error::ProtocolError;
pub use frame::{checksum, first_byte_hex, Frame};

/// Leading vendor token of every command body
pub const VENDOR_TOKEN: &str = "HUASI";

/// Frame start delimiter
pub const FRAME_HEAD: u8 = b'$';

/// Delimiter between body and checksum
pub const CHECKSUM_DELIMITER: u8 = b'*';

/// Frame terminator (CR LF)
pub const FRAME_TAIL: [u8; 2] = [0x0D, 0x0A];
