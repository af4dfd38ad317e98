//! # HuasiLink Core Library
//!
//! Core functionality for talking to HUASI shape-array displacement
//! sensor data collectors.
//!
//! This library provides:
//! - Text command encoding for the collector line protocol
//! - XOR checksum and `$<body>*<hex>\r\n` framing primitives
//! - Typed command parameters with validation
//!
//! The crate produces transmit-ready byte buffers only. Transport (serial
//! port, socket) and response decoding belong to the caller.
//!
//! ## Example
//!
//! ```rust
//! use huasilink_core::protocol::{CommandBuilder, TxtCommand};
//!
//! let builder = CommandBuilder::new("280537");
//! let frame = builder.encode(&TxtCommand::GetData)?;
//! assert_eq!(frame, b"$HUASI,GET,DATA,280537*27\r\n");
//! # Ok::<(), huasilink_core::protocol::ProtocolError>(())
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{
        CalType, CmdOptions, CommandBuilder, CommandId, Frame, LayType, ProtocolError, TxtCommand,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
