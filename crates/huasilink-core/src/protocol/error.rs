//! Protocol errors

use thiserror::Error;

/// Errors that can occur while encoding collector commands
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
}
