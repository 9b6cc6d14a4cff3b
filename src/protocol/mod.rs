//! Action-buffer protocol
//!
//! Movement and state changes travel as a compact stream of one- and
//! two-character op-codes. Internally commands are tagged values
//! ([`Command`]); the character form exists only at the network edge,
//! where a whole walk cycle compresses to a handful of letters instead of
//! per-frame position packets. One replay implementation serves local
//! prediction, remote playback, and bots.

pub mod command;
pub mod controller;
pub mod messages;

// Re-export main types for convenience
pub use command::{
    char_to_direction, decode_commands, decode_one, direction_to_char, encode_commands, Command,
};
pub use controller::{BufferedActionController, InputState};
pub use messages::{ChatPacket, MovePacket, Packet};

// Error types
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    #[error("unknown op-code '{opcode}'")]
    UnknownOpcode { opcode: char },

    #[error("'{opcode}' command truncated: missing direction")]
    Truncated { opcode: char },

    #[error("position correction missing '.' delimiter")]
    MissingDelimiter,

    #[error("position correction has bad coordinate: {text}")]
    BadCoordinate { text: String },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
