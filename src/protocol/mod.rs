//! FTP Protocol implementation
//!
//! Handles control-line framing, command parsing, the address codec,
//! reply text, and per-command handlers.

pub mod address;
pub mod commands;
pub mod framing;
pub mod handlers;
pub mod responses;

pub use address::{decode_address, encode_address};
pub use commands::{Command, CommandLine, parse_command};
pub use framing::{ControlChannel, Incoming, send};
pub use handlers::{CommandStatus, handle_command};
