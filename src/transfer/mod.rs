//! Transfer module for FTP server
//!
//! Handles data channel establishment and the byte-moving engine used by
//! RETR, STOR, LIST and NLST.

pub mod data_channel;
pub mod engine;
pub mod modes;

// Re-export key types and functions
pub use data_channel::DataLink;
pub use engine::{
    TransferRequest, receive_stream, send_file, send_pipelined, send_sequential,
};
pub use modes::{AddressMode, TransferVariant};
