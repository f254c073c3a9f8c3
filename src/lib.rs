//! Tandem FTP server library.
//!
//! Session engine for a small FTP server: control-line protocol, active and
//! passive data channels, and sequential or pipelined file transfers.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod transfer;

pub use config::ServerConfig;
pub use server::{Server, SessionContext};
