//! Error types
//!
//! Defines domain-specific error types for each layer of the FTP server.
//! Every I/O failure carries the syscall intent that failed and the
//! operation that issued it, so no shared message buffer is ever needed.

use std::fmt;
use std::io;
use std::net::SocketAddrV4;

use thiserror::Error;

/// The kind of system call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
    Seek,
    Open,
    Connect,
    Accept,
    Bind,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IoOp::Read => "read",
            IoOp::Write => "write",
            IoOp::Seek => "seek",
            IoOp::Open => "open",
            IoOp::Connect => "connect",
            IoOp::Accept => "accept",
            IoOp::Bind => "bind",
        };
        f.write_str(name)
    }
}

/// An I/O error tagged with the failing call and where it was issued.
#[derive(Debug, Error)]
#[error("{op} failed in {context}: {source}")]
pub struct IoFailure {
    pub op: IoOp,
    pub context: &'static str,
    #[source]
    pub source: io::Error,
}

impl IoFailure {
    pub fn new(op: IoOp, context: &'static str, source: io::Error) -> Self {
        Self { op, context, source }
    }
}

/// Failures decoding the comma-separated `h1,h2,h3,h4,p1,p2` address form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("expected 6 comma-separated fields, got {0}")]
    FieldCount(usize),
    #[error("invalid IPv4 address: {0}")]
    InvalidIp(String),
    #[error("invalid port field: {0}")]
    InvalidPort(String),
}

/// Failures realizing a data connection from the selected address mode.
#[derive(Debug, Error)]
pub enum DataChannelError {
    #[error("no data mode selected (PORT or PASV required)")]
    NoModeSelected,
    #[error("data connection to {addr} failed: {source}")]
    ConnectFailed {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },
    #[error("listener accept failed: {0}")]
    AcceptFailed(#[source] io::Error),
    #[error("passive mode selected but no listener is open")]
    ListenerMissing,
}

/// Failures moving bytes between a source and a destination.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Io(#[from] IoFailure),
    #[error("source ended early with {remaining} bytes still expected")]
    UnexpectedEof { remaining: u64 },
    #[error("pipelined write worker panicked")]
    WorkerPanicked,
}

impl TransferError {
    /// Returns the failing syscall intent, if this was an I/O failure.
    pub fn op(&self) -> Option<IoOp> {
        match self {
            TransferError::Io(failure) => Some(failure.op),
            _ => None,
        }
    }
}

/// Errors that terminate a whole session rather than a single command.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("control channel failure: {0}")]
    Control(#[from] IoFailure),
}
