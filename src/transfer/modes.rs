//! FTP Transfer modes
//!
//! How the next data connection is realized, and which engine variant
//! moves file bytes over it.

use std::net::SocketAddrV4;

/// Data-connection mode chosen by the last PORT or PASV command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    #[default]
    None,
    /// Server connects out to the client-supplied address.
    Active(SocketAddrV4),
    /// Server accepts one connection on its passive listener.
    Passive,
}

/// Engine variant used for downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferVariant {
    #[default]
    Sequential,
    /// Double-buffered: one buffer is written while the other is read.
    Pipelined,
}

impl TransferVariant {
    pub fn toggled(self) -> Self {
        match self {
            TransferVariant::Sequential => TransferVariant::Pipelined,
            TransferVariant::Pipelined => TransferVariant::Sequential,
        }
    }
}
