//! Error handlers
//!
//! Translates engine and data-channel errors into client-visible reply lines.

use crate::error::types::{DataChannelError, TransferError};
use crate::protocol::responses;
use log::error;

/// Reply line for a failed data-channel establishment.
pub fn data_channel_reply(err: &DataChannelError) -> &'static str {
    match err {
        DataChannelError::NoModeSelected => responses::NEED_DATA_MODE,
        DataChannelError::ConnectFailed { .. } => responses::DATA_CONNECT_FAILED,
        DataChannelError::AcceptFailed(_) | DataChannelError::ListenerMissing => {
            responses::DATA_ACCEPT_FAILED
        }
    }
}

/// Log a failed transfer with its structured context.
pub fn log_transfer_error(command: &str, err: &TransferError) {
    match err.op() {
        Some(op) => error!("{} transfer aborted on {}: {}", command, op, err),
        None => error!("{} transfer aborted: {}", command, err),
    }
}
