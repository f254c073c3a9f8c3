//! Session state
//!
//! One [`Session`] per control connection. It owns the control channel and
//! the data link, so dropping it closes every descriptor the session opened.

use std::io::{Read, Write};
use std::time::Duration;

use crate::protocol::framing::ControlChannel;
use crate::transfer::{AddressMode, DataLink, TransferVariant};

pub struct Session<R, W> {
    control: ControlChannel<R, W>,
    data_link: DataLink,
    resume_offset: u64,
    transfer_variant: TransferVariant,
    binary_mode: bool,
    authenticated: bool,
    username: Option<String>,
    current_virtual_path: String,
}

impl<R: Read, W: Write> Session<R, W> {
    pub fn new(control: ControlChannel<R, W>, connect_timeout: Duration) -> Self {
        Self {
            control,
            data_link: DataLink::new(connect_timeout),
            resume_offset: 0,
            transfer_variant: TransferVariant::default(),
            binary_mode: true,
            authenticated: false,
            username: None,
            current_virtual_path: "/".to_string(),
        }
    }

    pub fn control(&mut self) -> &mut ControlChannel<R, W> {
        &mut self.control
    }

    pub fn data_link(&self) -> &DataLink {
        &self.data_link
    }

    pub fn data_link_mut(&mut self) -> &mut DataLink {
        &mut self.data_link
    }

    /// Splits the borrow so a handler can stream over the data link while
    /// replying on the control channel.
    pub fn channels(&mut self) -> (&mut ControlChannel<R, W>, &mut DataLink) {
        (&mut self.control, &mut self.data_link)
    }

    pub fn address_mode(&self) -> AddressMode {
        self.data_link.mode()
    }

    pub fn resume_offset(&self) -> u64 {
        self.resume_offset
    }

    pub fn set_resume_offset(&mut self, offset: u64) {
        self.resume_offset = offset;
    }

    pub fn transfer_variant(&self) -> TransferVariant {
        self.transfer_variant
    }

    /// Flips between sequential and pipelined downloads, returning the new variant.
    pub fn toggle_transfer_variant(&mut self) -> TransferVariant {
        self.transfer_variant = self.transfer_variant.toggled();
        self.transfer_variant
    }

    pub fn is_binary(&self) -> bool {
        self.binary_mode
    }

    pub fn set_binary(&mut self, binary: bool) {
        self.binary_mode = binary;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Records the name given by USER. Any earlier login is dropped.
    pub fn begin_login(&mut self, username: &str) {
        self.username = Some(username.to_string());
        self.authenticated = false;
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    pub fn current_virtual_path(&self) -> &str {
        &self.current_virtual_path
    }

    pub fn set_current_virtual_path(&mut self, path: String) {
        self.current_virtual_path = path;
    }
}
