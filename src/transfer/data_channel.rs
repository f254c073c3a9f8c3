//! Module `data_channel`
//!
//! Owns the per-session data-connection resources: the mode chosen by
//! PORT/PASV, the single-use passive listener, and the open data stream.
//! A transfer command calls [`DataLink::establish`] to realize the
//! connection and [`DataLink::teardown`] exactly once afterwards.

use log::{debug, info, warn};
use std::io;
use std::net::{IpAddr, Shutdown, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::ops::Range;
use std::time::Duration;

use rand::Rng;

use crate::error::{DataChannelError, IoFailure, IoOp};
use crate::transfer::modes::AddressMode;

/// Random ports tried before PASV gives up.
const PASSIVE_BIND_ATTEMPTS: usize = 16;

/// Data-connection state of one session.
///
/// At most one of `listener` and `stream` is open at any time.
#[derive(Debug)]
pub struct DataLink {
    mode: AddressMode,
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl DataLink {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            mode: AddressMode::None,
            listener: None,
            stream: None,
            connect_timeout,
        }
    }

    pub fn mode(&self) -> AddressMode {
        self.mode
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Selects active mode; the next transfer connects out to `addr`.
    ///
    /// Any passive listener left over from an earlier PASV is closed.
    pub fn select_active(&mut self, addr: SocketAddrV4) {
        if self.listener.take().is_some() {
            info!("Replacing passive listener with PORT target {}", addr);
        }
        self.mode = AddressMode::Active(addr);
    }

    /// Binds a passive listener on a random port from `ports` and selects
    /// passive mode. Returns the bound port.
    pub fn open_passive(&mut self, bind_ip: IpAddr, ports: Range<u16>) -> Result<u16, IoFailure> {
        // The old listener is closed first so its port can be reused.
        if self.listener.take().is_some() {
            info!("Replacing existing passive listener");
        }

        let mut rng = rand::thread_rng();
        let mut last_error = io::Error::from(io::ErrorKind::AddrNotAvailable);
        for _ in 0..PASSIVE_BIND_ATTEMPTS {
            let port = rng.gen_range(ports.clone());
            match TcpListener::bind((bind_ip, port)) {
                Ok(listener) => {
                    debug!("Passive listener bound on {}:{}", bind_ip, port);
                    self.listener = Some(listener);
                    self.mode = AddressMode::Passive;
                    return Ok(port);
                }
                Err(e) => {
                    debug!("Passive bind on {}:{} failed: {}", bind_ip, port, e);
                    last_error = e;
                }
            }
        }
        Err(IoFailure::new(IoOp::Bind, "command_pasv", last_error))
    }

    /// Realizes the data connection for the selected mode.
    ///
    /// Passive listeners are single-use: the listener is closed after the
    /// accept whether or not it succeeded. The mode itself is left set on
    /// failure; the caller clears it through [`DataLink::teardown`].
    pub fn establish(&mut self) -> Result<&mut TcpStream, DataChannelError> {
        let stream = match self.mode {
            AddressMode::None => return Err(DataChannelError::NoModeSelected),
            AddressMode::Active(addr) => {
                debug!("Connecting data channel to {}", addr);
                TcpStream::connect_timeout(&SocketAddr::V4(addr), self.connect_timeout)
                    .map_err(|source| DataChannelError::ConnectFailed { addr, source })?
            }
            AddressMode::Passive => {
                let listener = self
                    .listener
                    .take()
                    .ok_or(DataChannelError::ListenerMissing)?;
                let (stream, peer) = listener
                    .accept()
                    .map_err(DataChannelError::AcceptFailed)?;
                debug!("Accepted data connection from {}", peer);
                stream
            }
        };

        if self.stream.is_some() {
            warn!("Dropping stale data stream before establishing a new one");
        }
        Ok(self.stream.insert(stream))
    }

    /// Closes the data stream, if any, and resets the mode to `None`.
    pub fn teardown(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.mode = AddressMode::None;
    }
}
