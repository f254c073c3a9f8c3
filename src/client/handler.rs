use log::{debug, error, info, warn};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use crate::client::Session;
use crate::error::{IoFailure, IoOp, SessionError};
use crate::protocol::framing::ControlChannel;
use crate::protocol::{
    Command, CommandStatus, Incoming, handle_command, parse_command, responses,
};
use crate::server::SessionContext;

/// Serves one control connection until the client quits or disconnects.
///
/// Blocking: the caller runs this on a dedicated thread. The session owns
/// both halves of `stream` and closes them when it returns.
pub fn handle_client(stream: TcpStream, client_addr: SocketAddr, ctx: Arc<SessionContext>) {
    info!("New client connected: {}", client_addr);

    let result = stream
        .try_clone()
        .map_err(|e| SessionError::from(IoFailure::new(IoOp::Open, "handle_client", e)))
        .and_then(|reader| {
            let control = ControlChannel::new(reader, stream, ctx.config.max_command_length);
            let mut session = Session::new(control, ctx.config.connect_timeout());
            run_session(&mut session, client_addr, &ctx)
        });

    match result {
        Ok(()) => info!("Session with {} ended", client_addr),
        Err(e) => error!("Session with {} aborted: {}", client_addr, e),
    }
}

/// Greets the client, then reads, parses and dispatches one line at a time.
pub fn run_session<R: Read, W: Write>(
    session: &mut Session<R, W>,
    client_addr: SocketAddr,
    ctx: &SessionContext,
) -> Result<(), SessionError> {
    session.control().reply(responses::GREETING)?;

    loop {
        let raw = match session.control().receive()? {
            Incoming::Line(raw) => raw,
            Incoming::Overlong(len) => {
                warn!("Dropped {} byte command line from {}", len, client_addr);
                session.control().reply(responses::LINE_TOO_LONG)?;
                continue;
            }
            Incoming::Closed => {
                info!("Connection closed by client {}", client_addr);
                break;
            }
        };

        let line = parse_command(&raw);
        // Never log passwords
        if line.command == Command::PASS {
            info!("Received from {}: PASS ****", client_addr);
        } else {
            info!(
                "Received from {}: {:?} {}",
                client_addr, line.command, line.argument
            );
        }

        match handle_command(session, ctx, &line)? {
            CommandStatus::Success => {}
            CommandStatus::Failure(reason) => {
                debug!("{:?} from {} failed: {}", line.command, client_addr, reason)
            }
            CommandStatus::CloseConnection => {
                info!("Client {} requested to quit", client_addr);
                break;
            }
        }
    }

    Ok(())
}
