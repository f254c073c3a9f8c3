//! Command handlers module for the Tandem FTP server.
//!
//! One handler per command. Each handler sends its own reply lines and
//! reports a [`CommandStatus`]; only a control-channel failure is returned
//! as an error, because it ends the session.

use log::{error, info, warn};
use std::io::{Read, Write};
use std::net::TcpStream;

use crate::client::Session;
use crate::error::handlers::{data_channel_reply, log_transfer_error};
use crate::error::{SessionError, TransferError};
use crate::protocol::address::{decode_address, encode_address};
use crate::protocol::commands::{Command, CommandLine};
use crate::protocol::framing::send;
use crate::protocol::responses;
use crate::server::SessionContext;
use crate::storage::resolve_virtual_path;
use crate::transfer::{AddressMode, TransferVariant, receive_stream, send_file};

/// Outcome of one command, after its replies have been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

type HandlerResult = Result<CommandStatus, SessionError>;

/// Dispatches a parsed command line to its handler.
pub fn handle_command<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
    line: &CommandLine,
) -> HandlerResult {
    let arg = line.argument.as_str();
    // Transfers fail without side effects until PORT or PASV picks a mode
    if line.command.is_transfer() && session.address_mode() == AddressMode::None {
        return reject(session, responses::NEED_DATA_MODE, "No data mode selected");
    }

    match line.command {
        Command::USER => handle_cmd_user(session, ctx, arg),
        Command::PASS => handle_cmd_pass(session, ctx, arg),
        Command::PWD => handle_cmd_pwd(session),
        Command::QUIT => handle_cmd_quit(session),
        Command::PORT => handle_cmd_port(session, arg),
        Command::PASV => handle_cmd_pasv(session, ctx),
        Command::RETR => handle_cmd_retr(session, ctx, arg),
        Command::SYST => acknowledge(session, responses::SYSTEM),
        Command::STOR => handle_cmd_stor(session, ctx, arg),
        Command::TYPE => handle_cmd_type(session, arg),
        Command::ABOR => acknowledge(session, responses::ABORT_OK),
        Command::LIST => handle_cmd_list(session, ctx, arg, true),
        Command::NLST => handle_cmd_list(session, ctx, arg, false),
        Command::MKD => handle_cmd_mkd(session, ctx, arg),
        Command::CWD => handle_cmd_cwd(session, ctx, arg),
        Command::RMD => handle_cmd_rmd(session, ctx, arg),
        Command::REST => handle_cmd_rest(session, arg),
        Command::MULT => handle_cmd_mult(session),
        Command::UNKNOWN => reject(session, responses::UNKNOWN_COMMAND, "Unknown command"),
    }
}

fn acknowledge<R: Read, W: Write>(session: &mut Session<R, W>, reply: &str) -> HandlerResult {
    session.control().reply(reply)?;
    Ok(CommandStatus::Success)
}

fn reject<R: Read, W: Write>(
    session: &mut Session<R, W>,
    reply: &str,
    reason: &str,
) -> HandlerResult {
    session.control().reply(reply)?;
    Ok(CommandStatus::Failure(reason.to_string()))
}

fn handle_cmd_user<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
    username: &str,
) -> HandlerResult {
    if username.is_empty() {
        return reject(session, responses::SYNTAX_ERROR, "USER requires a name");
    }
    if !ctx.verifier.verify_user(username) {
        warn!("Rejected user {}", username);
        return reject(session, responses::REJECT_USER, "Invalid username");
    }
    session.begin_login(username);
    acknowledge(session, responses::ACCEPT_USER)
}

fn handle_cmd_pass<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
    password: &str,
) -> HandlerResult {
    let Some(username) = session.username().map(str::to_string) else {
        return reject(session, responses::NEED_USER, "PASS before USER");
    };
    if !ctx.verifier.verify_password(&username, password) {
        warn!("Failed login for {}", username);
        session.set_authenticated(false);
        return reject(session, responses::REJECT_PASS, "Invalid password");
    }
    info!("User {} logged in", username);
    session.set_authenticated(true);
    acknowledge(session, responses::ACCEPT_PASS)
}

fn handle_cmd_pwd<R: Read, W: Write>(session: &mut Session<R, W>) -> HandlerResult {
    let reply = responses::current_directory(session.current_virtual_path());
    acknowledge(session, &reply)
}

fn handle_cmd_quit<R: Read, W: Write>(session: &mut Session<R, W>) -> HandlerResult {
    session.data_link_mut().teardown();
    session.control().reply(responses::GOODBYE)?;
    Ok(CommandStatus::CloseConnection)
}

/// PORT: an empty argument keeps the current mode and still acknowledges.
fn handle_cmd_port<R: Read, W: Write>(session: &mut Session<R, W>, arg: &str) -> HandlerResult {
    if arg.trim().is_empty() {
        return acknowledge(session, responses::ACCEPT_PORT);
    }
    match decode_address(arg.trim()) {
        Ok(addr) => {
            info!("Active mode target {}", addr);
            session.data_link_mut().select_active(addr);
            acknowledge(session, responses::ACCEPT_PORT)
        }
        Err(e) => {
            warn!("Bad PORT argument {:?}: {}", arg, e);
            reject(session, responses::REJECT_PORT, &e.to_string())
        }
    }
}

fn handle_cmd_pasv<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
) -> HandlerResult {
    let ports = ctx.config.data_port_range();
    match session.data_link_mut().open_passive(ctx.bind_ip, ports) {
        Ok(port) => {
            info!("Passive mode on port {}", port);
            let reply = responses::entering_passive(&encode_address(ctx.passive_ip, port));
            acknowledge(session, &reply)
        }
        Err(e) => {
            error!("PASV failed: {}", e);
            session.data_link_mut().teardown();
            reject(session, responses::REJECT_PASV, &e.to_string())
        }
    }
}

fn handle_cmd_type<R: Read, W: Write>(session: &mut Session<R, W>, arg: &str) -> HandlerResult {
    let code = arg.split_whitespace().next().unwrap_or("");
    match code.to_ascii_lowercase().as_str() {
        "i" | "l" => {
            session.set_binary(true);
            acknowledge(session, responses::ACCEPT_TYPE_BINARY)
        }
        "a" => {
            session.set_binary(false);
            acknowledge(session, responses::ACCEPT_TYPE_ASCII)
        }
        _ => reject(session, responses::SYNTAX_ERROR, "Unsupported TYPE"),
    }
}

/// REST: any non-numeric or negative argument clears the offset.
fn handle_cmd_rest<R: Read, W: Write>(session: &mut Session<R, W>, arg: &str) -> HandlerResult {
    match arg.trim().parse::<u64>() {
        Ok(offset) => {
            session.set_resume_offset(offset);
            acknowledge(session, &responses::restarting_at(offset))
        }
        Err(_) => {
            session.set_resume_offset(0);
            reject(session, responses::REJECT_REST, "Invalid restart offset")
        }
    }
}

fn handle_cmd_mult<R: Read, W: Write>(session: &mut Session<R, W>) -> HandlerResult {
    match session.toggle_transfer_variant() {
        TransferVariant::Pipelined => acknowledge(session, responses::PIPELINED_ON),
        TransferVariant::Sequential => acknowledge(session, responses::PIPELINED_OFF),
    }
}

fn handle_cmd_cwd<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
    arg: &str,
) -> HandlerResult {
    if arg.is_empty() {
        return reject(session, responses::SYNTAX_ERROR, "CWD requires a path");
    }
    let target = resolve_virtual_path(session.current_virtual_path(), arg);
    if !ctx.filesystem.is_dir(&target) {
        warn!("CWD to non-directory {}", target);
        return reject(session, responses::REJECT_CWD, "Not a directory");
    }
    session.set_current_virtual_path(target);
    acknowledge(session, responses::ACCEPT_CWD)
}

fn handle_cmd_mkd<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
    arg: &str,
) -> HandlerResult {
    if arg.is_empty() {
        return reject(session, responses::SYNTAX_ERROR, "MKD requires a path");
    }
    let target = resolve_virtual_path(session.current_virtual_path(), arg);
    match ctx.filesystem.make_dir(&target) {
        Ok(()) => {
            info!("Created directory {}", target);
            acknowledge(session, &responses::directory_created(&target))
        }
        Err(e) => {
            warn!("MKD {} failed: {}", target, e);
            reject(session, responses::REJECT_MKD, &e.to_string())
        }
    }
}

fn handle_cmd_rmd<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
    arg: &str,
) -> HandlerResult {
    if arg.is_empty() {
        return reject(session, responses::SYNTAX_ERROR, "RMD requires a path");
    }
    let target = resolve_virtual_path(session.current_virtual_path(), arg);
    if !ctx.filesystem.is_dir(&target) {
        return reject(session, responses::REJECT_RMD, "Not a directory");
    }
    match ctx.filesystem.remove_dir_all(&target) {
        Ok(()) => {
            info!("Removed directory {}", target);
            acknowledge(session, responses::ACCEPT_RMD)
        }
        Err(e) => {
            warn!("RMD {} failed: {}", target, e);
            reject(session, responses::REJECT_RMD, &e.to_string())
        }
    }
}

fn handle_cmd_retr<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
    arg: &str,
) -> HandlerResult {
    if arg.is_empty() {
        return reject(session, responses::SYNTAX_ERROR, "RETR requires a file name");
    }

    let path = resolve_virtual_path(session.current_virtual_path(), arg);
    if !ctx.filesystem.is_readable(&path) {
        warn!("RETR of missing file {}", path);
        return reject(session, responses::NO_SUCH_FILE, "No such file");
    }
    let mut file = match ctx.filesystem.open_read(&path) {
        Ok(file) => file,
        Err(e) => {
            error!("Cannot open {} for reading: {}", path, e);
            return reject(session, responses::CANNOT_READ, &e.to_string());
        }
    };

    let offset = session.resume_offset();
    let variant = session.transfer_variant();
    let chunk_size = ctx.config.buffer_size;
    let status = run_transfer(session, "RETR", |stream| {
        send_file(stream, &mut file, offset, chunk_size, variant).map(|_| ())
    });
    session.set_resume_offset(0);
    status
}

fn handle_cmd_stor<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
    arg: &str,
) -> HandlerResult {
    if arg.is_empty() {
        return reject(session, responses::SYNTAX_ERROR, "STOR requires a file name");
    }

    let path = resolve_virtual_path(session.current_virtual_path(), arg);
    let offset = session.resume_offset();
    let mut file = match ctx.filesystem.open_write(&path, offset) {
        Ok(file) => file,
        Err(e) => {
            error!("Cannot create {}: {}", path, e);
            return reject(session, responses::CANNOT_CREATE, &e.to_string());
        }
    };

    let chunk_size = ctx.config.buffer_size;
    let status = run_transfer(session, "STOR", |stream| {
        let received = receive_stream(&mut file, stream, chunk_size)?;
        info!("Stored {} bytes to {} at offset {}", received, path, offset);
        Ok(())
    });
    if ctx.config.store_resets_offset {
        session.set_resume_offset(0);
    }
    status
}

/// LIST (`long`) and NLST. Option words such as `-la` are ignored.
fn handle_cmd_list<R: Read, W: Write>(
    session: &mut Session<R, W>,
    ctx: &SessionContext,
    arg: &str,
    long: bool,
) -> HandlerResult {

    let target = arg
        .split_whitespace()
        .find(|word| !word.starts_with('-'))
        .unwrap_or("");
    let path = resolve_virtual_path(session.current_virtual_path(), target);
    if !ctx.filesystem.exists(&path) {
        return reject(session, responses::NO_SUCH_FILE, "No such file or directory");
    }
    let lines = match ctx.filesystem.list(&path, long) {
        Ok(lines) => lines,
        Err(e) => {
            error!("Listing {} failed: {}", path, e);
            return reject(session, responses::CANNOT_READ, &e.to_string());
        }
    };

    let command = if long { "LIST" } else { "NLST" };
    run_transfer(session, command, |stream| {
        for line in &lines {
            send(stream, format!("{line}\r\n").as_bytes(), "send_list")?;
        }
        Ok(())
    })
}

/// Establishes the data channel, announces the transfer, runs `transfer`
/// over the stream, and reports the outcome.
///
/// The data link is torn down exactly once on every path.
fn run_transfer<R, W, F>(session: &mut Session<R, W>, command: &str, transfer: F) -> HandlerResult
where
    R: Read,
    W: Write,
    F: FnOnce(&mut TcpStream) -> Result<(), TransferError>,
{
    let (control, link) = session.channels();

    let stream = match link.establish() {
        Ok(stream) => stream,
        Err(e) => {
            warn!("{} data channel not established: {}", command, e);
            link.teardown();
            control.reply(data_channel_reply(&e))?;
            return Ok(CommandStatus::Failure(e.to_string()));
        }
    };

    let result = match control.reply(responses::TRANSFER_START) {
        Ok(()) => transfer(stream),
        Err(e) => {
            link.teardown();
            return Err(e.into());
        }
    };
    link.teardown();

    match result {
        Ok(()) => {
            info!("{} complete", command);
            control.reply(responses::TRANSFER_SUCCESS)?;
            Ok(CommandStatus::Success)
        }
        Err(e) => {
            log_transfer_error(command, &e);
            control.reply(responses::TRANSFER_FAILED)?;
            Ok(CommandStatus::Failure(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AcceptAll, CredentialVerifier, StaticCredentials};
    use crate::config::ServerConfig;
    use crate::protocol::framing::ControlChannel;
    use crate::protocol::parse_command;
    use crate::storage::LocalFilesystem;
    use std::collections::HashMap;
    use std::fs;
    use std::io::Cursor;
    use std::net::{Ipv4Addr, SocketAddrV4};
    use std::sync::Arc;
    use std::time::Duration;

    type TestSession = Session<Cursor<Vec<u8>>, Vec<u8>>;

    fn context(root: &std::path::Path, verifier: Arc<dyn CredentialVerifier>) -> SessionContext {
        let config = ServerConfig {
            bind_address: "127.0.0.1".into(),
            passive_address: "127.0.0.1".into(),
            server_root: root.to_string_lossy().into_owned(),
            ..ServerConfig::default()
        };
        let filesystem = Arc::new(LocalFilesystem::new(root));
        SessionContext::with_capabilities(config, verifier, filesystem).unwrap()
    }

    fn setup() -> (tempfile::TempDir, SessionContext, TestSession) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data.bin"), b"0123456789").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        let ctx = context(dir.path(), Arc::new(AcceptAll));
        let control = ControlChannel::new(Cursor::new(Vec::new()), Vec::new(), 256);
        (dir, ctx, Session::new(control, Duration::from_secs(1)))
    }

    fn run(session: &mut TestSession, ctx: &SessionContext, line: &str) -> CommandStatus {
        handle_command(session, ctx, &parse_command(line)).unwrap()
    }

    /// Everything written to the control channel so far.
    fn transcript(session: &mut TestSession) -> String {
        String::from_utf8_lossy(session.control().writer()).into_owned()
    }

    fn last_reply(session: &mut TestSession) -> String {
        transcript(session)
            .lines()
            .last()
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn rest_sets_or_clears_offset() {
        let (_dir, ctx, mut session) = setup();

        assert_eq!(run(&mut session, &ctx, "REST 1024\r\n"), CommandStatus::Success);
        assert_eq!(session.resume_offset(), 1024);
        assert!(last_reply(&mut session).starts_with("350"));

        for bad in ["REST abc", "REST -5", "REST"] {
            session.set_resume_offset(7);
            assert!(matches!(run(&mut session, &ctx, bad), CommandStatus::Failure(_)));
            assert_eq!(session.resume_offset(), 0);
            assert!(last_reply(&mut session).starts_with("501"));
        }
    }

    #[test]
    fn type_accepts_image_and_ascii() {
        let (_dir, ctx, mut session) = setup();
        run(&mut session, &ctx, "TYPE A");
        assert!(!session.is_binary());
        run(&mut session, &ctx, "type i");
        assert!(session.is_binary());
        assert!(matches!(run(&mut session, &ctx, "TYPE E"), CommandStatus::Failure(_)));
        assert!(last_reply(&mut session).starts_with("501"));
    }

    #[test]
    fn mult_toggles_variant() {
        let (_dir, ctx, mut session) = setup();
        run(&mut session, &ctx, "MULT");
        assert_eq!(session.transfer_variant(), TransferVariant::Pipelined);
        run(&mut session, &ctx, "MULT");
        assert_eq!(session.transfer_variant(), TransferVariant::Sequential);
    }

    #[test]
    fn port_selects_active_mode() {
        let (_dir, ctx, mut session) = setup();

        run(&mut session, &ctx, "PORT 127,0,0,1,4,1");
        assert_eq!(
            session.address_mode(),
            AddressMode::Active(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 1025))
        );

        assert!(matches!(
            run(&mut session, &ctx, "PORT 127,0,0,1,999,1"),
            CommandStatus::Failure(_)
        ));
        assert!(last_reply(&mut session).starts_with("501"));
        assert!(matches!(session.address_mode(), AddressMode::Active(_)));

        assert_eq!(run(&mut session, &ctx, "PORT"), CommandStatus::Success);
        assert!(last_reply(&mut session).starts_with("200"));
        assert!(matches!(session.address_mode(), AddressMode::Active(_)));
    }

    #[test]
    fn pasv_opens_listener_and_reports_address() {
        let (_dir, ctx, mut session) = setup();
        assert_eq!(run(&mut session, &ctx, "PASV"), CommandStatus::Success);
        assert_eq!(session.address_mode(), AddressMode::Passive);
        assert!(session.data_link().has_listener());
        let reply = last_reply(&mut session);
        assert!(reply.starts_with("227 Entering Passive Mode (127,0,0,1,"));
    }

    #[test]
    fn pasv_advertises_configured_address() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            bind_address: "127.0.0.1".into(),
            passive_address: "10.0.0.5".into(),
            server_root: dir.path().to_string_lossy().into_owned(),
            ..ServerConfig::default()
        };
        let filesystem = Arc::new(LocalFilesystem::new(dir.path()));
        let ctx = SessionContext::with_capabilities(config, Arc::new(AcceptAll), filesystem).unwrap();
        let control = ControlChannel::new(Cursor::new(Vec::new()), Vec::new(), 256);
        let mut session: TestSession = Session::new(control, Duration::from_secs(1));

        assert_eq!(run(&mut session, &ctx, "PASV"), CommandStatus::Success);
        let reply = last_reply(&mut session);
        assert!(reply.starts_with("227 Entering Passive Mode (10,0,0,5,"), "{}", reply);
    }

    #[test]
    fn transfer_without_mode_needs_port_or_pasv() {
        let (_dir, ctx, mut session) = setup();
        for line in ["RETR data.bin", "STOR up.bin", "LIST", "NLST", "RETR"] {
            assert!(matches!(run(&mut session, &ctx, line), CommandStatus::Failure(_)));
            assert_eq!(last_reply(&mut session), responses::NEED_DATA_MODE.trim_end());
            assert_eq!(session.address_mode(), AddressMode::None);
            assert!(!session.data_link().has_stream());
        }
    }

    #[test]
    fn retr_missing_file_keeps_mode() {
        let (_dir, ctx, mut session) = setup();
        run(&mut session, &ctx, "PASV");
        session.set_resume_offset(3);

        assert!(matches!(
            run(&mut session, &ctx, "RETR missing.bin"),
            CommandStatus::Failure(_)
        ));
        assert!(last_reply(&mut session).starts_with("550"));
        assert_eq!(session.address_mode(), AddressMode::Passive);
        assert!(session.data_link().has_listener());
        assert_eq!(session.resume_offset(), 3);
    }

    #[test]
    fn retr_with_refused_connection_tears_down() {
        let (_dir, ctx, mut session) = setup();
        // Bind and drop to find a port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        run(
            &mut session,
            &ctx,
            &format!("PORT 127,0,0,1,{},{}", port / 256, port % 256),
        );
        session.set_resume_offset(4);

        assert!(matches!(
            run(&mut session, &ctx, "RETR data.bin"),
            CommandStatus::Failure(_)
        ));
        assert_eq!(last_reply(&mut session), responses::DATA_CONNECT_FAILED.trim_end());
        assert_eq!(session.address_mode(), AddressMode::None);
        assert_eq!(session.resume_offset(), 0);
    }

    #[test]
    fn directory_commands_move_within_root() {
        let (dir, ctx, mut session) = setup();

        run(&mut session, &ctx, "CWD docs");
        assert_eq!(session.current_virtual_path(), "/docs");
        run(&mut session, &ctx, "PWD");
        assert_eq!(last_reply(&mut session), "257 \"/docs\" is the current directory.");

        run(&mut session, &ctx, "MKD inner");
        assert!(dir.path().join("docs/inner").is_dir());
        assert!(last_reply(&mut session).starts_with("257 \"/docs/inner\""));

        assert!(matches!(run(&mut session, &ctx, "CWD nope"), CommandStatus::Failure(_)));
        assert_eq!(session.current_virtual_path(), "/docs");

        run(&mut session, &ctx, "CWD ../../..");
        assert_eq!(session.current_virtual_path(), "/");

        run(&mut session, &ctx, "RMD docs");
        assert!(!dir.path().join("docs").exists());
        assert!(matches!(run(&mut session, &ctx, "RMD data.bin"), CommandStatus::Failure(_)));
        assert!(dir.path().join("data.bin").exists());
    }

    #[test]
    fn login_consults_verifier() {
        let dir = tempfile::tempdir().unwrap();
        let users = HashMap::from([("alice".to_string(), "secret".to_string())]);
        let ctx = context(dir.path(), Arc::new(StaticCredentials::new(users)));
        let control = ControlChannel::new(Cursor::new(Vec::new()), Vec::new(), 256);
        let mut session: TestSession = Session::new(control, Duration::from_secs(1));

        assert!(matches!(run(&mut session, &ctx, "PASS x"), CommandStatus::Failure(_)));
        assert!(last_reply(&mut session).starts_with("503"));

        assert!(matches!(run(&mut session, &ctx, "USER mallory"), CommandStatus::Failure(_)));
        run(&mut session, &ctx, "USER alice");
        run(&mut session, &ctx, "PASS wrong");
        assert!(!session.is_authenticated());
        run(&mut session, &ctx, "PASS secret");
        assert!(session.is_authenticated());
        assert!(last_reply(&mut session).starts_with("230"));
    }

    #[test]
    fn unknown_and_quit() {
        let (_dir, ctx, mut session) = setup();
        assert!(matches!(run(&mut session, &ctx, "FEAT"), CommandStatus::Failure(_)));
        assert!(last_reply(&mut session).starts_with("500"));
        assert_eq!(run(&mut session, &ctx, "SYST"), CommandStatus::Success);
        assert_eq!(run(&mut session, &ctx, "ABOR"), CommandStatus::Success);
        assert_eq!(run(&mut session, &ctx, "QUIT"), CommandStatus::CloseConnection);
        assert!(last_reply(&mut session).starts_with("221"));
    }
}
