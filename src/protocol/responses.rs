//! FTP Response handling
//!
//! Reply lines sent over the control channel. Every line carries its own
//! CRLF terminator; the framing layer adds nothing.

pub const GREETING: &str = "220 Tandem FTP server ready.\r\n";
pub const GOODBYE: &str = "221 Goodbye.\r\n";

pub const ACCEPT_USER: &str = "331 User name okay, need password.\r\n";
pub const REJECT_USER: &str = "530 User name rejected.\r\n";
pub const ACCEPT_PASS: &str = "230 User logged in, proceed.\r\n";
pub const REJECT_PASS: &str = "530 Login incorrect.\r\n";
pub const NEED_USER: &str = "503 Login with USER first.\r\n";

pub const SYSTEM: &str = "215 UNIX Type: L8\r\n";
pub const ACCEPT_TYPE_BINARY: &str = "200 Type set to I.\r\n";
pub const ACCEPT_TYPE_ASCII: &str = "200 Type set to A.\r\n";
pub const ABORT_OK: &str = "226 ABOR command successful; no transfer in progress.\r\n";

pub const ACCEPT_PORT: &str = "200 PORT command successful.\r\n";
pub const REJECT_PORT: &str = "501 Invalid PORT address.\r\n";
pub const REJECT_PASV: &str = "425 Cannot enter passive mode.\r\n";

pub const NEED_DATA_MODE: &str = "425 Use PORT or PASV first.\r\n";
pub const DATA_CONNECT_FAILED: &str = "425 Cannot open data connection.\r\n";
pub const DATA_ACCEPT_FAILED: &str = "425 Cannot accept data connection.\r\n";

pub const TRANSFER_START: &str = "150 Opening data connection.\r\n";
pub const TRANSFER_SUCCESS: &str = "226 Transfer complete.\r\n";
pub const TRANSFER_FAILED: &str = "451 Transfer failed.\r\n";
pub const NO_SUCH_FILE: &str = "550 No such file or directory.\r\n";
pub const CANNOT_READ: &str = "550 Cannot read file.\r\n";
pub const CANNOT_CREATE: &str = "553 Cannot create file.\r\n";

pub const ACCEPT_CWD: &str = "250 Directory changed.\r\n";
pub const REJECT_CWD: &str = "550 Cannot change directory.\r\n";
pub const REJECT_MKD: &str = "550 Cannot create directory.\r\n";
pub const ACCEPT_RMD: &str = "250 Directory removed.\r\n";
pub const REJECT_RMD: &str = "550 Cannot remove directory.\r\n";

pub const REJECT_REST: &str = "501 Invalid restart offset.\r\n";
pub const PIPELINED_ON: &str = "200 Pipelined transfer enabled.\r\n";
pub const PIPELINED_OFF: &str = "200 Pipelined transfer disabled.\r\n";

pub const SYNTAX_ERROR: &str = "501 Syntax error in parameters or arguments.\r\n";
pub const UNKNOWN_COMMAND: &str = "500 Unknown command.\r\n";
pub const LINE_TOO_LONG: &str = "500 Command line too long.\r\n";

/// `227` reply embedding the comma-encoded passive address.
pub fn entering_passive(encoded: &str) -> String {
    format!("227 Entering Passive Mode ({encoded}).\r\n")
}

/// `257` reply naming the current virtual directory.
pub fn current_directory(virtual_path: &str) -> String {
    format!("257 \"{virtual_path}\" is the current directory.\r\n")
}

/// `257` reply for a created directory.
pub fn directory_created(virtual_path: &str) -> String {
    format!("257 \"{virtual_path}\" created.\r\n")
}

/// `350` reply acknowledging a restart offset.
pub fn restarting_at(offset: u64) -> String {
    format!("350 Restarting at {offset}.\r\n")
}
