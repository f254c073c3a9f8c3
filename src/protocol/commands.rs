//! Module `commands`
//!
//! Defines the FTP command table and the line parser that maps a raw control
//! line onto a command and its raw argument.

/// Represents an FTP command recognized by the server.
///
/// Arguments are kept separately in [`CommandLine`] because every command
/// shares the same tokenization rule.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    USER,
    PASS,
    PWD, // also XPWD
    QUIT,
    PORT,
    PASV,
    RETR,
    SYST,
    STOR,
    TYPE,
    ABOR,
    LIST,
    NLST,
    MKD,
    CWD,
    RMD,
    REST,
    MULT,    // toggles the pipelined transfer variant
    UNKNOWN, // not in the table; answered with a generic rejection
}

impl Command {
    /// Looks up a lowercased command word.
    fn from_word(word: &str) -> Command {
        match word {
            "user" => Command::USER,
            "pass" => Command::PASS,
            "pwd" | "xpwd" => Command::PWD,
            "quit" => Command::QUIT,
            "port" => Command::PORT,
            "pasv" => Command::PASV,
            "retr" => Command::RETR,
            "syst" => Command::SYST,
            "stor" => Command::STOR,
            "type" => Command::TYPE,
            "abor" => Command::ABOR,
            "list" => Command::LIST,
            "nlst" => Command::NLST,
            "mkd" => Command::MKD,
            "cwd" => Command::CWD,
            "rmd" => Command::RMD,
            "rest" => Command::REST,
            "mult" => Command::MULT,
            _ => Command::UNKNOWN,
        }
    }

    /// True for commands that consume the selected data mode.
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            Command::RETR | Command::STOR | Command::LIST | Command::NLST
        )
    }
}

/// A parsed control line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub command: Command,
    pub argument: String,
}

/// Removes up to two trailing CR/LF bytes.
pub fn strip_crlf(text: &str) -> &str {
    let is_eol = |c: char| c == '\r' || c == '\n';
    let mut stripped = text;
    for _ in 0..2 {
        match stripped.strip_suffix(is_eol) {
            Some(rest) => stripped = rest,
            None => break,
        }
    }
    stripped
}

/// Parses a raw control line into a [`CommandLine`].
///
/// The line is split at the first blank: the word before it is the command,
/// everything after it is the raw argument. Both halves lose trailing CR/LF
/// and the command word is matched case-insensitively. Unrecognized words
/// yield [`Command::UNKNOWN`].
pub fn parse_command(raw: &str) -> CommandLine {
    let (word, argument) = match raw.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (raw, ""),
    };
    let word = strip_crlf(word).to_ascii_lowercase();

    CommandLine {
        command: Command::from_word(&word),
        argument: strip_crlf(argument).to_string(),
    }
}
