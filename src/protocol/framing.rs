//! Control channel framing
//!
//! Line-oriented reads and full-payload writes over the control connection.

use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};

use crate::error::{IoFailure, IoOp};

/// Writes the whole payload, retrying short writes until every byte is sent.
///
/// No delimiter is appended; callers include their own line terminator.
pub fn send<W: Write + ?Sized>(
    channel: &mut W,
    bytes: &[u8],
    context: &'static str,
) -> Result<(), IoFailure> {
    let mut sent = 0;
    while sent < bytes.len() {
        match channel.write(&bytes[sent..]) {
            Ok(0) => {
                return Err(IoFailure::new(
                    IoOp::Write,
                    context,
                    io::Error::from(ErrorKind::WriteZero),
                ));
            }
            Ok(n) => sent += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(IoFailure::new(IoOp::Write, context, e)),
        }
    }
    channel
        .flush()
        .map_err(|e| IoFailure::new(IoOp::Write, context, e))
}

/// What one read from the control channel produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Line(String),
    /// A line longer than the bound; carries its full length in bytes.
    Overlong(usize),
    Closed,
}

/// The command/reply connection of one session.
///
/// Owns both halves of the control connection; dropping it closes them.
pub struct ControlChannel<R, W> {
    reader: BufReader<R>,
    writer: W,
    max_line: usize,
}

impl<R: Read, W: Write> ControlChannel<R, W> {
    pub fn new(reader: R, writer: W, max_line: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            max_line,
        }
    }

    /// Reads one line of protocol text, at most `max_line` bytes.
    ///
    /// A line that hits the bound without a terminator is dropped through
    /// its `\n` and reported as [`Incoming::Overlong`]; none of it is ever
    /// handed out as a command.
    pub fn receive(&mut self) -> Result<Incoming, IoFailure> {
        let mut line = Vec::new();
        let limit = self.max_line as u64;
        loop {
            match (&mut self.reader).take(limit).read_until(b'\n', &mut line) {
                Ok(0) if line.is_empty() => return Ok(Incoming::Closed),
                Ok(_) if line.len() as u64 >= limit && !line.ends_with(b"\n") => {
                    let skipped = self.skip_line()?;
                    return Ok(Incoming::Overlong(line.len() + skipped));
                }
                Ok(_) => return Ok(Incoming::Line(String::from_utf8_lossy(&line).into_owned())),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(IoFailure::new(IoOp::Read, "read_msg", e)),
            }
        }
    }

    /// Consumes input up to and including the next `\n` (or end of input)
    /// without buffering it. Returns the number of bytes dropped.
    fn skip_line(&mut self) -> Result<usize, IoFailure> {
        let mut skipped = 0;
        loop {
            let buf = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(IoFailure::new(IoOp::Read, "read_msg", e)),
            };
            if buf.is_empty() {
                return Ok(skipped);
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.reader.consume(end + 1);
                    return Ok(skipped + end + 1);
                }
                None => {
                    let n = buf.len();
                    self.reader.consume(n);
                    skipped += n;
                }
            }
        }
    }

    /// Sends one reply line.
    pub fn reply(&mut self, message: &str) -> Result<(), IoFailure> {
        send(&mut self.writer, message.as_bytes(), "send_msg")
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Accepts at most `step` bytes per write call.
    struct Trickle {
        written: Vec<u8>,
        step: usize,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.step);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn send_retries_short_writes() {
        let mut sink = Trickle {
            written: Vec::new(),
            step: 3,
        };
        send(&mut sink, b"226 Transfer complete.\r\n", "test").unwrap();
        assert_eq!(sink.written, b"226 Transfer complete.\r\n");
    }

    #[test]
    fn send_tags_failure_as_write() {
        let err = send(&mut Broken, b"hello", "test").unwrap_err();
        assert_eq!(err.op, IoOp::Write);
        assert_eq!(err.context, "test");
    }

    #[test]
    fn receive_returns_lines_then_closed() {
        let input = Cursor::new(b"USER bob\r\nPASS x\r\nQUIT".to_vec());
        let mut channel = ControlChannel::new(input, Vec::new(), 8191);
        assert_eq!(channel.receive().unwrap(), Incoming::Line("USER bob\r\n".into()));
        assert_eq!(channel.receive().unwrap(), Incoming::Line("PASS x\r\n".into()));
        assert_eq!(channel.receive().unwrap(), Incoming::Line("QUIT".into()));
        assert_eq!(channel.receive().unwrap(), Incoming::Closed);
    }

    #[test]
    fn overlong_line_is_dropped_whole() {
        let input = Cursor::new(b"CWD aaaaaaaaaaRMD docs\r\nPWD\r\n".to_vec());
        let mut channel = ControlChannel::new(input, Vec::new(), 8);
        assert_eq!(channel.receive().unwrap(), Incoming::Overlong(24));
        assert_eq!(channel.receive().unwrap(), Incoming::Line("PWD\r\n".into()));
        assert_eq!(channel.receive().unwrap(), Incoming::Closed);
    }

    #[test]
    fn line_filling_the_bound_exactly_is_kept() {
        let input = Cursor::new(b"abc\nabcd".to_vec());
        let mut channel = ControlChannel::new(input, Vec::new(), 4);
        assert_eq!(channel.receive().unwrap(), Incoming::Line("abc\n".into()));
        assert_eq!(channel.receive().unwrap(), Incoming::Overlong(4));
        assert_eq!(channel.receive().unwrap(), Incoming::Closed);
    }

    #[test]
    fn reply_writes_verbatim() {
        let mut channel = ControlChannel::new(Cursor::new(Vec::new()), Vec::new(), 64);
        channel.reply("200 ok\r\n").unwrap();
        assert_eq!(channel.writer(), b"200 ok\r\n");
    }
}
