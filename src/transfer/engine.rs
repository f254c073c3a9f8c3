//! Transfer engine
//!
//! Streams bytes between a source and a destination. Downloads use either
//! the sequential single-buffer loop or the pipelined double-buffer loop;
//! both produce identical output and the same error contract. Uploads use
//! [`receive_stream`], which runs until the source signals end of data.
//!
//! The engine never closes descriptors it did not open and never writes to
//! the control channel.

use log::{debug, info};
use std::cmp;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::mem;
use std::thread;

use crate::error::{IoFailure, IoOp, TransferError};
use crate::protocol::framing::send;
use crate::transfer::modes::TransferVariant;

/// One download: `total` bytes from `offset`, moved in `chunk_size` pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub offset: u64,
    pub total: u64,
    pub chunk_size: usize,
}

impl TransferRequest {
    fn next_read_len(&self, remaining: u64) -> usize {
        cmp::min(remaining, self.chunk_size as u64) as usize
    }
}

/// Reads once into `buf`, retrying interrupted reads.
fn read_chunk<S: Read + ?Sized>(
    source: &mut S,
    buf: &mut [u8],
    context: &'static str,
) -> Result<usize, IoFailure> {
    loop {
        match source.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(IoFailure::new(IoOp::Read, context, e)),
        }
    }
}

fn seek_to<S: Seek + ?Sized>(source: &mut S, offset: u64) -> Result<(), IoFailure> {
    source
        .seek(SeekFrom::Start(offset))
        .map(|_| ())
        .map_err(|e| IoFailure::new(IoOp::Seek, "send_file", e))
}

/// Single-buffer download: read a chunk, write it in full, repeat.
pub fn send_sequential<S, D>(
    dest: &mut D,
    source: &mut S,
    request: &TransferRequest,
) -> Result<u64, TransferError>
where
    S: Read + Seek + ?Sized,
    D: Write + ?Sized,
{
    seek_to(source, request.offset)?;

    let mut buf = vec![0u8; request.chunk_size];
    let mut remaining = request.total;
    while remaining > 0 {
        let want = request.next_read_len(remaining);
        let n = read_chunk(source, &mut buf[..want], "send_file")?;
        if n == 0 {
            return Err(TransferError::UnexpectedEof { remaining });
        }
        send(dest, &buf[..n], "send_file")?;
        remaining -= n as u64;
    }
    Ok(request.total)
}

/// Writes `pending` on a worker thread while the caller reads into `next`.
///
/// Exactly one worker exists, and it is joined before this returns, so the
/// caller never holds more than one outstanding handle. A failed write is
/// carried back through the join rather than dropped.
fn write_while_reading<S, D>(
    dest: &mut D,
    pending: &[u8],
    source: &mut S,
    next: &mut [u8],
) -> Result<usize, TransferError>
where
    S: Read + ?Sized,
    D: Write + Send + ?Sized,
{
    thread::scope(|scope| -> Result<usize, TransferError> {
        let writer = scope.spawn(|| send(dest, pending, "send_file_mt"));
        let read = read_chunk(source, next, "send_file_mt");
        let written = writer.join().map_err(|_| TransferError::WorkerPanicked)?;
        let n = read?;
        written?;
        Ok(n)
    })
}

/// Double-buffer download.
///
/// A seed read fills the front buffer. Each round then writes the front
/// buffer on a worker while the back buffer is filled, joins the worker, and
/// swaps the buffers. The last filled buffer is flushed synchronously once
/// the read side is exhausted.
pub fn send_pipelined<S, D>(
    dest: &mut D,
    source: &mut S,
    request: &TransferRequest,
) -> Result<u64, TransferError>
where
    S: Read + Seek + ?Sized,
    D: Write + Send + ?Sized,
{
    seek_to(source, request.offset)?;

    let mut front = vec![0u8; request.chunk_size];
    let mut back = vec![0u8; request.chunk_size];
    let mut remaining = request.total;

    let want = request.next_read_len(remaining);
    let mut filled = read_chunk(source, &mut front[..want], "send_file_mt")?;
    if filled == 0 && want > 0 {
        return Err(TransferError::UnexpectedEof { remaining });
    }
    remaining -= filled as u64;

    while remaining > 0 {
        let want = request.next_read_len(remaining);
        let n = write_while_reading(dest, &front[..filled], source, &mut back[..want])?;
        if n == 0 {
            return Err(TransferError::UnexpectedEof { remaining });
        }
        remaining -= n as u64;
        mem::swap(&mut front, &mut back);
        filled = n;
    }

    send(dest, &front[..filled], "send_file_mt")?;
    Ok(request.total)
}

/// Sends `source` from `offset` to its end using the chosen variant.
///
/// An offset past the end of the file sends nothing.
pub fn send_file<D>(
    dest: &mut D,
    source: &mut File,
    offset: u64,
    chunk_size: usize,
    variant: TransferVariant,
) -> Result<u64, TransferError>
where
    D: Write + Send + ?Sized,
{
    let size = source
        .metadata()
        .map_err(|e| IoFailure::new(IoOp::Read, "send_file", e))?
        .len();
    let request = TransferRequest {
        offset,
        total: size.saturating_sub(offset),
        chunk_size,
    };
    info!(
        "Start file transfer: {} bytes from offset {} ({:?})",
        request.total, offset, variant
    );

    let sent = match variant {
        TransferVariant::Sequential => send_sequential(dest, source, &request)?,
        TransferVariant::Pipelined => send_pipelined(dest, source, &request)?,
    };
    info!("Transfer success: {} bytes", sent);
    Ok(sent)
}

/// Upload loop: copies chunks from `source` to `dest` until a read returns
/// zero bytes. Returns the number of bytes moved.
pub fn receive_stream<D, S>(dest: &mut D, source: &mut S, chunk_size: usize) -> Result<u64, TransferError>
where
    D: Write + ?Sized,
    S: Read + ?Sized,
{
    let mut buf = vec![0u8; chunk_size];
    let mut received = 0u64;
    loop {
        let n = read_chunk(source, &mut buf, "recv_file")?;
        if n == 0 {
            break;
        }
        send(dest, &buf[..n], "recv_file")?;
        received += n as u64;
    }
    debug!("Received {} bytes", received);
    Ok(received)
}
