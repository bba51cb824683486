//! Native messaging framing and the request/response loop.
//!
//! Every frame is a 4-byte length prefix (`u32`, native byte order, the same
//! representation the browser uses) followed by that many bytes of UTF-8 JSON.
//! stdout carries nothing but frames, so all diagnostics go through `tracing`.

use serde::Serialize;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Host -> browser ceiling (1 MiB).
pub const MAX_TO_BROWSER: usize = 1_048_576;
/// Browser -> host ceiling (64 MiB).
pub const MAX_FROM_BROWSER: usize = 64 * 1_048_576;

const HEADER_LEN: usize = 4;

/// Transport-level failures. Apart from [`NmError::Disconnected`] all of these
/// end the loop: once framing is in doubt nothing more can be read safely.
#[derive(Debug, Error)]
pub enum NmError {
    /// The peer closed the stream on a frame boundary.
    #[error("peer disconnected")]
    Disconnected,

    #[error("message too large: {len} bytes (max {max})")]
    IncomingTooLarge { len: usize, max: usize },

    #[error("response too large: {len} bytes (max {max})")]
    OutgoingTooLarge { len: usize, max: usize },

    /// The stream ended inside a payload.
    #[error("truncated frame: expected {expected} bytes, received {received}")]
    Truncated { expected: usize, received: usize },

    #[error("message is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("invalid JSON in message: {0}")]
    DeserializeJson(#[source] serde_json::Error),

    #[error("failed to serialize response: {0}")]
    SerializeJson(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NmError {
    /// `true` for the normal shutdown signal (browser closed stdin).
    pub fn is_disconnect(&self) -> bool {
        matches!(self, NmError::Disconnected)
    }
}

/// Fill `buf` from `r`, returning how many bytes were read before EOF.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[inline]
fn read_u32_len<R: Read>(r: &mut R) -> Result<u32, NmError> {
    let mut len_buf = [0u8; HEADER_LEN];
    if read_full(r, &mut len_buf)? < HEADER_LEN {
        return Err(NmError::Disconnected);
    }
    Ok(u32::from_ne_bytes(len_buf))
}

/// Encode any serde-serializable value into a complete frame:
/// 4-byte native-endian length + JSON bytes.
pub fn encode_message<T: Serialize>(msg: &T) -> Result<Vec<u8>, NmError> {
    let json = serde_json::to_vec(msg).map_err(NmError::SerializeJson)?;
    if json.len() > MAX_TO_BROWSER {
        return Err(NmError::OutgoingTooLarge {
            len: json.len(),
            max: MAX_TO_BROWSER,
        });
    }
    let mut out = Vec::with_capacity(HEADER_LEN + json.len());
    out.extend_from_slice(&(json.len() as u32).to_ne_bytes());
    out.extend_from_slice(&json);
    Ok(out)
}

/// Decode a single framed message from a reader, returning the raw JSON text.
///
/// `max_size` is clamped to [`MAX_FROM_BROWSER`]. An oversized length prefix is
/// rejected before anything is allocated or read.
pub fn decode_message<R: Read>(reader: &mut R, max_size: usize) -> Result<String, NmError> {
    let len = read_u32_len(&mut *reader)? as usize;
    tracing::debug!(len, "received message length");

    let cap = max_size.min(MAX_FROM_BROWSER);
    if len > cap {
        return Err(NmError::IncomingTooLarge { len, max: cap });
    }

    let mut buf = vec![0u8; len];
    let received = read_full(reader, &mut buf)?;
    if received == 0 && len > 0 {
        // the browser went away between frames
        return Err(NmError::Disconnected);
    }
    if received < len {
        return Err(NmError::Truncated {
            expected: len,
            received,
        });
    }
    Ok(String::from_utf8(buf)?)
}

/// Read one frame and parse its payload as JSON.
pub fn read_message<R: Read>(reader: &mut R) -> Result<Value, NmError> {
    let raw = decode_message(reader, MAX_FROM_BROWSER)?;
    serde_json::from_str(&raw).map_err(NmError::DeserializeJson)
}

/// Write one complete frame and flush.
///
/// The frame is built in memory first, so a message that cannot be encoded
/// leaves the writer untouched.
pub fn write_message<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> Result<(), NmError> {
    let frame = encode_message(msg)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    tracing::debug!(len = frame.len() - HEADER_LEN, "sent message");
    Ok(())
}

/// Why [`serve`] returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The browser closed our stdin.
    Disconnected,
    /// [`StopSignal::request_stop`] was called.
    Interrupted,
}

/// Cooperative stop request shared between the loop and a signal watcher.
///
/// Frame writes happen while holding the gate, so once `request_stop` returns
/// no frame is in flight and none will start.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: AtomicBool,
    frame_gate: Mutex<()>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until any in-flight frame write completes.
    pub fn request_stop(&self) {
        let _gate = self.gate();
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        self.frame_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run the read -> handle -> reply loop until the peer disconnects, a stop is
/// requested, or the transport fails.
///
/// Requests are handled strictly one at a time. No reply is written for a
/// frame that failed to decode, and a reply is either written whole or not at all.
pub fn serve<R, W, T, F>(
    reader: &mut R,
    writer: &mut W,
    stop: &StopSignal,
    mut handler: F,
) -> Result<LoopExit, NmError>
where
    R: Read,
    W: Write,
    T: Serialize,
    F: FnMut(Value) -> T,
{
    tracing::info!("starting main loop");
    loop {
        if stop.is_stopped() {
            tracing::info!("stop requested, exiting loop");
            return Ok(LoopExit::Interrupted);
        }

        let request = match read_message(reader) {
            Ok(v) => v,
            Err(NmError::Disconnected) => {
                tracing::debug!("EOF reached, no more messages");
                return Ok(LoopExit::Disconnected);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read message");
                return Err(e);
            }
        };
        tracing::debug!(message = %request, "received message");

        let reply = handler(request);

        let _gate = stop.gate();
        if stop.is_stopped() {
            tracing::info!("stop requested, dropping pending reply");
            return Ok(LoopExit::Interrupted);
        }
        if let Err(e) = write_message(writer, &reply) {
            tracing::error!(error = %e, "failed to send response");
            return Err(e);
        }
    }
}
