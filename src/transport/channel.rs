//! # Transport Channel
//!
//! Turns one request frame into exactly one decoded [`Response`] over an
//! unreliable byte stream.
//!
//! ## Exchange
//!
//! 1. Write the frame and flush.
//! 2. Read until a complete response frame arrives. While reading:
//!    - bytes before the preamble are discarded
//!    - `SYN` means the device is still working; keep waiting
//!    - `NAK` means the device rejected the frame; resend at once
//!    - a read that returns nothing (timeout or EOF) ends the attempt
//!    - a reply to some other sequence/command is stale and skipped
//! 3. A frame that cannot be decoded ends the attempt like a timeout.
//!
//! The identical frame is resent on every attempt. After `max_retries`
//! failed attempts the exchange fails with [`Fp705Error::RequestTimeout`].
//!
//! A decoded frame is a successful exchange even when its status block
//! reports a device error; interpreting status is left to the caller.

use std::fmt;
use std::io::{ErrorKind, Read, Write};

use tracing::{debug, trace, warn};

use crate::error::Fp705Error;
use crate::protocol::commands::{LENGTH_OFFSET, NAK, PREAMBLE, SYN};
use crate::protocol::frame::{FrameError, MIN_RESPONSE_LEN, Response, decode_word};

/// `SYN` bytes tolerated within a single attempt before giving up on it.
pub const MAX_BUSY_SIGNALS: usize = 1000;

/// Declared response length minus this gives the full frame size
/// (adds preamble, BCC and terminator, removes the fixed offset).
const LENGTH_TO_FRAME: usize = LENGTH_OFFSET - 1 - 4 - 1;

/// Why one attempt produced no response.
#[derive(Debug)]
enum AttemptFailure {
    Timeout,
    Nak,
    Busy,
    Malformed(FrameError),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Timeout => f.write_str("read timed out"),
            AttemptFailure::Nak => f.write_str("device sent NAK"),
            AttemptFailure::Busy => f.write_str("device stayed busy"),
            AttemptFailure::Malformed(e) => write!(f, "malformed response: {}", e),
        }
    }
}

/// Request/response channel over a borrowed byte stream.
///
/// The stream's read timeout bounds each attempt; see
/// [`SerialPort`](crate::transport::SerialPort) for a TTY with one.
pub struct IoChannel<'a, S: Read + Write> {
    stream: &'a mut S,
    max_retries: u32,
}

impl<'a, S: Read + Write> IoChannel<'a, S> {
    /// Wrap `stream`, allowing up to `max_retries` attempts per frame (at least one).
    pub fn new(stream: &'a mut S, max_retries: u32) -> Self {
        Self {
            stream,
            max_retries: max_retries.max(1),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Send `frame` and wait for the matching response.
    ///
    /// ## Errors
    ///
    /// - [`Fp705Error::RequestTimeout`] once every attempt has failed
    /// - [`Fp705Error::Io`] for stream errors other than a read timeout
    pub fn send_packet(&mut self, frame: &[u8]) -> Result<Response, Fp705Error> {
        let expected = frame_identity(frame);

        for attempt in 1..=self.max_retries {
            trace!(attempt, frame = ?frame, "sending frame");
            self.stream.write_all(frame)?;
            self.stream.flush()?;

            match self.read_response(expected)? {
                Ok(response) => {
                    debug!(
                        seq = response.seq(),
                        cmd = response.command(),
                        data_len = response.data().len(),
                        "response received"
                    );
                    return Ok(response);
                }
                Err(failure) => {
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        "no valid response: {}",
                        failure
                    );
                }
            }
        }

        Err(Fp705Error::RequestTimeout {
            attempts: self.max_retries,
        })
    }

    /// Read one response frame. The outer `Result` carries stream errors,
    /// the inner one a failed attempt.
    fn read_response(
        &mut self,
        expected: Option<(u8, u16)>,
    ) -> Result<Result<Response, AttemptFailure>, Fp705Error> {
        let mut buf: Vec<u8> = Vec::new();
        let mut frame_len: Option<usize> = None;
        let mut busy = 0usize;

        loop {
            let Some(byte) = self.read_byte()? else {
                return Ok(Err(AttemptFailure::Timeout));
            };

            if buf.is_empty() {
                match byte {
                    PREAMBLE => buf.push(byte),
                    NAK => return Ok(Err(AttemptFailure::Nak)),
                    SYN => {
                        busy += 1;
                        if busy > MAX_BUSY_SIGNALS {
                            return Ok(Err(AttemptFailure::Busy));
                        }
                    }
                    other => trace!(byte = other, "discarding byte outside frame"),
                }
                continue;
            }

            buf.push(byte);

            if buf.len() == 5 {
                match decode_word(&buf[1..5]).map(|declared| declared as usize) {
                    Some(declared) if declared >= MIN_RESPONSE_LEN + LENGTH_TO_FRAME => {
                        frame_len = Some(declared - LENGTH_TO_FRAME);
                    }
                    _ => return Ok(Err(AttemptFailure::Malformed(FrameError::BadWord("length")))),
                }
            }

            if frame_len == Some(buf.len()) {
                let response = match Response::decode(&buf) {
                    Ok(response) => response,
                    Err(e) => return Ok(Err(AttemptFailure::Malformed(e))),
                };

                if expected.is_some_and(|id| id != (response.seq(), response.command())) {
                    debug!(
                        seq = response.seq(),
                        cmd = response.command(),
                        "skipping stale response"
                    );
                    buf.clear();
                    frame_len = None;
                    continue;
                }

                return Ok(Ok(response));
            }
        }
    }

    /// Read a single byte; `None` when the stream has nothing within its timeout.
    fn read_byte(&mut self) -> Result<Option<u8>, Fp705Error> {
        let mut byte = [0u8; 1];
        loop {
            match self.stream.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(None);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Sequence byte and command of a request frame.
fn frame_identity(frame: &[u8]) -> Option<(u8, u16)> {
    let seq = *frame.get(5)?;
    let cmd = decode_word(frame.get(6..10)?)?;
    Some((seq, cmd))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::commands::{STATUS_LEN, TERMINATOR};
    use crate::protocol::frame::{build_frame, encode_response};
    use std::collections::VecDeque;
    use std::io;

    const CLEAN: [u8; STATUS_LEN] = [0x80; STATUS_LEN];

    /// Scripted link: each write pops the next canned reply into the read buffer.
    #[derive(Default)]
    struct ScriptedLink {
        replies: VecDeque<Vec<u8>>,
        pending: VecDeque<u8>,
        writes: Vec<Vec<u8>>,
    }

    impl ScriptedLink {
        fn replying(replies: Vec<Vec<u8>>) -> Self {
            Self {
                replies: replies.into(),
                ..Default::default()
            }
        }
    }

    impl Read for ScriptedLink {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.pending.pop_front() {
                Some(b) => {
                    buf[0] = b;
                    Ok(1)
                }
                None => Err(io::Error::new(ErrorKind::TimedOut, "silent")),
            }
        }
    }

    impl Write for ScriptedLink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.push(buf.to_vec());
            if let Some(reply) = self.replies.pop_front() {
                self.pending.extend(reply);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn status_frame() -> Vec<u8> {
        build_frame(0x20, 0x4A, "").unwrap()
    }

    #[test]
    fn test_silent_device_exhausts_retries() {
        let mut link = ScriptedLink::default();
        let frame = status_frame();

        let err = IoChannel::new(&mut link, 3).send_packet(&frame).unwrap_err();

        assert!(matches!(err, Fp705Error::RequestTimeout { attempts: 3 }));
        assert_eq!(link.writes.len(), 3);
        assert!(link.writes.iter().all(|w| *w == frame));
    }

    #[test]
    fn test_zero_retries_still_sends_once() {
        let mut link = ScriptedLink::default();
        let err = IoChannel::new(&mut link, 0)
            .send_packet(&status_frame())
            .unwrap_err();

        assert!(matches!(err, Fp705Error::RequestTimeout { attempts: 1 }));
        assert_eq!(link.writes.len(), 1);
    }

    #[test]
    fn test_first_answer_is_returned() {
        let reply = encode_response(0x20, 0x4A, b"", &CLEAN).unwrap();
        let mut link = ScriptedLink::replying(vec![reply.clone()]);

        let response = IoChannel::new(&mut link, 3)
            .send_packet(&status_frame())
            .unwrap();

        assert_eq!(response.raw(), &reply[..]);
        assert_eq!(link.writes.len(), 1);
    }

    #[test]
    fn test_device_error_status_is_still_a_response() {
        let mut status = CLEAN;
        status[0] |= 0x01;
        let mut link = ScriptedLink::replying(vec![encode_response(0x20, 0x4A, b"", &status).unwrap()]);

        let response = IoChannel::new(&mut link, 3)
            .send_packet(&status_frame())
            .unwrap();
        assert_eq!(response.status()[0], 0x81);
    }

    #[test]
    fn test_syn_bytes_do_not_cost_an_attempt() {
        let mut reply = vec![SYN, SYN, SYN];
        reply.extend(encode_response(0x20, 0x4A, b"", &CLEAN).unwrap());
        let mut link = ScriptedLink::replying(vec![reply]);

        IoChannel::new(&mut link, 1)
            .send_packet(&status_frame())
            .unwrap();
        assert_eq!(link.writes.len(), 1);
    }

    #[test]
    fn test_nak_triggers_resend() {
        let mut link = ScriptedLink::replying(vec![
            vec![NAK],
            encode_response(0x20, 0x4A, b"", &CLEAN).unwrap(),
        ]);

        IoChannel::new(&mut link, 3)
            .send_packet(&status_frame())
            .unwrap();
        assert_eq!(link.writes.len(), 2);
    }

    #[test]
    fn test_malformed_frame_counts_as_timeout() {
        let mut broken = encode_response(0x20, 0x4A, b"", &CLEAN).unwrap();
        let n = broken.len();
        broken[n - 15] = 0x00; // separator
        let mut link = ScriptedLink::replying(vec![broken.clone(), broken]);

        let err = IoChannel::new(&mut link, 2)
            .send_packet(&status_frame())
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(link.writes.len(), 2);
    }

    #[test]
    fn test_garbage_before_preamble_is_skipped() {
        let mut reply = vec![0xFF, 0x00, TERMINATOR];
        reply.extend(encode_response(0x20, 0x4A, b"0\t", &CLEAN).unwrap());
        let mut link = ScriptedLink::replying(vec![reply]);

        let response = IoChannel::new(&mut link, 1)
            .send_packet(&status_frame())
            .unwrap();
        assert_eq!(response.data(), b"0\t");
    }

    #[test]
    fn test_stale_response_is_skipped() {
        let mut reply = encode_response(0x20, 0x27, b"", &CLEAN).unwrap();
        reply.extend(encode_response(0x20, 0x4A, b"", &CLEAN).unwrap());
        let mut link = ScriptedLink::replying(vec![reply]);

        let response = IoChannel::new(&mut link, 1)
            .send_packet(&status_frame())
            .unwrap();
        assert_eq!(response.command(), 0x4A);
    }

    #[test]
    fn test_terminator_inside_data_does_not_cut_frame() {
        let reply = encode_response(0x20, 0x4A, &[b'a', TERMINATOR, b'b'], &CLEAN).unwrap();
        let mut link = ScriptedLink::replying(vec![reply]);

        let response = IoChannel::new(&mut link, 1)
            .send_packet(&status_frame())
            .unwrap();
        assert_eq!(response.data(), &[b'a', TERMINATOR, b'b']);
    }

    #[test]
    fn test_other_io_errors_propagate() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::BrokenPipe, "gone"))
            }
        }
        impl Write for Broken {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut link = Broken;
        let err = IoChannel::new(&mut link, 5)
            .send_packet(&status_frame())
            .unwrap_err();
        assert!(matches!(err, Fp705Error::Io(_)));
    }
}
