//! # Frame Codec
//!
//! Byte-exact encoding of FP705 request frames and decoding of the device's
//! response frames. Pure functions, no I/O.
//!
//! ## Request Layout
//!
//! | Field      | Size | Value |
//! |------------|------|-------|
//! | Preamble   | 1    | `0x01` |
//! | Length     | 4    | nibble word of `32 + 1 + 4 + 4 + len(data) + 1` |
//! | Sequence   | 1    | `0x20..=0xFF` |
//! | Command    | 4    | nibble word |
//! | Data       | n    | cp1251 text |
//! | Postamble  | 1    | `0x05` |
//! | Checksum   | 4    | nibble word of the BCC |
//! | Terminator | 1    | `0x03` |
//!
//! ## Nibble Words
//!
//! A 16-bit value `X` becomes four bytes `0x30 + nibble`, most significant
//! nibble first: `0x002A` is sent as `30 30 32 3A`.
//!
//! ## BCC
//!
//! Unsigned 16-bit sum of every byte after the preamble up to and including
//! the postamble. Preamble, checksum and terminator are excluded.

use thiserror::Error;

use super::commands::{
    LENGTH_OFFSET, POSTAMBLE, PREAMBLE, SEP, SEPARATOR, STATUS_LEN, TERMINATOR,
};
use super::cp1251;
use crate::error::Fp705Error;

/// Smallest possible response: header, empty data, status block, trailer.
pub const MIN_RESPONSE_LEN: usize = 1 + 4 + 1 + 4 + 1 + STATUS_LEN + 1 + 4 + 1;

/// Bytes after the status block: postamble, BCC, terminator.
const TRAILER_LEN: usize = 1 + 4 + 1;

/// Offset of the first data byte in any frame.
const DATA_START: usize = 1 + 4 + 1 + 4;

/// Reasons a received frame cannot be turned into a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    #[error("frame does not start with preamble")]
    MissingPreamble,

    #[error("frame does not end with terminator")]
    MissingTerminator,

    #[error("no postamble before checksum")]
    MissingPostamble,

    #[error("no separator before status block")]
    MissingSeparator,

    #[error("malformed {0} field")]
    BadWord(&'static str),
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode a 16-bit value as a wire-order nibble word `[b4, b3, b2, b1]`.
///
/// ```
/// use fp705::protocol::frame::encode_word;
///
/// assert_eq!(encode_word(0x002A), [0x30, 0x30, 0x32, 0x3A]);
/// ```
pub fn encode_word(value: u16) -> [u8; 4] {
    [
        0x30 + ((value >> 12) & 0x0F) as u8,
        0x30 + ((value >> 8) & 0x0F) as u8,
        0x30 + ((value >> 4) & 0x0F) as u8,
        0x30 + (value & 0x0F) as u8,
    ]
}

/// Decode a wire-order nibble word. Every byte must be in `0x30..=0x3F`.
pub fn decode_word(bytes: &[u8]) -> Option<u16> {
    if bytes.len() != 4 {
        return None;
    }
    bytes.iter().try_fold(0u16, |acc, &b| {
        if (0x30..=0x3F).contains(&b) {
            Some((acc << 4) | u16::from(b - 0x30))
        } else {
            None
        }
    })
}

/// Join parameters with a TAB after each one, including the last.
///
/// A parameter may not contain ASCII control characters: a TAB would shift
/// every following field and the framing bytes would corrupt the frame.
///
/// ```
/// use fp705::protocol::frame::params;
///
/// assert_eq!(params(&["0", "6.00"]).unwrap(), "0\t6.00\t");
/// assert!(params(&["A\tB"]).is_err());
/// ```
pub fn params(values: &[&str]) -> Result<String, Fp705Error> {
    let mut out = String::with_capacity(values.iter().map(|v| v.len() + 1).sum());
    for (field, value) in values.iter().enumerate() {
        if let Some(ch) = value.chars().find(char::is_ascii_control) {
            return Err(Fp705Error::ControlCharacter { ch, field });
        }
        out.push_str(value);
        out.push(SEP);
    }
    Ok(out)
}

/// Declared length of a request carrying `data_len` payload bytes.
#[inline]
pub fn frame_length(data_len: usize) -> usize {
    LENGTH_OFFSET + 1 + 4 + 4 + data_len + 1
}

/// BCC over the checksummed section of a frame, as a nibble word.
pub fn checksum(section: &[u8]) -> [u8; 4] {
    let sum = section
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
    encode_word(sum)
}

/// # Build Request Frame
///
/// Encodes `data` as cp1251 and wraps it into a complete request frame.
///
/// ## Errors
///
/// - [`Fp705Error::Encoding`] if `data` contains a character outside cp1251
/// - [`Fp705Error::FrameTooLarge`] if the declared length exceeds 16 bits
///
/// ## Example
///
/// ```
/// use fp705::protocol::frame::build_frame;
///
/// let frame = build_frame(0x20, 0x4A, "").unwrap();
/// assert_eq!(
///     frame,
///     vec![0x01, 0x30, 0x30, 0x32, 0x3A, 0x20, 0x30, 0x30, 0x34, 0x3A,
///          0x05, 0x30, 0x31, 0x3B, 0x3F, 0x03]
/// );
/// ```
pub fn build_frame(seq: u8, cmd: u8, data: &str) -> Result<Vec<u8>, Fp705Error> {
    let payload = cp1251::encode(data)?;
    let len = frame_length(payload.len());
    let len_word = u16::try_from(len).map_err(|_| Fp705Error::FrameTooLarge(len))?;

    let mut frame = Vec::with_capacity(payload.len() + 16);
    frame.push(PREAMBLE);
    frame.extend_from_slice(&encode_word(len_word));
    frame.push(seq);
    frame.extend_from_slice(&encode_word(u16::from(cmd)));
    frame.extend_from_slice(&payload);
    frame.push(POSTAMBLE);

    let bcc = checksum(&frame[1..]);
    frame.extend_from_slice(&bcc);
    frame.push(TERMINATOR);
    Ok(frame)
}

/// # Build Response Frame
///
/// Builds a frame the way the device answers: data, separator, status
/// block, postamble. Used by in-memory devices in tests and tooling.
///
/// ## Errors
///
/// [`Fp705Error::FrameTooLarge`] if the declared length exceeds 16 bits.
pub fn encode_response(
    seq: u8,
    cmd: u16,
    data: &[u8],
    status: &[u8; STATUS_LEN],
) -> Result<Vec<u8>, Fp705Error> {
    let len = LENGTH_OFFSET + 4 + 1 + 4 + data.len() + 1 + STATUS_LEN + 1;
    let len_word = u16::try_from(len).map_err(|_| Fp705Error::FrameTooLarge(len))?;

    let mut frame = Vec::with_capacity(data.len() + 25);
    frame.push(PREAMBLE);
    frame.extend_from_slice(&encode_word(len_word));
    frame.push(seq);
    frame.extend_from_slice(&encode_word(cmd));
    frame.extend_from_slice(data);
    frame.push(SEPARATOR);
    frame.extend_from_slice(status);
    frame.push(POSTAMBLE);

    let bcc = checksum(&frame[1..]);
    frame.extend_from_slice(&bcc);
    frame.push(TERMINATOR);
    Ok(frame)
}

// ============================================================================
// DECODING
// ============================================================================

/// A decoded device reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    raw: Vec<u8>,
    data: Vec<u8>,
    status: Vec<u8>,
    seq: u8,
    command: u16,
}

impl Response {
    /// Parse a complete response frame.
    ///
    /// Structure is validated; the BCC is not compared.
    pub fn decode(raw: &[u8]) -> Result<Self, FrameError> {
        if raw.len() < MIN_RESPONSE_LEN {
            return Err(FrameError::TooShort(raw.len()));
        }
        if raw[0] != PREAMBLE {
            return Err(FrameError::MissingPreamble);
        }
        if raw[raw.len() - 1] != TERMINATOR {
            return Err(FrameError::MissingTerminator);
        }

        let postamble = raw.len() - TRAILER_LEN;
        if raw[postamble] != POSTAMBLE {
            return Err(FrameError::MissingPostamble);
        }
        let status_start = postamble - STATUS_LEN;
        let separator = status_start - 1;
        if raw[separator] != SEPARATOR {
            return Err(FrameError::MissingSeparator);
        }

        decode_word(&raw[1..5]).ok_or(FrameError::BadWord("length"))?;
        let command = decode_word(&raw[6..10]).ok_or(FrameError::BadWord("command"))?;
        decode_word(&raw[postamble + 1..postamble + 5]).ok_or(FrameError::BadWord("checksum"))?;

        Ok(Self {
            raw: raw.to_vec(),
            data: raw[DATA_START..separator].to_vec(),
            status: raw[status_start..postamble].to_vec(),
            seq: raw[5],
            command,
        })
    }

    /// The frame exactly as received.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Data bytes between the command word and the separator.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The status block.
    pub fn status(&self) -> &[u8] {
        &self.status
    }

    pub fn seq(&self) -> u8 {
        self.seq
    }

    pub fn command(&self) -> u16 {
        self.command
    }

    /// Data decoded from cp1251.
    pub fn text(&self) -> String {
        cp1251::decode(&self.data)
    }
}

// ============================================================================
// TESTS
// ============================================================================
