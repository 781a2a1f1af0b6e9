//! # FP705 Protocol Implementation
//!
//! Low-level, I/O-free pieces of the Datecs FP705 frame protocol.
//!
//! ## Module Structure
//!
//! - [`commands`]: Command codes and framing constants
//! - [`frame`]: Request encoding, BCC, response decoding
//! - [`status`]: Status block decoding
//! - [`cp1251`]: Windows-1251 text encoding
//! - [`amount`]: Half-up decimal formatting for money and quantities
//!
//! ## Usage Example
//!
//! ```
//! use fp705::protocol::{commands, frame};
//!
//! // Print one line inside an open non-fiscal receipt
//! let data = frame::params(&["Welcome"])?;
//! let bytes = frame::build_frame(commands::SEQ_START, commands::TEXT_RECEIPT_PRINT_TEXT, &data)?;
//! assert_eq!(bytes[0], commands::PREAMBLE);
//! assert_eq!(*bytes.last().unwrap(), commands::TERMINATOR);
//! # Ok::<(), fp705::Fp705Error>(())
//! ```

pub mod amount;
pub mod commands;
pub mod cp1251;
pub mod frame;
pub mod status;

pub use amount::format_half_up;
pub use frame::{Response, build_frame, params};
pub use status::{Status, StatusSet, decode_flags, decode_status};
