//! # Printer Transport Layer
//!
//! Everything that touches the byte stream.
//!
//! ## Layers
//!
//! - [`channel`]: one frame in, one [`Response`](crate::protocol::Response) out, with retries
//! - [`warning`]: per-operation wrapper collecting device warnings
//! - [`serial`]: raw TTY device usable as the stream
//!
//! Any `Read + Write` type can serve as the stream. Reads must return
//! `Ok(0)` or a `TimedOut`/`WouldBlock` error when the device stays
//! silent, otherwise a lost reply blocks forever.

pub mod channel;
pub mod serial;
pub mod warning;

pub use channel::IoChannel;
pub use serial::SerialPort;
pub use warning::WarningChannel;
