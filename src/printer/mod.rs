//! # Printer Module
//!
//! The FP705 driver and everything above the transport.
//!
//! ## Modules
//!
//! - [`config`]: Retry bounds and link settings
//! - [`fp705`]: The driver and its public operations
//! - [`session`]: Receipt printing state machine
//! - [`report`]: Period and operator reports

pub mod config;
pub mod fp705;
pub mod report;
pub mod session;

pub use config::PrinterConfig;
pub use fp705::Fp705Printer;
pub use report::{PeriodType, RegisterState};
pub use session::{ReceiptKind, ReceiptSession, SessionState};
