//! # fp705 - Datecs FP705 Fiscal Printer Driver
//!
//! fp705 drives Datecs FP705 fiscal cash-register printers over a serial
//! byte stream. It provides:
//!
//! - **Protocol implementation**: frame encoding, BCC, status decoding
//! - **Transport**: request/response exchange with bounded retries
//! - **Receipts**: fiscal and non-fiscal printing with recovery of a
//!   receipt left open by an aborted run
//! - **Reports**: fiscal memory by period, operator reports
//! - **Service**: queued printing with per-receipt status tracking
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use fp705::{Fp705Printer, Receipt, ReceiptItem, transport::SerialPort};
//!
//! let port = SerialPort::open("/dev/ttyUSB0", 115_200, Duration::from_millis(500))?;
//! let mut printer = Fp705Printer::new(port, Vec::new());
//!
//! let receipt = Receipt::new("USD")
//!     .prefix("Welcome")
//!     .item(ReceiptItem::new("Bread", 2.0, 1.50, 20.0))
//!     .suffix("Thank you");
//!
//! let response = printer.print_receipt(&receipt)?;
//! println!("warnings: {:?}", response.warnings());
//! # Ok::<(), fp705::Fp705Error>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Frame codec, command codes, status flags, cp1251 |
//! | [`transport`] | Retrying channel, warning channel, serial TTY |
//! | [`printer`] | Driver, receipt session, reports, configuration |
//! | [`receipt`] | Receipt data model and fiscal policy |
//! | [`service`] | Print queue, receipt repository, printing loop |
//! | [`error`] | Error types |
//!
//! Any `Read + Write` stream works in place of [`transport::SerialPort`],
//! which is how the tests drive the protocol against an in-memory device.

pub mod error;
pub mod printer;
pub mod protocol;
pub mod receipt;
pub mod service;
pub mod transport;

// Re-exports for convenience
pub use error::Fp705Error;
pub use printer::{Fp705Printer, PeriodType, PrinterConfig, RegisterState};
pub use protocol::{Status, StatusSet};
pub use receipt::{FiscalPolicy, PrintReceiptResponse, Receipt, ReceiptItem};
pub use service::{InMemoryPrintQueue, InMemoryReceiptRepository, PrintStatus, PrintingService};
