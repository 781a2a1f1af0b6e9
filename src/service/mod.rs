//! # Printing Service
//!
//! Queued receipt printing on top of [`Fp705Printer`](crate::Fp705Printer).
//!
//! - [`queue`]: Bounded queue of print requests
//! - [`repository`]: Printing status per receipt id
//! - [`printing`]: Drain loop deciding printed or failed

pub mod printing;
pub mod queue;
pub mod repository;

pub use printing::{PrintingService, is_accepted};
pub use queue::{InMemoryPrintQueue, PrintQueue, PrintReceiptRequest};
pub use repository::{InMemoryReceiptRepository, PrintStatus, ReceiptRepository};
