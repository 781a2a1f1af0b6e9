//! # FP705 Printer Driver
//!
//! Public operation surface over one exclusive byte stream.
//!
//! ## Exclusive Access
//!
//! Every operation takes `&mut self` and runs to completion (or to retry
//! exhaustion) before returning. Interleaving two operations on the same
//! link would desynchronize the device, so callers sharing a printer
//! between threads must serialize access themselves, e.g. with a `Mutex`.
//!
//! ## Example
//!
//! ```no_run
//! use fp705::{Fp705Printer, FiscalPolicy, Receipt, ReceiptItem};
//! use fp705::transport::SerialPort;
//! use std::time::Duration;
//!
//! let port = SerialPort::open("/dev/ttyUSB0", 115_200, Duration::from_millis(500))?;
//! let mut printer = Fp705Printer::new(port, vec![FiscalPolicy::new(20.0, "2")]);
//!
//! let receipt = Receipt::new("BGN").item(ReceiptItem::new("Coffee", 1.0, 2.40, 20.0));
//! let response = printer.print_fiscal_receipt(&receipt)?;
//! println!("warnings: {:?}", response.warnings());
//! printer.close()?;
//! # Ok::<(), fp705::Fp705Error>(())
//! ```

use std::io::{Read, Write};

use tracing::debug;

use super::config::PrinterConfig;
use super::session::{ReceiptKind, ReceiptSession};
use crate::error::Fp705Error;
use crate::protocol::commands::{READ_DATE_TIME, READ_STATUS};
use crate::protocol::frame::{Response, build_frame};
use crate::protocol::status::{StatusSet, decode_status};
use crate::receipt::{FiscalPolicy, PrintReceiptResponse, Receipt};
use crate::transport::{IoChannel, WarningChannel};

/// Channel for one logical operation.
pub(crate) fn open_channel<S: Read + Write>(stream: &mut S, retries: u32) -> WarningChannel<'_, S> {
    WarningChannel::new(IoChannel::new(stream, retries))
}

pub struct Fp705Printer<S: Read + Write> {
    pub(crate) stream: S,
    policy: Vec<FiscalPolicy>,
    pub(crate) config: PrinterConfig,
}

impl<S: Read + Write> Fp705Printer<S> {
    pub fn new(stream: S, policy: Vec<FiscalPolicy>) -> Self {
        Self::with_config(stream, policy, PrinterConfig::FP705)
    }

    pub fn with_config(stream: S, policy: Vec<FiscalPolicy>, config: PrinterConfig) -> Self {
        Self {
            stream,
            policy,
            config,
        }
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    pub fn policy(&self) -> &[FiscalPolicy] {
        &self.policy
    }

    /// Print a non-fiscal (free text) receipt.
    ///
    /// An open receipt left over from an earlier run is closed first.
    pub fn print_receipt(&mut self, receipt: &Receipt) -> Result<PrintReceiptResponse, Fp705Error> {
        self.print(receipt, ReceiptKind::NonFiscal)
    }

    /// Print a fiscal receipt, resolving VAT groups through the policy.
    ///
    /// An open receipt left over from an earlier run is closed first.
    pub fn print_fiscal_receipt(
        &mut self,
        receipt: &Receipt,
    ) -> Result<PrintReceiptResponse, Fp705Error> {
        self.print(receipt, ReceiptKind::Fiscal)
    }

    fn print(
        &mut self,
        receipt: &Receipt,
        kind: ReceiptKind,
    ) -> Result<PrintReceiptResponse, Fp705Error> {
        debug!(?kind, receipt_id = ?receipt.receipt_id, items = receipt.items.len(), "printing receipt");
        let status = self.get_status()?;

        let channel = open_channel(&mut self.stream, self.config.max_retries);
        ReceiptSession::new(channel, kind, self.config.seq_start).run(&status, receipt, &self.policy)
    }

    /// Current device flags. An empty set means no error condition.
    pub fn get_status(&mut self) -> Result<StatusSet, Fp705Error> {
        let response = self.query(READ_STATUS)?;
        decode_status(response.status())
    }

    /// Device clock, as the text the device returns.
    pub fn get_time(&mut self) -> Result<String, Fp705Error> {
        let response = self.query(READ_DATE_TIME)?;
        Ok(response.text())
    }

    /// Flush and release the stream, closing the link.
    pub fn close(mut self) -> Result<(), Fp705Error> {
        self.stream.flush()?;
        Ok(())
    }

    /// Single frame without data, on a fresh channel.
    fn query(&mut self, cmd: u8) -> Result<Response, Fp705Error> {
        let frame = build_frame(self.config.seq_start, cmd, "")?;
        let mut channel = open_channel(&mut self.stream, self.config.max_retries);
        let response = channel.send_packet(&frame)?;
        debug!(cmd, raw = ?response.raw(), data = ?response.data(), "query answered");
        Ok(response)
    }
}
