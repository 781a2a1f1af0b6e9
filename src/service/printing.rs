//! # Receipt Printing Service
//!
//! Drains a [`PrintQueue`] through an FP705, recording the outcome of each
//! receipt in a [`ReceiptRepository`].
//!
//! ## Acceptance
//!
//! The device raises its receipt-open flag while it holds a receipt, so a
//! print whose warnings include [`Status::FiscalReceiptIsOpen`] or
//! [`Status::NonFiscalReceiptIsOpen`] was accepted and the receipt is marked
//! printed. Any other outcome (no such flag, a failed connect, a print
//! error) marks it failed. The printer is closed after every receipt.

use std::io::{Read, Write};

use tracing::{info, warn};

use super::queue::{PrintQueue, PrintReceiptRequest};
use super::repository::ReceiptRepository;
use crate::error::Fp705Error;
use crate::printer::Fp705Printer;
use crate::protocol::Status;
use crate::receipt::PrintReceiptResponse;

/// Whether the device took the receipt.
pub fn is_accepted(response: &PrintReceiptResponse) -> bool {
    response.has_warning(Status::FiscalReceiptIsOpen)
        || response.has_warning(Status::NonFiscalReceiptIsOpen)
}

pub struct PrintingService<Q: PrintQueue, R: ReceiptRepository> {
    queue: Q,
    repository: R,
}

impl<Q: PrintQueue, R: ReceiptRepository> PrintingService<Q, R> {
    pub fn new(queue: Q, repository: R) -> Self {
        Self { queue, repository }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Register the receipt and queue it; returns the receipt id.
    ///
    /// A receipt the queue refuses is marked failed.
    pub fn submit(&mut self, request: PrintReceiptRequest) -> Result<String, Fp705Error> {
        let receipt_id = self.repository.register(&request.receipt)?;
        if let Err(e) = self.queue.queue(request) {
            self.repository.fail_printing(&receipt_id)?;
            return Err(e);
        }
        Ok(receipt_id)
    }

    /// Print every queued receipt on a printer obtained from `connect`.
    ///
    /// Returns the number of requests taken off the queue.
    pub fn print_receipts<S, F>(&mut self, mut connect: F) -> usize
    where
        S: Read + Write,
        F: FnMut() -> Result<Fp705Printer<S>, Fp705Error>,
    {
        let mut processed = 0;
        while let Some(request) = self.queue.next() {
            processed += 1;
            let accepted = match connect() {
                Ok(mut printer) => {
                    let accepted = print_one(&mut printer, &request);
                    if let Err(e) = printer.close() {
                        warn!(error = %e, "failed to close printer");
                    }
                    accepted
                }
                Err(e) => {
                    warn!(error = %e, "printer unavailable");
                    false
                }
            };
            self.record(&request, accepted);
        }
        processed
    }

    fn record(&mut self, request: &PrintReceiptRequest, accepted: bool) {
        let Some(receipt_id) = request.receipt.receipt_id.as_deref() else {
            warn!("receipt without receipt_id, outcome not recorded");
            return;
        };
        let result = if accepted {
            self.repository.finish_printing(receipt_id)
        } else {
            self.repository.fail_printing(receipt_id)
        };
        if let Err(e) = result {
            warn!(receipt_id, error = %e, "receipt was not found in repository");
        }
    }
}

fn print_one<S: Read + Write>(
    printer: &mut Fp705Printer<S>,
    request: &PrintReceiptRequest,
) -> bool {
    let outcome = if request.fiscal {
        printer.print_fiscal_receipt(&request.receipt)
    } else {
        printer.print_receipt(&request.receipt)
    };

    match outcome {
        Ok(response) if is_accepted(&response) => {
            info!(warnings = ?response.warnings(), "receipt printing accepted");
            true
        }
        Ok(response) => {
            info!(warnings = ?response.warnings(), "receipt printing rejected");
            false
        }
        Err(e) => {
            warn!(error = %e, "receipt printing failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::StatusSet;

    fn response(flags: &[Status]) -> PrintReceiptResponse {
        PrintReceiptResponse::new(flags.iter().copied().collect::<StatusSet>())
    }

    #[test]
    fn test_receipt_open_flag_means_accepted() {
        assert!(is_accepted(&response(&[Status::FiscalReceiptIsOpen])));
        assert!(is_accepted(&response(&[
            Status::NearPaperEnd,
            Status::NonFiscalReceiptIsOpen
        ])));
    }

    #[test]
    fn test_other_flags_mean_rejected() {
        assert!(!is_accepted(&response(&[])));
        assert!(!is_accepted(&response(&[Status::PrintMechanismFailure])));
    }
}
