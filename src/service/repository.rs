//! # Receipt Repository
//!
//! Tracks the printing status of each submitted receipt by its
//! `receipt_id`.
//!
//! ```text
//! register ──► Printing ──► Printed   (finish_printing)
//!                      └──► Failed    (fail_printing)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Fp705Error;
use crate::receipt::Receipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintStatus {
    Printing,
    Printed,
    Failed,
}

pub trait ReceiptRepository {
    /// Start tracking `receipt` as [`PrintStatus::Printing`]; returns its id.
    ///
    /// ## Errors
    ///
    /// - [`Fp705Error::MissingReceiptId`] if the receipt carries no id
    /// - [`Fp705Error::ReceiptAlreadyRegistered`] if the id is tracked already
    fn register(&mut self, receipt: &Receipt) -> Result<String, Fp705Error>;

    fn get_status(&self, receipt_id: &str) -> Result<PrintStatus, Fp705Error>;

    /// Every tracked receipt currently in `status`.
    fn get_by_status(&self, status: PrintStatus) -> Vec<Receipt>;

    /// Mark as [`PrintStatus::Printed`].
    fn finish_printing(&mut self, receipt_id: &str) -> Result<Receipt, Fp705Error>;

    /// Mark as [`PrintStatus::Failed`].
    fn fail_printing(&mut self, receipt_id: &str) -> Result<Receipt, Fp705Error>;
}

/// Repository held in process memory, ordered by receipt id.
#[derive(Debug, Default)]
pub struct InMemoryReceiptRepository {
    receipts: BTreeMap<String, (Receipt, PrintStatus)>,
}

impl InMemoryReceiptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&mut self, receipt_id: &str, status: PrintStatus) -> Result<Receipt, Fp705Error> {
        let entry = self
            .receipts
            .get_mut(receipt_id)
            .ok_or_else(|| Fp705Error::ReceiptNotFound(receipt_id.to_string()))?;
        entry.1 = status;
        info!(receipt_id, ?status, "receipt processed");
        Ok(entry.0.clone())
    }
}

impl ReceiptRepository for InMemoryReceiptRepository {
    fn register(&mut self, receipt: &Receipt) -> Result<String, Fp705Error> {
        let receipt_id = receipt
            .receipt_id
            .clone()
            .ok_or(Fp705Error::MissingReceiptId)?;
        if self.receipts.contains_key(&receipt_id) {
            return Err(Fp705Error::ReceiptAlreadyRegistered(receipt_id));
        }
        self.receipts
            .insert(receipt_id.clone(), (receipt.clone(), PrintStatus::Printing));
        Ok(receipt_id)
    }

    fn get_status(&self, receipt_id: &str) -> Result<PrintStatus, Fp705Error> {
        self.receipts
            .get(receipt_id)
            .map(|(_, status)| *status)
            .ok_or_else(|| Fp705Error::ReceiptNotFound(receipt_id.to_string()))
    }

    fn get_by_status(&self, status: PrintStatus) -> Vec<Receipt> {
        self.receipts
            .values()
            .filter(|(_, current)| *current == status)
            .map(|(receipt, _)| receipt.clone())
            .collect()
    }

    fn finish_printing(&mut self, receipt_id: &str) -> Result<Receipt, Fp705Error> {
        self.update(receipt_id, PrintStatus::Printed)
    }

    fn fail_printing(&mut self, receipt_id: &str) -> Result<Receipt, Fp705Error> {
        self.update(receipt_id, PrintStatus::Failed)
    }
}
