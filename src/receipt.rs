//! # Receipt Data Model
//!
//! Caller-owned inputs to the printer (receipts, items, fiscal policy) and
//! the outcome of a print operation. The printer only reads these.
//!
//! ## JSON Shape
//!
//! ```json
//! {
//!   "receipt_id": "A-17",
//!   "prefix_lines": ["Welcome"],
//!   "items": [{ "name": "Bread", "quantity": 2, "price": 1.5, "vat": 20 }],
//!   "suffix_lines": ["Thank you"],
//!   "currency": "USD"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::protocol::status::{Status, StatusSet};

/// VAT group used when no policy entry matches an item's rate.
pub const DEFAULT_VAT_GROUP: &str = "1";

/// A single sale line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
    /// VAT rate, matched against [`FiscalPolicy::vat`]
    pub vat: f64,
}

impl ReceiptItem {
    pub fn new(name: impl Into<String>, quantity: f64, price: f64, vat: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
            vat,
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.price * self.quantity
    }
}

/// # Receipt
///
/// Printed as: prefix lines, one line per item, suffix lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default)]
    pub receipt_id: Option<String>,
    #[serde(default)]
    pub prefix_lines: Vec<String>,
    pub items: Vec<ReceiptItem>,
    #[serde(default)]
    pub suffix_lines: Vec<String>,
    pub currency: String,
}

impl Receipt {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            ..Default::default()
        }
    }

    pub fn prefix(mut self, line: impl Into<String>) -> Self {
        self.prefix_lines.push(line.into());
        self
    }

    pub fn item(mut self, item: ReceiptItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn suffix(mut self, line: impl Into<String>) -> Self {
        self.suffix_lines.push(line.into());
        self
    }

    pub fn id(mut self, receipt_id: impl Into<String>) -> Self {
        self.receipt_id = Some(receipt_id.into());
        self
    }

    /// Sum of `price × quantity` over all items.
    pub fn total(&self) -> f64 {
        self.items.iter().map(ReceiptItem::total).sum()
    }
}

/// Maps a VAT rate onto a device tax group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalPolicy {
    pub vat: f64,
    pub group: String,
}

impl FiscalPolicy {
    pub fn new(vat: f64, group: impl Into<String>) -> Self {
        Self {
            vat,
            group: group.into(),
        }
    }
}

/// First policy entry whose rate equals `vat`, else [`DEFAULT_VAT_GROUP`].
pub fn resolve_vat_group(policy: &[FiscalPolicy], vat: f64) -> &str {
    policy
        .iter()
        .find(|entry| entry.vat == vat)
        .map(|entry| entry.group.as_str())
        .unwrap_or(DEFAULT_VAT_GROUP)
}

/// Outcome of a print operation: the warnings the device raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrintReceiptResponse {
    warnings: StatusSet,
}

impl PrintReceiptResponse {
    pub fn new(warnings: StatusSet) -> Self {
        Self { warnings }
    }

    pub fn warnings(&self) -> &StatusSet {
        &self.warnings
    }

    pub fn has_warning(&self, flag: Status) -> bool {
        self.warnings.contains(&flag)
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> Vec<FiscalPolicy> {
        vec![FiscalPolicy::new(20.0, "2"), FiscalPolicy::new(9.0, "3")]
    }

    #[test]
    fn test_vat_group_match() {
        assert_eq!(resolve_vat_group(&policy(), 9.0), "3");
        assert_eq!(resolve_vat_group(&policy(), 20.0), "2");
    }

    #[test]
    fn test_vat_group_default() {
        assert_eq!(resolve_vat_group(&policy(), 5.0), "1");
        assert_eq!(resolve_vat_group(&[], 20.0), "1");
    }

    #[test]
    fn test_vat_group_first_match_wins() {
        let policy = vec![FiscalPolicy::new(9.0, "3"), FiscalPolicy::new(9.0, "4")];
        assert_eq!(resolve_vat_group(&policy, 9.0), "3");
    }

    #[test]
    fn test_receipt_total() {
        let receipt = Receipt::new("BGN")
            .item(ReceiptItem::new("Bread", 2.0, 1.5, 9.0))
            .item(ReceiptItem::new("Milk", 1.0, 3.0, 9.0));
        assert!((receipt.total() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_receipt_from_json_defaults() {
        let json = r#"{ "items": [{ "name": "Bread", "quantity": 2, "price": 1.5, "vat": 20 }],
                        "currency": "USD" }"#;
        let receipt: Receipt = serde_json::from_str(json).unwrap();

        assert!(receipt.prefix_lines.is_empty());
        assert!(receipt.suffix_lines.is_empty());
        assert_eq!(receipt.receipt_id, None);
        assert_eq!(receipt.items[0], ReceiptItem::new("Bread", 2.0, 1.5, 20.0));
    }

    #[test]
    fn test_response_serializes_flag_names() {
        let mut warnings = StatusSet::new();
        warnings.insert(Status::NearPaperEnd);
        let response = PrintReceiptResponse::new(warnings);

        assert!(response.has_warning(Status::NearPaperEnd));
        assert!(!response.is_clean());
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"warnings":["NEAR_PAPER_END"]}"#
        );
    }
}
