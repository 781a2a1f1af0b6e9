//! # Receipt Session
//!
//! Packet sequence for printing one receipt, fiscal or non-fiscal.
//!
//! ```text
//! Idle ──► Recovering ──► Open ──► Emitting ──► Closed
//! ```
//!
//! - **Recovering**: a receipt left open by an aborted run is forced shut
//!   (non-fiscal close first, then a zero-total fiscal close).
//! - **Open**: the receipt-open frame.
//! - **Emitting**: prefix lines, one frame per item, suffix lines.
//! - **Closed**: non-fiscal close, or fiscal total + close.
//!
//! ## Sequence Bytes
//!
//! The counter starts at the configured start byte and advances once per
//! frame of the Open and Emitting phases. Recovering and Closed send with
//! whatever value is current at that moment without advancing it, so a
//! recovery close shares its byte with the open that follows. The counter
//! wraps from `0xFF` back to the start byte.
//!
//! Any [`Fp705Error`] aborts the remaining steps.

use std::io::{Read, Write};

use tracing::{debug, info};

use crate::error::Fp705Error;
use crate::protocol::commands::{
    FISCAL_OPEN_PARAMS, FISCAL_RECEIPT_CLOSE, FISCAL_RECEIPT_OPEN, FISCAL_RECEIPT_PAYMENT,
    FISCAL_RECEIPT_PRINT_TEXT, FISCAL_RECEIPT_TOTAL, PAYMENT_TYPE_CASH, TEXT_RECEIPT_CLOSE,
    TEXT_RECEIPT_OPEN, TEXT_RECEIPT_PRINT_TEXT,
};
use crate::protocol::amount::format_half_up;
use crate::protocol::frame::{Response, build_frame, params};
use crate::protocol::status::{Status, StatusSet};
use crate::receipt::{FiscalPolicy, PrintReceiptResponse, Receipt, ReceiptItem, resolve_vat_group};
use crate::transport::WarningChannel;

/// Which kind of receipt a session prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptKind {
    NonFiscal,
    Fiscal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recovering,
    Open,
    Emitting,
    Closed,
}

/// Non-fiscal item line: `"<name> - <qty:.2> X <price:.2> <currency>"`.
pub fn non_fiscal_item_line(item: &ReceiptItem, currency: &str) -> String {
    format!(
        "{} - {} X {} {}",
        item.name,
        format_half_up(item.quantity, 2),
        format_half_up(item.price, 2),
        currency
    )
}

/// Fiscal sale payload: name, VAT group, price, quantity, then the
/// discount type, discount value and department the device requires.
pub fn fiscal_item_params(
    item: &ReceiptItem,
    policy: &[FiscalPolicy],
) -> Result<String, Fp705Error> {
    let group = resolve_vat_group(policy, item.vat);
    let price = format_half_up(item.price, 2);
    let quantity = format_half_up(item.quantity, 3);
    params(&[item.name.as_str(), group, price.as_str(), quantity.as_str(), "0", "", "0"])
}

/// Fiscal total payload: cash payment of `sum`.
pub fn fiscal_total_params(sum: f64) -> Result<String, Fp705Error> {
    let amount = format_half_up(sum, 2);
    params(&[PAYMENT_TYPE_CASH, amount.as_str()])
}

pub struct ReceiptSession<'a, S: Read + Write> {
    channel: WarningChannel<'a, S>,
    kind: ReceiptKind,
    state: SessionState,
    seq_start: u8,
    seq: u8,
    sum: f64,
}

impl<'a, S: Read + Write> ReceiptSession<'a, S> {
    pub fn new(channel: WarningChannel<'a, S>, kind: ReceiptKind, seq_start: u8) -> Self {
        Self {
            channel,
            kind,
            state: SessionState::Idle,
            seq_start,
            seq: seq_start,
            sum: 0.0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Running `price × quantity` total of the items emitted so far.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Run every phase. `status` is the device status read just before.
    pub fn run(
        mut self,
        status: &StatusSet,
        receipt: &Receipt,
        policy: &[FiscalPolicy],
    ) -> Result<PrintReceiptResponse, Fp705Error> {
        self.recover(status)?;
        self.open()?;
        self.emit(receipt, policy)?;
        self.close()
    }

    /// Force shut any receipt `status` reports as open.
    pub fn recover(&mut self, status: &StatusSet) -> Result<(), Fp705Error> {
        self.enter(SessionState::Recovering);
        info!(?status, "checking for unfinished receipts");

        if status.contains(&Status::NonFiscalReceiptIsOpen) {
            info!("non-fiscal receipt was open, closing it");
            self.send(self.seq, TEXT_RECEIPT_CLOSE, "")?;
            info!("non-fiscal receipt closed");
        }
        if status.contains(&Status::FiscalReceiptIsOpen) {
            info!("fiscal receipt was open, closing it");
            self.close_fiscal(0.0)?;
            info!("fiscal receipt closed");
        }
        Ok(())
    }

    pub fn open(&mut self) -> Result<(), Fp705Error> {
        self.enter(SessionState::Open);
        let seq = self.next_seq();
        match self.kind {
            ReceiptKind::NonFiscal => self.send(seq, TEXT_RECEIPT_OPEN, "")?,
            ReceiptKind::Fiscal => {
                self.send(seq, FISCAL_RECEIPT_OPEN, &params(&FISCAL_OPEN_PARAMS)?)?
            }
        };
        Ok(())
    }

    pub fn emit(&mut self, receipt: &Receipt, policy: &[FiscalPolicy]) -> Result<(), Fp705Error> {
        self.enter(SessionState::Emitting);

        for line in &receipt.prefix_lines {
            self.print_text(line)?;
        }

        for item in &receipt.items {
            let seq = self.next_seq();
            match self.kind {
                ReceiptKind::NonFiscal => {
                    let line = non_fiscal_item_line(item, &receipt.currency);
                    self.send(seq, TEXT_RECEIPT_PRINT_TEXT, &params(&[line.as_str()])?)?;
                }
                ReceiptKind::Fiscal => {
                    let data = fiscal_item_params(item, policy)?;
                    self.send(seq, FISCAL_RECEIPT_PAYMENT, &data)?;
                    self.sum += item.total();
                }
            }
        }

        for line in &receipt.suffix_lines {
            self.print_text(line)?;
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<PrintReceiptResponse, Fp705Error> {
        self.enter(SessionState::Closed);
        match self.kind {
            ReceiptKind::NonFiscal => {
                self.send(self.seq, TEXT_RECEIPT_CLOSE, "")?;
            }
            ReceiptKind::Fiscal => {
                let sum = self.sum;
                self.close_fiscal(sum)?;
            }
        }
        Ok(self.channel.into_response())
    }

    fn print_text(&mut self, line: &str) -> Result<(), Fp705Error> {
        let cmd = match self.kind {
            ReceiptKind::NonFiscal => TEXT_RECEIPT_PRINT_TEXT,
            ReceiptKind::Fiscal => FISCAL_RECEIPT_PRINT_TEXT,
        };
        let seq = self.next_seq();
        self.send(seq, cmd, &params(&[line])?)?;
        Ok(())
    }

    fn close_fiscal(&mut self, sum: f64) -> Result<(), Fp705Error> {
        self.send(self.seq, FISCAL_RECEIPT_TOTAL, &fiscal_total_params(sum)?)?;
        self.send(self.seq, FISCAL_RECEIPT_CLOSE, "")?;
        Ok(())
    }

    fn send(&mut self, seq: u8, cmd: u8, data: &str) -> Result<Response, Fp705Error> {
        let frame = build_frame(seq, cmd, data)?;
        debug!(seq, cmd, data, "sending packet");
        self.channel.send_packet(&frame)
    }

    /// Current sequence byte; advances the counter.
    fn next_seq(&mut self) -> u8 {
        let seq = self.seq;
        self.seq = if seq == u8::MAX {
            self.seq_start
        } else {
            seq + 1
        };
        seq
    }

    fn enter(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, kind = ?self.kind, "receipt session");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::commands::{STATUS_LEN, SEQ_START};
    use crate::protocol::frame::{decode_word, encode_response};
    use crate::transport::IoChannel;
    use std::collections::VecDeque;
    use std::io;

    /// Acknowledges every frame with a clean status and records (seq, cmd, data).
    #[derive(Default)]
    struct AckDevice {
        pending: VecDeque<u8>,
        sent: Vec<(u8, u8, String)>,
    }

    impl Read for AckDevice {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.pending.pop_front() {
                Some(b) => {
                    buf[0] = b;
                    Ok(1)
                }
                None => Ok(0),
            }
        }
    }

    impl Write for AckDevice {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let seq = buf[5];
            let cmd = decode_word(&buf[6..10]).unwrap();
            let data = String::from_utf8_lossy(&buf[10..buf.len() - 6]).into_owned();
            self.sent.push((seq, cmd as u8, data));
            self.pending
                .extend(encode_response(seq, cmd, b"", &[0x80; STATUS_LEN]).unwrap());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn session(device: &mut AckDevice, kind: ReceiptKind) -> ReceiptSession<'_, AckDevice> {
        ReceiptSession::new(
            WarningChannel::new(IoChannel::new(device, 1)),
            kind,
            SEQ_START,
        )
    }

    #[test]
    fn test_item_line_formats() {
        let item = ReceiptItem::new("Bread", 2.0, 1.5, 20.0);
        assert_eq!(non_fiscal_item_line(&item, "USD"), "Bread - 2.00 X 1.50 USD");

        let policy = vec![FiscalPolicy::new(20.0, "2")];
        assert_eq!(
            fiscal_item_params(&item, &policy).unwrap(),
            "Bread\t2\t1.50\t2.000\t0\t\t0\t"
        );
    }

    #[test]
    fn test_fiscal_total_format() {
        assert_eq!(fiscal_total_params(6.0).unwrap(), "0\t6.00\t");
        assert_eq!(fiscal_total_params(0.0).unwrap(), "0\t0.00\t");
    }

    #[test]
    fn test_amounts_round_half_up() {
        assert_eq!(fiscal_total_params(0.125).unwrap(), "0\t0.13\t");
        assert_eq!(fiscal_total_params(0.625).unwrap(), "0\t0.63\t");

        let item = ReceiptItem::new("Nails", 0.0625, 0.125, 20.0);
        assert_eq!(
            fiscal_item_params(&item, &[]).unwrap(),
            "Nails\t1\t0.13\t0.063\t0\t\t0\t"
        );
        assert_eq!(non_fiscal_item_line(&item, "BGN"), "Nails - 0.06 X 0.13 BGN");
    }

    #[test]
    fn test_tab_in_item_name_is_rejected() {
        let item = ReceiptItem::new("A\tB", 1.0, 1.0, 20.0);
        let err = fiscal_item_params(&item, &[]).unwrap_err();
        assert!(matches!(err, Fp705Error::ControlCharacter { ch: '\t', field: 0 }));
    }

    #[test]
    fn test_clean_status_issues_no_recovery_frames() {
        let mut device = AckDevice::default();
        let mut s = session(&mut device, ReceiptKind::NonFiscal);
        s.recover(&StatusSet::new()).unwrap();
        assert_eq!(s.state(), SessionState::Recovering);
        drop(s);

        assert!(device.sent.is_empty());
    }

    #[test]
    fn test_both_open_flags_recover_non_fiscal_first() {
        let mut device = AckDevice::default();
        let status: StatusSet = [Status::FiscalReceiptIsOpen, Status::NonFiscalReceiptIsOpen]
            .into_iter()
            .collect();

        let mut s = session(&mut device, ReceiptKind::Fiscal);
        s.recover(&status).unwrap();
        drop(s);

        let sent: Vec<(u8, u8)> = device.sent.iter().map(|(s, c, _)| (*s, *c)).collect();
        assert_eq!(
            sent,
            vec![
                (0x20, TEXT_RECEIPT_CLOSE),
                (0x20, FISCAL_RECEIPT_TOTAL),
                (0x20, FISCAL_RECEIPT_CLOSE)
            ]
        );
        assert_eq!(device.sent[1].2, "0\t0.00\t");
    }

    #[test]
    fn test_sequence_advances_only_in_open_and_emitting() {
        let mut device = AckDevice::default();
        let receipt = Receipt::new("USD")
            .prefix("Welcome")
            .item(ReceiptItem::new("Bread", 2.0, 1.5, 20.0))
            .suffix("Thank you");

        let status: StatusSet = [Status::NonFiscalReceiptIsOpen].into_iter().collect();
        let response = session(&mut device, ReceiptKind::NonFiscal)
            .run(&status, &receipt, &[])
            .unwrap();
        assert!(response.is_clean());

        let seqs: Vec<u8> = device.sent.iter().map(|(s, _, _)| *s).collect();
        // recovery close, open, prefix, item, suffix, close
        assert_eq!(seqs, vec![0x20, 0x20, 0x21, 0x22, 0x23, 0x24]);
    }

    #[test]
    fn test_fiscal_sum_accumulates() {
        let mut device = AckDevice::default();
        let receipt = Receipt::new("BGN")
            .item(ReceiptItem::new("Bread", 2.0, 1.5, 9.0))
            .item(ReceiptItem::new("Milk", 1.0, 3.0, 9.0));

        let mut s = session(&mut device, ReceiptKind::Fiscal);
        s.open().unwrap();
        s.emit(&receipt, &[]).unwrap();
        assert!((s.sum() - 6.0).abs() < 1e-9);
        s.close().unwrap();

        let (_, cmd, data) = &device.sent[device.sent.len() - 2];
        assert_eq!(*cmd, FISCAL_RECEIPT_TOTAL);
        assert_eq!(data, "0\t6.00\t");
    }

    #[test]
    fn test_sequence_wraps_to_start() {
        let mut device = AckDevice::default();
        let mut s = session(&mut device, ReceiptKind::NonFiscal);
        s.seq = u8::MAX;
        assert_eq!(s.next_seq(), 0xFF);
        assert_eq!(s.next_seq(), SEQ_START);
    }
}
