//! # Status Decoder
//!
//! Every FP705 response carries an 8-byte status block. Each byte has bit 7
//! set and up to seven independent flag bits. Decoding walks a declarative
//! table of `(byte, mask, flag)` entries.
//!
//! | Byte | Bits used |
//! |------|-----------|
//! | 0 | general errors, cover, clock |
//! | 1 | command permission, overflow |
//! | 2 | receipts, paper, electronic journal |
//! | 3 | unused |
//! | 4 | fiscal memory |
//! | 5 | fiscalization state |
//! | 6, 7 | unused |
//!
//! Byte 4 and 5 also carry bits that describe a healthy fiscalized device
//! (tax number set, fiscal memory formatted, device fiscalized, VAT rates
//! set). These are [informational](Status::is_informational):
//! [`decode_flags`] reports them, [`decode_status`] does not, so an empty
//! [`decode_status`] result means no error condition.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::commands::STATUS_LEN;
use crate::error::Fp705Error;

/// A named status flag. Ordering follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    SyntaxError,
    InvalidCommand,
    ClockNotSynchronized,
    PrintMechanismFailure,
    GeneralError,
    CoverOpen,
    Overflow,
    CommandNotPermitted,
    EndOfPaper,
    NearPaperEnd,
    EjFull,
    FiscalReceiptIsOpen,
    EjNearlyFull,
    NonFiscalReceiptIsOpen,
    FiscalMemoryAccessError,
    TaxNumberSet,
    FiscalMemoryMissing,
    FiscalMemoryNearlyFull,
    FiscalMemoryFull,
    FiscalMemoryError,
    FiscalMemoryFormatted,
    DeviceFiscalized,
    VatRatesSet,
}

/// Decoded flags, iterated in declaration order.
pub type StatusSet = BTreeSet<Status>;

/// `(byte index, bit mask, flag)`
const STATUS_TABLE: &[(usize, u8, Status)] = &[
    (0, 0x01, Status::SyntaxError),
    (0, 0x02, Status::InvalidCommand),
    (0, 0x04, Status::ClockNotSynchronized),
    (0, 0x10, Status::PrintMechanismFailure),
    (0, 0x20, Status::GeneralError),
    (0, 0x40, Status::CoverOpen),
    (1, 0x01, Status::Overflow),
    (1, 0x02, Status::CommandNotPermitted),
    (2, 0x01, Status::EndOfPaper),
    (2, 0x02, Status::NearPaperEnd),
    (2, 0x04, Status::EjFull),
    (2, 0x08, Status::FiscalReceiptIsOpen),
    (2, 0x10, Status::EjNearlyFull),
    (2, 0x20, Status::NonFiscalReceiptIsOpen),
    (4, 0x01, Status::FiscalMemoryAccessError),
    (4, 0x02, Status::TaxNumberSet),
    (4, 0x04, Status::FiscalMemoryMissing),
    (4, 0x08, Status::FiscalMemoryNearlyFull),
    (4, 0x10, Status::FiscalMemoryFull),
    (4, 0x20, Status::FiscalMemoryError),
    (5, 0x02, Status::FiscalMemoryFormatted),
    (5, 0x08, Status::DeviceFiscalized),
    (5, 0x10, Status::VatRatesSet),
];

impl Status {
    /// Every flag, in declaration order.
    pub fn all() -> impl Iterator<Item = Status> {
        STATUS_TABLE.iter().map(|&(_, _, flag)| flag)
    }

    /// Position of this flag in the status block.
    pub fn location(self) -> (usize, u8) {
        STATUS_TABLE
            .iter()
            .find(|&&(_, _, flag)| flag == self)
            .map(|&(byte, mask, _)| (byte, mask))
            .unwrap_or((0, 0))
    }

    /// Set on every fiscalized device; not a condition to act on.
    pub fn is_informational(self) -> bool {
        matches!(
            self,
            Status::TaxNumberSet
                | Status::FiscalMemoryFormatted
                | Status::DeviceFiscalized
                | Status::VatRatesSet
        )
    }

    /// Whether this flag's bit is set in `status`.
    pub fn is_set_in(self, status: &[u8]) -> bool {
        let (byte, mask) = self.location();
        status.get(byte).is_some_and(|b| b & mask != 0)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::SyntaxError => "syntax error",
            Status::InvalidCommand => "invalid command code",
            Status::ClockNotSynchronized => "clock not synchronized",
            Status::PrintMechanismFailure => "print mechanism failure",
            Status::GeneralError => "general error",
            Status::CoverOpen => "cover open",
            Status::Overflow => "overflow during command execution",
            Status::CommandNotPermitted => "command not permitted",
            Status::EndOfPaper => "end of paper",
            Status::NearPaperEnd => "near paper end",
            Status::EjFull => "electronic journal full",
            Status::FiscalReceiptIsOpen => "fiscal receipt open",
            Status::EjNearlyFull => "electronic journal nearly full",
            Status::NonFiscalReceiptIsOpen => "non-fiscal receipt open",
            Status::FiscalMemoryAccessError => "fiscal memory access error",
            Status::TaxNumberSet => "tax number set",
            Status::FiscalMemoryMissing => "fiscal memory module missing",
            Status::FiscalMemoryNearlyFull => "fiscal memory nearly full",
            Status::FiscalMemoryFull => "fiscal memory full",
            Status::FiscalMemoryError => "fiscal memory error",
            Status::FiscalMemoryFormatted => "fiscal memory formatted",
            Status::DeviceFiscalized => "device fiscalized",
            Status::VatRatesSet => "VAT rates set",
        };
        f.write_str(text)
    }
}

/// Decode every flag a status block carries, informational ones included.
///
/// The block must hold at least [`STATUS_LEN`] bytes; a shorter block is
/// rejected rather than padded.
pub fn decode_flags(status: &[u8]) -> Result<StatusSet, Fp705Error> {
    if status.len() < STATUS_LEN {
        return Err(Fp705Error::StatusLength {
            expected: STATUS_LEN,
            actual: status.len(),
        });
    }
    Ok(STATUS_TABLE
        .iter()
        .filter(|&&(byte, mask, _)| status[byte] & mask != 0)
        .map(|&(_, _, flag)| flag)
        .collect())
}

/// Decode the conditions a status block reports. Empty means no error.
pub fn decode_status(status: &[u8]) -> Result<StatusSet, Fp705Error> {
    let mut flags = decode_flags(status)?;
    flags.retain(|flag| !flag.is_informational());
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero_is_empty() {
        assert!(decode_status(&[0u8; STATUS_LEN]).unwrap().is_empty());
    }

    #[test]
    fn test_reserved_bit_seven_is_ignored() {
        assert!(decode_status(&[0x80u8; STATUS_LEN]).unwrap().is_empty());
    }

    #[test]
    fn test_each_documented_bit_maps_to_its_flag() {
        for flag in Status::all() {
            let (byte, mask) = flag.location();
            let mut status = [0x80u8; STATUS_LEN];
            status[byte] |= mask;

            let decoded = decode_flags(&status).unwrap();
            assert_eq!(decoded.len(), 1, "{:?}", flag);
            assert!(decoded.contains(&flag));
            assert!(flag.is_set_in(&status));
        }
    }

    #[test]
    fn test_receipt_open_flags() {
        let mut status = [0x80u8; STATUS_LEN];
        status[2] |= 0x20 | 0x08;

        let decoded: Vec<Status> = decode_status(&status).unwrap().into_iter().collect();
        assert_eq!(
            decoded,
            vec![Status::FiscalReceiptIsOpen, Status::NonFiscalReceiptIsOpen]
        );
    }

    #[test]
    fn test_declaration_order_across_bytes() {
        let mut status = [0x80u8; STATUS_LEN];
        status[5] |= 0x08;
        status[0] |= 0x40;
        status[2] |= 0x01;

        let decoded: Vec<Status> = decode_flags(&status).unwrap().into_iter().collect();
        assert_eq!(
            decoded,
            vec![Status::CoverOpen, Status::EndOfPaper, Status::DeviceFiscalized]
        );
    }

    #[test]
    fn test_fiscalized_healthy_device_reports_no_condition() {
        let mut status = [0x80u8; STATUS_LEN];
        status[4] |= 0x02;
        status[5] |= 0x02 | 0x08 | 0x10;

        assert!(decode_status(&status).unwrap().is_empty());

        let flags: Vec<Status> = decode_flags(&status).unwrap().into_iter().collect();
        assert_eq!(
            flags,
            vec![
                Status::TaxNumberSet,
                Status::FiscalMemoryFormatted,
                Status::DeviceFiscalized,
                Status::VatRatesSet
            ]
        );
        assert!(flags.iter().all(|flag| flag.is_informational()));
    }

    #[test]
    fn test_conditions_survive_next_to_informational_bits() {
        let mut status = [0x80u8; STATUS_LEN];
        status[2] |= 0x08;
        status[5] |= 0x08;

        let decoded: Vec<Status> = decode_status(&status).unwrap().into_iter().collect();
        assert_eq!(decoded, vec![Status::FiscalReceiptIsOpen]);
    }

    #[test]
    fn test_short_block_is_rejected() {
        let err = decode_status(&[0x80; 6]).unwrap_err();
        assert!(matches!(
            err,
            Fp705Error::StatusLength {
                expected: 8,
                actual: 6
            }
        ));
    }

    #[test]
    fn test_table_has_no_duplicate_bits() {
        let mut seen = std::collections::HashSet::new();
        for &(byte, mask, _) in STATUS_TABLE {
            assert!(seen.insert((byte, mask)));
        }
    }
}
