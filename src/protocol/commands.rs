//! # FP705 Command Codes
//!
//! Command codes and fixed framing bytes of the Datecs FP705 protocol.
//!
//! ## Request Frame
//!
//! ```text
//! 01 LEN(4) SEQ CMD(4) DATA... 05 BCC(4) 03
//! ```
//!
//! ## Response Frame
//!
//! ```text
//! 01 LEN(4) SEQ CMD(4) DATA... 04 STATUS(8) 05 BCC(4) 03
//! ```
//!
//! LEN, CMD and BCC are 16-bit values written as four ASCII nibbles
//! (`0x30 + nibble`), most significant nibble first.

// ============================================================================
// FRAMING BYTES
// ============================================================================

/// Start of a frame
pub const PREAMBLE: u8 = 0x01;

/// Separates response data from the status block
pub const SEPARATOR: u8 = 0x04;

/// Ends the checksummed part of a frame
pub const POSTAMBLE: u8 = 0x05;

/// End of a frame
pub const TERMINATOR: u8 = 0x03;

/// Device rejected the last frame (bad checksum); resend it
pub const NAK: u8 = 0x15;

/// Device is busy processing; keep waiting
pub const SYN: u8 = 0x16;

/// Parameter separator inside DATA
pub const SEP: char = '\t';

/// Fixed protocol overhead added to every declared request length.
pub const LENGTH_OFFSET: usize = 32;

/// First sequence byte of every logical operation.
pub const SEQ_START: u8 = 0x20;

/// Number of status bytes in a response.
pub const STATUS_LEN: usize = 8;

// ============================================================================
// STATUS / INFORMATION
// ============================================================================

/// Read date and time (62)
pub const READ_DATE_TIME: u8 = 0x3E;

/// Read status (74)
pub const READ_STATUS: u8 = 0x4A;

// ============================================================================
// FISCAL RECEIPT
// ============================================================================

/// Open fiscal receipt (48): `{OpCode}{OpPwd}{TillNmb}{Invoice}`
pub const FISCAL_RECEIPT_OPEN: u8 = 0x30;

/// Register sale (49): `{Name}{TaxCd}{Price}{Quantity}{DiscType}{DiscValue}{Department}`
pub const FISCAL_RECEIPT_PAYMENT: u8 = 0x31;

/// Payment and total (53): `{PaidMode}{Amount}`
pub const FISCAL_RECEIPT_TOTAL: u8 = 0x35;

/// Print free text inside a fiscal receipt (54)
pub const FISCAL_RECEIPT_PRINT_TEXT: u8 = 0x36;

/// Close fiscal receipt (56)
pub const FISCAL_RECEIPT_CLOSE: u8 = 0x38;

/// Operator, password, till and invoice flag sent with every fiscal open.
pub const FISCAL_OPEN_PARAMS: [&str; 4] = ["1", "0000", "1", ""];

/// Paid mode "cash" for the total command
pub const PAYMENT_TYPE_CASH: &str = "0";

// ============================================================================
// NON-FISCAL RECEIPT
// ============================================================================

/// Open non-fiscal receipt (38)
pub const TEXT_RECEIPT_OPEN: u8 = 0x26;

/// Close non-fiscal receipt (39)
pub const TEXT_RECEIPT_CLOSE: u8 = 0x27;

/// Print free text inside a non-fiscal receipt (42)
pub const TEXT_RECEIPT_PRINT_TEXT: u8 = 0x2A;

// ============================================================================
// REPORTS
// ============================================================================

/// Fiscal memory report by date (94): `{Type}{Start}{End}`
pub const FISCAL_MEMORY_REPORT_BY_DATE: u8 = 0x5E;

/// Operators report (105): `{FirstOper}{LastOper}{Clear}`
pub const REPORT_OPERATORS: u8 = 0x69;

/// Date format the device expects in report parameters (DD-MM-YY).
pub const REPORT_DATE_FORMAT: &str = "%d-%m-%y";
