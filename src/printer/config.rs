//! # Printer Configuration
//!
//! Link and retry settings for a printer driver.
//!
//! ## Defaults
//!
//! | Setting | FP705 | Notes |
//! |---------|-------|-------|
//! | `max_retries` | 50 | receipts, status, clock |
//! | `report_retries` | 3 | reports; the device rarely answers them |
//! | `seq_start` | `0x20` | first sequence byte of every operation |
//! | `read_timeout` | 500 ms | one attempt's silence limit on the TTY |
//! | `baud` | 115200 | serial line speed |
//!
//! ## Usage
//!
//! ```
//! use std::time::Duration;
//! use fp705::printer::PrinterConfig;
//!
//! let config = PrinterConfig::FP705
//!     .with_max_retries(10)
//!     .with_read_timeout(Duration::from_secs(1));
//! assert_eq!(config.report_retries, 3);
//! ```

use std::time::Duration;

use crate::error::Fp705Error;
use crate::protocol::commands::SEQ_START;

/// # Printer Configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Printer model name
    pub name: &'static str,

    /// Attempts per frame for receipts, status and clock queries
    pub max_retries: u32,

    /// Attempts per frame for period/operator reports
    pub report_retries: u32,

    /// First sequence byte of every logical operation
    pub seq_start: u8,

    /// How long one read may stay silent before the attempt fails
    pub read_timeout: Duration,

    /// Serial line speed
    pub baud: u32,
}

impl PrinterConfig {
    /// # Datecs FP705 Configuration
    pub const FP705: Self = Self {
        name: "Datecs FP705",
        max_retries: 50,
        report_retries: 3,
        seq_start: SEQ_START,
        read_timeout: Duration::from_millis(500),
        baud: 115_200,
    };

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_report_retries(mut self, retries: u32) -> Self {
        self.report_retries = retries;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Reject settings the protocol cannot work with.
    pub fn validate(&self) -> Result<(), Fp705Error> {
        if self.max_retries == 0 || self.report_retries == 0 {
            return Err(Fp705Error::Config("retry counts must be at least 1".into()));
        }
        if self.seq_start < SEQ_START {
            return Err(Fp705Error::Config(format!(
                "sequence start 0x{:02X} is below 0x{:02X}",
                self.seq_start, SEQ_START
            )));
        }
        if self.read_timeout.is_zero() {
            return Err(Fp705Error::Config("read timeout must be positive".into()));
        }
        Ok(())
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::FP705
    }
}
