//! # Error Types
//!
//! This module defines error types used throughout the fp705 library.

use thiserror::Error;

/// Main error type for fp705 operations
#[derive(Debug, Error)]
pub enum Fp705Error {
    /// The device did not answer a frame after every retry was spent
    #[error("Request timed out after {attempts} attempts")]
    RequestTimeout { attempts: u32 },

    /// Payload text has no Windows-1251 representation
    #[error("Cannot encode {ch:?} at position {position} as cp1251")]
    Encoding { ch: char, position: usize },

    /// Control character inside a payload parameter
    #[error("Parameter {field} contains control character {ch:?}")]
    ControlCharacter { ch: char, field: usize },

    /// Encoded frame length does not fit the 16-bit length field
    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// Status block shorter than the protocol defines
    #[error("Status block must be {expected} bytes, got {actual}")]
    StatusLength { expected: usize, actual: usize },

    /// Print queue is at capacity
    #[error("Print queue is full ({capacity} receipts)")]
    QueueFull { capacity: usize },

    /// Receipt handed to the repository without a `receipt_id`
    #[error("Receipt has no receipt_id")]
    MissingReceiptId,

    /// Receipt id already tracked by the repository
    #[error("Receipt {0} is already registered")]
    ReceiptAlreadyRegistered(String),

    /// Receipt id unknown to the repository
    #[error("Receipt {0} is not registered")]
    ReceiptNotFound(String),

    /// Transport-level errors (device setup, TTY configuration)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid configuration or CLI input
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Fp705Error {
    /// True for the link-level timeout that report commands are allowed to swallow.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Fp705Error::RequestTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_timeout() {
        assert!(Fp705Error::RequestTimeout { attempts: 3 }.is_timeout());
        assert!(!Fp705Error::FrameTooLarge(70000).is_timeout());
    }

    #[test]
    fn test_encoding_message_names_character() {
        let err = Fp705Error::Encoding {
            ch: '★',
            position: 4,
        };
        assert_eq!(
            err.to_string(),
            "Cannot encode '★' at position 4 as cp1251"
        );
    }
}
