//! # Warning Channel
//!
//! Wraps an [`IoChannel`] for one logical operation (a whole receipt, a
//! report, a status query). Status flags the device raises along the way
//! are collected as warnings instead of aborting the operation; a
//! [`Fp705Error::RequestTimeout`] still propagates.

use std::io::{Read, Write};

use tracing::warn;

use super::channel::IoChannel;
use crate::error::Fp705Error;
use crate::protocol::frame::Response;
use crate::protocol::status::{StatusSet, decode_status};
use crate::receipt::PrintReceiptResponse;

pub struct WarningChannel<'a, S: Read + Write> {
    channel: IoChannel<'a, S>,
    warnings: StatusSet,
}

impl<'a, S: Read + Write> WarningChannel<'a, S> {
    pub fn new(channel: IoChannel<'a, S>) -> Self {
        Self {
            channel,
            warnings: StatusSet::new(),
        }
    }

    /// Send `frame`, recording every condition flag of the reply as a warning.
    pub fn send_packet(&mut self, frame: &[u8]) -> Result<Response, Fp705Error> {
        let response = self.channel.send_packet(frame)?;

        for flag in decode_status(response.status())? {
            if self.warnings.insert(flag) {
                warn!(flag = ?flag, "device reported: {}", flag);
            }
        }

        Ok(response)
    }

    /// Everything accumulated so far, in flag declaration order.
    pub fn warnings(&self) -> &StatusSet {
        &self.warnings
    }

    pub fn into_response(self) -> PrintReceiptResponse {
        PrintReceiptResponse::new(self.warnings)
    }
}
