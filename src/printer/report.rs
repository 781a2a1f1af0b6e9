//! # Reports
//!
//! Fiscal memory report by date and operator report. The device does not
//! reliably answer either command, so both run with the short report retry
//! bound and treat a timeout as success.

use std::io::{Read, Write};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::fp705::{Fp705Printer, open_channel};
use crate::error::Fp705Error;
use crate::protocol::commands::{FISCAL_MEMORY_REPORT_BY_DATE, REPORT_DATE_FORMAT, REPORT_OPERATORS};
use crate::protocol::frame::{build_frame, params};

/// Detail level of a period report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    #[default]
    Short,
    Extended,
}

impl PeriodType {
    fn code(self) -> &'static str {
        match self {
            PeriodType::Short => "0",
            PeriodType::Extended => "1",
        }
    }
}

/// Whether operator registers are cleared after the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterState {
    #[default]
    Keep,
    Clear,
}

impl RegisterState {
    fn code(self) -> &'static str {
        match self {
            RegisterState::Keep => "0",
            RegisterState::Clear => "1",
        }
    }
}

/// `{Type}{Start}{End}` with dates as DD-MM-YY.
pub fn period_report_params(
    start: NaiveDateTime,
    end: NaiveDateTime,
    period: PeriodType,
) -> Result<String, Fp705Error> {
    let from = start.format(REPORT_DATE_FORMAT).to_string();
    let to = end.format(REPORT_DATE_FORMAT).to_string();
    params(&[period.code(), from.as_str(), to.as_str()])
}

/// `{FirstOper}{LastOper}{Clear}` for a single operator.
pub fn operator_report_params(
    operator_id: &str,
    state: RegisterState,
) -> Result<String, Fp705Error> {
    params(&[operator_id, operator_id, state.code()])
}

impl<S: Read + Write> Fp705Printer<S> {
    /// Print the fiscal memory report between `start` and `end`.
    ///
    /// A timeout is not an error: the device may print without answering.
    pub fn report_for_period(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        period: PeriodType,
    ) -> Result<(), Fp705Error> {
        let data = period_report_params(start, end, period)?;
        self.send_report(FISCAL_MEMORY_REPORT_BY_DATE, &data)
    }

    /// Print the report of a single operator, optionally clearing its registers.
    ///
    /// A timeout is not an error: the device may print without answering.
    pub fn report_for_operator(
        &mut self,
        operator_id: &str,
        state: RegisterState,
    ) -> Result<(), Fp705Error> {
        let data = operator_report_params(operator_id, state)?;
        self.send_report(REPORT_OPERATORS, &data)
    }

    fn send_report(&mut self, cmd: u8, data: &str) -> Result<(), Fp705Error> {
        let frame = build_frame(self.config.seq_start, cmd, data)?;
        let mut channel = open_channel(&mut self.stream, self.config.report_retries);

        match channel.send_packet(&frame) {
            Ok(response) => {
                debug!(cmd, data = ?response.data(), warnings = ?channel.warnings(), "report answered");
                Ok(())
            }
            Err(e) if e.is_timeout() => {
                info!(cmd, "report sent, no answer from device");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
