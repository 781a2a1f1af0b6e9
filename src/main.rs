//! # fp705 CLI
//!
//! Command-line interface for a Datecs FP705 fiscal printer.
//!
//! ## Usage
//!
//! ```bash
//! # Device status flags
//! fp705 status
//!
//! # Device clock
//! fp705 --device /dev/ttyUSB1 time
//!
//! # Non-fiscal receipt from JSON
//! fp705 print receipt.json
//!
//! # Fiscal receipt with a VAT policy
//! fp705 print --fiscal --policy policy.json receipt.json
//!
//! # Fiscal memory report
//! fp705 report-period --start 2026-10-01 --end 2026-10-19 --detailed
//!
//! # Operator report, clearing registers
//! fp705 report-operator 1 --clear
//!
//! # Queue several receipts and print them in order
//! fp705 print-batch --fiscal a.json b.json c.json
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG`; results go to stdout as JSON.

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fp705::{
    FiscalPolicy, Fp705Error, Fp705Printer, InMemoryPrintQueue, InMemoryReceiptRepository,
    PeriodType, PrintStatus, PrinterConfig, PrintingService, Receipt, RegisterState,
    service::{PrintReceiptRequest, ReceiptRepository},
    transport::{
        SerialPort,
        serial::{DEFAULT_BAUD, DEFAULT_DEVICE},
    },
};

/// fp705 - Datecs FP705 fiscal printer utility
#[derive(Parser, Debug)]
#[command(name = "fp705")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Printer device path
    #[arg(long, global = true, default_value = DEFAULT_DEVICE)]
    device: String,

    /// Serial line speed
    #[arg(long, global = true, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Read timeout per attempt, in milliseconds
    #[arg(long, global = true, default_value_t = 500)]
    timeout_ms: u64,

    /// Attempts per frame for receipts and queries
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Attempts per frame for reports
    #[arg(long, global = true)]
    report_retries: Option<u32>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the device status flags
    Status,

    /// Print the device clock
    Time,

    /// Print a receipt described by a JSON file
    Print {
        /// Receipt JSON file
        receipt: PathBuf,

        /// Print as a fiscal receipt
        #[arg(long)]
        fiscal: bool,

        /// Fiscal policy JSON file: `[{"vat": 20, "group": "2"}, ...]`
        #[arg(long, value_name = "FILE")]
        policy: Option<PathBuf>,
    },

    /// Queue receipts and print them one after another
    PrintBatch {
        /// Receipt JSON files; a receipt without an id is named after its file
        #[arg(required = true)]
        receipts: Vec<PathBuf>,

        /// Print as fiscal receipts
        #[arg(long)]
        fiscal: bool,

        /// Fiscal policy JSON file
        #[arg(long, value_name = "FILE")]
        policy: Option<PathBuf>,
    },

    /// Fiscal memory report between two dates
    ReportPeriod {
        /// First day (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        #[arg(long, value_parser = parse_timestamp)]
        start: NaiveDateTime,

        /// Last day (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        #[arg(long, value_parser = parse_timestamp)]
        end: NaiveDateTime,

        /// Detailed instead of short report
        #[arg(long)]
        detailed: bool,
    },

    /// Report for a single operator
    ReportOperator {
        /// Operator id (1-30)
        operator: String,

        /// Clear the operator's registers afterwards
        #[arg(long)]
        clear: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logger(verbose: bool) {
    let default = if verbose { "fp705=debug" } else { "fp705=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), Fp705Error> {
    let config = build_config(&cli)?;

    // Validate inputs before touching the device
    let job = match cli.command {
        Commands::Print {
            receipt,
            fiscal,
            policy,
        } => {
            let receipt: Receipt = read_json(&receipt)?;
            let policy: Vec<FiscalPolicy> = match policy {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            Job::Print {
                receipt,
                fiscal,
                policy,
            }
        }
        Commands::PrintBatch {
            receipts,
            fiscal,
            policy,
        } => {
            let receipts = receipts
                .iter()
                .map(|path| read_batch_receipt(path))
                .collect::<Result<Vec<_>, _>>()?;
            let policy: Vec<FiscalPolicy> = match policy {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            Job::PrintBatch {
                receipts,
                fiscal,
                policy,
            }
        }
        Commands::Status => Job::Status,
        Commands::Time => Job::Time,
        Commands::ReportPeriod {
            start,
            end,
            detailed,
        } => {
            if end < start {
                return Err(Fp705Error::Config("--end is before --start".into()));
            }
            let period = if detailed {
                PeriodType::Extended
            } else {
                PeriodType::Short
            };
            Job::ReportPeriod { start, end, period }
        }
        Commands::ReportOperator { operator, clear } => {
            let state = if clear {
                RegisterState::Clear
            } else {
                RegisterState::Keep
            };
            Job::ReportOperator { operator, state }
        }
    };

    let open_port = || SerialPort::open(&cli.device, config.baud, config.read_timeout);

    match job {
        Job::Print {
            receipt,
            fiscal,
            policy,
        } => {
            let mut printer = Fp705Printer::with_config(open_port()?, policy, config);
            let response = if fiscal {
                printer.print_fiscal_receipt(&receipt)?
            } else {
                printer.print_receipt(&receipt)?
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
            printer.close()?;
        }
        Job::Status => {
            let mut printer = Fp705Printer::with_config(open_port()?, Vec::new(), config);
            let status = printer.get_status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            printer.close()?;
        }
        Job::Time => {
            let mut printer = Fp705Printer::with_config(open_port()?, Vec::new(), config);
            println!("{}", serde_json::to_string(&printer.get_time()?)?);
            printer.close()?;
        }
        Job::ReportPeriod { start, end, period } => {
            let mut printer = Fp705Printer::with_config(open_port()?, Vec::new(), config);
            printer.report_for_period(start, end, period)?;
            printer.close()?;
        }
        Job::ReportOperator { operator, state } => {
            let mut printer = Fp705Printer::with_config(open_port()?, Vec::new(), config);
            printer.report_for_operator(&operator, state)?;
            printer.close()?;
        }
        Job::PrintBatch {
            receipts,
            fiscal,
            policy,
        } => print_batch(open_port, config, receipts, fiscal, policy)?,
    }

    Ok(())
}

/// Submit every receipt, then drain the queue, opening the port per receipt.
fn print_batch<F>(
    open_port: F,
    config: PrinterConfig,
    receipts: Vec<Receipt>,
    fiscal: bool,
    policy: Vec<FiscalPolicy>,
) -> Result<(), Fp705Error>
where
    F: Fn() -> Result<SerialPort, Fp705Error>,
{
    let mut service = PrintingService::new(
        InMemoryPrintQueue::new(),
        InMemoryReceiptRepository::new(),
    );
    let mut ids = Vec::with_capacity(receipts.len());
    for receipt in receipts {
        ids.push(service.submit(PrintReceiptRequest::new(receipt, fiscal))?);
    }

    service.print_receipts(|| {
        Ok(Fp705Printer::with_config(open_port()?, policy.clone(), config))
    });

    let outcome = ids
        .into_iter()
        .map(|id| {
            let status = service.repository().get_status(&id)?;
            Ok((id, status))
        })
        .collect::<Result<BTreeMap<String, PrintStatus>, Fp705Error>>()?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// A parsed command, ready to run against the device.
enum Job {
    Print {
        receipt: Receipt,
        fiscal: bool,
        policy: Vec<FiscalPolicy>,
    },
    PrintBatch {
        receipts: Vec<Receipt>,
        fiscal: bool,
        policy: Vec<FiscalPolicy>,
    },
    Status,
    Time,
    ReportPeriod {
        start: NaiveDateTime,
        end: NaiveDateTime,
        period: PeriodType,
    },
    ReportOperator {
        operator: String,
        state: RegisterState,
    },
}

fn build_config(cli: &Cli) -> Result<PrinterConfig, Fp705Error> {
    let mut config = PrinterConfig::FP705
        .with_baud(cli.baud)
        .with_read_timeout(Duration::from_millis(cli.timeout_ms));
    if let Some(retries) = cli.retries {
        config = config.with_max_retries(retries);
    }
    if let Some(retries) = cli.report_retries {
        config = config.with_report_retries(retries);
    }
    config.validate()?;
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Fp705Error> {
    let text = fs::read_to_string(path)
        .map_err(|e| Fp705Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&text)?)
}

fn read_batch_receipt(path: &Path) -> Result<Receipt, Fp705Error> {
    let mut receipt: Receipt = read_json(path)?;
    if receipt.receipt_id.is_none() {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        receipt.receipt_id = stem;
    }
    Ok(receipt)
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ts);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", value))
}
