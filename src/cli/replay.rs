use std::error::Error;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};
use thiserror::Error;

use crate::config::AnalogControllerConfig;
use crate::drivers::analog_controller::AnalogController;

/// Represents all possible errors loading a [Trace]
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
    #[error("Invalid hex byte '{0}' in exchange {1}")]
    InvalidHex(String, usize),
}

/// Recorded sequence of bus exchanges
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Trace {
    /// Each exchange is a string of hex bytes sent by the bus master,
    /// starting with the address byte. e.g. "01 42 00 00 00"
    pub exchanges: Vec<String>,
    /// Deselect the controller after every exchange
    #[serde(default = "default_deselect")]
    pub deselect: bool,
}

fn default_deselect() -> bool {
    true
}

impl Trace {
    pub fn from_yaml(content: String) -> Result<Trace, TraceError> {
        let trace: Trace = serde_yaml::from_str(content.as_str())?;
        Ok(trace)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Trace, TraceError> {
        let file = File::open(path)?;
        let trace: Trace = serde_yaml::from_reader(file)?;
        Ok(trace)
    }

    /// Decode every exchange into the bytes to send
    pub fn decode(&self) -> Result<Vec<Vec<u8>>, TraceError> {
        self.exchanges
            .iter()
            .enumerate()
            .map(|(i, exchange)| parse_hex(exchange, i))
            .collect()
    }
}

/// Parse whitespace separated hex bytes, with or without a 0x prefix
pub fn parse_hex(exchange: &str, index: usize) -> Result<Vec<u8>, TraceError> {
    exchange
        .split_whitespace()
        .map(|byte| {
            let digits = byte.trim_start_matches("0x").trim_start_matches("0X");
            u8::from_str_radix(digits, 16)
                .map_err(|_| TraceError::InvalidHex(byte.to_string(), index))
        })
        .collect()
}

/// Result of clocking one exchange through the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResult {
    pub sent: Vec<u8>,
    pub received: Vec<u8>,
    /// Number of bytes the controller acknowledged
    pub acked: usize,
}

#[derive(Tabled)]
struct ExchangeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Sent")]
    sent: String,
    #[tabled(rename = "Received")]
    received: String,
    #[tabled(rename = "Acked")]
    acked: usize,
}

/// Clock the given exchange through the controller. Like a real bus master,
/// sending stops at the first byte the controller does not acknowledge.
pub fn run_exchange(
    controller: &mut AnalogController,
    bytes: &[u8],
    deselect: bool,
) -> ExchangeResult {
    let mut result = ExchangeResult {
        sent: Vec::with_capacity(bytes.len()),
        received: Vec::with_capacity(bytes.len()),
        acked: 0,
    };

    for byte in bytes {
        let reply = controller.transfer(*byte);
        result.sent.push(*byte);
        result.received.push(reply.data);
        if !reply.ack {
            break;
        }
        result.acked += 1;
    }

    if deselect {
        controller.reset_transfer_state();
    }

    result
}

/// Replay the whole trace, returning the result of every exchange
pub fn run_trace(
    controller: &mut AnalogController,
    trace: &Trace,
) -> Result<Vec<ExchangeResult>, TraceError> {
    let exchanges = trace.decode()?;
    let results = exchanges
        .iter()
        .map(|bytes| run_exchange(controller, bytes, trace.deselect))
        .collect();
    Ok(results)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub async fn handle_replay(
    trace_path: PathBuf,
    config_path: Option<PathBuf>,
    save_state_path: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let config = match config_path {
        Some(path) => AnalogControllerConfig::from_yaml_file(path)?,
        None => AnalogControllerConfig::default(),
    };
    let trace = Trace::from_yaml_file(&trace_path)?;
    log::debug!("Replaying {} exchanges from {trace_path:?}", trace.exchanges.len());

    let mut controller = AnalogController::new(0);
    controller.set_config(config);
    controller.reset();
    log::debug!(
        "Controller {} settings: {:?}",
        controller.index() + 1,
        controller.config()
    );
    let results = run_trace(&mut controller, &trace)?;

    let rows: Vec<ExchangeRow> = results
        .iter()
        .enumerate()
        .map(|(index, result)| ExchangeRow {
            index,
            sent: to_hex(&result.sent),
            received: to_hex(&result.received),
            acked: result.acked,
        })
        .collect();
    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Bus Exchanges"));
    println!("{table}");

    println!(
        "Final mode: {} (id 0x{:02X}), locked: {}, config mode: {}",
        if controller.analog_mode() {
            "analog"
        } else {
            "digital"
        },
        controller.mode().id_byte(),
        controller.is_analog_locked(),
        controller.configuration_mode(),
    );

    if let Some(path) = save_state_path {
        let mut file = File::create(&path)?;
        controller.save_state(&mut file)?;
        println!("Saved controller state to: {}", path.display());
    }

    Ok(())
}
