use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::drivers::analog_controller::save_state::PackedControllerState;

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl StateRow {
    fn new(field: &'static str, value: impl ToString) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

fn rows(state: &PackedControllerState) -> Vec<StateRow> {
    let length = usize::from(state.response_length);
    vec![
        StateRow::new("Version", state.version),
        StateRow::new("Command", format!("{:?}", state.command)),
        StateRow::new("Step", state.command_step),
        StateRow::new("Response Length", length),
        StateRow::new("Rx", format!("{:02X?}", &state.rx_buffer[..length])),
        StateRow::new("Tx", format!("{:02X?}", &state.tx_buffer[..length])),
        StateRow::new("Analog Mode", state.analog_mode),
        StateRow::new("Analog Locked", state.analog_locked),
        StateRow::new("DualShock", state.dualshock_enabled),
        StateRow::new("Configuration Mode", state.configuration_mode),
        StateRow::new("Toggle Queued", state.analog_toggle_queued),
        StateRow::new("Status", format!("0x{:02X}", state.status_byte)),
        StateRow::new("Buttons", format!("0x{:04X}", state.button_state)),
        StateRow::new("Axes", format!("{:02X?}", state.axis_state)),
        StateRow::new("Rumble Config", format!("{:02X?}", state.rumble_config)),
        StateRow::new("Large Motor Slot", state.large_motor_index),
        StateRow::new("Small Motor Slot", state.small_motor_index),
        StateRow::new("Motors", format!("{:?}", state.motor_state)),
    ]
}

pub async fn handle_state(path: PathBuf) -> Result<(), Box<dyn Error>> {
    let mut file = File::open(&path)?;
    let state = PackedControllerState::read_from(&mut file)?;

    let mut table = Table::new(rows(&state));
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Controller State"));
    println!("{table}");

    Ok(())
}
