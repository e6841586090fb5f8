use std::io::{self, Read, Write};

use packed_struct::prelude::*;
use thiserror::Error;

use super::{
    command::{Command, MAX_RESPONSE_LENGTH},
    driver::AnalogController,
};

/// Layout version written at the start of every save state
pub const STATE_VERSION: u8 = 1;

/// Size in bytes of a packed save state
pub const STATE_SIZE: usize = 52;

/// Represents all possible errors saving or loading controller state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Could not read or write state: {0}")]
    IoError(io::Error),
    #[error("State data ended early")]
    Truncated,
    #[error("Unsupported state version {0}")]
    UnsupportedVersion(u8),
    #[error("Unable to pack or unpack state: {0}")]
    PackingError(#[from] PackingError),
    #[error("Invalid command session in state: {0}")]
    InvalidSession(String),
}

impl From<io::Error> for StateError {
    fn from(value: io::Error) -> Self {
        if value.kind() == io::ErrorKind::UnexpectedEof {
            return StateError::Truncated;
        }
        StateError::IoError(value)
    }
}

/// Serialized form of an [AnalogController]. Every field keeps a fixed
/// offset so states written by one build can be read by another.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "52")]
pub struct PackedControllerState {
    #[packed_field(bytes = "0")]
    pub version: u8,

    // Command session
    #[packed_field(bytes = "1", ty = "enum")]
    pub command: Command,
    #[packed_field(bytes = "2")]
    pub command_step: u8,
    #[packed_field(bytes = "3..=10")]
    pub rx_buffer: [u8; 8],
    #[packed_field(bytes = "11..=18")]
    pub tx_buffer: [u8; 8],
    #[packed_field(bytes = "19")]
    pub response_length: u8,

    // Mode flags, one per byte
    #[packed_field(bits = "167")]
    pub analog_mode: bool,
    #[packed_field(bits = "175")]
    pub analog_locked: bool,
    #[packed_field(bits = "183")]
    pub dualshock_enabled: bool,
    #[packed_field(bits = "191")]
    pub configuration_mode: bool,
    #[packed_field(bits = "199")]
    pub analog_toggle_queued: bool,
    #[packed_field(bytes = "25")]
    pub status_byte: u8,

    // Input
    #[packed_field(bytes = "26..=29")]
    pub axis_state: [u8; 4],
    #[packed_field(bytes = "30..=37")]
    pub half_axis_state: [u8; 8],

    // Rumble
    #[packed_field(bytes = "38..=43")]
    pub rumble_config: [u8; 6],
    #[packed_field(bytes = "44")]
    pub large_motor_index: i8,
    #[packed_field(bytes = "45")]
    pub small_motor_index: i8,

    #[packed_field(bytes = "46..=47", endian = "lsb")]
    pub button_state: u16,
    #[packed_field(bytes = "48..=49")]
    pub motor_state: [u8; 2],

    // Legacy
    #[packed_field(bytes = "50")]
    pub command_param: u8,
    #[packed_field(bits = "415")]
    pub legacy_rumble_unlocked: bool,
}

impl PackedControllerState {
    /// Read and validate a packed state from the given reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, StateError> {
        let mut buf = [0; STATE_SIZE];
        reader.read_exact(&mut buf)?;
        if buf[0] != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(buf[0]));
        }

        let state = PackedControllerState::unpack(&buf)?;
        state.validate()?;
        Ok(state)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), StateError> {
        let buf = self.pack()?;
        writer.write_all(&buf)?;
        Ok(())
    }

    /// Check that the command session can be resumed
    fn validate(&self) -> Result<(), StateError> {
        let length = usize::from(self.response_length);
        let step = usize::from(self.command_step);
        if length > MAX_RESPONSE_LENGTH {
            return Err(StateError::InvalidSession(format!(
                "response length {length} exceeds {MAX_RESPONSE_LENGTH}"
            )));
        }
        if self.command.is_active() {
            if step >= length {
                return Err(StateError::InvalidSession(format!(
                    "step {step} of {:?} is past the response length {length}",
                    self.command
                )));
            }
        } else if step != 0 {
            return Err(StateError::InvalidSession(format!(
                "step {step} while {:?}",
                self.command
            )));
        }
        Ok(())
    }
}

impl AnalogController {
    /// Serialize the full controller state to the given writer
    pub fn save_state<W: Write>(&self, writer: &mut W) -> Result<(), StateError> {
        let state = self.to_packed();
        log::trace!("Saving controller state: {state}");
        state.write_to(writer)
    }

    /// Restore the full controller state from the given reader. Nothing is
    /// changed if the state cannot be read.
    pub fn load_state<R: Read>(&mut self, reader: &mut R) -> Result<(), StateError> {
        self.load_state_with_options(reader, true)
    }

    /// Restore controller state. Without `apply_input_state` the buttons, axes
    /// and analog mode currently held by the user are kept.
    pub fn load_state_with_options<R: Read>(
        &mut self,
        reader: &mut R,
        apply_input_state: bool,
    ) -> Result<(), StateError> {
        let state = PackedControllerState::read_from(reader)?;
        log::trace!("Loading controller state: {state}");
        self.restore(&state, apply_input_state);
        Ok(())
    }
}
