use packed_struct::prelude::*;

/// Address byte the bus master sends to select a controller
pub const ADDRESS_BYTE: u8 = 0x01;

/// Value driven on the data line when the device is not talking
pub const HI_Z: u8 = 0xFF;

/// Transmit and receive buffers do not include the address/Hi-Z byte
pub const MAX_RESPONSE_LENGTH: usize = 8;

/// Opcodes understood by the analog controller
pub const OPCODE_READ_PAD: u8 = 0x42;
pub const OPCODE_CONFIG_MODE_SET_MODE: u8 = 0x43;
pub const OPCODE_SET_ANALOG_MODE: u8 = 0x44;
pub const OPCODE_GET_ANALOG_MODE: u8 = 0x45;
pub const OPCODE_COMMAND_46: u8 = 0x46;
pub const OPCODE_COMMAND_47: u8 = 0x47;
pub const OPCODE_COMMAND_4C: u8 = 0x4C;
pub const OPCODE_GET_SET_RUMBLE: u8 = 0x4D;

/// State of the command/response exchange. The discriminants are part of the
/// save state layout.
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Command {
    #[default]
    Idle = 0,
    Ready = 1,
    ReadPad = 2,
    ConfigModeSetMode = 3,
    SetAnalogMode = 4,
    GetAnalogMode = 5,
    Command46 = 6,
    Command47 = 7,
    Command4C = 8,
    GetSetRumble = 9,
}

impl Command {
    /// Look up the command selected by the given opcode. Everything past
    /// 0x43 only exists while the controller is in configuration mode.
    pub fn from_opcode(opcode: u8, configuration_mode: bool) -> Option<Self> {
        let command = match opcode {
            OPCODE_READ_PAD => Self::ReadPad,
            OPCODE_CONFIG_MODE_SET_MODE => Self::ConfigModeSetMode,
            OPCODE_SET_ANALOG_MODE => Self::SetAnalogMode,
            OPCODE_GET_ANALOG_MODE => Self::GetAnalogMode,
            OPCODE_COMMAND_46 => Self::Command46,
            OPCODE_COMMAND_47 => Self::Command47,
            OPCODE_COMMAND_4C => Self::Command4C,
            OPCODE_GET_SET_RUMBLE => Self::GetSetRumble,
            _ => return None,
        };
        if command.requires_configuration_mode() && !configuration_mode {
            return None;
        }
        Some(command)
    }

    pub fn opcode(&self) -> Option<u8> {
        match self {
            Self::Idle | Self::Ready => None,
            Self::ReadPad => Some(OPCODE_READ_PAD),
            Self::ConfigModeSetMode => Some(OPCODE_CONFIG_MODE_SET_MODE),
            Self::SetAnalogMode => Some(OPCODE_SET_ANALOG_MODE),
            Self::GetAnalogMode => Some(OPCODE_GET_ANALOG_MODE),
            Self::Command46 => Some(OPCODE_COMMAND_46),
            Self::Command47 => Some(OPCODE_COMMAND_47),
            Self::Command4C => Some(OPCODE_COMMAND_4C),
            Self::GetSetRumble => Some(OPCODE_GET_SET_RUMBLE),
        }
    }

    pub fn requires_configuration_mode(&self) -> bool {
        !matches!(
            self,
            Self::Idle | Self::Ready | Self::ReadPad | Self::ConfigModeSetMode
        )
    }

    /// True while an opcode has been accepted and its response is still
    /// being clocked out
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Ready)
    }
}

/// The byte exchange currently in progress
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CommandSession {
    pub command: Command,
    pub step: usize,
    pub rx_buffer: [u8; MAX_RESPONSE_LENGTH],
    pub tx_buffer: [u8; MAX_RESPONSE_LENGTH],
    pub response_length: usize,
}

impl CommandSession {
    /// Start clocking out the response for the given command. The step is
    /// expected to be zero; the opcode byte itself is step 0.
    pub fn begin(
        &mut self,
        command: Command,
        response_length: usize,
        tx_buffer: [u8; MAX_RESPONSE_LENGTH],
    ) {
        self.command = command;
        self.response_length = response_length.min(MAX_RESPONSE_LENGTH);
        self.tx_buffer = tx_buffer;
    }

    /// Record a byte received from the bus at the current step
    pub fn receive(&mut self, data_in: u8) {
        if let Some(slot) = self.rx_buffer.get_mut(self.step) {
            *slot = data_in;
        }
    }

    /// Byte to drive on the bus for the current step
    pub fn transmit(&self) -> u8 {
        self.tx_buffer.get(self.step).copied().unwrap_or(HI_Z)
    }

    /// Payload byte received at the given step of this exchange
    pub fn received(&self, step: usize) -> u8 {
        self.rx_buffer.get(step).copied().unwrap_or_default()
    }

    /// Move on to the next byte. Returns true when the response has been
    /// fully clocked out.
    pub fn advance(&mut self) -> bool {
        self.step += 1;
        self.step >= self.response_length
    }

    /// Drop the exchange. Buffers are kept for debugging and save states.
    pub fn reset(&mut self) {
        self.command = Command::Idle;
        self.step = 0;
    }

    /// Clear everything including the buffers
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
