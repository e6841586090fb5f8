use crate::{
    config::AnalogControllerConfig,
    input::{
        bind::{apply_bind, Bind, PRESS_THRESHOLD},
        capability::InputEvent,
        sample::InputSubscriber,
    },
};

use super::{
    command::{Command, CommandSession, ADDRESS_BYTE, HI_Z, MAX_RESPONSE_LENGTH},
    mode::{ModeState, ToggleRequest},
    rumble::{Motor, Rumble, RUMBLE_CONFIG_SIZE},
    save_state::{PackedControllerState, STATE_VERSION},
    state::{Axis, Button, ControllerState, HalfAxis},
};

// Left stick positions that press the D-pad in digital mode, 30% away from
// the center in either direction.
const DPAD_NEGATIVE_THRESHOLD: u8 = 38;
const DPAD_POSITIVE_THRESHOLD: u8 = 217;

/// Selector bytes of the reserved configuration commands
const SELECTOR_0: u8 = 0x00;
const SELECTOR_1: u8 = 0x01;

/// Byte driven back to the bus master for one clocked byte
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransferReply {
    pub data: u8,
    /// Whether the device pulls /ACK, asking for another byte. The last byte
    /// of an exchange is never acknowledged.
    pub ack: bool,
}

impl TransferReply {
    fn ack(data: u8) -> Self {
        Self { data, ack: true }
    }

    fn nack(data: u8) -> Self {
        Self { data, ack: false }
    }
}

/// Emulated DualShock style analog controller sitting on a controller port
#[derive(Debug)]
pub struct AnalogController {
    index: u32,
    config: AnalogControllerConfig,
    state: ControllerState,
    input: Option<InputSubscriber>,
    session: CommandSession,
    mode: ModeState,
    rumble: Rumble,
    // Fields no longer used but still serialized for older save states
    command_param: u8,
    legacy_rumble_unlocked: bool,
}

impl AnalogController {
    pub fn new(index: u32) -> Self {
        AnalogController::new_with_config(index, AnalogControllerConfig::default())
    }

    /// Create a new controller on the given port with the given configuration.
    pub fn new_with_config(index: u32, config: AnalogControllerConfig) -> Self {
        let mut controller = Self {
            index,
            config: config.clamped(),
            state: ControllerState::default(),
            input: None,
            session: CommandSession::default(),
            mode: ModeState::default(),
            rumble: Rumble::default(),
            command_param: 0,
            legacy_rumble_unlocked: false,
        };
        controller.reset();
        controller
    }

    /// Power cycle the controller. Held inputs survive.
    pub fn reset(&mut self) {
        log::debug!("Resetting controller {}", self.index + 1);
        self.session.clear();
        self.mode = ModeState::default();
        self.rumble.reset();

        if self.config.force_analog_on_reset {
            self.mode.set_analog_mode(true);
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn config(&self) -> &AnalogControllerConfig {
        &self.config
    }

    /// Apply new settings. They take effect on the next reset or input.
    pub fn set_config(&mut self, config: AnalogControllerConfig) {
        self.config = config.clamped();
    }

    /// Take input samples from the given subscriber instead of the setters on
    /// this controller. A sample is copied at the start of every pad read.
    pub fn attach_input(&mut self, input: InputSubscriber) {
        self.input = Some(input);
    }

    pub fn detach_input(&mut self) -> Option<InputSubscriber> {
        self.input.take()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn mode(&self) -> &ModeState {
        &self.mode
    }

    pub fn session(&self) -> &CommandSession {
        &self.session
    }

    pub fn rumble(&self) -> &Rumble {
        &self.rumble
    }

    pub fn command(&self) -> Command {
        self.session.command
    }

    pub fn analog_mode(&self) -> bool {
        self.mode.analog_mode
    }

    pub fn is_analog_locked(&self) -> bool {
        self.mode.is_analog_locked()
    }

    pub fn configuration_mode(&self) -> bool {
        self.mode.configuration_mode
    }

    pub fn dualshock_enabled(&self) -> bool {
        self.mode.dualshock_enabled
    }

    pub fn set_button_state(&mut self, button: Button, pressed: bool) {
        self.state.set_button_state(button, pressed);
    }

    pub fn set_axis_state(&mut self, axis: Axis, value: u8) {
        self.state.set_axis_state(axis, value);
    }

    pub fn set_half_axis_state(&mut self, half_axis: HalfAxis, value: u8) {
        self.state.set_half_axis_state(half_axis, value);
    }

    /// Apply a normalized host input value (0.0 - 1.0) to a controller input
    pub fn set_bind_state(&mut self, bind: Bind, value: f32) {
        if bind == Bind::Analog {
            if value >= PRESS_THRESHOLD {
                self.request_analog_toggle();
            }
            return;
        }
        apply_bind(&mut self.state, &self.config, bind, value);
    }

    /// Apply a host level input event
    pub fn handle_event(&mut self, event: InputEvent) {
        for (bind, value) in event.binds() {
            self.set_bind_state(bind, value);
        }
    }

    /// Flip the analog mode like the analog button does. If an exchange is
    /// in flight the flip waits until it is over.
    pub fn request_analog_toggle(&mut self) -> ToggleRequest {
        let in_flight = self.session.command != Command::Idle;
        let result = self.mode.request_analog_toggle(in_flight);
        if result == ToggleRequest::Applied {
            self.rumble.reset();
        }
        result
    }

    /// Ask for the given reporting mode, respecting the lock the game may
    /// have placed and deferring the change past an exchange in flight.
    /// Returns [ToggleRequest::Unchanged] when no flip is needed, including
    /// when a pending flip away from the requested mode gets cancelled.
    pub fn set_analog_mode(&mut self, enabled: bool) -> ToggleRequest {
        let queued = self.mode.analog_toggle_queued;
        let effective = self.mode.analog_mode != queued;
        if effective == enabled {
            return if queued {
                ToggleRequest::Queued
            } else {
                ToggleRequest::Unchanged
            };
        }
        if self.mode.is_analog_locked() {
            log::debug!("Ignoring analog mode change, mode is locked");
            return ToggleRequest::Locked;
        }
        if queued {
            // The pending flip would move away from the requested mode
            self.mode.analog_toggle_queued = false;
            return ToggleRequest::Unchanged;
        }
        self.request_analog_toggle()
    }

    /// Enter or leave configuration mode outside of a 0x43 exchange
    pub fn toggle_configuration_mode(&mut self, enabled: bool) {
        self.mode.toggle_configuration_mode(enabled);
    }

    /// Set a motor intensity directly. Ignored unless DualShock mode is on.
    pub fn set_motor_state(&mut self, motor: Motor, value: u8) -> bool {
        self.rumble
            .set_motor_state(motor, value, self.mode.dualshock_enabled)
    }

    pub fn motor_state(&self, motor: Motor) -> u8 {
        self.rumble.motor_state(motor)
    }

    /// Strength (0.0 - 1.0) a host vibration device should use for the motor
    pub fn vibration_motor_strength(&self, motor: Motor) -> f32 {
        self.rumble
            .vibration_strength(motor, self.config.vibration_bias)
    }

    /// Pressed buttons as set bits, for input displays
    pub fn button_state_bits(&self) -> u16 {
        self.state.button_state_bits()
    }

    pub fn analog_input_bytes(&self) -> u32 {
        self.state.analog_input_bytes()
    }

    /// Called when the bus master deselects the controller. Any exchange in
    /// progress is abandoned.
    pub fn reset_transfer_state(&mut self) {
        if self.session.command == Command::GetSetRumble {
            // Keep the mapping in line with whatever was written so far
            self.rumble.update_mapping();
        }
        self.session.reset();
        self.apply_queued_toggle();
    }

    /// Clock one byte through the controller
    pub fn transfer(&mut self, data_in: u8) -> TransferReply {
        self.session.receive(data_in);

        match self.session.command {
            Command::Idle => {
                if data_in == ADDRESS_BYTE {
                    log::trace!("Controller {} selected", self.index + 1);
                    self.session.command = Command::Ready;
                    return TransferReply::ack(HI_Z);
                }
                log::trace!("Ignoring byte 0x{data_in:02X} while idle");
                return TransferReply::nack(HI_Z);
            }
            Command::Ready => {
                let Some(command) = Command::from_opcode(data_in, self.mode.configuration_mode)
                else {
                    if self.mode.configuration_mode {
                        log::warn!("Unimplemented config mode command 0x{data_in:02X}");
                    } else {
                        log::debug!("Unknown command 0x{data_in:02X}");
                    }
                    self.session.reset();
                    return TransferReply::nack(HI_Z);
                };
                self.select_command(command);
            }
            command => self.process_byte(command, data_in),
        }

        let data = self.session.transmit();
        log::trace!(
            "Step {}: rx 0x{data_in:02X} tx 0x{data:02X}",
            self.session.step
        );
        if self.session.advance() {
            self.complete_exchange();
            return TransferReply::nack(data);
        }

        TransferReply::ack(data)
    }

    /// Build the response for a newly selected command
    fn select_command(&mut self, command: Command) {
        let id = self.mode.id_byte();
        let status = self.mode.status_byte;
        let zeros = [id, status, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

        let tx_buffer = match command {
            Command::ReadPad => {
                self.sample_input();
                self.pad_response(id, status)
            }
            Command::ConfigModeSetMode => {
                if self.mode.configuration_mode {
                    zeros
                } else {
                    self.sample_input();
                    self.pad_response(id, status)
                }
            }
            Command::SetAnalogMode => {
                self.rumble.reset();
                zeros
            }
            Command::GetAnalogMode => [
                id,
                status,
                0x01,
                0x02,
                u8::from(self.mode.analog_mode),
                0x02,
                0x01,
                0x00,
            ],
            Command::Command47 => [id, status, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00],
            Command::GetSetRumble => {
                // Answer with the old configuration while the new one comes in
                let mut tx_buffer = zeros;
                tx_buffer[2..2 + RUMBLE_CONFIG_SIZE].copy_from_slice(&self.rumble.config);
                tx_buffer
            }
            Command::Command46 | Command::Command4C | Command::Idle | Command::Ready => zeros,
        };

        let response_length = self.mode.response_length();
        log::debug!(
            "Controller {}: command {command:?}, {response_length} byte response",
            self.index + 1
        );
        self.session.begin(command, response_length, tx_buffer);
    }

    /// Handle a byte following the opcode
    fn process_byte(&mut self, command: Command, data_in: u8) {
        let step = self.session.step;
        match command {
            Command::ReadPad => self.process_motor_byte(step, data_in),
            Command::ConfigModeSetMode => {
                if !self.mode.configuration_mode {
                    self.process_motor_byte(step, data_in);
                }
                if step + 1 == self.session.response_length {
                    let enabled = self.session.received(2) == 0x01;
                    self.mode.toggle_configuration_mode(enabled);
                }
            }
            Command::SetAnalogMode => match (step, data_in) {
                (2, 0x00 | 0x01) => {
                    if self.mode.is_analog_locked() {
                        log::debug!("Analog mode is locked, ignoring mode byte 0x{data_in:02X}");
                    } else {
                        self.mode.set_analog_mode(data_in == 0x01);
                    }
                }
                (3, 0x02 | 0x03) => self.mode.set_analog_locked(data_in == 0x03),
                _ => (),
            },
            Command::GetAnalogMode => (),
            Command::Command46 => {
                if step == 2 {
                    match data_in {
                        SELECTOR_0 => {
                            self.session.tx_buffer[4..].copy_from_slice(&[0x01, 0x02, 0x00, 0x0A])
                        }
                        SELECTOR_1 => {
                            self.session.tx_buffer[4..].copy_from_slice(&[0x01, 0x01, 0x01, 0x14])
                        }
                        _ => (),
                    }
                }
            }
            Command::Command47 => {
                if step == 2 && data_in != SELECTOR_0 {
                    self.session.tx_buffer[4] = 0x00;
                    self.session.tx_buffer[6] = 0x00;
                }
            }
            Command::Command4C => {
                if step == 2 {
                    match data_in {
                        SELECTOR_0 => self.session.tx_buffer[5] = 0x04,
                        SELECTOR_1 => self.session.tx_buffer[5] = 0x07,
                        _ => (),
                    }
                }
            }
            Command::GetSetRumble => {
                if let Some(slot) = step.checked_sub(2) {
                    self.rumble.write_config(slot, data_in);
                }
            }
            Command::Idle | Command::Ready => (),
        }
    }

    /// Request bytes of a pad read double as motor commands
    fn process_motor_byte(&mut self, step: usize, data_in: u8) {
        if self.mode.dualshock_enabled {
            if let Some(slot) = step.checked_sub(2) {
                self.rumble.set_motor_state_for_slot(slot, data_in, true);
            }
        } else if step == 3 {
            let on = (self.session.received(2) & 0xC0) == 0x40 && (data_in & 0x01) != 0;
            self.rumble.set_legacy_motor_state(on);
        }
    }

    /// Commit side effects of the finished exchange and go back to idle
    fn complete_exchange(&mut self) {
        let command = self.session.command;
        if command == Command::GetSetRumble {
            self.rumble.update_mapping();
            self.rumble.stop_unmapped_motors(self.mode.dualshock_enabled);
        }

        let length = self.session.response_length;
        log::debug!("Rx: {:02X?}", &self.session.rx_buffer[..length]);
        log::debug!("Tx: {:02X?}", &self.session.tx_buffer[..length]);

        self.session.reset();
        self.apply_queued_toggle();
    }

    fn apply_queued_toggle(&mut self) {
        if self.mode.take_queued_toggle() && self.mode.toggle_analog_mode() {
            self.rumble.reset();
        }
    }

    /// Copy the latest published input sample, if input comes from elsewhere
    fn sample_input(&mut self) {
        if let Some(input) = self.input.as_mut() {
            self.state = input.snapshot();
        }
    }

    fn pad_response(&self, id: u8, status: u8) -> [u8; MAX_RESPONSE_LENGTH] {
        let buttons = self.state.button_state;
        [
            id,
            status,
            (buttons as u8) & self.extra_button_mask_lsb(),
            (buttons >> 8) as u8,
            self.state.axis(Axis::RightX),
            self.state.axis(Axis::RightY),
            self.state.axis(Axis::LeftX),
            self.state.axis(Axis::LeftY),
        ]
    }

    /// Mask for the low button byte pressing the D-pad from the left stick
    fn extra_button_mask_lsb(&self) -> u8 {
        if !self.config.analog_dpad_in_digital_mode
            || self.mode.analog_mode
            || self.mode.configuration_mode
        {
            return 0xFF;
        }

        let x = self.state.axis(Axis::LeftX);
        let y = self.state.axis(Axis::LeftY);
        let mut pressed: u16 = 0;
        if x <= DPAD_NEGATIVE_THRESHOLD {
            pressed |= Button::Left.mask();
        }
        if x >= DPAD_POSITIVE_THRESHOLD {
            pressed |= Button::Right.mask();
        }
        if y <= DPAD_NEGATIVE_THRESHOLD {
            pressed |= Button::Up.mask();
        }
        if y >= DPAD_POSITIVE_THRESHOLD {
            pressed |= Button::Down.mask();
        }
        !(pressed as u8)
    }

    /// Flatten the controller into its save state layout
    pub(super) fn to_packed(&self) -> PackedControllerState {
        PackedControllerState {
            version: STATE_VERSION,
            command: self.session.command,
            command_step: self.session.step as u8,
            rx_buffer: self.session.rx_buffer,
            tx_buffer: self.session.tx_buffer,
            response_length: self.session.response_length as u8,
            analog_mode: self.mode.analog_mode,
            analog_locked: self.mode.analog_locked,
            dualshock_enabled: self.mode.dualshock_enabled,
            configuration_mode: self.mode.configuration_mode,
            analog_toggle_queued: self.mode.analog_toggle_queued,
            status_byte: self.mode.status_byte,
            axis_state: self.state.axis_state,
            half_axis_state: self.state.half_axis_state,
            rumble_config: self.rumble.config,
            large_motor_index: self.rumble.large_motor_index,
            small_motor_index: self.rumble.small_motor_index,
            button_state: self.state.button_state,
            motor_state: self.rumble.motor_state,
            command_param: self.command_param,
            legacy_rumble_unlocked: self.legacy_rumble_unlocked,
        }
    }

    /// Restore a validated save state. Without `apply_input_state` the
    /// buttons and the analog mode currently held by the user are kept.
    pub(super) fn restore(&mut self, packed: &PackedControllerState, apply_input_state: bool) {
        let old_analog_mode = self.mode.analog_mode;

        self.session = CommandSession {
            command: packed.command,
            step: usize::from(packed.command_step),
            rx_buffer: packed.rx_buffer,
            tx_buffer: packed.tx_buffer,
            response_length: usize::from(packed.response_length),
        };
        self.mode = ModeState {
            analog_mode: packed.analog_mode,
            analog_locked: packed.analog_locked,
            dualshock_enabled: packed.dualshock_enabled,
            configuration_mode: packed.configuration_mode,
            analog_toggle_queued: packed.analog_toggle_queued,
            status_byte: packed.status_byte,
        };
        self.rumble = Rumble {
            config: packed.rumble_config,
            large_motor_index: packed.large_motor_index,
            small_motor_index: packed.small_motor_index,
            motor_state: packed.motor_state,
        };
        if self.rumble.clamp_indices() {
            log::warn!(
                "Save state has out of range rumble motor indices, treating them as unmapped"
            );
        }
        self.command_param = packed.command_param;
        self.legacy_rumble_unlocked = packed.legacy_rumble_unlocked;

        if apply_input_state {
            self.state = ControllerState {
                button_state: packed.button_state,
                axis_state: packed.axis_state,
                half_axis_state: packed.half_axis_state,
            };
        } else {
            self.mode.analog_mode = old_analog_mode;
        }

        if old_analog_mode != self.mode.analog_mode {
            log::info!(
                "Controller {} switched to {} mode by save state",
                self.index + 1,
                if self.mode.analog_mode { "analog" } else { "digital" }
            );
        }
    }
}
