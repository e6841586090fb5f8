use crate::{
    config::AnalogControllerConfig,
    drivers::analog_controller::state::{Button, ControllerState, HalfAxis},
};

/// Bind values at or above this level count as pressed
pub const PRESS_THRESHOLD: f32 = 0.5;

/// Index of the analog mode button in the flat bind numbering
const ANALOG_BIND_INDEX: u32 = Button::ALL.len() as u32;

/// A single input of the analog controller a host input can be bound to
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Bind {
    Button(Button),
    /// The mode button on the controller face, not reported over the bus
    Analog,
    HalfAxis(HalfAxis),
}

impl Bind {
    /// Look up a bind from its flat index: the 16 buttons, then the analog
    /// button, then the 8 half axes.
    pub fn from_index(index: u32) -> Option<Self> {
        if let Some(button) = Button::ALL.get(index as usize) {
            return Some(Self::Button(*button));
        }
        if index == ANALOG_BIND_INDEX {
            return Some(Self::Analog);
        }
        let sub_index = (index - ANALOG_BIND_INDEX - 1) as usize;
        HalfAxis::ALL.get(sub_index).map(|axis| Self::HalfAxis(*axis))
    }

    pub fn index(&self) -> u32 {
        match self {
            Self::Button(button) => *button as u32,
            Self::Analog => ANALOG_BIND_INDEX,
            Self::HalfAxis(axis) => ANALOG_BIND_INDEX + 1 + *axis as u32,
        }
    }
}

/// Convert a normalized stick magnitude into a half axis byte
pub fn half_axis_value(config: &AnalogControllerConfig, value: f32) -> u8 {
    let value = config.apply_deadzone_sensitivity(value);
    (value * 255.0).clamp(0.0, 255.0) as u8
}

/// Apply a normalized bind value (0.0 - 1.0) to the given state. The analog
/// button has no representation in [ControllerState] and is left to the
/// caller. Returns true if the state changed.
pub fn apply_bind(
    state: &mut ControllerState,
    config: &AnalogControllerConfig,
    bind: Bind,
    value: f32,
) -> bool {
    match bind {
        Bind::Button(button) => {
            let pressed = value >= PRESS_THRESHOLD;
            let changed = state.is_pressed(button) != pressed;
            state.set_button_state(button, pressed);
            changed
        }
        Bind::HalfAxis(axis) => state.set_half_axis_state(axis, half_axis_value(config, value)),
        Bind::Analog => false,
    }
}
