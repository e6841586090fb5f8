use crate::drivers::analog_controller::state::{Button, HalfAxis};

use super::bind::Bind;

/// Generic gamepad buttons a host input device can report
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    South,
    East,
    North,
    West,
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,
    Start,
    Select,
    Guide,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GamepadAxis {
    LeftStick,
    RightStick,
}

/// Host level input event before it is translated into controller binds
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Button { button: GamepadButton, pressed: bool },
    /// Stick position with each component from -1.0 to 1.0. Negative x is
    /// left, negative y is up. A missing component did not change.
    Axis {
        axis: GamepadAxis,
        x: Option<f32>,
        y: Option<f32>,
    },
}

impl GamepadButton {
    /// Controller bind the button is wired to
    pub fn as_bind(&self) -> Bind {
        match self {
            GamepadButton::South => Bind::Button(Button::Cross),
            GamepadButton::East => Bind::Button(Button::Circle),
            GamepadButton::North => Bind::Button(Button::Triangle),
            GamepadButton::West => Bind::Button(Button::Square),
            GamepadButton::LeftBumper => Bind::Button(Button::L1),
            GamepadButton::RightBumper => Bind::Button(Button::R1),
            GamepadButton::LeftTrigger => Bind::Button(Button::L2),
            GamepadButton::RightTrigger => Bind::Button(Button::R2),
            GamepadButton::Start => Bind::Button(Button::Start),
            GamepadButton::Select => Bind::Button(Button::Select),
            GamepadButton::Guide => Bind::Analog,
            GamepadButton::LeftStick => Bind::Button(Button::L3),
            GamepadButton::RightStick => Bind::Button(Button::R3),
            GamepadButton::DPadUp => Bind::Button(Button::Up),
            GamepadButton::DPadDown => Bind::Button(Button::Down),
            GamepadButton::DPadLeft => Bind::Button(Button::Left),
            GamepadButton::DPadRight => Bind::Button(Button::Right),
        }
    }
}

impl InputEvent {
    /// Translate the event into bind values from 0.0 to 1.0
    pub fn binds(&self) -> Vec<(Bind, f32)> {
        match *self {
            InputEvent::Button { button, pressed } => {
                vec![(button.as_bind(), if pressed { 1.0 } else { 0.0 })]
            }
            InputEvent::Axis { axis, x, y } => {
                let (left, right, up, down) = match axis {
                    GamepadAxis::LeftStick => (
                        HalfAxis::LLeft,
                        HalfAxis::LRight,
                        HalfAxis::LUp,
                        HalfAxis::LDown,
                    ),
                    GamepadAxis::RightStick => (
                        HalfAxis::RLeft,
                        HalfAxis::RRight,
                        HalfAxis::RUp,
                        HalfAxis::RDown,
                    ),
                };

                let mut binds = Vec::with_capacity(4);
                if let Some(x) = x {
                    binds.push((Bind::HalfAxis(left), (-x).max(0.0)));
                    binds.push((Bind::HalfAxis(right), x.max(0.0)));
                }
                if let Some(y) = y {
                    binds.push((Bind::HalfAxis(up), (-y).max(0.0)));
                    binds.push((Bind::HalfAxis(down), y.max(0.0)));
                }
                binds
            }
        }
    }
}
