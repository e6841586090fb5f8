//! Button and axis sample reported by the analog controller. Nothing in here
//! knows about the serial protocol.

/// Digital inputs in the order of their bit in the button halfword.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Button {
    Select = 0,
    L3 = 1,
    R3 = 2,
    Start = 3,
    Up = 4,
    Right = 5,
    Down = 6,
    Left = 7,
    L2 = 8,
    R2 = 9,
    L1 = 10,
    R1 = 11,
    Triangle = 12,
    Circle = 13,
    Cross = 14,
    Square = 15,
}

impl Button {
    pub const ALL: [Button; 16] = [
        Button::Select,
        Button::L3,
        Button::R3,
        Button::Start,
        Button::Up,
        Button::Right,
        Button::Down,
        Button::Left,
        Button::L2,
        Button::R2,
        Button::L1,
        Button::R1,
        Button::Triangle,
        Button::Circle,
        Button::Cross,
        Button::Square,
    ];

    /// Bit mask of this button inside the button halfword
    pub fn mask(&self) -> u16 {
        1 << (*self as u8)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
}

pub const NUM_AXES: usize = 4;

/// One direction of a stick axis. Each half axis carries a magnitude that is
/// merged with its opposite into a single [Axis] byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HalfAxis {
    LLeft = 0,
    LRight = 1,
    LDown = 2,
    LUp = 3,
    RLeft = 4,
    RRight = 5,
    RDown = 6,
    RUp = 7,
}

pub const NUM_HALF_AXES: usize = 8;

impl HalfAxis {
    pub const ALL: [HalfAxis; NUM_HALF_AXES] = [
        HalfAxis::LLeft,
        HalfAxis::LRight,
        HalfAxis::LDown,
        HalfAxis::LUp,
        HalfAxis::RLeft,
        HalfAxis::RRight,
        HalfAxis::RDown,
        HalfAxis::RUp,
    ];

    /// Returns the merged axis, and the (positive, negative) half axes that
    /// make it up.
    pub fn components(&self) -> (Axis, HalfAxis, HalfAxis) {
        match self {
            HalfAxis::LLeft | HalfAxis::LRight => (Axis::LeftX, HalfAxis::LRight, HalfAxis::LLeft),
            HalfAxis::LDown | HalfAxis::LUp => (Axis::LeftY, HalfAxis::LDown, HalfAxis::LUp),
            HalfAxis::RLeft | HalfAxis::RRight => {
                (Axis::RightX, HalfAxis::RRight, HalfAxis::RLeft)
            }
            HalfAxis::RDown | HalfAxis::RUp => (Axis::RightY, HalfAxis::RDown, HalfAxis::RUp),
        }
    }
}

/// Axis value reported for a stick at rest
pub const AXIS_CENTER: u8 = 0x80;

/// Buttons are active low, so this is the state with nothing pressed
pub const BUTTONS_RELEASED: u16 = 0xFFFF;

/// Current input sample of the controller
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControllerState {
    pub button_state: u16,
    pub axis_state: [u8; NUM_AXES],
    pub half_axis_state: [u8; NUM_HALF_AXES],
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            button_state: BUTTONS_RELEASED,
            axis_state: [AXIS_CENTER; NUM_AXES],
            half_axis_state: [0; NUM_HALF_AXES],
        }
    }
}

impl ControllerState {
    /// Press or release the given button. A pressed button clears its bit.
    pub fn set_button_state(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.button_state &= !button.mask();
        } else {
            self.button_state |= button.mask();
        }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.button_state & button.mask() == 0
    }

    /// Set a merged axis value directly
    pub fn set_axis_state(&mut self, axis: Axis, value: u8) {
        self.axis_state[axis as usize] = value;
    }

    pub fn axis(&self, axis: Axis) -> u8 {
        self.axis_state[axis as usize]
    }

    /// Set the magnitude of one half axis and re-merge the axis it belongs to.
    /// Returns false if the value did not change.
    pub fn set_half_axis_state(&mut self, half_axis: HalfAxis, value: u8) -> bool {
        if self.half_axis_state[half_axis as usize] == value {
            return false;
        }
        self.half_axis_state[half_axis as usize] = value;

        let (axis, positive, negative) = half_axis.components();
        self.axis_state[axis as usize] = self.merge(positive, negative);
        true
    }

    /// A non-zero positive direction wins over the negative one
    fn merge(&self, positive: HalfAxis, negative: HalfAxis) -> u8 {
        let pos = self.half_axis_state[positive as usize];
        let neg = self.half_axis_state[negative as usize];
        if pos != 0 {
            AXIS_CENTER + pos / 2
        } else {
            AXIS_CENTER - neg.div_ceil(2)
        }
    }

    /// Button halfword with pressed buttons as set bits
    pub fn button_state_bits(&self) -> u16 {
        self.button_state ^ BUTTONS_RELEASED
    }

    /// All four axes packed as LY:LX:RY:RX, most significant byte first
    pub fn analog_input_bytes(&self) -> u32 {
        u32::from(self.axis(Axis::LeftY)) << 24
            | u32::from(self.axis(Axis::LeftX)) << 16
            | u32::from(self.axis(Axis::RightY)) << 8
            | u32::from(self.axis(Axis::RightX))
    }
}
