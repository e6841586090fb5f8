//! Mapping of the rumble configuration bytes onto the two vibration motors.
//!
//! During configuration mode the game writes six bytes with command 0x4D. Each
//! byte corresponds to a byte of the following ReadPad requests: a slot
//! holding 0x00 routes that request byte to the small motor, 0x01 routes it to
//! the large motor, anything else (usually 0xFF) leaves it unused.

pub const NUM_MOTORS: usize = 2;
pub const RUMBLE_CONFIG_SIZE: usize = 6;

/// Slot value routing a request byte to the small motor
pub const SLOT_SMALL_MOTOR: u8 = 0x00;
/// Slot value routing a request byte to the large motor
pub const SLOT_LARGE_MOTOR: u8 = 0x01;
/// Slot value of an unused byte
pub const SLOT_UNUSED: u8 = 0xFF;

/// Motor index value meaning no slot is mapped
pub const UNMAPPED: i8 = -1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Motor {
    Large = 0,
    Small = 1,
}

/// Rumble configuration and the current motor intensities
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rumble {
    pub config: [u8; RUMBLE_CONFIG_SIZE],
    pub large_motor_index: i8,
    pub small_motor_index: i8,
    pub motor_state: [u8; NUM_MOTORS],
}

impl Default for Rumble {
    fn default() -> Self {
        Self {
            config: [SLOT_UNUSED; RUMBLE_CONFIG_SIZE],
            large_motor_index: UNMAPPED,
            small_motor_index: UNMAPPED,
            motor_state: [0; NUM_MOTORS],
        }
    }
}

impl Rumble {
    /// Forget the configuration and stop both motors
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Recompute both motor indices from the configuration bytes. When a
    /// marker appears more than once the last slot wins.
    pub fn update_mapping(&mut self) {
        self.large_motor_index = UNMAPPED;
        self.small_motor_index = UNMAPPED;
        for (index, slot) in self.config.iter().enumerate() {
            let index = index as i8;
            match *slot {
                SLOT_SMALL_MOTOR => self.small_motor_index = index,
                SLOT_LARGE_MOTOR => self.large_motor_index = index,
                _ => (),
            }
        }
        log::debug!(
            "Rumble mapping: large motor slot {}, small motor slot {}",
            self.large_motor_index,
            self.small_motor_index
        );
    }

    /// Store one configuration byte written by the host
    pub fn write_config(&mut self, index: usize, value: u8) {
        if let Some(slot) = self.config.get_mut(index) {
            *slot = value;
        }
    }

    /// Set the intensity of a motor. Controllers that have not been switched
    /// into DualShock mode ignore the write.
    pub fn set_motor_state(&mut self, motor: Motor, value: u8, dualshock_enabled: bool) -> bool {
        if !dualshock_enabled {
            log::trace!("Ignoring {motor:?} motor write without DualShock mode");
            return false;
        }
        self.write_motor(motor, value);
        true
    }

    /// Motor write from the single motor protocol predating DualShock mode
    pub fn set_legacy_motor_state(&mut self, on: bool) {
        self.write_motor(Motor::Small, if on { u8::MAX } else { 0 });
    }

    fn write_motor(&mut self, motor: Motor, value: u8) {
        let state = &mut self.motor_state[motor as usize];
        if *state != value {
            log::trace!("{motor:?} motor intensity {value}");
        }
        *state = value;
    }

    /// Route a ReadPad request byte to whichever motor is mapped to the
    /// given configuration slot
    pub fn set_motor_state_for_slot(&mut self, slot: usize, value: u8, dualshock_enabled: bool) {
        if mapped_slot(self.small_motor_index) == Some(slot) {
            // The small motor can only be switched on or off
            let value = if value & 0x01 != 0 { u8::MAX } else { 0 };
            self.set_motor_state(Motor::Small, value, dualshock_enabled);
        } else if mapped_slot(self.large_motor_index) == Some(slot) {
            self.set_motor_state(Motor::Large, value, dualshock_enabled);
        }
    }

    /// Stop every motor that no slot maps to
    pub fn stop_unmapped_motors(&mut self, dualshock_enabled: bool) {
        if self.large_motor_index == UNMAPPED {
            self.set_motor_state(Motor::Large, 0, dualshock_enabled);
        }
        if self.small_motor_index == UNMAPPED {
            self.set_motor_state(Motor::Small, 0, dualshock_enabled);
        }
    }

    /// Replace motor indices that do not point at a configuration slot with
    /// [UNMAPPED]. Returns true if anything was clamped.
    pub fn clamp_indices(&mut self) -> bool {
        let mut clamped = false;
        for index in [&mut self.large_motor_index, &mut self.small_motor_index] {
            if *index != UNMAPPED && mapped_slot(*index).is_none() {
                *index = UNMAPPED;
                clamped = true;
            }
        }
        clamped
    }

    pub fn motor_state(&self, motor: Motor) -> u8 {
        self.motor_state[motor as usize]
    }

    /// Strength of a motor from 0.0 to 1.0 for a host vibration device. The
    /// bias helps weak intensities overcome the inertia of the host motor.
    pub fn vibration_strength(&self, motor: Motor, bias: u8) -> f32 {
        let state = self.motor_state(motor);
        if state == 0 {
            return 0.0;
        }

        // Cubic fit of the DualShock motor response
        let x = f64::from(state.saturating_add(bias));
        let strength = 0.006474549734772402 * x.powi(3) - 1.258165252213538 * x.powi(2)
            + 156.82454281087692 * x
            + 3.637978807091713e-11;
        (strength / 65535.0) as f32
    }
}

/// Slot number of a motor index, if it points inside the configuration
fn mapped_slot(index: i8) -> Option<usize> {
    usize::try_from(index)
        .ok()
        .filter(|slot| *slot < RUMBLE_CONFIG_SIZE)
}
