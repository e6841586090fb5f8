/// Second byte of every response while nothing special happened
pub const STATUS_READY: u8 = 0x5A;

/// Second byte of a response after the user flipped the analog mode of a
/// controller running with DualShock features, telling the game to
/// reconfigure it.
pub const STATUS_MODE_CHANGED: u8 = 0x00;

const MODE_ID_DIGITAL: u8 = 0x4;
const MODE_ID_ANALOG: u8 = 0x7;
const MODE_ID_CONFIGURATION: u8 = 0xF;

/// Result of asking for an analog mode flip
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ToggleRequest {
    /// The mode changed right away
    Applied,
    /// An exchange is in flight; the flip happens once it ends
    Queued,
    /// The game locked the mode
    Locked,
    /// The controller already is, or stays, in the requested mode
    Unchanged,
}

/// Reporting mode of the controller
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ModeState {
    pub analog_mode: bool,
    pub analog_locked: bool,
    pub dualshock_enabled: bool,
    pub configuration_mode: bool,
    pub analog_toggle_queued: bool,
    pub status_byte: u8,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            analog_mode: false,
            analog_locked: false,
            dualshock_enabled: false,
            configuration_mode: false,
            analog_toggle_queued: false,
            status_byte: STATUS_READY,
        }
    }
}

impl ModeState {
    /// Switch between digital and analog reporting, ignoring the lock.
    /// Returns true if the mode changed.
    pub fn set_analog_mode(&mut self, enabled: bool) -> bool {
        if self.analog_mode == enabled {
            return false;
        }
        log::info!(
            "Controller switched to {} mode",
            if enabled { "analog" } else { "digital" }
        );
        self.analog_mode = enabled;
        true
    }

    pub fn is_analog_locked(&self) -> bool {
        self.analog_locked
    }

    pub fn set_analog_locked(&mut self, locked: bool) {
        if self.analog_locked != locked {
            log::debug!("Analog mode lock {}", if locked { "set" } else { "cleared" });
        }
        self.analog_locked = locked;
    }

    /// Enter or leave configuration mode. Entering it means the game talks
    /// DualShock, which unlocks rumble and resets the status byte.
    pub fn toggle_configuration_mode(&mut self, enabled: bool) {
        self.configuration_mode = enabled;
        if enabled {
            self.dualshock_enabled = true;
            self.status_byte = STATUS_READY;
        }
        log::debug!(
            "Configuration mode {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Flip the analog mode as if the analog button was pressed. Returns false
    /// if the mode is locked.
    pub fn toggle_analog_mode(&mut self) -> bool {
        if self.analog_locked {
            log::info!(
                "Controller is locked to {} mode by the game",
                if self.analog_mode { "analog" } else { "digital" }
            );
            return false;
        }
        self.set_analog_mode(!self.analog_mode);
        if self.dualshock_enabled {
            self.status_byte = STATUS_MODE_CHANGED;
        }
        true
    }

    /// Flip the analog mode now, or once the exchange in flight has ended
    pub fn request_analog_toggle(&mut self, in_flight: bool) -> ToggleRequest {
        if in_flight {
            log::debug!("Deferring analog mode toggle until the exchange completes");
            self.analog_toggle_queued = true;
            return ToggleRequest::Queued;
        }
        if self.toggle_analog_mode() {
            ToggleRequest::Applied
        } else {
            ToggleRequest::Locked
        }
    }

    /// Clears the deferred toggle, returning whether one was pending
    pub fn take_queued_toggle(&mut self) -> bool {
        std::mem::take(&mut self.analog_toggle_queued)
    }

    /// Number of halfwords following the ID halfword of a response
    pub fn response_halfwords(&self) -> u8 {
        if self.configuration_mode || self.analog_mode {
            3
        } else {
            1
        }
    }

    /// Total number of bytes in a response, ID halfword included
    pub fn response_length(&self) -> usize {
        (usize::from(self.response_halfwords()) + 1) * 2
    }

    pub fn mode_id(&self) -> u8 {
        if self.configuration_mode {
            MODE_ID_CONFIGURATION
        } else if self.analog_mode {
            MODE_ID_ANALOG
        } else {
            MODE_ID_DIGITAL
        }
    }

    /// First response byte: mode in the high nibble, halfword count in the low
    pub fn id_byte(&self) -> u8 {
        (self.mode_id() << 4) | self.response_halfwords()
    }
}
