use std::{io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Default dead zone applied to analog stick input
pub const DEFAULT_STICK_DEADZONE: f32 = 0.0;
/// Default multiplier applied to analog stick input after the dead zone
pub const DEFAULT_STICK_SENSITIVITY: f32 = 1.33;
/// Default bias added to motor intensities before the vibration curve
pub const DEFAULT_VIBRATION_BIAS: u8 = 8;

/// Represents all possible errors loading a [AnalogControllerConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// Settings of an emulated analog controller
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct AnalogControllerConfig {
    /// Start in analog mode whenever the controller is reset
    pub force_analog_on_reset: bool,
    /// Let the left stick drive the D-pad while in digital mode
    pub analog_dpad_in_digital_mode: bool,
    /// Stick input below this magnitude is reported as centered (0.0 - 1.0)
    pub analog_deadzone: f32,
    /// Multiplier for stick input past the dead zone (0.01 - 3.0)
    pub analog_sensitivity: f32,
    /// Added to motor intensities before converting them to a vibration strength
    pub vibration_bias: u8,
}

impl Default for AnalogControllerConfig {
    fn default() -> Self {
        Self {
            force_analog_on_reset: false,
            analog_dpad_in_digital_mode: true,
            analog_deadzone: DEFAULT_STICK_DEADZONE,
            analog_sensitivity: DEFAULT_STICK_SENSITIVITY,
            vibration_bias: DEFAULT_VIBRATION_BIAS,
        }
    }
}

impl AnalogControllerConfig {
    /// Load a [AnalogControllerConfig] from the given YAML string
    pub fn from_yaml(content: String) -> Result<AnalogControllerConfig, LoadError> {
        let config: AnalogControllerConfig = serde_yaml::from_str(content.as_str())?;
        Ok(config.clamped())
    }

    /// Load a [AnalogControllerConfig] from the given YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<AnalogControllerConfig, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: AnalogControllerConfig = serde_yaml::from_reader(file)?;
        Ok(config.clamped())
    }

    /// Returns a copy with every value forced into its valid range
    pub fn clamped(mut self) -> Self {
        // NaN is not a valid dead zone or sensitivity either
        if self.analog_deadzone.is_nan() {
            self.analog_deadzone = DEFAULT_STICK_DEADZONE;
        }
        if self.analog_sensitivity.is_nan() {
            self.analog_sensitivity = DEFAULT_STICK_SENSITIVITY;
        }
        self.analog_deadzone = self.analog_deadzone.clamp(0.0, 1.0);
        self.analog_sensitivity = self.analog_sensitivity.clamp(0.01, 3.0);
        self
    }

    /// Apply the dead zone and sensitivity to a normalized stick value
    pub fn apply_deadzone_sensitivity(&self, value: f32) -> f32 {
        if value < self.analog_deadzone {
            return 0.0;
        }
        // A dead zone of 1.0 leaves no range to scale into
        let range = 1.0 - self.analog_deadzone;
        if range <= f32::EPSILON {
            return 0.0;
        }
        (value - self.analog_deadzone) / range * self.analog_sensitivity
    }
}
