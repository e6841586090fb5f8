//! Hand-off of input samples from an input thread to the bus engine.
//!
//! The input side owns an [InputPublisher] and updates the sample whenever a
//! host input changes. The engine owns the matching [InputSubscriber] and copies
//! the latest sample once at the start of each pad read.
use tokio::sync::watch;

use crate::{
    config::AnalogControllerConfig,
    drivers::analog_controller::state::{Axis, Button, ControllerState, HalfAxis},
};

use super::bind::{apply_bind, Bind};

/// Create a connected publisher/subscriber pair starting from the given sample
pub fn channel(initial: ControllerState) -> (InputPublisher, InputSubscriber) {
    let (tx, rx) = watch::channel(initial);
    (InputPublisher { tx }, InputSubscriber { rx })
}

/// Writing end of the input sample hand-off
#[derive(Debug)]
pub struct InputPublisher {
    tx: watch::Sender<ControllerState>,
}

impl InputPublisher {
    pub fn set_button_state(&self, button: Button, pressed: bool) {
        self.tx.send_if_modified(|state| {
            let changed = state.is_pressed(button) != pressed;
            state.set_button_state(button, pressed);
            changed
        });
    }

    pub fn set_axis_state(&self, axis: Axis, value: u8) {
        self.tx.send_if_modified(|state| {
            let changed = state.axis(axis) != value;
            state.set_axis_state(axis, value);
            changed
        });
    }

    pub fn set_half_axis_state(&self, half_axis: HalfAxis, value: u8) {
        self.tx
            .send_if_modified(|state| state.set_half_axis_state(half_axis, value));
    }

    /// Apply a normalized host input value. The analog mode button belongs to
    /// the engine and is ignored here.
    pub fn set_bind_state(&self, config: &AnalogControllerConfig, bind: Bind, value: f32) {
        if bind == Bind::Analog {
            log::warn!("Analog mode button cannot be published as an input sample");
            return;
        }
        self.tx
            .send_if_modified(|state| apply_bind(state, config, bind, value));
    }

    /// Replace the whole sample at once
    pub fn publish(&self, state: ControllerState) {
        self.tx.send_replace(state);
    }

    /// True once the engine side has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Reading end of the input sample hand-off
#[derive(Debug)]
pub struct InputSubscriber {
    rx: watch::Receiver<ControllerState>,
}

impl InputSubscriber {
    /// Copy of the most recent sample
    pub fn snapshot(&mut self) -> ControllerState {
        *self.rx.borrow_and_update()
    }

    /// True if a sample was published since the last snapshot
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}
