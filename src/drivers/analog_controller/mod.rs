//! Emulation of a DualShock style analog controller on the console's
//! controller port serial bus.
//!
//! The bus master clocks one byte at a time through [AnalogController::transfer]
//! and gets the byte the controller drives back along with whether it pulls
//! /ACK. Deselecting the controller ends the exchange through
//! [AnalogController::reset_transfer_state].
pub mod command;
pub mod driver;
#[cfg(test)]
pub mod driver_test;
pub mod mode;
pub mod rumble;
pub mod save_state;
pub mod state;

pub use driver::{AnalogController, TransferReply};
