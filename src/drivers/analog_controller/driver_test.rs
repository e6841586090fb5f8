use std::error::Error;

use crate::{
    config::AnalogControllerConfig,
    drivers::analog_controller::{
        command::Command,
        mode::{ToggleRequest, STATUS_MODE_CHANGED},
        rumble::{Motor, UNMAPPED},
        state::{Axis, Button, ControllerState},
        AnalogController, TransferReply,
    },
    input::{
        bind::Bind,
        capability::{GamepadButton, InputEvent},
        sample,
    },
};

/// Clock the bytes through the controller without deselecting it
fn clock(controller: &mut AnalogController, bytes: &[u8]) -> Vec<TransferReply> {
    bytes.iter().map(|byte| controller.transfer(*byte)).collect()
}

fn data(replies: &[TransferReply]) -> Vec<u8> {
    replies.iter().map(|reply| reply.data).collect()
}

/// Run a full exchange and deselect the controller afterwards
fn exchange(controller: &mut AnalogController, bytes: &[u8]) -> Vec<u8> {
    let replies = clock(controller, bytes);
    controller.reset_transfer_state();
    data(&replies)
}

fn enter_config(controller: &mut AnalogController) {
    let length = controller.mode().response_length();
    let mut bytes = vec![0x01, 0x43, 0x00, 0x01];
    bytes.resize(length + 1, 0x00);
    exchange(controller, &bytes);
}

fn exit_config(controller: &mut AnalogController) {
    exchange(controller, &[0x01, 0x43, 0x00, 0, 0, 0, 0, 0, 0]);
}

#[tokio::test]
async fn test_digital_read_pad() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    let replies = clock(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x00]);
    println!("Replies: {replies:?}");

    assert_eq!(data(&replies), vec![0xFF, 0x41, 0x5A, 0xFF, 0xFF]);
    let acks: Vec<bool> = replies.iter().map(|reply| reply.ack).collect();
    assert_eq!(acks, vec![true, true, true, true, false]);
    assert_eq!(controller.command(), Command::Idle);

    Ok(())
}

#[tokio::test]
async fn test_idle_and_unknown_bytes() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);

    let reply = controller.transfer(0x81);
    assert_eq!(reply, TransferReply { data: 0xFF, ack: false });
    assert_eq!(controller.command(), Command::Idle);

    let replies = clock(&mut controller, &[0x01, 0x99]);
    assert!(!replies[1].ack, "unknown commands should not be acked");
    assert_eq!(controller.command(), Command::Idle);

    // Configuration commands need configuration mode
    let replies = clock(&mut controller, &[0x01, 0x45]);
    assert_eq!(replies[1], TransferReply { data: 0xFF, ack: false });

    Ok(())
}

#[tokio::test]
async fn test_buttons_in_response() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    controller.set_button_state(Button::Cross, true);
    controller.set_button_state(Button::Start, true);

    let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x00]);
    assert_eq!(response[3], 0xF7, "start should clear bit 3");
    assert_eq!(response[4], 0xBF, "cross should clear bit 14");
    assert_eq!(
        controller.button_state_bits(),
        Button::Cross.mask() | Button::Start.mask()
    );

    Ok(())
}

#[tokio::test]
async fn test_configuration_flow() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);

    let response = exchange(&mut controller, &[0x01, 0x43, 0x00, 0x01, 0x00]);
    assert_eq!(response, vec![0xFF, 0x41, 0x5A, 0xFF, 0xFF]);
    assert!(controller.configuration_mode());
    assert!(controller.dualshock_enabled());

    // Set analog mode and lock it
    let response = exchange(
        &mut controller,
        &[0x01, 0x44, 0x00, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00],
    );
    assert_eq!(response, vec![0xFF, 0xF3, 0x5A, 0, 0, 0, 0, 0, 0]);
    assert!(controller.analog_mode());
    assert!(controller.is_analog_locked());

    let response = exchange(&mut controller, &[0x01, 0x45, 0x00, 0, 0, 0, 0, 0, 0]);
    assert_eq!(
        response,
        vec![0xFF, 0xF3, 0x5A, 0x01, 0x02, 0x01, 0x02, 0x01, 0x00]
    );

    let response = exchange(&mut controller, &[0x01, 0x43, 0x00, 0x00, 0, 0, 0, 0, 0]);
    assert_eq!(response, vec![0xFF, 0xF3, 0x5A, 0, 0, 0, 0, 0, 0]);
    assert!(!controller.configuration_mode());

    let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0, 0, 0, 0, 0, 0]);
    assert_eq!(
        response,
        vec![0xFF, 0x73, 0x5A, 0xFF, 0xFF, 0x80, 0x80, 0x80, 0x80]
    );

    Ok(())
}

#[tokio::test]
async fn test_constant_tables() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    enter_config(&mut controller);

    let cases: [(u8, u8, [u8; 6]); 6] = [
        (0x46, 0x00, [0x00, 0x00, 0x01, 0x02, 0x00, 0x0A]),
        (0x46, 0x01, [0x00, 0x00, 0x01, 0x01, 0x01, 0x14]),
        (0x47, 0x00, [0x00, 0x00, 0x02, 0x00, 0x01, 0x00]),
        (0x47, 0x01, [0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
        (0x4C, 0x00, [0x00, 0x00, 0x00, 0x04, 0x00, 0x00]),
        (0x4C, 0x01, [0x00, 0x00, 0x00, 0x07, 0x00, 0x00]),
    ];
    for (opcode, selector, expected) in cases {
        let response = exchange(
            &mut controller,
            &[0x01, opcode, 0x00, selector, 0, 0, 0, 0, 0],
        );
        println!("0x{opcode:02X} 0x{selector:02X}: {response:02X?}");
        assert_eq!(&response[..3], &[0xFF, 0xF3, 0x5A]);
        assert_eq!(response[3..], expected);
    }

    Ok(())
}

#[tokio::test]
async fn test_deferred_toggle() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);

    clock(&mut controller, &[0x01, 0x42, 0x00]);
    assert_eq!(controller.request_analog_toggle(), ToggleRequest::Queued);
    assert!(!controller.analog_mode());

    let replies = clock(&mut controller, &[0x00, 0x00]);
    assert!(!replies[1].ack);
    assert!(controller.analog_mode(), "toggle should apply on completion");

    // A selected but idle controller also defers the toggle until deselect
    clock(&mut controller, &[0x01]);
    assert_eq!(controller.request_analog_toggle(), ToggleRequest::Queued);
    controller.reset_transfer_state();
    assert!(!controller.analog_mode());

    Ok(())
}

#[tokio::test]
async fn test_analog_lock() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    enter_config(&mut controller);
    exchange(&mut controller, &[0x01, 0x44, 0x00, 0x00, 0x03, 0, 0, 0, 0]);
    exit_config(&mut controller);
    assert!(controller.is_analog_locked());

    assert_eq!(controller.request_analog_toggle(), ToggleRequest::Locked);
    assert_eq!(controller.set_analog_mode(true), ToggleRequest::Locked);
    controller.set_bind_state(Bind::Analog, 1.0);
    assert!(!controller.analog_mode());

    // Mode writes are ignored while locked, the lock byte is not
    enter_config(&mut controller);
    exchange(&mut controller, &[0x01, 0x44, 0x00, 0x01, 0x03, 0, 0, 0, 0]);
    assert!(!controller.analog_mode());
    exchange(&mut controller, &[0x01, 0x44, 0x00, 0x01, 0x02, 0, 0, 0, 0]);
    assert!(!controller.analog_mode());
    assert!(!controller.is_analog_locked());
    exchange(&mut controller, &[0x01, 0x44, 0x00, 0x01, 0x02, 0, 0, 0, 0]);
    assert!(controller.analog_mode());

    Ok(())
}

#[tokio::test]
async fn test_set_analog_mode() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    assert_eq!(controller.set_analog_mode(false), ToggleRequest::Unchanged);
    assert!(!controller.analog_mode());
    assert_eq!(controller.set_analog_mode(true), ToggleRequest::Applied);
    assert_eq!(controller.set_analog_mode(true), ToggleRequest::Unchanged);
    assert!(controller.analog_mode());

    clock(&mut controller, &[0x01, 0x42]);
    assert_eq!(controller.set_analog_mode(false), ToggleRequest::Queued);
    assert_eq!(controller.set_analog_mode(false), ToggleRequest::Queued);
    // Asking for the current mode again cancels the pending flip
    assert_eq!(controller.set_analog_mode(true), ToggleRequest::Unchanged);
    controller.reset_transfer_state();
    assert!(controller.analog_mode());

    Ok(())
}

#[tokio::test]
async fn test_user_toggle_status_byte() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    enter_config(&mut controller);
    exit_config(&mut controller);

    controller.set_bind_state(Bind::Analog, 1.0);
    assert!(controller.analog_mode());
    assert_eq!(controller.mode().status_byte, STATUS_MODE_CHANGED);

    let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0, 0, 0, 0, 0, 0]);
    assert_eq!(response[1..3], [0x73, 0x00]);

    enter_config(&mut controller);
    let response = exchange(&mut controller, &[0x01, 0x45, 0x00, 0, 0, 0, 0, 0, 0]);
    assert_eq!(response[2], 0x5A);

    Ok(())
}

#[tokio::test]
async fn test_rumble_mapping() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    assert!(!controller.set_motor_state(Motor::Large, 0x80));

    enter_config(&mut controller);
    let response = exchange(
        &mut controller,
        &[0x01, 0x4D, 0x00, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF],
    );
    assert_eq!(response[3..], [0xFF; 6], "should answer with the old config");
    assert_eq!(controller.rumble().small_motor_index, 0);
    assert_eq!(controller.rumble().large_motor_index, 1);

    let response = exchange(
        &mut controller,
        &[0x01, 0x4D, 0x00, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF],
    );
    assert_eq!(response[3..], [0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF]);
    exit_config(&mut controller);

    // Full duplex: the request bytes of a pad read drive the motors
    exchange(&mut controller, &[0x01, 0x42, 0x00, 0x01, 0xC0]);
    assert_eq!(controller.motor_state(Motor::Small), 0xFF);
    assert_eq!(controller.motor_state(Motor::Large), 0xC0);
    assert!(controller.vibration_motor_strength(Motor::Large) > 0.0);

    exchange(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x00]);
    assert_eq!(controller.motor_state(Motor::Small), 0);
    assert_eq!(controller.motor_state(Motor::Large), 0);

    // Setting the analog mode forgets the rumble configuration
    enter_config(&mut controller);
    exchange(&mut controller, &[0x01, 0x44, 0x00, 0x01, 0x02, 0, 0, 0, 0]);
    assert_eq!(controller.rumble().large_motor_index, UNMAPPED);
    assert_eq!(controller.rumble().small_motor_index, UNMAPPED);

    Ok(())
}

#[tokio::test]
async fn test_unmapped_motors_stop() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    enter_config(&mut controller);
    exchange(&mut controller, &[0x01, 0x4D, 0x00, 0x01, 0xFF, 0, 0, 0, 0]);
    exit_config(&mut controller);
    // Slot 2 and later also map to the small motor, the last one wins
    assert_eq!(controller.rumble().small_motor_index, 5);

    enter_config(&mut controller);
    assert!(controller.set_motor_state(Motor::Large, 0x80));
    assert!(controller.set_motor_state(Motor::Small, 0xFF));
    exchange(&mut controller, &[0x01, 0x4D, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(controller.motor_state(Motor::Large), 0x80);
    assert_eq!(controller.motor_state(Motor::Small), 0, "unmapped motor should stop");

    Ok(())
}

#[tokio::test]
async fn test_legacy_rumble() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    exchange(&mut controller, &[0x01, 0x42, 0x00, 0x40, 0x01]);
    assert_eq!(controller.motor_state(Motor::Small), 0xFF);

    exchange(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x01]);
    assert_eq!(controller.motor_state(Motor::Small), 0);

    Ok(())
}

#[tokio::test]
async fn test_analog_dpad_in_digital_mode() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    controller.set_axis_state(Axis::LeftX, 0x00);
    controller.set_axis_state(Axis::LeftY, 0xFF);

    let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x00]);
    let pressed = Button::Left.mask() | Button::Down.mask();
    assert_eq!(response[3], !(pressed as u8));

    controller.set_analog_mode(true);
    let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0, 0, 0, 0, 0, 0]);
    assert_eq!(response[3], 0xFF);

    let config = AnalogControllerConfig {
        analog_dpad_in_digital_mode: false,
        ..Default::default()
    };
    let mut controller = AnalogController::new_with_config(1, config);
    controller.set_axis_state(Axis::LeftX, 0x00);
    let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x00]);
    assert_eq!(response[3], 0xFF);

    Ok(())
}

#[tokio::test]
async fn test_reset() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    enter_config(&mut controller);
    exchange(&mut controller, &[0x01, 0x44, 0x00, 0x01, 0x03, 0, 0, 0, 0]);
    clock(&mut controller, &[0x01, 0x42]);

    controller.reset();
    assert!(!controller.analog_mode());
    assert!(!controller.is_analog_locked());
    assert!(!controller.configuration_mode());
    assert!(!controller.dualshock_enabled());
    assert_eq!(controller.command(), Command::Idle);
    assert_eq!(controller.button_state_bits(), 0);

    let config = AnalogControllerConfig {
        force_analog_on_reset: true,
        ..Default::default()
    };
    let controller = AnalogController::new_with_config(0, config);
    assert!(controller.analog_mode());
    assert_eq!(controller.mode().id_byte(), 0x73);

    Ok(())
}

#[tokio::test]
async fn test_input_events() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    controller.handle_event(InputEvent::Button {
        button: GamepadButton::South,
        pressed: true,
    });
    assert_eq!(controller.button_state_bits(), Button::Cross.mask());

    controller.handle_event(InputEvent::Button {
        button: GamepadButton::Guide,
        pressed: true,
    });
    assert!(controller.analog_mode());

    Ok(())
}

#[tokio::test]
async fn test_input_subscriber() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    let (publisher, subscriber) = sample::channel(ControllerState::default());
    controller.attach_input(subscriber);

    publisher.set_button_state(Button::Circle, true);
    assert!(
        !controller.state().is_pressed(Button::Circle),
        "sample should only be taken at the start of a pad read"
    );

    let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x00]);
    assert_eq!(response[4], !(Button::Circle.mask() >> 8) as u8);
    assert!(controller.state().is_pressed(Button::Circle));

    assert!(controller.detach_input().is_some());

    Ok(())
}

#[tokio::test]
async fn test_toggle_configuration_mode() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    controller.toggle_configuration_mode(true);
    assert!(controller.configuration_mode());
    assert!(controller.dualshock_enabled());

    let response = exchange(&mut controller, &[0x01, 0x45, 0x00, 0, 0, 0, 0, 0, 0]);
    assert_eq!(response[1], 0xF3);

    controller.toggle_configuration_mode(false);
    let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x00]);
    assert_eq!(response[1], 0x41);

    Ok(())
}

#[tokio::test]
async fn test_analog_dpad_thresholds() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(0);
    let cases = [
        (Axis::LeftX, 38, Button::Left.mask()),
        (Axis::LeftX, 39, 0),
        (Axis::LeftX, 216, 0),
        (Axis::LeftX, 217, Button::Right.mask()),
        (Axis::LeftY, 38, Button::Up.mask()),
        (Axis::LeftY, 39, 0),
        (Axis::LeftY, 216, 0),
        (Axis::LeftY, 217, Button::Down.mask()),
    ];
    for (axis, value, pressed) in cases {
        controller.set_axis_state(Axis::LeftX, 0x80);
        controller.set_axis_state(Axis::LeftY, 0x80);
        controller.set_axis_state(axis, value);
        let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x00]);
        println!("{axis:?} at {value}: 0x{:02X}", response[3]);
        assert_eq!(response[3], !(pressed as u8), "{axis:?} at {value}");
    }

    Ok(())
}

#[tokio::test]
async fn test_set_config() -> Result<(), Box<dyn Error>> {
    let mut controller = AnalogController::new(2);
    assert_eq!(controller.index(), 2);
    assert!(!controller.analog_mode());

    let config = AnalogControllerConfig {
        force_analog_on_reset: true,
        analog_dpad_in_digital_mode: false,
        analog_deadzone: 4.0,
        ..Default::default()
    };
    controller.set_config(config);
    assert_eq!(controller.config().analog_deadzone, 1.0, "should be clamped");
    assert!(!controller.analog_mode(), "should wait for the next reset");

    controller.set_axis_state(Axis::LeftX, 0x00);
    let response = exchange(&mut controller, &[0x01, 0x42, 0x00, 0x00, 0x00]);
    assert_eq!(response[3], 0xFF);

    controller.reset();
    assert!(controller.analog_mode());

    Ok(())
}
