pub mod analog_controller;
