// Interrupt-driven blinky on a tiny fixed-priority kernel (ESP32-C3)

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "esp32c3")]
pub mod board;
pub mod config;
pub mod kernel;
