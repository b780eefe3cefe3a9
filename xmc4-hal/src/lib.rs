//! HAL for the XMC4000 microcontrollers
//!
//! Analog input through the VADC and analog output through the DAC, with
//! the pin map tying port 14 and 15 pins to converter channels.
//!
//! NOTE This HAL is still under active development. This API will remain volatile until 1.0.0
//!
//! # Crate features
//!
//! * **defmt** -
//!   Implement `defmt::Format` for several types and log driver decisions.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub use mcu_hal_common as common;

pub mod analogin;
pub mod analogout;
pub mod pac;
pub mod pins;

pub use mcu_hal_common::{ResultCode, Rslt};
