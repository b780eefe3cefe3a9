//! HAL for the TMPM4G9 microcontrollers
//!
//! A blocking I2C controller driver for the three I2C channels, usable
//! byte by byte or through the [`embedded-hal`] I2C trait.
//!
//! NOTE This HAL is still under active development. This API will remain volatile until 1.0.0
//!
//! # Crate features
//!
//! * **defmt** -
//!   Implement `defmt::Format` for several types and log driver decisions.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub use mcu_hal_common as common;

pub mod i2c;
pub mod pac;
pub mod pins;

pub use mcu_hal_common::{ResultCode, Rslt};
