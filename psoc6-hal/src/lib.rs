//! HAL for the PSoC6 microcontrollers
//!
//! Register level drivers for the PSoC6 DMA engines, trigger multiplexer,
//! SAR ADC, CTDAC and TCPWM counters, with [`embedded-hal`] trait
//! implementations where one fits.
//!
//! Shared blocks are reserved through a [`hwmgr::HwManager`], normally a
//! single `static` the application passes to every driver.
//!
//! NOTE This HAL is still under active development. This API will remain volatile until 1.0.0
//!
//! # Crate features
//!
//! * **dw** -
//!   The part has Datawire DMA blocks. On by default.
//! * **dmac** -
//!   The part has a DMAC. On by default.
//! * **defmt** -
//!   Implement `defmt::Format` for several types and log driver decisions.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub use mcu_hal_common as common;

pub mod adc;
pub mod dac;
pub mod dma;
pub mod hwmgr;
pub mod pac;
pub mod pins;
pub mod pwm;
pub mod tcpwm;
pub mod timer;
pub mod triggers;

pub use mcu_hal_common::{ResultCode, Rslt};
