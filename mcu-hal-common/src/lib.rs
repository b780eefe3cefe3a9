//! Common HAL code
//!
//! This library contains types and functions which are shared between the
//! PSoC6, XMC4000 and TMPM4G9 HALs.
//!
//! You shouldn't include anything here which requires either the `cortex-m`
//! crate, or a particular device's register map.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod callback;
pub mod peripherals;
pub mod poll;
pub mod reg;
pub mod result;

pub use callback::CallbackSlot;
pub use poll::{wait_until, Timeout};
pub use reg::{Field, Reg};
pub use result::{ResultCode, Rslt, RsltType};

#[doc(hidden)]
pub use critical_section;
#[doc(hidden)]
pub use paste;
