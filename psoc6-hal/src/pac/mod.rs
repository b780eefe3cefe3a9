//! Register blocks and peripheral handles
//!
//! Every IP block is described by a `#[repr(C)]` `RegisterBlock` built from
//! [`Reg`](mcu_hal_common::Reg) cells, together with its bit-field
//! definitions. The zero sized handles (`DW0`, `DMAC`, ...) dereference to the
//! block at its fixed address, the same way svd2rust generated crates do.
//! Drivers only ever borrow `&RegisterBlock`, so they don't care whether the
//! block is the real MMIO one or a copy living in RAM.

pub mod ctdac;
pub mod dmac;
pub mod dw;
pub mod peri;
pub mod sar;
pub mod tcpwm;

/// Number of Datawire blocks.
pub const DW_BLOCKS: usize = 2;
/// Channels per Datawire block.
pub const DW_CHANNELS: usize = 16;
/// Channels of the DMAC.
pub const DMAC_CHANNELS: usize = 8;
/// Number of TCPWM blocks.
pub const TCPWM_BLOCKS: usize = 2;
/// Counters per TCPWM block.
pub const TCPWM_COUNTERS: usize = 8;

mcu_hal_common::peripherals! {
    PERI: peri @ 0x4001_0000, "Peripheral interconnect (trigger multiplexer)";
    DW0: dw @ 0x4028_0000, "Datawire DMA block 0";
    DW1: dw @ 0x4029_0000, "Datawire DMA block 1";
    DMAC: dmac @ 0x402a_0000, "DMAC (M-DMA) controller";
    TCPWM0: tcpwm @ 0x4038_0000, "Timer/counter/PWM block 0";
    TCPWM1: tcpwm @ 0x4039_0000, "Timer/counter/PWM block 1";
    CTDAC0: ctdac @ 0x4114_0000, "Continuous time DAC";
    SAR: sar @ 0x411d_0000, "SAR ADC";
}

/// A register block allocated in RAM, for exercising drivers off-target.
#[cfg(test)]
pub(crate) fn detached<T>() -> std::boxed::Box<T> {
    // Safety: register blocks only contain `Reg` cells and plain `u32`
    // padding, for which all-zeroes is a valid value.
    std::boxed::Box::new(unsafe { core::mem::zeroed() })
}
