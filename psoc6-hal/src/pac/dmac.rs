//! DMAC (M-DMA) controller

use super::DMAC_CHANNELS;
use mcu_hal_common::{Field, Reg};

/// DMAC register block.
#[repr(C)]
pub struct RegisterBlock {
    /// 0x000 - Control
    pub ctl: Reg,
    _reserved0: [u32; 3],
    /// 0x010 - Active channels
    pub active: Reg,
    _reserved1: [u32; 0x3fb],
    /// 0x1000 - Per channel registers
    pub ch: [Ch; DMAC_CHANNELS],
}

/// Registers of one DMAC channel.
#[repr(C)]
pub struct Ch {
    /// 0x00 - Channel control
    pub ctl: Reg,
    _reserved0: [u32; 3],
    /// 0x10 - Channel X/Y loop indices
    pub idx: Reg,
    /// 0x14 - Current source address
    pub src: Reg,
    /// 0x18 - Current destination address
    pub dst: Reg,
    _reserved1: Reg,
    /// 0x20 - Current descriptor pointer
    pub curr: Reg,
    _reserved2: [u32; 23],
    /// 0x80 - Interrupt (write 1 to clear)
    pub intr: Reg,
    /// 0x84 - Interrupt set
    pub intr_set: Reg,
    /// 0x88 - Interrupt mask
    pub intr_mask: Reg,
    /// 0x8C - Interrupt masked
    pub intr_masked: Reg,
    _reserved3: [u32; 28],
}

/// `CTL.ENABLED`
pub const CTL_ENABLED: Field = Field::bit(31);

/// `ACTIVE.ACTIVE`: one bit per channel.
pub const ACTIVE_ACTIVE: Field = Field::new(0, DMAC_CHANNELS as u8);

/// `CH_CTL.P`: privileged access.
pub const CH_CTL_P: Field = Field::bit(0);
/// `CH_CTL.PRIO`
pub const CH_CTL_PRIO: Field = Field::new(4, 2);
/// `CH_CTL.ENABLED`
pub const CH_CTL_ENABLED: Field = Field::bit(31);

/// `INTR` cause bits; the DMAC flags each cause separately.
pub mod intr {
    use mcu_hal_common::Field;

    /// Descriptor completion.
    pub const COMPLETION: Field = Field::bit(0);
    /// Bus error on a source load.
    pub const SRC_BUS_ERROR: Field = Field::bit(1);
    /// Bus error on a destination store.
    pub const DST_BUS_ERROR: Field = Field::bit(2);
    /// Misaligned source address.
    pub const SRC_MISAL: Field = Field::bit(3);
    /// Misaligned destination address.
    pub const DST_MISAL: Field = Field::bit(4);
    /// Current descriptor pointer is null.
    pub const CURR_PTR_NULL: Field = Field::bit(5);
    /// Channel disabled while active.
    pub const ACTIVE_CH_DISABLED: Field = Field::bit(6);
    /// Bus error loading a descriptor.
    pub const DESCR_BUS_ERROR: Field = Field::bit(7);
    /// All cause bits.
    pub const ALL: u32 = 0xff;
}
