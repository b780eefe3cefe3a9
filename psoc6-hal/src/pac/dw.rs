//! Datawire (DW) DMA block

use super::DW_CHANNELS;
use mcu_hal_common::{Field, Reg};

/// Datawire register block.
#[repr(C)]
pub struct RegisterBlock {
    /// 0x000 - Control
    pub ctl: Reg,
    /// 0x004 - Status
    pub status: Reg,
    _reserved0: [u32; 0x1ffe],
    /// 0x8000 - Per channel registers
    pub ch_struct: [ChStruct; DW_CHANNELS],
}

/// Registers of one Datawire channel.
#[repr(C)]
pub struct ChStruct {
    /// 0x00 - Channel control
    pub ch_ctl: Reg,
    /// 0x04 - Channel status
    pub ch_status: Reg,
    /// 0x08 - Channel X/Y loop indices
    pub ch_idx: Reg,
    /// 0x0C - Current descriptor pointer
    pub ch_curr_ptr: Reg,
    /// 0x10 - Interrupt (write 1 to clear)
    pub intr: Reg,
    /// 0x14 - Interrupt set
    pub intr_set: Reg,
    /// 0x18 - Interrupt mask
    pub intr_mask: Reg,
    /// 0x1C - Interrupt masked
    pub intr_masked: Reg,
}

/// `CTL.ENABLED`
pub const CTL_ENABLED: Field = Field::bit(31);

/// `STATUS.CH_IDX`: channel currently being serviced.
pub const STATUS_CH_IDX: Field = Field::new(8, 5);
/// `STATUS.ACTIVE`
pub const STATUS_ACTIVE: Field = Field::bit(31);

/// `CH_CTL.P`: privileged access.
pub const CH_CTL_P: Field = Field::bit(0);
/// `CH_CTL.PRIO`
pub const CH_CTL_PRIO: Field = Field::new(16, 2);
/// `CH_CTL.PREEMPTABLE`
pub const CH_CTL_PREEMPTABLE: Field = Field::bit(18);
/// `CH_CTL.ENABLED`
pub const CH_CTL_ENABLED: Field = Field::bit(31);

/// `CH_STATUS.INTR_CAUSE`
pub const CH_STATUS_INTR_CAUSE: Field = Field::new(0, 4);
/// `CH_STATUS.PENDING`: the channel has a trigger pending or is being serviced.
pub const CH_STATUS_PENDING: Field = Field::bit(31);

/// `INTR.CH`
pub const INTR_CH: Field = Field::bit(0);

/// Values of `CH_STATUS.INTR_CAUSE`.
pub mod intr_cause {
    /// No interrupt.
    pub const NONE: u32 = 0;
    /// Descriptor completion.
    pub const COMPLETION: u32 = 1;
    /// Bus error on a source load.
    pub const SRC_BUS_ERROR: u32 = 2;
    /// Bus error on a destination store.
    pub const DST_BUS_ERROR: u32 = 3;
    /// Misaligned source address.
    pub const SRC_MISAL: u32 = 4;
    /// Misaligned destination address.
    pub const DST_MISAL: u32 = 5;
    /// Current descriptor pointer is null.
    pub const CURR_PTR_NULL: u32 = 6;
    /// Channel disabled while active.
    pub const ACTIVE_CH_DISABLED: u32 = 7;
    /// Bus error loading a descriptor.
    pub const DESCR_BUS_ERROR: u32 = 8;
}
