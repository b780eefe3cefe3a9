//! Continuous time DAC (CTDAC)

use mcu_hal_common::{Field, Reg};

/// CTDAC register block.
#[repr(C)]
pub struct RegisterBlock {
    /// 0x000 - Global control
    pub ctdac_ctrl: Reg,
    _reserved0: [u32; 0x1f],
    /// 0x080 - Interrupt (write 1 to clear)
    pub intr: Reg,
    /// 0x084 - Interrupt set
    pub intr_set: Reg,
    /// 0x088 - Interrupt mask
    pub intr_mask: Reg,
    /// 0x08C - Interrupt masked
    pub intr_masked: Reg,
    _reserved1: [u32; 0x1c],
    /// 0x100 - Switch control
    pub ctdac_sw: Reg,
    /// 0x104 - Switch control, write 1 to clear
    pub ctdac_sw_clear: Reg,
    _reserved2: [u32; 0x3e],
    /// 0x200 - Current DAC value
    pub ctdac_val: Reg,
    /// 0x204 - Next DAC value, loaded on the next update
    pub ctdac_val_nxt: Reg,
}

/// `CTDAC_CTRL.DEGLITCH_CNT`
pub const CTRL_DEGLITCH_CNT: Field = Field::new(0, 6);
/// `CTDAC_CTRL.DEGLITCH_CO6`
pub const CTRL_DEGLITCH_CO6: Field = Field::bit(8);
/// `CTDAC_CTRL.OUT_EN`: drive the output pin.
pub const CTRL_OUT_EN: Field = Field::bit(22);
/// `CTDAC_CTRL.CTDAC_RANGE`: output buffer gain.
pub const CTRL_CTDAC_RANGE: Field = Field::bit(23);
/// `CTDAC_CTRL.CTDAC_MODE`
pub const CTRL_CTDAC_MODE: Field = Field::new(24, 2);
/// `CTDAC_CTRL.DISABLED_MODE`
pub const CTRL_DISABLED_MODE: Field = Field::bit(27);
/// `CTDAC_CTRL.DSI_STROBE_EN`
pub const CTRL_DSI_STROBE_EN: Field = Field::bit(28);
/// `CTDAC_CTRL.DSI_STROBE_LEVEL`
pub const CTRL_DSI_STROBE_LEVEL: Field = Field::bit(29);
/// `CTDAC_CTRL.DEEPSLEEP_ON`
pub const CTRL_DEEPSLEEP_ON: Field = Field::bit(30);
/// `CTDAC_CTRL.ENABLED`
pub const CTRL_ENABLED: Field = Field::bit(31);

/// `CTDAC_SW.CTDD_CVD`: reference from VDDA.
pub const SW_CTDD_CVD: Field = Field::bit(0);
/// `CTDAC_SW.CTDO_CO6`: output to the pin.
pub const SW_CTDO_CO6: Field = Field::bit(8);

/// `CTDAC_VAL.VALUE`
pub const VAL_VALUE: Field = Field::new(0, 12);

/// `INTR.VDAC_EMPTY`
pub const INTR_VDAC_EMPTY: Field = Field::bit(0);
