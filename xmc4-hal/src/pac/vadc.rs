//! Versatile analog-to-digital converter (VADC)

use super::VADC_GROUPS;
use mcu_hal_common::{Field, Reg};

/// Channels per group.
pub const GROUP_CHANNELS: usize = 8;
/// Result registers per group.
pub const GROUP_RESULTS: usize = 16;

/// VADC register block: global registers followed by the four groups.
#[repr(C)]
pub struct RegisterBlock {
    /// 0x000 - Clock control
    pub clc: Reg,
    _reserved0: u32,
    /// 0x008 - Module identification
    pub id: Reg,
    _reserved1: [u32; 29],
    /// 0x080 - Global configuration
    pub globcfg: Reg,
    _reserved2: [u32; 7],
    /// 0x0A0 - Global input class
    pub globiclass: [Reg; 2],
    _reserved3: [u32; 214],
    /// 0x400 - Conversion groups
    pub g: [Group; VADC_GROUPS],
}

/// Registers of one conversion group.
#[repr(C)]
pub struct Group {
    _reserved0: [u32; 32],
    /// 0x080 - Arbitration configuration
    pub arbcfg: Reg,
    /// 0x084 - Arbitration priority
    pub arbpr: Reg,
    /// 0x088 - Channel assignment
    pub chass: Reg,
    _reserved1: [u32; 5],
    /// 0x0A0 - Input class
    pub iclass: [Reg; 2],
    _reserved2: [u32; 22],
    /// 0x100 - Queue 0 source control
    pub qctrl0: Reg,
    /// 0x104 - Queue 0 mode
    pub qmr0: Reg,
    /// 0x108 - Queue 0 status
    pub qsr0: Reg,
    /// 0x10C - Queue 0 register 0
    pub q0r0: Reg,
    /// 0x110 - Queue 0 input
    pub qinr0: Reg,
    _reserved3: [u32; 59],
    /// 0x200 - Channel control
    pub chctr: [Reg; GROUP_CHANNELS],
    _reserved4: [u32; 24],
    /// 0x280 - Result control
    pub rcr: [Reg; GROUP_RESULTS],
    _reserved5: [u32; 16],
    /// 0x300 - Results
    pub res: [Reg; GROUP_RESULTS],
    _reserved6: [u32; 46],
    /// 0x3F8 - Valid flags
    pub vfr: Reg,
    _reserved7: u32,
}

/// `CLC.DISR`: module disable request.
pub const CLC_DISR: Field = Field::bit(0);
/// `CLC.DISS`: module disabled.
pub const CLC_DISS: Field = Field::bit(1);

/// `GLOBCFG.DIVA`: analog clock divider, divides by `DIVA + 1`.
pub const GLOBCFG_DIVA: Field = Field::new(0, 5);
/// `GLOBCFG.DIVWC`: write enable for the divider fields.
pub const GLOBCFG_DIVWC: Field = Field::bit(15);
/// `GLOBCFG.SUCAL`: start-up calibration.
pub const GLOBCFG_SUCAL: Field = Field::bit(31);

/// `ICLASS.STCS`: additional sample clock cycles.
pub const ICLASS_STCS: Field = Field::new(0, 5);
/// `ICLASS.CMS`: conversion mode, 0 is 12-bit.
pub const ICLASS_CMS: Field = Field::new(8, 3);

/// `ARBCFG.ANONC`: analog converter control.
pub const ARBCFG_ANONC: Field = Field::new(0, 2);
/// `ARBCFG.CAL`: calibration running.
pub const ARBCFG_CAL: Field = Field::bit(28);
/// `ARBCFG.BUSY`: conversion running.
pub const ARBCFG_BUSY: Field = Field::bit(30);

/// `ANONC` value for normal operation.
pub const ANON_NORMAL: u32 = 3;

/// `ARBPR.ASEN0`: queue source arbitration enable.
pub const ARBPR_ASEN0: Field = Field::bit(24);

/// `QMR0.ENGT`: gating, 1 issues requests whenever the queue holds one.
pub const QMR0_ENGT: Field = Field::new(0, 2);
/// `QMR0.TREV`: software trigger.
pub const QMR0_TREV: Field = Field::bit(9);
/// `QMR0.FLUSH`: empty the queue.
pub const QMR0_FLUSH: Field = Field::bit(10);

/// `QSR0.EMPTY`
pub const QSR0_EMPTY: Field = Field::bit(5);

/// `QINR0.REQCHNR`: channel to convert.
pub const QINR0_REQCHNR: Field = Field::new(0, 5);
/// `QINR0.RF`: refill the entry after conversion.
pub const QINR0_RF: Field = Field::bit(5);
/// `QINR0.EXTR`: wait for a trigger before converting.
pub const QINR0_EXTR: Field = Field::bit(7);

/// `CHCTR.ICLSEL`: input class.
pub const CHCTR_ICLSEL: Field = Field::new(0, 2);
/// `CHCTR.RESREG`: result register.
pub const CHCTR_RESREG: Field = Field::new(16, 4);

/// `RES.RESULT`
pub const RES_RESULT: Field = Field::new(0, 16);
/// `RES.VF`: valid flag, cleared by reading.
pub const RES_VF: Field = Field::bit(31);
