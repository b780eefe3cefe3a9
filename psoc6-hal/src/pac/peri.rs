//! Peripheral interconnect: trigger multiplexer registers

use mcu_hal_common::{Field, Reg};

/// Number of trigger groups.
pub const TR_GROUPS: usize = 16;
/// Output lines per trigger group.
pub const TR_GROUP_OUTPUTS: usize = 128;

/// PERI register block (trigger related part).
#[repr(C)]
pub struct RegisterBlock {
    _reserved0: [u32; 8],
    /// 0x020 - Software trigger command
    pub tr_cmd: Reg,
    _reserved1: [u32; 0x7f7],
    /// 0x2000 - Trigger groups
    pub tr_gr: [TrGroup; TR_GROUPS],
}

/// One trigger group: an output line selects one of the group's inputs.
#[repr(C)]
pub struct TrGroup {
    /// Output line control
    pub tr_out_ctl: [Reg; TR_GROUP_OUTPUTS],
}

/// `TR_CMD.TR_SEL`: line index inside the group.
pub const TR_CMD_TR_SEL: Field = Field::new(0, 8);
/// `TR_CMD.GROUP_SEL`
pub const TR_CMD_GROUP_SEL: Field = Field::new(8, 4);
/// `TR_CMD.COUNT`: number of cycles the trigger is held, 0xFF for "until cleared".
pub const TR_CMD_COUNT: Field = Field::new(16, 8);
/// `TR_CMD.OUT_SEL`: the command addresses an output line.
pub const TR_CMD_OUT_SEL: Field = Field::bit(30);
/// `TR_CMD.ACTIVATE`: set by software, cleared by hardware when done.
pub const TR_CMD_ACTIVATE: Field = Field::bit(31);

/// `TR_OUT_CTL.TR_SEL`: selected input, 0 ties the output low.
pub const TR_OUT_CTL_TR_SEL: Field = Field::new(0, 8);
/// `TR_OUT_CTL.TR_INV`
pub const TR_OUT_CTL_TR_INV: Field = Field::bit(8);
/// `TR_OUT_CTL.TR_EDGE`
pub const TR_OUT_CTL_TR_EDGE: Field = Field::bit(9);
