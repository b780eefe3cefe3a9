//! Timer / counter / PWM (TCPWM)

use super::TCPWM_COUNTERS;
use mcu_hal_common::{Field, Reg};

/// TCPWM register block.
#[repr(C)]
pub struct RegisterBlock {
    /// 0x000 - Counter enables, one bit per counter
    pub ctrl: Reg,
    /// 0x004 - Counter enable clear
    pub ctrl_clr: Reg,
    /// 0x008 - Counter enable set
    pub ctrl_set: Reg,
    /// 0x00C - Capture command
    pub cmd_capture: Reg,
    /// 0x010 - Reload command
    pub cmd_reload: Reg,
    /// 0x014 - Stop command
    pub cmd_stop: Reg,
    /// 0x018 - Start command
    pub cmd_start: Reg,
    /// 0x01C - Interrupt cause, one bit per counter
    pub intr_cause: Reg,
    _reserved0: [u32; 0x38],
    /// 0x100 - Counters
    pub cnt: [Cnt; TCPWM_COUNTERS],
}

/// Registers of one counter.
#[repr(C)]
pub struct Cnt {
    /// 0x00 - Counter control
    pub ctrl: Reg,
    /// 0x04 - Counter status
    pub status: Reg,
    /// 0x08 - Counter value
    pub counter: Reg,
    /// 0x0C - Compare / capture
    pub cc: Reg,
    /// 0x10 - Buffered compare / capture
    pub cc_buff: Reg,
    /// 0x14 - Period
    pub period: Reg,
    /// 0x18 - Buffered period
    pub period_buff: Reg,
    _reserved0: Reg,
    /// 0x20 - Trigger input selection
    pub tr_ctrl0: Reg,
    /// 0x24 - Trigger input edge detection
    pub tr_ctrl1: Reg,
    /// 0x28 - Output line behaviour
    pub tr_ctrl2: Reg,
    _reserved1: Reg,
    /// 0x30 - Interrupt (write 1 to clear)
    pub intr: Reg,
    /// 0x34 - Interrupt set
    pub intr_set: Reg,
    /// 0x38 - Interrupt mask
    pub intr_mask: Reg,
    /// 0x3C - Interrupt masked
    pub intr_masked: Reg,
}

/// `CNT_CTRL.AUTO_RELOAD_CC`: swap `CC` and `CC_BUFF` on terminal count.
pub const CNT_CTRL_AUTO_RELOAD_CC: Field = Field::bit(0);
/// `CNT_CTRL.AUTO_RELOAD_PERIOD`
pub const CNT_CTRL_AUTO_RELOAD_PERIOD: Field = Field::bit(1);
/// `CNT_CTRL.GENERIC`: prescaler, divides by 2^GENERIC.
pub const CNT_CTRL_GENERIC: Field = Field::new(8, 8);
/// `CNT_CTRL.UP_DOWN_MODE`
pub const CNT_CTRL_UP_DOWN_MODE: Field = Field::new(16, 2);
/// `CNT_CTRL.ONE_SHOT`
pub const CNT_CTRL_ONE_SHOT: Field = Field::bit(18);
/// `CNT_CTRL.MODE`
pub const CNT_CTRL_MODE: Field = Field::new(24, 3);

/// Largest `CNT_CTRL.GENERIC` prescaler exponent.
pub const PRESCALER_MAX_EXP: u32 = 7;

/// `UP_DOWN_MODE` values.
pub mod up_down_mode {
    /// Count up to `PERIOD`, then wrap to 0.
    pub const UP: u32 = 0;
    /// Count down to 0, then reload `PERIOD`.
    pub const DOWN: u32 = 1;
    /// Up then down, terminal count at 0.
    pub const UPDN1: u32 = 2;
    /// Up then down, terminal count at 0 and `PERIOD`.
    pub const UPDN2: u32 = 3;
}

/// `MODE` values.
pub mod mode {
    /// Timer.
    pub const TIMER: u32 = 0;
    /// Capture.
    pub const CAPTURE: u32 = 2;
    /// Quadrature decoder.
    pub const QUAD: u32 = 3;
    /// PWM.
    pub const PWM: u32 = 4;
}

/// `CNT_STATUS.DOWN`
pub const CNT_STATUS_DOWN: Field = Field::bit(0);
/// `CNT_STATUS.RUNNING`
pub const CNT_STATUS_RUNNING: Field = Field::bit(31);

/// `CNT_TR_CTRL0.COUNT_SEL`: 1 selects the constant "always count" input.
pub const CNT_TR_CTRL0_COUNT_SEL: Field = Field::new(4, 4);
/// `CNT_TR_CTRL0.RELOAD_SEL`
pub const CNT_TR_CTRL0_RELOAD_SEL: Field = Field::new(8, 4);
/// `CNT_TR_CTRL0.STOP_SEL`
pub const CNT_TR_CTRL0_STOP_SEL: Field = Field::new(12, 4);
/// `CNT_TR_CTRL0.START_SEL`
pub const CNT_TR_CTRL0_START_SEL: Field = Field::new(16, 4);

/// `CNT_TR_CTRL2.CC_MATCH_MODE`
pub const CNT_TR_CTRL2_CC_MATCH_MODE: Field = Field::new(0, 2);
/// `CNT_TR_CTRL2.OVERFLOW_MODE`
pub const CNT_TR_CTRL2_OVERFLOW_MODE: Field = Field::new(2, 2);
/// `CNT_TR_CTRL2.UNDERFLOW_MODE`
pub const CNT_TR_CTRL2_UNDERFLOW_MODE: Field = Field::new(4, 2);

/// Line action values for `CNT_TR_CTRL2`.
pub mod line_mode {
    /// Drive the line high.
    pub const SET: u32 = 0;
    /// Drive the line low.
    pub const CLEAR: u32 = 1;
    /// Toggle the line.
    pub const INVERT: u32 = 2;
    /// Leave the line alone.
    pub const NO_CHANGE: u32 = 3;
}

/// `CNT_INTR.TC`: terminal count.
pub const CNT_INTR_TC: Field = Field::bit(0);
/// `CNT_INTR.CC_MATCH`
pub const CNT_INTR_CC_MATCH: Field = Field::bit(1);
