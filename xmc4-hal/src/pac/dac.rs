//! Digital-to-analog converter (DAC)

use mcu_hal_common::{Field, Reg};

/// Number of DAC channels.
pub const CHANNELS: usize = 2;

/// DAC register block.
#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Module identification
    pub id: Reg,
    /// 0x04 - Channel configuration
    pub ch: [ChCfg; CHANNELS],
    /// 0x14 - Channel data
    pub data: [Reg; CHANNELS],
    /// 0x1C - Data of both channels
    pub data01: Reg,
}

/// Configuration registers of one channel.
#[repr(C)]
pub struct ChCfg {
    /// 0x00 - Configuration 0
    pub cfg0: Reg,
    /// 0x04 - Configuration 1
    pub cfg1: Reg,
}

/// `CFG0.FREQ`: output rate divider.
pub const CFG0_FREQ: Field = Field::new(0, 20);
/// `CFG0.MODE`
pub const CFG0_MODE: Field = Field::new(20, 3);
/// `CFG0.SIGN`: data is signed.
pub const CFG0_SIGN: Field = Field::bit(23);
/// `CFG0.RUN`: channel running.
pub const CFG0_RUN: Field = Field::bit(31);

/// `MODE` values.
pub mod mode {
    /// Channel off.
    pub const DISABLE: u32 = 0;
    /// Output follows every write of the data register.
    pub const SINGLE: u32 = 1;
}

/// `CFG1.SCALE`
pub const CFG1_SCALE: Field = Field::new(0, 3);
/// `CFG1.OFFS`
pub const CFG1_OFFS: Field = Field::new(4, 8);
/// `CFG1.ANAEN`: analog output enable.
pub const CFG1_ANAEN: Field = Field::bit(24);

/// `DATA.DATA`
pub const DATA_DATA: Field = Field::new(0, 12);
