//! SAR ADC

use mcu_hal_common::{Field, Reg};

/// Number of SAR sequencer channels.
pub const CHANNELS: usize = 16;

/// SAR register block.
#[repr(C)]
pub struct RegisterBlock {
    /// 0x000 - Analog control
    pub ctrl: Reg,
    /// 0x004 - Sample control
    pub sample_ctrl: Reg,
    _reserved0: [u32; 2],
    /// 0x010 - Sample time slots 0 and 1
    pub sample_time01: Reg,
    /// 0x014 - Sample time slots 2 and 3
    pub sample_time23: Reg,
    _reserved1: [u32; 26],
    /// 0x080 - Channel configuration
    pub chan_config: [Reg; CHANNELS],
    _reserved2: [u32; 16],
    /// 0x100 - Channel enable
    pub chan_en: Reg,
    /// 0x104 - Start control
    pub start_ctrl: Reg,
    _reserved3: [u32; 62],
    /// 0x200 - Channel results
    pub chan_result: [Reg; CHANNELS],
    _reserved4: [u32; 16],
    /// 0x280 - Result updated flags
    pub chan_result_updated: Reg,
    _reserved5: [u32; 31],
    /// 0x300 - Status
    pub status: Reg,
    _reserved6: [u32; 3],
    /// 0x310 - Interrupt (write 1 to clear)
    pub intr: Reg,
    /// 0x314 - Interrupt set
    pub intr_set: Reg,
    /// 0x318 - Interrupt mask
    pub intr_mask: Reg,
    /// 0x31C - Interrupt masked
    pub intr_masked: Reg,
}

/// `CTRL.VREF_SEL`
pub const CTRL_VREF_SEL: Field = Field::new(4, 3);
/// `CTRL.VREF_BYP_CAP_EN`
pub const CTRL_VREF_BYP_CAP_EN: Field = Field::bit(7);
/// `CTRL.NEG_SEL`
pub const CTRL_NEG_SEL: Field = Field::new(9, 3);
/// `CTRL.ENABLED`
pub const CTRL_ENABLED: Field = Field::bit(31);

/// `VREF_SEL` values.
pub mod vref_sel {
    /// Internal bandgap reference.
    pub const INTERNAL: u32 = 4;
    /// External reference pin.
    pub const EXTERNAL: u32 = 5;
    /// VDDA / 2.
    pub const VDDA_DIV_2: u32 = 6;
    /// VDDA.
    pub const VDDA: u32 = 7;
}

/// `NEG_SEL` values.
pub mod neg_sel {
    /// Negative input tied to VSSA.
    pub const VSSA: u32 = 0;
    /// Negative input tied to VREF.
    pub const VREF: u32 = 7;
}

/// `SAMPLE_CTRL.LEFT_ALIGN`
pub const SAMPLE_CTRL_LEFT_ALIGN: Field = Field::bit(1);
/// `SAMPLE_CTRL.SINGLE_ENDED_SIGNED`
pub const SAMPLE_CTRL_SINGLE_ENDED_SIGNED: Field = Field::bit(2);
/// `SAMPLE_CTRL.DIFFERENTIAL_SIGNED`
pub const SAMPLE_CTRL_DIFFERENTIAL_SIGNED: Field = Field::bit(3);
/// `SAMPLE_CTRL.AVG_CNT`: averages 2^(AVG_CNT+1) samples.
pub const SAMPLE_CTRL_AVG_CNT: Field = Field::new(4, 3);
/// `SAMPLE_CTRL.AVG_SHIFT`: shift averaged result back to 12 bits.
pub const SAMPLE_CTRL_AVG_SHIFT: Field = Field::bit(7);
/// `SAMPLE_CTRL.CONTINUOUS`
pub const SAMPLE_CTRL_CONTINUOUS: Field = Field::bit(16);

/// `SAMPLE_TIMExx` low slot.
pub const SAMPLE_TIME_LO: Field = Field::new(0, 10);
/// `SAMPLE_TIMExx` high slot.
pub const SAMPLE_TIME_HI: Field = Field::new(16, 10);

/// `CHAN_CONFIG.POS_PIN_ADDR`
pub const CHAN_CONFIG_POS_PIN_ADDR: Field = Field::new(0, 3);
/// `CHAN_CONFIG.DIFFERENTIAL_EN`
pub const CHAN_CONFIG_DIFFERENTIAL_EN: Field = Field::bit(8);
/// `CHAN_CONFIG.AVG_EN`
pub const CHAN_CONFIG_AVG_EN: Field = Field::bit(10);
/// `CHAN_CONFIG.SAMPLE_TIME_SEL`
pub const CHAN_CONFIG_SAMPLE_TIME_SEL: Field = Field::new(12, 2);
/// `CHAN_CONFIG.NEG_PIN_ADDR`
pub const CHAN_CONFIG_NEG_PIN_ADDR: Field = Field::new(16, 3);
/// `CHAN_CONFIG.NEG_ADDR_EN`
pub const CHAN_CONFIG_NEG_ADDR_EN: Field = Field::bit(24);

/// `START_CTRL.FW_TRIGGER`
pub const START_CTRL_FW_TRIGGER: Field = Field::bit(0);

/// `CHAN_RESULT.RESULT`
pub const CHAN_RESULT_RESULT: Field = Field::new(0, 16);

/// `STATUS.BUSY`
pub const STATUS_BUSY: Field = Field::bit(31);

/// `INTR.EOS_INTR`: end of scan.
pub const INTR_EOS: Field = Field::bit(0);
/// `INTR.OVERFLOW_INTR`
pub const INTR_OVERFLOW: Field = Field::bit(1);
/// `INTR.FW_COLLISION_INTR`
pub const INTR_FW_COLLISION: Field = Field::bit(2);
