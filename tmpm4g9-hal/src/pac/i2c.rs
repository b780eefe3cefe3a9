//! I2C interface

use mcu_hal_common::{Field, Reg};

/// I2C register block.
#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control 1
    pub cr1: Reg,
    /// 0x04 - Data buffer
    pub dbr: Reg,
    /// 0x08 - Own address
    pub ar: Reg,
    /// 0x0C - Control 2 when written, status when read
    pub cr2_sr: Reg,
    /// 0x10 - Prescaler clock
    pub prs: Reg,
    /// 0x14 - Interrupt enable
    pub ie: Reg,
    /// 0x18 - Interrupt status, write 1 to clear
    pub st: Reg,
    /// 0x1C - Extended function
    pub op: Reg,
    /// 0x20 - Bus pin monitor
    pub pm: Reg,
    /// 0x24 - Second own address
    pub ar2: Reg,
}

/// `CR1.SCK`: SCL divider select.
pub const CR1_SCK: Field = Field::new(0, 3);
/// `CR1.NOACK`: no slave address match detection.
pub const CR1_NOACK: Field = Field::bit(3);
/// `CR1.ACK`: generate the acknowledge clock.
pub const CR1_ACK: Field = Field::bit(4);
/// `CR1.BC`: bits per transfer, 0 meaning 8.
pub const CR1_BC: Field = Field::new(5, 3);

/// `DBR.DB`
pub const DBR_DB: Field = Field::new(0, 8);

/// `CR2.SWRES`: software reset, written as 2 then 1.
pub const CR2_SWRES: Field = Field::new(0, 2);
/// `CR2.I2CM`: I2C mode enable.
pub const CR2_I2CM: Field = Field::bit(3);
/// `CR2.PIN`: writing 1 releases the service request.
pub const CR2_PIN: Field = Field::bit(4);
/// `CR2.BB`: start (1) or stop (0) condition.
pub const CR2_BB: Field = Field::bit(5);
/// `CR2.TRX`: transmitter.
pub const CR2_TRX: Field = Field::bit(6);
/// `CR2.MST`: master.
pub const CR2_MST: Field = Field::bit(7);

/// `SR.LRB`: last received bit, 1 is a NACK.
pub const SR_LRB: Field = Field::bit(0);
/// `SR.AL`: arbitration lost.
pub const SR_AL: Field = Field::bit(3);
/// `SR.BB`: bus busy.
pub const SR_BB: Field = Field::bit(5);
/// `SR.MST`: operating as master.
pub const SR_MST: Field = Field::bit(7);

/// `PRS.PRSCK`: prescaler, 1 to 32 with 0 meaning 32.
pub const PRS_PRSCK: Field = Field::new(0, 5);

/// `ST.I2C`: transfer done.
pub const ST_I2C: Field = Field::bit(0);
