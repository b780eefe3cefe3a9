//! Analog output (DAC)
//!
//! Both DAC channels run in single value mode: the output follows every
//! write of the data register.

use crate::{
    pac::dac::{self, mode, RegisterBlock},
    pins::{self, PinName},
};
use mcu_hal_common::result::{module, ResultCode, Rslt, RsltType};

const DATA_MAX: u32 = 0xfff;

/// Analog output errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The pin isn't a DAC output.
    InvalidPin,
    /// The channel is already driving its pin.
    InUse,
}

impl ResultCode for Error {
    fn rslt(&self) -> Rslt {
        let code = match self {
            Error::InvalidPin => 0,
            Error::InUse => 2,
        };
        Rslt::create(RsltType::Error, module::DAC, code)
    }
}

/// A DAC channel driving its pin.
pub struct AnalogOut<'a> {
    regs: &'a RegisterBlock,
    channel: usize,
    pin: PinName,
}

impl<'a> AnalogOut<'a> {
    /// Starts driving `pin` at 0 V.
    pub fn new(regs: &'a RegisterBlock, pin: PinName) -> Result<Self, Error> {
        let channel = pins::dac_channel(pin).ok_or(Error::InvalidPin)?;
        let ch = &regs.ch[channel];
        if ch.cfg1.is_set(dac::CFG1_ANAEN.mask()) {
            return Err(Error::InUse);
        }

        regs.data[channel].write(0);
        ch.cfg0.write(dac::CFG0_MODE.val(mode::SINGLE));
        ch.cfg1.write(dac::CFG1_ANAEN.mask());
        #[cfg(feature = "defmt")]
        defmt::debug!("dac: channel {} on {}", channel, pin);
        Ok(Self { regs, channel, pin })
    }

    /// The driven pin.
    pub fn pin(&self) -> PinName {
        self.pin
    }

    /// Sets the output as a fraction of the reference, saturating outside
    /// 0 to 1.
    pub fn write(&mut self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        self.write_raw((value * DATA_MAX as f32 + 0.5) as u32);
    }

    /// Sets the output to `value / 65536` of the reference.
    pub fn write_u16(&mut self, value: u16) {
        self.write_raw(value as u32 >> 4);
    }

    fn write_raw(&self, value: u32) {
        self.regs.data[self.channel].write_field(dac::DATA_DATA, value);
    }

    fn read_raw(&self) -> u32 {
        self.regs.data[self.channel].read_field(dac::DATA_DATA)
    }

    /// Current output as a fraction of the reference.
    pub fn read(&self) -> f32 {
        self.read_raw() as f32 / DATA_MAX as f32
    }

    /// Current output as a 16-bit fraction of the reference.
    pub fn read_u16(&self) -> u16 {
        let v = self.read_raw();
        ((v << 4) | (v >> 8)) as u16
    }

    /// Turns the channel off and releases its pin.
    pub fn free(self) {
        let ch = &self.regs.ch[self.channel];
        ch.cfg1.clear_bits(dac::CFG1_ANAEN.mask());
        ch.cfg0.write_field(dac::CFG0_MODE, mode::DISABLE);
    }
}
