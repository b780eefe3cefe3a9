//! Digital-Analog Converter (CTDAC)
//!
//! A 12-bit voltage DAC driving P9.6. Values are given as 16-bit fractions
//! of the reference voltage, or directly in millivolts.

use crate::{
    hwmgr::{self, HwManager, Resource, ResourceKind},
    pac::ctdac::{self, RegisterBlock},
    pins::{self, PinName},
};
use mcu_hal_common::result::{module, ResultCode, Rslt, RsltType};

/// Deglitch time in CTDAC clock cycles.
const DEGLITCH_CYCLES: u32 = 35;
const DAC_MAX: u32 = 0xfff;

/// Output power level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Power {
    /// Converter off.
    Off,
    /// Low power.
    Low,
    /// Medium power.
    Medium,
    /// Full power.
    #[default]
    High,
}

/// DAC errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The pin isn't a CTDAC output.
    InvalidPin,
    /// Reference voltage of 0 mV.
    InvalidReference,
    /// Resource manager error.
    Resource(hwmgr::Error),
}

impl From<hwmgr::Error> for Error {
    fn from(e: hwmgr::Error) -> Self {
        Error::Resource(e)
    }
}

impl ResultCode for Error {
    fn rslt(&self) -> Rslt {
        let code = match self {
            Error::InvalidPin => 0,
            Error::InvalidReference => 1,
            Error::Resource(e) => return e.rslt(),
        };
        Rslt::create(RsltType::Error, module::DAC, code)
    }
}

/// The CTDAC.
pub struct Dac<'a> {
    ctdac: &'a RegisterBlock,
    hwmgr: &'a HwManager,
    resource: Resource,
    pin: PinName,
    vref_mv: u16,
    power: Power,
}

impl<'a> Dac<'a> {
    /// Reserves the CTDAC and starts driving `pin` at 0 V.
    ///
    /// The reference defaults to VDDA at 3.3 V.
    pub fn new(ctdac: &'a RegisterBlock, hwmgr: &'a HwManager, pin: PinName) -> Result<Self, Error> {
        if !pins::is_ctdac_output(pin) {
            return Err(Error::InvalidPin);
        }
        let resource = Resource::new(ResourceKind::Ctdac, 0, 0);
        hwmgr.reserve(resource)?;
        #[cfg(feature = "defmt")]
        defmt::debug!("dac: reserved {} on {}", resource, pin);

        ctdac.ctdac_val.write(0);
        ctdac.ctdac_val_nxt.write(0);
        ctdac
            .ctdac_sw
            .write(ctdac::SW_CTDD_CVD.mask() | ctdac::SW_CTDO_CO6.mask());
        ctdac.intr_mask.write(0);
        ctdac.ctdac_ctrl.write(
            ctdac::CTRL_DEGLITCH_CNT.val(DEGLITCH_CYCLES)
                | ctdac::CTRL_DEGLITCH_CO6.mask()
                | ctdac::CTRL_OUT_EN.mask()
                | ctdac::CTRL_ENABLED.mask(),
        );
        Ok(Dac {
            ctdac,
            hwmgr,
            resource,
            pin,
            vref_mv: 3300,
            power: Power::High,
        })
    }

    /// The output pin.
    pub fn pin(&self) -> PinName {
        self.pin
    }

    /// Sets the output to `value / 65536` of the reference.
    pub fn write(&mut self, value: u16) {
        self.ctdac
            .ctdac_val
            .write_field(ctdac::VAL_VALUE, value as u32 >> 4);
    }

    /// Sets the output in millivolts, saturating at the reference voltage.
    pub fn write_mv(&mut self, mv: u16) {
        let mv = mv.min(self.vref_mv) as u32;
        let counts = mv * DAC_MAX / self.vref_mv as u32;
        self.ctdac.ctdac_val.write_field(ctdac::VAL_VALUE, counts);
    }

    /// Current output as a 16-bit fraction of the reference.
    pub fn read(&self) -> u16 {
        let v = self.ctdac.ctdac_val.read_field(ctdac::VAL_VALUE);
        ((v << 4) | (v >> 8)) as u16
    }

    /// Changes the output power level.
    ///
    /// [`Power::Off`] disables the converter and its output; every other
    /// level keeps it running.
    pub fn set_power(&mut self, power: Power) {
        let on = ctdac::CTRL_ENABLED.mask() | ctdac::CTRL_OUT_EN.mask();
        match power {
            Power::Off => self.ctdac.ctdac_ctrl.clear_bits(on),
            _ => self.ctdac.ctdac_ctrl.set_bits(on),
        }
        self.power = power;
    }

    /// Current output power level.
    pub fn power(&self) -> Power {
        self.power
    }

    /// Sets the reference voltage used by [`Dac::write_mv`].
    pub fn set_reference(&mut self, vref_mv: u16) -> Result<(), Error> {
        if vref_mv == 0 {
            return Err(Error::InvalidReference);
        }
        self.vref_mv = vref_mv;
        Ok(())
    }

    /// Disables the converter, opens its switches and returns it to the
    /// resource manager.
    pub fn free(self) {
        self.ctdac.ctdac_ctrl.clear_bits(ctdac::CTRL_ENABLED.mask() | ctdac::CTRL_OUT_EN.mask());
        self.ctdac
            .ctdac_sw_clear
            .write(ctdac::SW_CTDD_CVD.mask() | ctdac::SW_CTDO_CO6.mask());
        self.hwmgr.free(self.resource);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac;

    #[test]
    fn only_the_output_pin() {
        let regs = pac::detached::<RegisterBlock>();
        let hwmgr = HwManager::new();
        assert_eq!(Dac::new(&regs, &hwmgr, pins::P10_0).err(), Some(Error::InvalidPin));
        let dac = Dac::new(&regs, &hwmgr, pins::P9_6).unwrap();
        assert_eq!(dac.pin(), pins::P9_6);
        assert!(regs.ctdac_ctrl.is_set(ctdac::CTRL_ENABLED.mask()));
        assert!(regs.ctdac_sw.is_set(ctdac::SW_CTDO_CO6.mask()));
        assert_eq!(
            Dac::new(&regs, &hwmgr, pins::P9_6).err(),
            Some(Error::Resource(hwmgr::Error::InUse))
        );
        dac.free();
        assert!(!regs.ctdac_ctrl.is_set(ctdac::CTRL_ENABLED.mask()));
        assert!(Dac::new(&regs, &hwmgr, pins::P9_6).is_ok());
    }

    #[test]
    fn write_and_read_back() {
        let regs = pac::detached::<RegisterBlock>();
        let hwmgr = HwManager::new();
        let mut dac = Dac::new(&regs, &hwmgr, pins::P9_6).unwrap();
        dac.write(0xffff);
        assert_eq!(regs.ctdac_val.read(), 0xfff);
        assert_eq!(dac.read(), 0xffff);
        dac.write(0x8000);
        assert_eq!(regs.ctdac_val.read(), 0x800);
        assert_eq!(dac.read(), 0x8008);
        dac.write(0);
        assert_eq!(dac.read(), 0);
    }

    #[test]
    fn millivolts_saturate() {
        let regs = pac::detached::<RegisterBlock>();
        let hwmgr = HwManager::new();
        let mut dac = Dac::new(&regs, &hwmgr, pins::P9_6).unwrap();
        dac.write_mv(1650);
        assert_eq!(regs.ctdac_val.read(), 2047);
        dac.write_mv(5000);
        assert_eq!(regs.ctdac_val.read(), 0xfff);

        assert_eq!(dac.set_reference(0), Err(Error::InvalidReference));
        dac.set_reference(1200).unwrap();
        dac.write_mv(600);
        assert_eq!(regs.ctdac_val.read(), 2047);
    }

    #[test]
    fn power_off_disables_output() {
        let regs = pac::detached::<RegisterBlock>();
        let hwmgr = HwManager::new();
        let mut dac = Dac::new(&regs, &hwmgr, pins::P9_6).unwrap();
        dac.set_power(Power::Off);
        assert!(!regs.ctdac_ctrl.is_set(ctdac::CTRL_ENABLED.mask()));
        assert_eq!(dac.power(), Power::Off);
        dac.set_power(Power::Low);
        assert!(regs.ctdac_ctrl.is_set(ctdac::CTRL_OUT_EN.mask()));
    }
}
