//! Analog input (VADC)
//!
//! Each [`AnalogIn`] converts one pin through the queue source of its
//! group. Groups are powered and calibrated the first time a pin of theirs
//! is opened, and stay up afterwards.

use crate::{
    pac::{
        vadc::{self, RegisterBlock},
        VADC_GROUPS,
    },
    pins::{self, PinName, VadcInput},
};
use core::cell::Cell;
use critical_section::Mutex;
use mcu_hal_common::{
    poll::wait_until,
    result::{module, ResultCode, Rslt, RsltType},
};

/// Polls spent waiting for a conversion result.
pub const CONVERSION_BUDGET: u32 = 100_000;
/// Polls spent waiting for start-up calibration.
pub const CALIBRATION_BUDGET: u32 = 100_000;

/// Analog clock divider, the converter runs at `fPERIPH / (DIVA + 1)`.
const ANALOG_CLOCK_DIVA: u32 = 3;
/// Additional sample cycles on top of the minimum of 2.
const SAMPLE_CYCLES: u32 = 0;
const RAW_MAX: u16 = 0xfff;

const CONVERTER_UP: u8 = 1 << 4;

/// Analog input errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The pin isn't connected to the VADC.
    InvalidPin,
    /// Calibration or conversion didn't finish in time.
    Timeout,
}

impl ResultCode for Error {
    fn rslt(&self) -> Rslt {
        match self {
            Error::InvalidPin => Rslt::create(RsltType::Error, module::ADC, 0),
            Error::Timeout => Rslt::create(RsltType::Warning, module::ADC, 4),
        }
    }
}

/// The VADC and the power state of its groups.
///
/// Bits 0 to 3 of the state track which groups are running, bit 4 the
/// converter clock and calibration.
pub struct Vadc<'a> {
    regs: &'a RegisterBlock,
    state: Mutex<Cell<u8>>,
}

impl<'a> Vadc<'a> {
    /// Wraps the VADC registers. Nothing is touched until the first
    /// [`AnalogIn`] is created.
    pub const fn new(regs: &'a RegisterBlock) -> Self {
        Self {
            regs,
            state: Mutex::new(Cell::new(0)),
        }
    }

    fn state(&self) -> u8 {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    fn mark(&self, bits: u8) {
        critical_section::with(|cs| {
            let state = self.state.borrow(cs);
            state.set(state.get() | bits);
        });
    }

    /// Returns `true` once `group` has been powered and calibrated.
    pub fn is_group_active(&self, group: usize) -> bool {
        group < VADC_GROUPS && self.state() & (1 << group) != 0
    }

    fn enable_converter(&self) {
        let regs = self.regs;
        regs.clc.write(0);
        regs.globcfg.write(
            vadc::GLOBCFG_DIVA.val(ANALOG_CLOCK_DIVA) | vadc::GLOBCFG_DIVWC.mask(),
        );
        self.mark(CONVERTER_UP);
    }

    fn bring_up(&self, group: usize) -> Result<(), Error> {
        if self.state() & CONVERTER_UP == 0 {
            self.enable_converter();
        }
        if self.is_group_active(group) {
            return Ok(());
        }
        let g = &self.regs.g[group];

        self.regs.globcfg.set_bits(vadc::GLOBCFG_SUCAL.mask());
        wait_until(CALIBRATION_BUDGET, || !g.arbcfg.is_set(vadc::ARBCFG_CAL.mask())).map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::warn!("vadc: group {} calibration timed out", group);
            Error::Timeout
        })?;

        g.arbcfg.write_field(vadc::ARBCFG_ANONC, vadc::ANON_NORMAL);
        g.iclass[0].write(vadc::ICLASS_STCS.val(SAMPLE_CYCLES) | vadc::ICLASS_CMS.val(0));
        g.qmr0.write(vadc::QMR0_ENGT.val(1) | vadc::QMR0_FLUSH.mask());
        g.arbpr.set_bits(vadc::ARBPR_ASEN0.mask());

        self.mark(1 << group);
        #[cfg(feature = "defmt")]
        defmt::debug!("vadc: group {} up", group);
        Ok(())
    }
}

/// A pin sampled by the VADC.
pub struct AnalogIn<'a> {
    vadc: &'a Vadc<'a>,
    pin: PinName,
    input: VadcInput,
}

impl<'a> AnalogIn<'a> {
    /// Opens `pin` for conversion, bringing its group up on first use.
    pub fn new(vadc: &'a Vadc<'a>, pin: PinName) -> Result<Self, Error> {
        let input = pins::vadc_input(pin).ok_or(Error::InvalidPin)?;
        vadc.bring_up(input.group as usize)?;

        let ch = input.channel as usize;
        vadc.regs.g[input.group as usize].chctr[ch]
            .write(vadc::CHCTR_ICLSEL.val(0) | vadc::CHCTR_RESREG.val(ch as u32));
        Ok(Self { vadc, pin, input })
    }

    /// The sampled pin.
    pub fn pin(&self) -> PinName {
        self.pin
    }

    /// Group and channel the pin is converted on.
    pub fn input(&self) -> VadcInput {
        self.input
    }

    /// Runs one conversion and returns the 12-bit result.
    pub fn read_raw(&mut self) -> Result<u16, Error> {
        let ch = self.input.channel as usize;
        let g = &self.vadc.regs.g[self.input.group as usize];

        // Reading the result register drops a stale valid flag.
        let _ = g.res[ch].read();
        g.qinr0.write(vadc::QINR0_REQCHNR.val(ch as u32));
        g.qmr0.set_bits(vadc::QMR0_TREV.mask());

        let mut res = 0;
        wait_until(CONVERSION_BUDGET, || {
            res = g.res[ch].read();
            res & vadc::RES_VF.mask() != 0
        })
        .map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::warn!("vadc: no result on {}", self.input);
            Error::Timeout
        })?;
        Ok(vadc::RES_RESULT.get(res) as u16 & RAW_MAX)
    }

    /// Runs one conversion, scaled to the full `u16` range.
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let raw = self.read_raw()?;
        Ok((raw << 4) | (raw >> 8))
    }

    /// Runs one conversion, as a fraction of the reference from 0 to 1.
    pub fn read(&mut self) -> Result<f32, Error> {
        Ok(self.read_raw()? as f32 / RAW_MAX as f32)
    }
}
