//! Analog-Digital Converter (SAR ADC)
//!
//! The SAR scans up to 16 sequencer channels, each one connected to a
//! port 10 pin (or a pair of them for differential measurements).
//! [`Adc::channel`] sets up a channel, and [`Adc::read`] takes a single
//! sample from it.
//!
//! ```no_run
//! use psoc6_hal::{
//!     adc::{Adc, AdcConfig, ChannelConfig},
//!     hwmgr::HwManager,
//!     pac, pins,
//! };
//!
//! static HWMGR: HwManager = HwManager::new();
//!
//! let sar = unsafe { &*pac::SAR::ptr() };
//! let mut adc = Adc::new(sar, &HWMGR, AdcConfig::default()).unwrap();
//! let ch = adc.channel(pins::P10_0, None, ChannelConfig::default()).unwrap();
//! let counts = adc.read(&ch).unwrap();
//! let microvolts = adc.read_uv(&ch).unwrap();
//! ```
//!
//! Channels can also be read through the embedded-hal 0.2 `OneShot` trait,
//! which returns the left aligned 16 bit value of [`Adc::read_u16`].

use crate::{
    hwmgr::{self, HwManager, Resource, ResourceKind},
    pac::sar::{self, RegisterBlock},
    pins::{self, PinName},
};
use embedded_hal_0_2::adc::{Channel, OneShot};
use fugit::HertzU32;
use mcu_hal_common::{
    result::{module, ResultCode, Rslt, RsltType},
    wait_until,
};

/// Polls of the end-of-scan flag before [`Error::Timeout`].
pub const READ_BUDGET: u32 = 100_000;

/// Number of shared sample time slots.
pub const SAMPLE_TIME_SLOTS: usize = 4;

const RESOLUTION: u8 = 12;
const INTERNAL_VREF_MV: u32 = 1200;
const MIN_SAMPLE_CYCLES: u32 = 2;

/// Reference voltage source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vref {
    /// Internal 1.2 V bandgap.
    Internal,
    /// External reference pin.
    External,
    /// Half of VDDA.
    VddaDiv2,
    /// VDDA.
    #[default]
    Vdda,
}

/// Negative input of single ended channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vneg {
    /// Analog ground.
    #[default]
    Vssa,
    /// The reference voltage.
    Vref,
}

/// Converter wide settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcConfig {
    /// Scan continuously instead of on demand.
    pub continuous_scanning: bool,
    /// Result resolution in bits. Only 12 is supported.
    pub resolution: u8,
    /// Samples averaged on channels with averaging enabled. Power of two, at most 256.
    pub average_count: u16,
    /// Reference voltage source.
    pub vref: Vref,
    /// Negative input of single ended channels.
    pub vneg: Vneg,
    /// VDDA, in millivolts.
    pub vdda_mv: u32,
    /// Voltage on the external reference pin, in millivolts.
    pub ext_vref_mv: u32,
    /// Route the reference through the bypass capacitor.
    pub bypass_capacitor: bool,
    /// SAR clock.
    pub clock: HertzU32,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            continuous_scanning: false,
            resolution: RESOLUTION,
            average_count: 1,
            vref: Vref::default(),
            vneg: Vneg::default(),
            vdda_mv: 3300,
            ext_vref_mv: 0,
            bypass_capacitor: false,
            clock: HertzU32::from_raw(18_000_000),
        }
    }
}

impl AdcConfig {
    fn validate(&self) -> Result<(), Error> {
        let count_ok = self.average_count.is_power_of_two() && self.average_count <= 256;
        let vref_ok = self.vref != Vref::External || self.ext_vref_mv != 0;
        if self.resolution != RESOLUTION || !count_ok || !vref_ok || self.clock.to_Hz() == 0 {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }

    fn vref_mv(&self) -> u32 {
        match self.vref {
            Vref::Internal => INTERNAL_VREF_MV,
            Vref::External => self.ext_vref_mv,
            Vref::VddaDiv2 => self.vdda_mv / 2,
            Vref::Vdda => self.vdda_mv,
        }
    }
}

/// Per channel settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Average samples as set by [`AdcConfig::average_count`].
    pub enable_averaging: bool,
    /// Minimum acquisition time, in nanoseconds.
    pub min_acquisition_ns: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            enable_averaging: false,
            min_acquisition_ns: 220,
        }
    }
}

/// ADC errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Unsupported configuration value.
    InvalidParameter,
    /// The pin isn't connected to the SAR.
    InvalidPin,
    /// All 16 channels are in use.
    NoFreeChannel,
    /// Every sample time slot holds a different acquisition time.
    NoSampleTimeSlot,
    /// The conversion didn't finish within [`READ_BUDGET`] polls.
    Timeout,
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
        let (ty, code) = match self {
            Error::InvalidParameter => (RsltType::Error, 0),
            Error::InvalidPin => (RsltType::Error, 1),
            Error::NoFreeChannel => (RsltType::Error, 2),
            Error::NoSampleTimeSlot => (RsltType::Error, 3),
            Error::Timeout => (RsltType::Warning, 4),
            Error::Resource(e) => return e.rslt(),
        };
        Rslt::create(ty, module::ADC, code)
    }
}

/// A configured sequencer channel.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcChannel {
    index: u8,
    vplus: PinName,
    vminus: Option<PinName>,
    slot: u8,
    config: ChannelConfig,
}

impl AdcChannel {
    /// Sequencer channel number.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Positive input.
    pub fn vplus(&self) -> PinName {
        self.vplus
    }

    /// Negative input of a differential channel.
    pub fn vminus(&self) -> Option<PinName> {
        self.vminus
    }

    /// Current channel settings.
    pub fn config(&self) -> ChannelConfig {
        self.config
    }

    fn is_differential(&self) -> bool {
        self.vminus.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SampleSlot {
    cycles: u16,
    users: u8,
}

/// Sample time in SAR clock cycles for at least `ns` nanoseconds.
fn sample_cycles(ns: u32, clock: HertzU32) -> u16 {
    let cycles = (ns as u64 * clock.to_Hz() as u64).div_ceil(1_000_000_000);
    cycles.clamp(MIN_SAMPLE_CYCLES as u64, sar::SAMPLE_TIME_LO.max() as u64) as u16
}

/// The SAR ADC.
pub struct Adc<'a> {
    sar: &'a RegisterBlock,
    hwmgr: &'a HwManager,
    resource: Resource,
    config: AdcConfig,
    channels: u16,
    averaging: u16,
    slots: [SampleSlot; SAMPLE_TIME_SLOTS],
}

impl<'a> Adc<'a> {
    /// Reserves the SAR, applies `config` and enables the converter.
    pub fn new(sar: &'a RegisterBlock, hwmgr: &'a HwManager, config: AdcConfig) -> Result<Self, Error> {
        config.validate()?;
        let resource = Resource::new(ResourceKind::Sar, 0, 0);
        hwmgr.reserve(resource)?;
        #[cfg(feature = "defmt")]
        defmt::debug!("adc: reserved {}", resource);

        let adc = Adc {
            sar,
            hwmgr,
            resource,
            config,
            channels: 0,
            averaging: 0,
            slots: [SampleSlot::default(); SAMPLE_TIME_SLOTS],
        };
        sar.chan_en.write(0);
        adc.apply_config();
        Ok(adc)
    }

    /// Replaces the converter wide settings.
    pub fn configure(&mut self, config: AdcConfig) -> Result<(), Error> {
        config.validate()?;
        self.config = config;
        self.apply_config();
        Ok(())
    }

    /// Current converter wide settings.
    pub fn config(&self) -> &AdcConfig {
        &self.config
    }

    fn apply_config(&self) {
        let cfg = &self.config;
        let vref = match cfg.vref {
            Vref::Internal => sar::vref_sel::INTERNAL,
            Vref::External => sar::vref_sel::EXTERNAL,
            Vref::VddaDiv2 => sar::vref_sel::VDDA_DIV_2,
            Vref::Vdda => sar::vref_sel::VDDA,
        };
        let neg = match cfg.vneg {
            Vneg::Vssa => sar::neg_sel::VSSA,
            Vneg::Vref => sar::neg_sel::VREF,
        };
        let mut ctrl = sar::CTRL_VREF_SEL.val(vref) | sar::CTRL_NEG_SEL.val(neg);
        if cfg.bypass_capacitor {
            ctrl |= sar::CTRL_VREF_BYP_CAP_EN.mask();
        }

        // Averaging 2^(n+1) samples.
        let avg_cnt = (cfg.average_count.trailing_zeros()).saturating_sub(1);
        let mut sample_ctrl = sar::SAMPLE_CTRL_DIFFERENTIAL_SIGNED.mask()
            | sar::SAMPLE_CTRL_AVG_CNT.val(avg_cnt)
            | sar::SAMPLE_CTRL_AVG_SHIFT.mask();
        if cfg.continuous_scanning {
            sample_ctrl |= sar::SAMPLE_CTRL_CONTINUOUS.mask();
        }

        let averaging = cfg.average_count > 1;
        let continuous = cfg.continuous_scanning;
        self.sar.ctrl.write(ctrl);
        self.sar.sample_ctrl.write(sample_ctrl);
        for idx in 0..sar::CHANNELS {
            if self.channels & (1 << idx) != 0 {
                let wanted = self.averaging & (1 << idx) != 0;
                self.sar.chan_config[idx].write_field(sar::CHAN_CONFIG_AVG_EN, (averaging && wanted) as u32);
            }
        }
        self.sar.chan_en.write(if continuous { self.channels as u32 } else { 0 });
        self.sar.ctrl.set_bits(sar::CTRL_ENABLED.mask());
        if continuous {
            self.sar.start_ctrl.write(sar::START_CTRL_FW_TRIGGER.mask());
        }
    }

    /// Sets up a channel sampling `vplus`, against `vminus` if given.
    ///
    /// Single ended channels measure against the configured [`Vneg`].
    pub fn channel(
        &mut self,
        vplus: PinName,
        vminus: Option<PinName>,
        config: ChannelConfig,
    ) -> Result<AdcChannel, Error> {
        let pos = pins::sar_address(vplus).ok_or(Error::InvalidPin)?;
        let neg = match vminus {
            Some(pin) if pin == vplus => return Err(Error::InvalidPin),
            Some(pin) => Some(pins::sar_address(pin).ok_or(Error::InvalidPin)?),
            None => None,
        };
        let free = !self.channels;
        if free == 0 {
            return Err(Error::NoFreeChannel);
        }
        let index = free.trailing_zeros() as u8;
        let slot = self.claim_slot(sample_cycles(config.min_acquisition_ns, self.config.clock))?;

        let chan = AdcChannel {
            index,
            vplus,
            vminus,
            slot,
            config,
        };
        self.channels |= 1 << index;
        self.write_chan_config(&chan, pos, neg);
        #[cfg(feature = "defmt")]
        defmt::debug!("adc: channel {} on {}", index, vplus);
        Ok(chan)
    }

    /// Changes the settings of an existing channel.
    pub fn channel_configure(&mut self, chan: &mut AdcChannel, config: ChannelConfig) -> Result<(), Error> {
        let cycles = sample_cycles(config.min_acquisition_ns, self.config.clock);
        let old = chan.slot;
        self.release_slot(old);
        match self.claim_slot(cycles) {
            Ok(slot) => chan.slot = slot,
            Err(e) => {
                // Keep the old slot.
                self.slots[old as usize].users += 1;
                return Err(e);
            }
        }
        chan.config = config;
        let pos = pins::sar_address(chan.vplus).ok_or(Error::InvalidPin)?;
        let neg = chan.vminus.and_then(pins::sar_address);
        self.write_chan_config(chan, pos, neg);
        Ok(())
    }

    /// Disables a channel and frees its sequencer slot.
    pub fn channel_free(&mut self, chan: AdcChannel) {
        let idx = chan.index as usize;
        self.sar.chan_en.clear_bits(1 << idx);
        self.sar.chan_config[idx].write(0);
        self.release_slot(chan.slot);
        self.channels &= !(1 << idx);
        self.averaging &= !(1 << idx);
    }

    fn write_chan_config(&mut self, chan: &AdcChannel, pos: u8, neg: Option<u8>) {
        let mut value = sar::CHAN_CONFIG_POS_PIN_ADDR.val(pos as u32)
            | sar::CHAN_CONFIG_SAMPLE_TIME_SEL.val(chan.slot as u32);
        if let Some(neg) = neg {
            value |= sar::CHAN_CONFIG_DIFFERENTIAL_EN.mask()
                | sar::CHAN_CONFIG_NEG_ADDR_EN.mask()
                | sar::CHAN_CONFIG_NEG_PIN_ADDR.val(neg as u32);
        }
        let bit = 1 << chan.index;
        if chan.config.enable_averaging {
            self.averaging |= bit;
            if self.config.average_count > 1 {
                value |= sar::CHAN_CONFIG_AVG_EN.mask();
            }
        } else {
            self.averaging &= !bit;
        }
        self.sar.chan_config[chan.index as usize].write(value);
        if self.config.continuous_scanning {
            self.sar.chan_en.set_bits(bit as u32);
        }
    }

    fn claim_slot(&mut self, cycles: u16) -> Result<u8, Error> {
        let idx = self
            .slots
            .iter()
            .position(|s| s.users > 0 && s.cycles == cycles)
            .or_else(|| self.slots.iter().position(|s| s.users == 0))
            .ok_or(Error::NoSampleTimeSlot)?;
        let slot = &mut self.slots[idx];
        if slot.users == 0 {
            slot.cycles = cycles;
            let (reg, field) = match idx {
                0 => (&self.sar.sample_time01, sar::SAMPLE_TIME_LO),
                1 => (&self.sar.sample_time01, sar::SAMPLE_TIME_HI),
                2 => (&self.sar.sample_time23, sar::SAMPLE_TIME_LO),
                _ => (&self.sar.sample_time23, sar::SAMPLE_TIME_HI),
            };
            reg.write_field(field, cycles as u32);
        }
        slot.users += 1;
        Ok(idx as u8)
    }

    fn release_slot(&mut self, idx: u8) {
        let slot = &mut self.slots[idx as usize];
        slot.users = slot.users.saturating_sub(1);
    }

    /// Takes one sample from `chan`, in converter counts.
    ///
    /// Differential channels return signed counts.
    pub fn read(&mut self, chan: &AdcChannel) -> Result<i32, Error> {
        let idx = chan.index as usize;
        let bit = 1u32 << idx;
        if self.config.continuous_scanning {
            self.poll(|sar| sar.chan_result_updated.is_set(bit))?;
            self.sar.chan_result_updated.write(bit);
        } else {
            self.sar.chan_en.write(bit);
            let stale = self.sar.intr.read() & sar::INTR_EOS.mask();
            self.sar.intr.write(stale);
            self.sar.start_ctrl.write(sar::START_CTRL_FW_TRIGGER.mask());
            self.poll(|sar| sar.intr.is_set(sar::INTR_EOS.mask()))?;
            self.sar.intr.write(sar::INTR_EOS.mask());
        }
        let raw = self.sar.chan_result[idx].read_field(sar::CHAN_RESULT_RESULT);
        Ok(if chan.is_differential() {
            raw as u16 as i16 as i32
        } else {
            raw as i32
        })
    }

    fn poll(&self, done: impl Fn(&RegisterBlock) -> bool) -> Result<(), Error> {
        wait_until(READ_BUDGET, || done(self.sar)).map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::warn!("adc: conversion timed out");
            Error::Timeout
        })
    }

    /// Takes one sample and returns it left aligned to 16 bits.
    ///
    /// Negative differential results read as 0.
    pub fn read_u16(&mut self, chan: &AdcChannel) -> Result<u16, Error> {
        let max = (1 << self.config.resolution) - 1;
        let counts = self.read(chan)?.clamp(0, max) as u32;
        Ok((counts << (16 - self.config.resolution as u32)) as u16)
    }

    /// Takes one sample and converts it to microvolts.
    pub fn read_uv(&mut self, chan: &AdcChannel) -> Result<i32, Error> {
        let counts = self.read(chan)? as i64;
        let range = if chan.is_differential() {
            1i64 << (self.config.resolution - 1)
        } else {
            1i64 << self.config.resolution
        };
        let vref_uv = self.config.vref_mv() as i64 * 1000;
        Ok((counts * vref_uv / range) as i32)
    }

    /// Disables the converter and returns the SAR to the resource manager.
    pub fn free(self) {
        self.sar.chan_en.write(0);
        self.sar.ctrl.clear_bits(sar::CTRL_ENABLED.mask());
        self.hwmgr.free(self.resource);
    }
}

impl Channel<Adc<'_>> for AdcChannel {
    type ID = ();

    fn channel() -> Self::ID {}
}

impl<'a, WORD> OneShot<Adc<'a>, WORD, AdcChannel> for Adc<'a>
where
    WORD: From<u16>,
{
    type Error = Error;

    fn read(&mut self, pin: &mut AdcChannel) -> nb::Result<WORD, Self::Error> {
        self.read_u16(pin).map(WORD::from).map_err(nb::Error::Other)
    }
}
