//! Inter-Integrated Circuit (I2C) bus
//!
//! A blocking controller driver. Transfers can be driven byte by byte with
//! [`I2c::start`], [`I2c::byte_write`], [`I2c::byte_read`] and
//! [`I2c::stop`], or a buffer at a time with [`I2c::read`] and
//! [`I2c::write`]. [`embedded_hal::i2c::I2c`] is implemented on top.
//!
//! The start condition is issued together with the first byte written
//! after [`I2c::start`], since the hardware sends the address from the
//! data buffer as part of the start sequence.
//!
//! ## Usage
//! ```no_run
//! use fugit::RateExtU32;
//! use tmpm4g9_hal::{i2c::{Config, I2c}, pac, pins};
//!
//! let p = pac::Peripherals::take().unwrap();
//! let config = Config {
//!     frequency: 400.kHz(),
//!     system_clock: 80.MHz(),
//! };
//! let mut i2c = I2c::new(&p.I2C0, pins::PG2, pins::PG3, config).unwrap();
//!
//! i2c.write(0x2c, &[1, 2, 3], true).unwrap();
//! let mut buf = [0; 2];
//! i2c.read(0x2c, &mut buf, true).unwrap();
//! ```

use crate::{
    pac::i2c::{self, RegisterBlock},
    pins::{self, PinName},
};
use embedded_hal::i2c::{self as eh1, ErrorKind, NoAcknowledgeSource, Operation, SevenBitAddress};
use fugit::HertzU32;
use mcu_hal_common::{
    poll::wait_until,
    result::{module, ResultCode, Rslt, RsltType},
};

/// Polls spent waiting for the bus to become free.
pub const BUS_FREE_BUDGET: u32 = 100_000;
/// Polls spent waiting for one byte transfer.
pub const TRANSFER_BUDGET: u32 = 100_000;

const PRESCALER_MAX: u32 = 32;
const SCK_MAX: u32 = 7;

/// I2C error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// SDA and SCL don't belong to the same I2C channel.
    InvalidPin,
    /// No divider produces a bus frequency at or below the request.
    InvalidFrequency,
    /// Another master holds the bus.
    BusBusy,
    /// A transfer or the stop condition didn't complete in time.
    Timeout,
    /// Another master won arbitration.
    ArbitrationLost,
    /// Nobody acknowledged the address.
    NoSlave,
    /// The device didn't acknowledge a data byte.
    DataNack,
}

impl ResultCode for Error {
    fn rslt(&self) -> Rslt {
        let (ty, code) = match self {
            Error::InvalidPin => (RsltType::Error, 0),
            Error::InvalidFrequency => (RsltType::Error, 1),
            Error::BusBusy => (RsltType::Error, 2),
            Error::Timeout => (RsltType::Warning, 3),
            Error::ArbitrationLost => (RsltType::Error, 4),
            Error::NoSlave => (RsltType::Error, 5),
            Error::DataNack => (RsltType::Error, 6),
        };
        Rslt::create(ty, module::I2C, code)
    }
}

impl eh1::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::BusBusy => ErrorKind::Bus,
            Error::ArbitrationLost => ErrorKind::ArbitrationLoss,
            Error::NoSlave => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Error::DataNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            _ => ErrorKind::Other,
        }
    }
}

/// Acknowledge received after a byte was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    /// The byte was acknowledged.
    Ack,
    /// The byte was not acknowledged.
    Nack,
}

/// Bus configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Highest acceptable SCL frequency.
    pub frequency: HertzU32,
    /// Peripheral clock feeding the prescaler.
    pub system_clock: HertzU32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frequency: HertzU32::from_raw(100_000),
            system_clock: HertzU32::from_raw(80_000_000),
        }
    }
}

/// Prescaler and SCL divider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDivider {
    /// Prescaler, 1 to 32.
    pub prescaler: u32,
    /// SCL divider select, 0 to 7.
    pub sck: u32,
    /// Resulting SCL frequency.
    pub frequency: HertzU32,
}

/// Finds the divider giving the highest SCL frequency not above `target`.
///
/// SCL runs at `fsys / (prescaler * (2^(sck + 2) + 16))`.
pub fn frequency(target: HertzU32, system_clock: HertzU32) -> Option<ClockDivider> {
    let target = target.to_Hz();
    let fsys = system_clock.to_Hz();
    let mut best: Option<ClockDivider> = None;
    for prescaler in 1..=PRESCALER_MAX {
        for sck in 0..=SCK_MAX {
            let f = fsys / (prescaler * ((1 << (sck + 2)) + 16));
            if f > target || best.is_some_and(|b| b.frequency.to_Hz() >= f) {
                continue;
            }
            best = Some(ClockDivider {
                prescaler,
                sck,
                frequency: HertzU32::from_raw(f),
            });
        }
    }
    best
}

/// An I2C channel operating as bus controller.
pub struct I2c<'a> {
    regs: &'a RegisterBlock,
    instance: u8,
    divider: ClockDivider,
    start_pending: bool,
}

impl<'a> I2c<'a> {
    /// Configures the channel behind `regs` as controller on `sda` and
    /// `scl`.
    pub fn new(
        regs: &'a RegisterBlock,
        sda: PinName,
        scl: PinName,
        config: Config,
    ) -> Result<Self, Error> {
        let instance = pins::i2c_instance(sda, scl).ok_or(Error::InvalidPin)?;
        let divider =
            frequency(config.frequency, config.system_clock).ok_or(Error::InvalidFrequency)?;
        let i2c = I2c {
            regs,
            instance,
            divider,
            start_pending: false,
        };
        i2c.init();
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "i2c{}: {=u32} Hz (prs {=u32}, sck {=u32})",
            instance,
            divider.frequency.to_Hz(),
            divider.prescaler,
            divider.sck
        );
        Ok(i2c)
    }

    fn init(&self) {
        let regs = self.regs;
        regs.cr2_sr.write(i2c::CR2_SWRES.val(2));
        regs.cr2_sr.write(i2c::CR2_SWRES.val(1));
        regs.ie.write(0);
        regs.st.write(i2c::ST_I2C.mask());
        regs.prs.write(i2c::PRS_PRSCK.val(self.divider.prescaler));
        regs.cr1
            .write(i2c::CR1_SCK.val(self.divider.sck) | i2c::CR1_ACK.mask());
        regs.cr2_sr.write(i2c::CR2_I2CM.mask() | i2c::CR2_PIN.mask());
    }

    /// I2C channel number.
    pub fn instance(&self) -> u8 {
        self.instance
    }

    /// The SCL frequency in use.
    pub fn bus_frequency(&self) -> HertzU32 {
        self.divider.frequency
    }

    /// Software resets the channel and restores its configuration.
    pub fn reset(&mut self) {
        self.start_pending = false;
        self.init();
    }

    /// Prepares a start condition, sent with the next [`I2c::byte_write`].
    ///
    /// While this controller holds the bus a repeated start follows.
    /// Otherwise the bus has to be free within [`BUS_FREE_BUDGET`] polls.
    pub fn start(&mut self) -> Result<(), Error> {
        let sr = self.regs.cr2_sr.read();
        if sr & i2c::SR_MST.mask() != 0 && sr & i2c::SR_BB.mask() != 0 {
            // Release the bus without a stop, SCL is held until the next start.
            self.regs
                .cr2_sr
                .write(i2c::CR2_I2CM.mask() | i2c::CR2_PIN.mask());
            self.wait_bus_free(Error::Timeout)?;
        } else {
            self.wait_bus_free(Error::BusBusy)?;
        }
        self.start_pending = true;
        Ok(())
    }

    fn wait_bus_free(&self, err: Error) -> Result<(), Error> {
        wait_until(BUS_FREE_BUDGET, || {
            !self.regs.cr2_sr.is_set(i2c::SR_BB.mask())
        })
        .map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::warn!("i2c{}: bus not released", self.instance);
            err
        })
    }

    /// Sends a stop condition and waits for the bus to be released.
    pub fn stop(&mut self) -> Result<(), Error> {
        self.start_pending = false;
        self.regs.cr2_sr.write(
            i2c::CR2_MST.mask() | i2c::CR2_TRX.mask() | i2c::CR2_I2CM.mask() | i2c::CR2_PIN.mask(),
        );
        self.wait_bus_free(Error::Timeout)
    }

    fn wait_transfer(&self) -> Result<(), Error> {
        wait_until(TRANSFER_BUDGET, || self.regs.st.is_set(i2c::ST_I2C.mask())).map_err(
            |_| {
                #[cfg(feature = "defmt")]
                defmt::warn!("i2c{}: transfer timed out", self.instance);
                Error::Timeout
            },
        )?;
        self.regs.st.write(i2c::ST_I2C.mask());
        Ok(())
    }

    /// Writes one byte, preceded by the start condition if one is pending.
    pub fn byte_write(&mut self, byte: u8) -> Result<Ack, Error> {
        self.regs.dbr.write(byte as u32);
        if self.start_pending {
            self.start_pending = false;
            self.regs.cr2_sr.write(
                i2c::CR2_MST.mask()
                    | i2c::CR2_TRX.mask()
                    | i2c::CR2_BB.mask()
                    | i2c::CR2_PIN.mask()
                    | i2c::CR2_I2CM.mask(),
            );
        }
        self.wait_transfer()?;

        let sr = self.regs.cr2_sr.read();
        // Losing arbitration also drops the channel out of master mode.
        if sr & i2c::SR_AL.mask() != 0 && sr & i2c::SR_MST.mask() == 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("i2c{}: arbitration lost", self.instance);
            return Err(Error::ArbitrationLost);
        }
        Ok(if sr & i2c::SR_LRB.mask() == 0 {
            Ack::Ack
        } else {
            Ack::Nack
        })
    }

    /// Reads one byte, acknowledging it unless it is the `last` one.
    pub fn byte_read(&mut self, last: bool) -> Result<u8, Error> {
        self.regs.cr1.modify(|r| i2c::CR1_ACK.set(r, !last as u32));
        // Writing the buffer clocks in the next byte.
        self.regs.dbr.write(0);
        self.wait_transfer()?;
        Ok(self.regs.dbr.read_field(i2c::DBR_DB) as u8)
    }

    fn address(&mut self, addr: SevenBitAddress, read: bool) -> Result<(), Error> {
        self.start()?;
        if self.byte_write((addr << 1) | read as u8)? == Ack::Nack {
            self.stop()?;
            return Err(Error::NoSlave);
        }
        Ok(())
    }

    /// Reads `buf.len()` bytes from `addr`, returning the count read.
    ///
    /// With `stop` false the bus stays claimed for a repeated start.
    pub fn read(&mut self, addr: SevenBitAddress, buf: &mut [u8], stop: bool) -> Result<usize, Error> {
        self.address(addr, true)?;
        self.read_bytes(buf, true)?;
        if stop {
            self.stop()?;
        }
        Ok(buf.len())
    }

    /// Reads into `buf`, not acknowledging the final byte if `nack_last`.
    fn read_bytes(&mut self, buf: &mut [u8], nack_last: bool) -> Result<(), Error> {
        let len = buf.len();
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.byte_read(nack_last && i + 1 == len)?;
        }
        Ok(())
    }

    /// Writes `data` to `addr`, returning the number of bytes acknowledged.
    ///
    /// The transfer ends at the first byte the device doesn't acknowledge.
    pub fn write(&mut self, addr: SevenBitAddress, data: &[u8], stop: bool) -> Result<usize, Error> {
        self.address(addr, false)?;
        let sent = self.write_bytes(data)?;
        if stop {
            self.stop()?;
        }
        Ok(sent)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, Error> {
        let mut sent = 0;
        for &byte in data {
            if self.byte_write(byte)? == Ack::Nack {
                #[cfg(feature = "defmt")]
                defmt::debug!("i2c{}: nack after {} bytes", self.instance, sent);
                break;
            }
            sent += 1;
        }
        Ok(sent)
    }

    fn transaction_inner(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        // Some(true) while reading, Some(false) while writing.
        let mut reading = None;
        for i in 0..operations.len() {
            let nack_last = !read_continues(&operations[i + 1..]);
            match &mut operations[i] {
                Operation::Read(buf) => {
                    if reading != Some(true) {
                        self.address(address, true)?;
                        reading = Some(true);
                    }
                    self.read_bytes(buf, nack_last)?;
                }
                Operation::Write(data) => {
                    if reading != Some(false) {
                        self.address(address, false)?;
                        reading = Some(false);
                    }
                    if self.write_bytes(data)? != data.len() {
                        return Err(Error::DataNack);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Returns `true` if the reads at the head of `rest` still want bytes, in
/// which case the byte before them must be acknowledged.
fn read_continues(rest: &[Operation<'_>]) -> bool {
    rest.iter()
        .map_while(|op| match op {
            Operation::Read(buf) => Some(!buf.is_empty()),
            Operation::Write(_) => None,
        })
        .any(|wants| wants)
}

impl eh1::ErrorType for I2c<'_> {
    type Error = Error;
}

impl eh1::I2c<SevenBitAddress> for I2c<'_> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }
        let result = self.transaction_inner(address, operations);
        match result {
            Err(Error::NoSlave) | Err(Error::BusBusy) => result,
            _ => {
                let stopped = self.stop();
                result.and(stopped)
            }
        }
    }
}
