//! Timer / counter / PWM blocks
//!
//! Both [`Timer`](crate::timer::Timer) and [`Pwm`](crate::pwm::Pwm) run on a
//! TCPWM counter allocated from the resource manager. Block 0 has 32-bit
//! counters, block 1 16-bit ones.

use crate::{
    hwmgr::{self, HwManager, Resource, ResourceKind},
    pac::{tcpwm, TCPWM_BLOCKS},
};
use mcu_hal_common::result::{module, ResultCode, Rslt, RsltType};

/// The TCPWM blocks a counter may be allocated from.
#[derive(Clone, Copy)]
pub struct TcpwmHw<'a> {
    /// TCPWM blocks.
    pub blocks: [&'a tcpwm::RegisterBlock; TCPWM_BLOCKS],
    /// Resource manager the counter is allocated from.
    pub hwmgr: &'a HwManager,
}

bitflags::bitflags! {
    /// Counter events. Bit positions follow the counter interrupt register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Event: u8 {
        /// The counter reached its terminal count.
        const TERMINAL_COUNT = 1 << 0;
        /// The counter matched its compare value.
        const COMPARE_MATCH = 1 << 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Event {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Event({=u8:#x})", self.bits())
    }
}

/// Timer and PWM errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// A parameter is out of range.
    InvalidParameter,
    /// The requested frequency can't be derived from the counter clock.
    FrequencyUnreachable,
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
            Error::InvalidParameter => 0,
            Error::FrequencyUnreachable => 1,
            Error::Resource(e) => return e.rslt(),
        };
        Rslt::create(RsltType::Error, module::TCPWM, code)
    }
}

impl embedded_hal::pwm::Error for Error {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

/// An allocated counter.
pub(crate) struct Counter<'a> {
    block: &'a tcpwm::RegisterBlock,
    hwmgr: &'a HwManager,
    resource: Resource,
}

impl<'a> Counter<'a> {
    pub(crate) fn alloc(hw: TcpwmHw<'a>) -> Result<Self, Error> {
        let resource = hw.hwmgr.allocate(ResourceKind::Tcpwm)?;
        #[cfg(feature = "defmt")]
        defmt::debug!("tcpwm: allocated {}", resource);
        let counter = Counter {
            block: hw.blocks[resource.block as usize],
            hwmgr: hw.hwmgr,
            resource,
        };
        counter.disable();
        Ok(counter)
    }

    pub(crate) fn resource(&self) -> Resource {
        self.resource
    }

    pub(crate) fn regs(&self) -> &'a tcpwm::Cnt {
        &self.block.cnt[self.resource.channel as usize]
    }

    fn bit(&self) -> u32 {
        1 << self.resource.channel
    }

    /// Largest counter value.
    pub(crate) fn max(&self) -> u32 {
        match self.resource.block {
            0 => u32::MAX,
            _ => u16::MAX as u32,
        }
    }

    pub(crate) fn enable(&self) {
        self.block.ctrl_set.write(self.bit());
    }

    pub(crate) fn disable(&self) {
        self.block.ctrl_clr.write(self.bit());
        let cnt = self.regs();
        cnt.intr_mask.write(0);
        cnt.intr.write(tcpwm::CNT_INTR_TC.mask() | tcpwm::CNT_INTR_CC_MATCH.mask());
    }

    pub(crate) fn start(&self) {
        self.enable();
        self.block.cmd_start.write(self.bit());
    }

    pub(crate) fn stop(&self) {
        self.block.cmd_stop.write(self.bit());
    }

    pub(crate) fn is_running(&self) -> bool {
        self.regs().status.is_set(tcpwm::CNT_STATUS_RUNNING.mask())
    }

    /// Selects the counter clock prescaler, dividing by `2^exp`.
    pub(crate) fn set_prescaler(&self, exp: u32) {
        self.regs().ctrl.write_field(tcpwm::CNT_CTRL_GENERIC, exp);
    }

    pub(crate) fn prescaler(&self) -> u32 {
        self.regs().ctrl.read_field(tcpwm::CNT_CTRL_GENERIC)
    }

    pub(crate) fn set_intr_mask(&self, events: Event) {
        self.regs().intr_mask.write(events.bits() as u32);
    }

    /// Reads and clears the unmasked interrupt causes.
    pub(crate) fn take_events(&self) -> Event {
        let cnt = self.regs();
        let pending = cnt.intr.read() & cnt.intr_mask.read();
        if pending != 0 {
            cnt.intr.write(pending);
        }
        Event::from_bits_truncate(pending as u8)
    }

    pub(crate) fn free(&self) {
        self.disable();
        self.hwmgr.free(self.resource);
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use super::*;
    use crate::pac;
    use std::boxed::Box;

    pub(crate) struct Hw {
        pub tcpwm0: Box<tcpwm::RegisterBlock>,
        pub tcpwm1: Box<tcpwm::RegisterBlock>,
        pub hwmgr: HwManager,
    }

    impl Hw {
        pub fn new() -> Self {
            Self {
                tcpwm0: pac::detached(),
                tcpwm1: pac::detached(),
                hwmgr: HwManager::new(),
            }
        }

        pub fn tcpwm(&self) -> TcpwmHw<'_> {
            TcpwmHw {
                blocks: [&self.tcpwm0, &self.tcpwm1],
                hwmgr: &self.hwmgr,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fixture::Hw, *};
    use crate::pac::TCPWM_COUNTERS;

    #[test]
    fn counters_come_from_block_0_first() {
        let hw = Hw::new();
        let mut counters = Vec::new();
        for _ in 0..TCPWM_COUNTERS {
            let c = Counter::alloc(hw.tcpwm()).unwrap();
            assert_eq!(c.resource().block, 0);
            assert_eq!(c.max(), u32::MAX);
            counters.push(c);
        }
        let c = Counter::alloc(hw.tcpwm()).unwrap();
        assert_eq!((c.resource().block, c.resource().channel), (1, 0));
        assert_eq!(c.max(), 0xffff);
        c.free();
        assert!(!hw.hwmgr.is_reserved(c.resource()));
    }

    #[test]
    fn start_and_stop_commands() {
        let hw = Hw::new();
        let _c0 = Counter::alloc(hw.tcpwm()).unwrap();
        let c1 = Counter::alloc(hw.tcpwm()).unwrap();
        c1.start();
        assert_eq!(hw.tcpwm0.ctrl_set.read(), 0b10);
        assert_eq!(hw.tcpwm0.cmd_start.read(), 0b10);
        c1.stop();
        assert_eq!(hw.tcpwm0.cmd_stop.read(), 0b10);
        assert!(!c1.is_running());
        hw.tcpwm0.cnt[1].status.write(tcpwm::CNT_STATUS_RUNNING.mask());
        assert!(c1.is_running());
    }

    #[test]
    fn events_are_masked() {
        let hw = Hw::new();
        let c = Counter::alloc(hw.tcpwm()).unwrap();
        hw.tcpwm0.cnt[0]
            .intr
            .write(tcpwm::CNT_INTR_TC.mask() | tcpwm::CNT_INTR_CC_MATCH.mask());
        assert_eq!(c.take_events(), Event::empty());
        c.set_intr_mask(Event::COMPARE_MATCH);
        assert_eq!(c.take_events(), Event::COMPARE_MATCH);
    }

    #[test]
    fn error_codes() {
        let r = Error::FrequencyUnreachable.rslt();
        assert_eq!((r.module(), r.code()), (module::TCPWM, 1));
    }
}
