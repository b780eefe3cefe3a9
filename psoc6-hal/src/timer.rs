//! Timer
//!
//! A TCPWM counter in timer mode. The counter ticks at the TCPWM input
//! clock divided by a power-of-two prescaler, counts towards its period and
//! raises [`Event::TERMINAL_COUNT`] when it wraps. With compare enabled it
//! also raises [`Event::COMPARE_MATCH`].
//!
//! ```no_run
//! use fugit::RateExtU32;
//! use psoc6_hal::{
//!     hwmgr::HwManager,
//!     pac,
//!     tcpwm::{Event, TcpwmHw},
//!     timer::{Timer, TimerConfig},
//! };
//!
//! static HWMGR: HwManager = HwManager::new();
//!
//! let hw = TcpwmHw {
//!     blocks: unsafe { [&*pac::TCPWM0::ptr(), &*pac::TCPWM1::ptr()] },
//!     hwmgr: &HWMGR,
//! };
//! let mut timer = Timer::new(hw, 8.MHz()).unwrap();
//! timer.set_frequency(1.MHz()).unwrap();
//! timer
//!     .configure(TimerConfig {
//!         period: 999,
//!         ..Default::default()
//!     })
//!     .unwrap();
//! timer.enable_event(Event::TERMINAL_COUNT, true);
//! timer.start();
//! ```

use crate::{
    hwmgr::Resource,
    pac::tcpwm,
    tcpwm::{Counter, Error, Event, TcpwmHw},
};
use fugit::HertzU32;
use mcu_hal_common::CallbackSlot;

/// Counting direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerDirection {
    /// Count up from 0 to the period.
    #[default]
    Up,
    /// Count down from the period to 0.
    Down,
    /// Count up to the period, then back down to 0.
    UpDown,
}

/// Timer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    /// Keep running after the terminal count instead of stopping.
    pub is_continuous: bool,
    /// Counting direction.
    pub direction: TimerDirection,
    /// Compare against [`TimerConfig::compare_value`].
    pub is_compare: bool,
    /// Terminal count. Defaults to the widest 32-bit period, which only
    /// block 0 counters can hold.
    pub period: u32,
    /// Compare value, used when `is_compare` is set.
    pub compare_value: u32,
    /// Initial counter value.
    pub value: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            is_continuous: true,
            direction: TimerDirection::Up,
            is_compare: false,
            period: u32::MAX,
            compare_value: 0,
            value: 0,
        }
    }
}

/// A TCPWM counter in timer mode.
pub struct Timer<'a> {
    counter: Counter<'a>,
    clock: HertzU32,
    config: TimerConfig,
    events: Event,
    callback: CallbackSlot<'a, Event>,
}

impl<'a> Timer<'a> {
    /// Allocates a counter clocked from `clock` and sets it up as a free
    /// running timer without prescaler, using the counter's full width as
    /// period.
    pub fn new(hw: TcpwmHw<'a>, clock: HertzU32) -> Result<Self, Error> {
        if clock.to_Hz() == 0 {
            return Err(Error::InvalidParameter);
        }
        let counter = Counter::alloc(hw)?;
        let cnt = counter.regs();
        cnt.ctrl.write(tcpwm::CNT_CTRL_MODE.val(tcpwm::mode::TIMER));
        cnt.tr_ctrl0.write(tcpwm::CNT_TR_CTRL0_COUNT_SEL.val(1));
        let config = TimerConfig {
            period: counter.max(),
            ..Default::default()
        };
        let mut timer = Timer {
            counter,
            clock,
            config,
            events: Event::empty(),
            callback: CallbackSlot::new(),
        };
        if let Err(e) = timer.configure(config) {
            timer.counter.free();
            return Err(e);
        }
        Ok(timer)
    }

    /// The allocated counter.
    pub fn resource(&self) -> Resource {
        self.counter.resource()
    }

    /// Applies `config`. The timer is stopped while its registers change.
    pub fn configure(&mut self, config: TimerConfig) -> Result<(), Error> {
        let max = self.counter.max();
        if config.period > max || config.compare_value > max || config.value > max {
            return Err(Error::InvalidParameter);
        }
        self.counter.stop();
        let cnt = self.counter.regs();
        let up_down = match config.direction {
            TimerDirection::Up => tcpwm::up_down_mode::UP,
            TimerDirection::Down => tcpwm::up_down_mode::DOWN,
            TimerDirection::UpDown => tcpwm::up_down_mode::UPDN1,
        };
        cnt.ctrl.modify(|r| {
            let r = tcpwm::CNT_CTRL_UP_DOWN_MODE.set(r, up_down);
            tcpwm::CNT_CTRL_ONE_SHOT.set(r, !config.is_continuous as u32)
        });
        cnt.period.write(config.period);
        cnt.cc.write(config.compare_value);
        cnt.counter.write(config.value);
        self.config = config;
        self.apply_mask();
        Ok(())
    }

    /// Sets the tick rate to `frequency`.
    ///
    /// The prescaler divides the input clock by a power of two up to 128.
    /// Fails if no divider gets within 1% of the request.
    pub fn set_frequency(&mut self, frequency: HertzU32) -> Result<(), Error> {
        let exp = prescaler_for(self.clock, frequency).ok_or_else(|| {
            #[cfg(feature = "defmt")]
            defmt::warn!("timer: {} Hz unreachable", frequency.to_Hz());
            Error::FrequencyUnreachable
        })?;
        self.counter.set_prescaler(exp);
        Ok(())
    }

    /// Current tick rate.
    pub fn frequency(&self) -> HertzU32 {
        HertzU32::from_raw(self.clock.to_Hz() >> self.counter.prescaler())
    }

    /// Starts counting.
    pub fn start(&mut self) {
        self.counter.start();
    }

    /// Stops counting. The counter keeps its value.
    pub fn stop(&mut self) {
        self.counter.stop();
    }

    /// Loads the configured initial value into the counter.
    pub fn reset(&mut self) {
        self.counter.regs().counter.write(self.config.value);
    }

    /// Current counter value.
    pub fn read(&self) -> u32 {
        self.counter.regs().counter.read()
    }

    /// Returns `true` while the counter is running.
    pub fn is_running(&self) -> bool {
        self.counter.is_running()
    }

    /// Enables or disables reporting of `event` to the callback.
    pub fn enable_event(&mut self, event: Event, enable: bool) {
        self.events.set(event, enable);
        self.apply_mask();
    }

    fn apply_mask(&self) {
        let mut mask = self.events;
        if !self.config.is_compare {
            mask.remove(Event::COMPARE_MATCH);
        }
        self.counter.set_intr_mask(mask);
    }

    /// Installs the event callback.
    pub fn register_callback(&mut self, callback: &'a dyn Fn(Event)) {
        self.callback.register(callback);
    }

    /// Interrupt handler body. Returns the events passed to the callback.
    pub fn on_interrupt(&mut self) -> Event {
        let fired = self.counter.take_events();
        if !fired.is_empty() {
            self.callback.invoke(fired);
        }
        fired
    }

    /// Stops the timer and returns its counter to the resource manager.
    pub fn free(self) {
        self.callback.clear();
        self.counter.free();
    }
}

/// Prescaler exponent turning `clock` into `target` within 1%.
fn prescaler_for(clock: HertzU32, target: HertzU32) -> Option<u32> {
    let clock = clock.to_Hz() as u64;
    let target = target.to_Hz() as u64;
    if target == 0 {
        return None;
    }
    (0..=tcpwm::PRESCALER_MAX_EXP).find(|&exp| {
        let f = clock >> exp;
        f.abs_diff(target) * 100 <= target
    })
}
