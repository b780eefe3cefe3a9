//! Pulse Width Modulation (PWM)
//!
//! A TCPWM counter in PWM mode drives its line output high for `pulse` of
//! every `period` counter ticks. The counter prescaler is chosen so that the
//! period fits the counter, 32 bits on block 0 and 16 bits on block 1.
//!
//! ```no_run
//! use embedded_hal::pwm::SetDutyCycle;
//! use fugit::RateExtU32;
//! use psoc6_hal::{hwmgr::HwManager, pac, pwm::Pwm, tcpwm::TcpwmHw};
//!
//! static HWMGR: HwManager = HwManager::new();
//!
//! let hw = TcpwmHw {
//!     blocks: unsafe { [&*pac::TCPWM0::ptr(), &*pac::TCPWM1::ptr()] },
//!     hwmgr: &HWMGR,
//! };
//! let mut pwm = Pwm::new(hw, 100.MHz()).unwrap();
//! pwm.set_duty_cycle_at(25.0, 10.kHz()).unwrap();
//! pwm.start();
//! pwm.set_duty_cycle_fraction(1, 2).unwrap();
//! ```

use crate::{
    hwmgr::Resource,
    pac::tcpwm::{self, line_mode},
    tcpwm::{Counter, Error, TcpwmHw},
};
use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use fugit::HertzU32;

/// Where the pulse sits inside the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alignment {
    /// Pulse at the start of the period.
    #[default]
    Left,
    /// Pulse at the end of the period.
    Right,
    /// Pulse centred in the period.
    Center,
}

/// A TCPWM counter in PWM mode.
pub struct Pwm<'a> {
    counter: Counter<'a>,
    clock: HertzU32,
    alignment: Alignment,
    inverted: bool,
    period: u32,
    pulse: u32,
}

impl<'a> Pwm<'a> {
    /// Allocates a counter clocked from `clock`, left aligned and stopped.
    pub fn new(hw: TcpwmHw<'a>, clock: HertzU32) -> Result<Self, Error> {
        if clock.to_Hz() == 0 {
            return Err(Error::InvalidParameter);
        }
        let counter = Counter::alloc(hw)?;
        let cnt = counter.regs();
        cnt.ctrl.write(
            tcpwm::CNT_CTRL_MODE.val(tcpwm::mode::PWM)
                | tcpwm::CNT_CTRL_AUTO_RELOAD_CC.mask()
                | tcpwm::CNT_CTRL_AUTO_RELOAD_PERIOD.mask(),
        );
        cnt.tr_ctrl0.write(tcpwm::CNT_TR_CTRL0_COUNT_SEL.val(1));
        cnt.period.write(0);
        cnt.cc.write(0);
        let pwm = Pwm {
            counter,
            clock,
            alignment: Alignment::Left,
            inverted: false,
            period: 0,
            pulse: 0,
        };
        pwm.apply_lines();
        Ok(pwm)
    }

    /// The allocated counter.
    pub fn resource(&self) -> Resource {
        self.counter.resource()
    }

    /// Sets period and pulse width in microseconds.
    pub fn set_period(&mut self, period_us: u32, pulse_us: u32) -> Result<(), Error> {
        if period_us == 0 || pulse_us > period_us {
            return Err(Error::InvalidParameter);
        }
        let hz = self.clock.to_Hz() as u64;
        self.apply(
            period_us as u64 * hz / 1_000_000,
            pulse_us as u64 * hz / 1_000_000,
        )
    }

    /// Sets the duty cycle in percent at `frequency`.
    ///
    /// Named apart from [`SetDutyCycle::set_duty_cycle_percent`], which keeps
    /// the current period.
    pub fn set_duty_cycle_at(&mut self, percent: f32, frequency: HertzU32) -> Result<(), Error> {
        let f = frequency.to_Hz();
        if !(0.0..=100.0).contains(&percent) || f == 0 || f > self.clock.to_Hz() {
            return Err(Error::InvalidParameter);
        }
        let period = (self.clock.to_Hz() / f) as u64;
        let pulse = (period as f32 * percent / 100.0) as u64;
        self.apply(period, pulse.min(period))
    }

    // Both arguments are in input clock ticks.
    fn apply(&mut self, period: u64, pulse: u64) -> Result<(), Error> {
        let max = self.counter.max() as u64;
        let exp = (0..=tcpwm::PRESCALER_MAX_EXP)
            .find(|&exp| period >> exp <= max)
            .ok_or(Error::InvalidParameter)?;
        let period = (period >> exp) as u32;
        if period == 0 {
            return Err(Error::InvalidParameter);
        }
        let pulse = (pulse >> exp) as u32;

        let cnt = self.counter.regs();
        self.counter.set_prescaler(exp);
        cnt.period.write(period);
        cnt.period_buff.write(period);
        cnt.cc.write(pulse);
        cnt.cc_buff.write(pulse);
        self.period = period;
        self.pulse = pulse;
        Ok(())
    }

    /// Period in counter ticks.
    pub fn period_ticks(&self) -> u32 {
        self.period
    }

    /// Pulse width in counter ticks.
    pub fn pulse_ticks(&self) -> u32 {
        self.pulse
    }

    /// Moves the pulse within the period.
    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
        self.apply_lines();
    }

    /// Drives the line low during the pulse instead of high.
    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
        self.apply_lines();
    }

    fn apply_lines(&self) {
        use line_mode::{CLEAR, INVERT, NO_CHANGE, SET};
        let (up_down, cc, overflow, underflow) = match self.alignment {
            Alignment::Left => (tcpwm::up_down_mode::UP, CLEAR, SET, NO_CHANGE),
            Alignment::Right => (tcpwm::up_down_mode::DOWN, SET, NO_CHANGE, CLEAR),
            Alignment::Center => (tcpwm::up_down_mode::UPDN1, INVERT, NO_CHANGE, SET),
        };
        let invert = |mode: u32| match (self.inverted, mode) {
            (true, SET) => CLEAR,
            (true, CLEAR) => SET,
            _ => mode,
        };
        let cnt = self.counter.regs();
        cnt.ctrl.write_field(tcpwm::CNT_CTRL_UP_DOWN_MODE, up_down);
        cnt.tr_ctrl2.write(
            tcpwm::CNT_TR_CTRL2_CC_MATCH_MODE.val(invert(cc))
                | tcpwm::CNT_TR_CTRL2_OVERFLOW_MODE.val(invert(overflow))
                | tcpwm::CNT_TR_CTRL2_UNDERFLOW_MODE.val(invert(underflow)),
        );
    }

    /// Starts the output.
    pub fn start(&mut self) {
        self.counter.start();
    }

    /// Stops the output.
    pub fn stop(&mut self) {
        self.counter.stop();
    }

    /// Stops the output and returns the counter to the resource manager.
    pub fn free(self) {
        self.counter.free();
    }
}

impl ErrorType for Pwm<'_> {
    type Error = Error;
}

impl SetDutyCycle for Pwm<'_> {
    fn max_duty_cycle(&self) -> u16 {
        self.period.clamp(1, u16::MAX as u32) as u16
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let max = self.max_duty_cycle();
        if duty > max {
            return Err(Error::InvalidParameter);
        }
        let pulse = (duty as u64 * self.period as u64 / max as u64) as u32;
        let cnt = self.counter.regs();
        cnt.cc.write(pulse);
        cnt.cc_buff.write(pulse);
        self.pulse = pulse;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcpwm::fixture::Hw;
    use fugit::RateExtU32;

    #[test]
    fn new_is_left_aligned_pwm() {
        let hw = Hw::new();
        let pwm = Pwm::new(hw.tcpwm(), 100.MHz()).unwrap();
        let cnt = &hw.tcpwm0.cnt[0];
        assert_eq!(cnt.ctrl.read_field(tcpwm::CNT_CTRL_MODE), tcpwm::mode::PWM);
        assert_eq!(cnt.ctrl.read_field(tcpwm::CNT_CTRL_UP_DOWN_MODE), tcpwm::up_down_mode::UP);
        let tr = cnt.tr_ctrl2.read();
        assert_eq!(tcpwm::CNT_TR_CTRL2_CC_MATCH_MODE.get(tr), line_mode::CLEAR);
        assert_eq!(tcpwm::CNT_TR_CTRL2_OVERFLOW_MODE.get(tr), line_mode::SET);
        pwm.free();
    }

    #[test]
    fn period_in_microseconds() {
        let hw = Hw::new();
        let mut pwm = Pwm::new(hw.tcpwm(), 1.MHz()).unwrap();
        pwm.set_period(1000, 250).unwrap();
        assert_eq!((pwm.period_ticks(), pwm.pulse_ticks()), (1000, 250));
        let cnt = &hw.tcpwm0.cnt[0];
        assert_eq!((cnt.period.read(), cnt.cc.read()), (1000, 250));
        assert_eq!(cnt.ctrl.read_field(tcpwm::CNT_CTRL_GENERIC), 0);

        assert_eq!(pwm.set_period(100, 101), Err(Error::InvalidParameter));
        assert_eq!(pwm.set_period(0, 0), Err(Error::InvalidParameter));
    }

    #[test]
    fn sixteen_bit_counter_uses_prescaler() {
        let hw = Hw::new();
        let mut pwms = Vec::new();
        for _ in 0..8 {
            pwms.push(Pwm::new(hw.tcpwm(), 1.MHz()).unwrap());
        }
        let mut pwm = Pwm::new(hw.tcpwm(), 1.MHz()).unwrap();
        assert_eq!(pwm.resource().block, 1);
        // 200 ms at 1 MHz needs a divide by 4 to fit 16 bits.
        pwm.set_period(200_000, 100_000).unwrap();
        assert_eq!((pwm.period_ticks(), pwm.pulse_ticks()), (50_000, 25_000));
        assert_eq!(hw.tcpwm1.cnt[0].ctrl.read_field(tcpwm::CNT_CTRL_GENERIC), 2);
        // Beyond a divide by 128.
        assert_eq!(pwm.set_period(9_000_000, 0), Err(Error::InvalidParameter));
    }

    #[test]
    fn duty_cycle_percent() {
        let hw = Hw::new();
        let mut pwm = Pwm::new(hw.tcpwm(), 100.MHz()).unwrap();
        pwm.set_duty_cycle_at(25.0, 10.kHz()).unwrap();
        assert_eq!((pwm.period_ticks(), pwm.pulse_ticks()), (10_000, 2_500));
        pwm.set_duty_cycle_at(100.0, 10.kHz()).unwrap();
        assert_eq!(pwm.pulse_ticks(), 10_000);
        assert_eq!(
            pwm.set_duty_cycle_at(101.0, 10.kHz()),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            pwm.set_duty_cycle_at(50.0, 0.Hz()),
            Err(Error::InvalidParameter)
        );
    }

    #[test]
    fn alignment_and_inversion() {
        let hw = Hw::new();
        let mut pwm = Pwm::new(hw.tcpwm(), 1.MHz()).unwrap();
        let cnt = &hw.tcpwm0.cnt[0];
        let lines = || {
            let tr = cnt.tr_ctrl2.read();
            (
                tcpwm::CNT_TR_CTRL2_CC_MATCH_MODE.get(tr),
                tcpwm::CNT_TR_CTRL2_OVERFLOW_MODE.get(tr),
                tcpwm::CNT_TR_CTRL2_UNDERFLOW_MODE.get(tr),
            )
        };

        pwm.set_alignment(Alignment::Right);
        assert_eq!(cnt.ctrl.read_field(tcpwm::CNT_CTRL_UP_DOWN_MODE), tcpwm::up_down_mode::DOWN);
        assert_eq!(lines(), (line_mode::SET, line_mode::NO_CHANGE, line_mode::CLEAR));

        pwm.set_alignment(Alignment::Center);
        assert_eq!(cnt.ctrl.read_field(tcpwm::CNT_CTRL_UP_DOWN_MODE), tcpwm::up_down_mode::UPDN1);
        pwm.set_inverted(true);
        assert_eq!(lines(), (line_mode::INVERT, line_mode::NO_CHANGE, line_mode::CLEAR));

        pwm.set_alignment(Alignment::Left);
        assert_eq!(lines(), (line_mode::SET, line_mode::CLEAR, line_mode::NO_CHANGE));
    }

    #[test]
    fn set_duty_cycle_trait() {
        let hw = Hw::new();
        let mut pwm = Pwm::new(hw.tcpwm(), 1.MHz()).unwrap();
        pwm.set_period(1000, 0).unwrap();
        assert_eq!(pwm.max_duty_cycle(), 1000);
        pwm.set_duty_cycle_percent(40).unwrap();
        assert_eq!(hw.tcpwm0.cnt[0].cc.read(), 400);
        pwm.set_duty_cycle_fully_on().unwrap();
        assert_eq!(pwm.pulse_ticks(), 1000);
        assert_eq!(pwm.set_duty_cycle(1001), Err(Error::InvalidParameter));

        // Periods wider than 16 bits are scaled.
        pwm.set_period(1_000_000, 0).unwrap();
        assert_eq!(pwm.max_duty_cycle(), u16::MAX);
        pwm.set_duty_cycle_fraction(1, 2).unwrap();
        assert_eq!(pwm.pulse_ticks(), 499_992);
    }
}
