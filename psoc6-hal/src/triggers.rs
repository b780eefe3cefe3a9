//! Trigger multiplexer
//!
//! Peripherals signal each other over trigger lines that run through the
//! PERI trigger multiplexer. Every destination (a DMA channel's trigger
//! input, a counter's start input, ...) is an output line of some mux group;
//! routing a source to it means selecting that source on the line.
//!
//! The encoding used here is uniform rather than device exact: the
//! destination picks the group and the line within it, and the source picks
//! the input select value. Input select 0 ties the line low.

use crate::pac::{
    peri::{self, TR_GROUPS, TR_GROUP_OUTPUTS},
    DMAC_CHANNELS, DW_BLOCKS, DW_CHANNELS, TCPWM_BLOCKS, TCPWM_COUNTERS,
};
use mcu_hal_common::result::{module, ResultCode, Rslt, RsltType};

/// A trigger signal produced by a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerSource {
    /// A Datawire channel finished an element, burst or descriptor.
    DwDone {
        /// DW block.
        block: u8,
        /// Channel inside the block.
        channel: u8,
    },
    /// A DMAC channel finished an element, burst or descriptor.
    DmacDone {
        /// DMAC channel.
        channel: u8,
    },
    /// A TCPWM counter reached its terminal count.
    TcpwmOverflow {
        /// TCPWM block.
        block: u8,
        /// Counter inside the block.
        counter: u8,
    },
    /// A TCPWM counter matched its compare value.
    TcpwmCompareMatch {
        /// TCPWM block.
        block: u8,
        /// Counter inside the block.
        counter: u8,
    },
    /// The SAR finished a scan.
    SarDone,
}

/// Trigger input of a TCPWM counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TcpwmInput {
    /// Start counting.
    Start,
    /// Reload the counter.
    Reload,
    /// Stop counting.
    Stop,
    /// Count one step.
    Count,
}

/// A trigger input of a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerDest {
    /// Trigger input of a Datawire channel.
    DwChannel {
        /// DW block.
        block: u8,
        /// Channel inside the block.
        channel: u8,
    },
    /// Trigger input of a DMAC channel.
    DmacChannel {
        /// DMAC channel.
        channel: u8,
    },
    /// A trigger input of a TCPWM counter.
    Tcpwm {
        /// TCPWM block.
        block: u8,
        /// Counter inside the block.
        counter: u8,
        /// Which input.
        input: TcpwmInput,
    },
    /// Start of a SAR scan.
    SarStart,
}

/// How the destination samples the routed signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerKind {
    /// The destination follows the level of the line.
    #[default]
    Level,
    /// The destination sees a single pulse per rising edge.
    Edge,
}

/// Trigger mux errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The source names a block or channel that doesn't exist.
    InvalidSource,
    /// The destination names a block or channel that doesn't exist.
    InvalidDestination,
    /// The destination is already driven by a different source.
    InUse,
    /// Nothing is connected to the destination.
    NotConnected,
    /// A previous software trigger is still being driven.
    Busy,
}

impl ResultCode for Error {
    fn rslt(&self) -> Rslt {
        let code = match self {
            Error::InvalidSource => 0,
            Error::InvalidDestination => 1,
            Error::InUse => 2,
            Error::NotConnected => 3,
            Error::Busy => 4,
        };
        Rslt::create(RsltType::Error, module::TRIGGER, code)
    }
}

const DW_GROUP_BASE: u8 = 0;
const DMAC_GROUP: u8 = DW_BLOCKS as u8;
const TCPWM_GROUP: u8 = DMAC_GROUP + 1;
const SAR_GROUP: u8 = TCPWM_GROUP + 1;

const TCPWM_INPUTS: u8 = 4;

const DW_SEL_BASE: u32 = 1;
const DMAC_SEL_BASE: u32 = DW_SEL_BASE + (DW_BLOCKS * DW_CHANNELS) as u32;
const TCPWM_OVERFLOW_SEL_BASE: u32 = DMAC_SEL_BASE + DMAC_CHANNELS as u32;
const TCPWM_CC_SEL_BASE: u32 = TCPWM_OVERFLOW_SEL_BASE + (TCPWM_BLOCKS * TCPWM_COUNTERS) as u32;
const SAR_SEL: u32 = TCPWM_CC_SEL_BASE + (TCPWM_BLOCKS * TCPWM_COUNTERS) as u32;

impl TriggerSource {
    /// Input select value of this source, never 0.
    pub fn input_select(&self) -> Result<u32, Error> {
        let sel = match *self {
            TriggerSource::DwDone { block, channel } => {
                if block as usize >= DW_BLOCKS || channel as usize >= DW_CHANNELS {
                    return Err(Error::InvalidSource);
                }
                DW_SEL_BASE + (block as u32 * DW_CHANNELS as u32) + channel as u32
            }
            TriggerSource::DmacDone { channel } => {
                if channel as usize >= DMAC_CHANNELS {
                    return Err(Error::InvalidSource);
                }
                DMAC_SEL_BASE + channel as u32
            }
            TriggerSource::TcpwmOverflow { block, counter } => {
                TCPWM_OVERFLOW_SEL_BASE + counter_index(block, counter).ok_or(Error::InvalidSource)?
            }
            TriggerSource::TcpwmCompareMatch { block, counter } => {
                TCPWM_CC_SEL_BASE + counter_index(block, counter).ok_or(Error::InvalidSource)?
            }
            TriggerSource::SarDone => SAR_SEL,
        };
        Ok(sel)
    }
}

impl TriggerDest {
    /// Mux group and output line driving this destination.
    pub fn group_line(&self) -> Result<(u8, u8), Error> {
        let gl = match *self {
            TriggerDest::DwChannel { block, channel } => {
                if block as usize >= DW_BLOCKS || channel as usize >= DW_CHANNELS {
                    return Err(Error::InvalidDestination);
                }
                (DW_GROUP_BASE + block, channel)
            }
            TriggerDest::DmacChannel { channel } => {
                if channel as usize >= DMAC_CHANNELS {
                    return Err(Error::InvalidDestination);
                }
                (DMAC_GROUP, channel)
            }
            TriggerDest::Tcpwm {
                block,
                counter,
                input,
            } => {
                let idx = counter_index(block, counter).ok_or(Error::InvalidDestination)? as u8;
                (TCPWM_GROUP, idx * TCPWM_INPUTS + input as u8)
            }
            TriggerDest::SarStart => (SAR_GROUP, 0),
        };
        debug_assert!((gl.0 as usize) < TR_GROUPS && (gl.1 as usize) < TR_GROUP_OUTPUTS);
        Ok(gl)
    }
}

fn counter_index(block: u8, counter: u8) -> Option<u32> {
    if (block as usize) < TCPWM_BLOCKS && (counter as usize) < TCPWM_COUNTERS {
        Some(block as u32 * TCPWM_COUNTERS as u32 + counter as u32)
    } else {
        None
    }
}

/// Number of cycles [`TriggerMux::sw_trigger`] holds a trigger high for the
/// DMA engines to register it.
pub const SW_TRIGGER_CYCLES: u8 = 2;

/// Access to the trigger multiplexer.
pub struct TriggerMux<'a> {
    regs: &'a peri::RegisterBlock,
}

impl<'a> TriggerMux<'a> {
    /// Wraps the PERI register block.
    pub fn new(regs: &'a peri::RegisterBlock) -> Self {
        Self { regs }
    }

    fn out_ctl(&self, dst: TriggerDest) -> Result<&'a mcu_hal_common::Reg, Error> {
        let (group, line) = dst.group_line()?;
        Ok(&self.regs.tr_gr[group as usize].tr_out_ctl[line as usize])
    }

    /// Routes `src` to `dst`.
    ///
    /// Reconnecting the same source only updates the trigger kind.
    pub fn connect(
        &self,
        src: TriggerSource,
        dst: TriggerDest,
        kind: TriggerKind,
    ) -> Result<(), Error> {
        let sel = src.input_select()?;
        let ctl = self.out_ctl(dst)?;
        critical_section::with(|_| {
            let current = ctl.read_field(peri::TR_OUT_CTL_TR_SEL);
            if current != 0 && current != sel {
                return Err(Error::InUse);
            }
            let edge = match kind {
                TriggerKind::Level => 0,
                TriggerKind::Edge => 1,
            };
            ctl.write(peri::TR_OUT_CTL_TR_SEL.val(sel) | peri::TR_OUT_CTL_TR_EDGE.val(edge));
            Ok(())
        })?;
        #[cfg(feature = "defmt")]
        defmt::debug!("trigger {} -> {}", src, dst);
        Ok(())
    }

    /// Removes whatever drives `dst`.
    pub fn disconnect(&self, dst: TriggerDest) -> Result<(), Error> {
        let ctl = self.out_ctl(dst)?;
        critical_section::with(|_| {
            if ctl.read_field(peri::TR_OUT_CTL_TR_SEL) == 0 {
                return Err(Error::NotConnected);
            }
            ctl.write(0);
            Ok(())
        })
    }

    /// Returns `true` if some source drives `dst`.
    pub fn is_connected(&self, dst: TriggerDest) -> bool {
        self.out_ctl(dst)
            .map(|ctl| ctl.read_field(peri::TR_OUT_CTL_TR_SEL) != 0)
            .unwrap_or(false)
    }

    /// Fires `dst` from software for `cycles` peripheral clock cycles.
    pub fn sw_trigger(&self, dst: TriggerDest, cycles: u8) -> Result<(), Error> {
        let (group, line) = dst.group_line()?;
        critical_section::with(|_| {
            if self.regs.tr_cmd.is_set(peri::TR_CMD_ACTIVATE.mask()) {
                return Err(Error::Busy);
            }
            self.regs.tr_cmd.write(
                peri::TR_CMD_TR_SEL.val(line as u32)
                    | peri::TR_CMD_GROUP_SEL.val(group as u32)
                    | peri::TR_CMD_COUNT.val(cycles as u32)
                    | peri::TR_CMD_OUT_SEL.mask()
                    | peri::TR_CMD_ACTIVATE.mask(),
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac;

    #[test]
    fn source_selects_are_distinct() {
        let sources = [
            TriggerSource::DwDone { block: 0, channel: 0 },
            TriggerSource::DwDone { block: 1, channel: 15 },
            TriggerSource::DmacDone { channel: 0 },
            TriggerSource::DmacDone { channel: 7 },
            TriggerSource::TcpwmOverflow { block: 0, counter: 0 },
            TriggerSource::TcpwmOverflow { block: 1, counter: 7 },
            TriggerSource::TcpwmCompareMatch { block: 0, counter: 0 },
            TriggerSource::SarDone,
        ];
        let mut sels: Vec<u32> = sources.iter().map(|s| s.input_select().unwrap()).collect();
        assert!(sels.iter().all(|&s| s != 0 && s <= peri::TR_OUT_CTL_TR_SEL.max()));
        sels.sort();
        sels.dedup();
        assert_eq!(sels.len(), sources.len());
    }

    #[test]
    fn bad_indices() {
        assert_eq!(
            TriggerSource::DmacDone { channel: 8 }.input_select(),
            Err(Error::InvalidSource)
        );
        assert_eq!(
            TriggerDest::Tcpwm { block: 2, counter: 0, input: TcpwmInput::Start }.group_line(),
            Err(Error::InvalidDestination)
        );
    }

    #[test]
    fn connect_and_disconnect() {
        let regs = pac::detached::<peri::RegisterBlock>();
        let mux = TriggerMux::new(&regs);
        let dst = TriggerDest::DwChannel { block: 1, channel: 4 };
        let src = TriggerSource::TcpwmOverflow { block: 0, counter: 2 };

        assert!(!mux.is_connected(dst));
        mux.connect(src, dst, TriggerKind::Edge).unwrap();
        assert!(mux.is_connected(dst));

        let ctl = regs.tr_gr[1].tr_out_ctl[4].read();
        assert_eq!(peri::TR_OUT_CTL_TR_SEL.get(ctl), src.input_select().unwrap());
        assert_eq!(peri::TR_OUT_CTL_TR_EDGE.get(ctl), 1);

        // Same source again just changes the kind.
        mux.connect(src, dst, TriggerKind::Level).unwrap();
        assert_eq!(peri::TR_OUT_CTL_TR_EDGE.get(regs.tr_gr[1].tr_out_ctl[4].read()), 0);

        assert_eq!(
            mux.connect(TriggerSource::SarDone, dst, TriggerKind::Level),
            Err(Error::InUse)
        );

        mux.disconnect(dst).unwrap();
        assert!(!mux.is_connected(dst));
        assert_eq!(mux.disconnect(dst), Err(Error::NotConnected));
    }

    #[test]
    fn tcpwm_inputs_get_their_own_lines() {
        let start = TriggerDest::Tcpwm { block: 1, counter: 3, input: TcpwmInput::Start };
        let stop = TriggerDest::Tcpwm { block: 1, counter: 3, input: TcpwmInput::Stop };
        let (g0, l0) = start.group_line().unwrap();
        let (g1, l1) = stop.group_line().unwrap();
        assert_eq!(g0, g1);
        assert_ne!(l0, l1);
    }

    #[test]
    fn sw_trigger_command() {
        let regs = pac::detached::<peri::RegisterBlock>();
        let mux = TriggerMux::new(&regs);
        let dst = TriggerDest::DmacChannel { channel: 5 };
        mux.sw_trigger(dst, SW_TRIGGER_CYCLES).unwrap();

        let cmd = regs.tr_cmd.read();
        assert_eq!(peri::TR_CMD_TR_SEL.get(cmd), 5);
        assert_eq!(peri::TR_CMD_GROUP_SEL.get(cmd), DMAC_GROUP as u32);
        assert_eq!(peri::TR_CMD_COUNT.get(cmd), 2);
        assert!(cmd & peri::TR_CMD_OUT_SEL.mask() != 0);

        // Hardware hasn't cleared ACTIVATE yet.
        assert_eq!(mux.sw_trigger(dst, SW_TRIGGER_CYCLES), Err(Error::Busy));
        regs.tr_cmd.write(0);
        assert_eq!(mux.sw_trigger(dst, SW_TRIGGER_CYCLES), Ok(()));
    }
}
