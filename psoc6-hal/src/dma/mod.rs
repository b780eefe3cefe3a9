//! Direct memory access (DMA)
//!
//! The PSoC6 has two kinds of DMA engine. The Datawire (DW) blocks have many
//! small channels meant for peripheral traffic, while the DMAC has a few
//! channels that move large blocks of memory efficiently. [`Dma::init`]
//! picks the engine from the transfer [`Direction`]: memory to memory
//! transfers prefer the DMAC, everything else prefers a Datawire channel.
//! When every channel of the preferred engine is taken, the other engine is
//! used instead.
//!
//! A channel executes one [`Descriptor`], which the caller provides and
//! which must outlive the channel. Transfers are started with a software
//! trigger routed through the trigger multiplexer, or by a peripheral
//! trigger connected with [`Dma::connect_digital`].
//!
//! ```no_run
//! use psoc6_hal::{
//!     dma::{Descriptor, Direction, Dma, DmaHw, Event, Priority, TransferConfig},
//!     hwmgr::HwManager,
//!     pac,
//! };
//!
//! static HWMGR: HwManager = HwManager::new();
//!
//! let hw = DmaHw {
//!     dw: unsafe { [&*pac::DW0::ptr(), &*pac::DW1::ptr()] },
//!     dmac: unsafe { &*pac::DMAC::ptr() },
//!     peri: unsafe { &*pac::PERI::ptr() },
//!     hwmgr: &HWMGR,
//! };
//! let src = [1u32, 2, 3, 4];
//! let mut dst = [0u32; 4];
//! let mut descriptor = Descriptor::new();
//!
//! let mut dma = Dma::init(hw, &mut descriptor, Priority::default(), Direction::MemToMem).unwrap();
//! dma.configure(TransferConfig {
//!     src_addr: src.as_ptr() as u32,
//!     dst_addr: dst.as_mut_ptr() as u32,
//!     length: 4,
//!     ..Default::default()
//! })
//! .unwrap();
//! dma.start_transfer().unwrap();
//! while dma.is_busy() {}
//! dma.free();
//! ```

pub mod descriptor;
#[cfg(feature = "dmac")]
mod dmac;
#[cfg(feature = "dw")]
mod dw;

pub use descriptor::Descriptor;

use crate::{
    hwmgr::{self, HwManager, Resource, ResourceKind},
    pac::{self, DW_BLOCKS},
    triggers::{self, TriggerDest, TriggerKind, TriggerMux, TriggerSource, SW_TRIGGER_CYCLES},
};
use descriptor::{tr_type, Limits, Plan};
use embedded_dma::{ReadBuffer, WriteBuffer};
use mcu_hal_common::{
    result::{module, ResultCode, Rslt, RsltType},
    CallbackSlot,
};

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Memory to memory.
    MemToMem,
    /// Memory to a peripheral register.
    MemToPeriph,
    /// Peripheral register to memory.
    PeriphToMem,
    /// Peripheral register to peripheral register.
    PeriphToPeriph,
}

impl Direction {
    fn src_is_periph(self) -> bool {
        matches!(self, Direction::PeriphToMem | Direction::PeriphToPeriph)
    }

    fn dst_is_periph(self) -> bool {
        matches!(self, Direction::MemToPeriph | Direction::PeriphToPeriph)
    }
}

/// Channel priority. Lower values win arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Priority {
    /// Priority 0.
    Highest = 0,
    /// Priority 1.
    High = 1,
    /// Priority 2.
    Medium = 2,
    /// Priority 3.
    #[default]
    Low = 3,
}

impl TryFrom<u8> for Priority {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Highest),
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            _ => Err(Error::InvalidPriority),
        }
    }
}

/// Size of one transferred element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferWidth {
    /// 8 bits.
    Bits8,
    /// 16 bits.
    Bits16,
    /// 32 bits.
    #[default]
    Bits32,
}

impl TransferWidth {
    /// Element size in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            TransferWidth::Bits8 => 1,
            TransferWidth::Bits16 => 2,
            TransferWidth::Bits32 => 4,
        }
    }

    /// Width of a buffer word of `size` bytes.
    pub fn from_word_size(size: usize) -> Result<Self, Error> {
        match size {
            1 => Ok(TransferWidth::Bits8),
            2 => Ok(TransferWidth::Bits16),
            4 => Ok(TransferWidth::Bits32),
            _ => Err(Error::InvalidTransferWidth),
        }
    }

    fn data_size(self) -> u32 {
        match self {
            TransferWidth::Bits8 => 0,
            TransferWidth::Bits16 => 1,
            TransferWidth::Bits32 => 2,
        }
    }
}

impl TryFrom<u8> for TransferWidth {
    type Error = Error;

    /// Converts a width in bits.
    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(TransferWidth::Bits8),
            16 => Ok(TransferWidth::Bits16),
            32 => Ok(TransferWidth::Bits32),
            _ => Err(Error::InvalidTransferWidth),
        }
    }
}

/// What a single trigger does, and what happens at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferAction {
    /// Each trigger moves one burst; the descriptor is re-armed afterwards.
    Burst,
    /// One trigger moves everything; the descriptor is re-armed afterwards.
    #[default]
    Full,
    /// Each trigger moves one burst; the channel is disabled at the end.
    BurstDisable,
    /// One trigger moves everything; the channel is disabled at the end.
    FullDisable,
}

impl TransferAction {
    fn disables(self) -> bool {
        matches!(self, TransferAction::BurstDisable | TransferAction::FullDisable)
    }

    fn tr_in(self) -> u32 {
        match self {
            TransferAction::Burst | TransferAction::BurstDisable => tr_type::X_LOOP,
            TransferAction::Full | TransferAction::FullDisable => tr_type::DESCR,
        }
    }
}

/// Amount of work one input trigger starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Input {
    /// One element.
    SingleElement = 0,
    /// One burst.
    SingleBurst = 1,
    /// The whole transfer.
    AllElements = 2,
}

/// When the channel pulses its output trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Output {
    /// After every element.
    SingleElement = 0,
    /// After every burst.
    SingleBurst = 1,
    /// After the whole transfer.
    AllElements = 2,
}

/// Engine a channel was allocated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineKind {
    /// Datawire block.
    Datawire,
    /// DMAC.
    Dmac,
}

impl EngineKind {
    const fn resource_kind(self) -> ResourceKind {
        match self {
            EngineKind::Datawire => ResourceKind::Dw,
            EngineKind::Dmac => ResourceKind::Dmac,
        }
    }

    const fn is_present(self) -> bool {
        match self {
            EngineKind::Datawire => cfg!(feature = "dw"),
            EngineKind::Dmac => cfg!(feature = "dmac"),
        }
    }
}

/// One transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferConfig {
    /// Address of the first source element.
    pub src_addr: u32,
    /// Source step between elements, in elements.
    pub src_increment: i16,
    /// Address of the first destination element.
    pub dst_addr: u32,
    /// Destination step between elements, in elements.
    pub dst_increment: i16,
    /// Element size.
    pub transfer_width: TransferWidth,
    /// Number of elements.
    pub length: u32,
    /// Elements per burst, 0 for a single burst covering everything.
    pub burst_size: u32,
    /// Trigger and completion behaviour.
    pub action: TransferAction,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            src_addr: 0,
            src_increment: 1,
            dst_addr: 0,
            dst_increment: 1,
            transfer_width: TransferWidth::default(),
            length: 0,
            burst_size: 0,
            action: TransferAction::default(),
        }
    }
}

bitflags::bitflags! {
    /// Channel events. Bit positions follow the DMAC interrupt register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Event: u8 {
        /// The descriptor completed.
        const TRANSFER_COMPLETE = 1 << 0;
        /// Bus error on a source load.
        const SRC_BUS_ERROR = 1 << 1;
        /// Bus error on a destination store.
        const DST_BUS_ERROR = 1 << 2;
        /// Source address not aligned to the element size.
        const SRC_MISAL = 1 << 3;
        /// Destination address not aligned to the element size.
        const DST_MISAL = 1 << 4;
        /// The channel was started without a descriptor.
        const CURR_PTR_NULL = 1 << 5;
        /// The channel was disabled while active.
        const ACTIVE_CH_DISABLED = 1 << 6;
        /// Bus error loading a descriptor.
        const DESCR_BUS_ERROR = 1 << 7;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Event {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Event({=u8:#x})", self.bits())
    }
}

/// DMA errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// A parameter is out of range, or the channel isn't configured.
    InvalidParameter,
    /// Element size other than 8, 16 or 32 bits.
    InvalidTransferWidth,
    /// An address isn't aligned to the element size.
    InvalidAlignment,
    /// The length isn't a multiple of the burst size.
    InvalidBurstSize,
    /// Priority outside 0..=3.
    InvalidPriority,
    /// The channel has a transfer pending or running.
    ChannelBusy,
    /// The previous transfer was started and hasn't completed yet.
    TransferAlreadyStarted,
    /// No DMA engine is available on this part.
    UnsupportedHardware,
    /// Resource manager error.
    Resource(hwmgr::Error),
    /// Trigger routing error.
    Trigger(triggers::Error),
}

impl From<hwmgr::Error> for Error {
    fn from(e: hwmgr::Error) -> Self {
        Error::Resource(e)
    }
}

impl From<triggers::Error> for Error {
    fn from(e: triggers::Error) -> Self {
        Error::Trigger(e)
    }
}

impl ResultCode for Error {
    fn rslt(&self) -> Rslt {
        let (ty, code) = match self {
            Error::InvalidParameter => (RsltType::Error, 0),
            Error::InvalidTransferWidth => (RsltType::Error, 1),
            Error::InvalidAlignment => (RsltType::Error, 2),
            Error::InvalidBurstSize => (RsltType::Error, 3),
            Error::InvalidPriority => (RsltType::Error, 4),
            Error::ChannelBusy => (RsltType::Error, 5),
            Error::TransferAlreadyStarted => (RsltType::Warning, 6),
            Error::UnsupportedHardware => (RsltType::Fatal, 7),
            Error::Resource(e) => return e.rslt(),
            Error::Trigger(e) => return e.rslt(),
        };
        Rslt::create(ty, module::DMA, code)
    }
}

/// Engine independent control word inputs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CtlParams {
    pub tr_in: u32,
    pub tr_out: u32,
    pub ch_disable: bool,
    pub src_word: bool,
    pub dst_word: bool,
    pub data_size: u32,
    pub next: u32,
}

/// Operations every engine's channel provides.
pub(crate) trait Channel {
    fn kind(&self) -> EngineKind;
    fn limits(&self) -> Limits;
    fn write_descriptor(&self, words: &mut [u32; 8], src: u32, dst: u32, plan: &Plan, p: &CtlParams);
    fn is_busy(&self) -> bool;
    /// The raw interrupt shows a completed descriptor.
    fn completion_pending(&self) -> bool;
    fn program(&self, descriptor: u32, priority: Priority);
    fn disable(&self);
    fn set_intr_mask(&self, events: Event);
    /// Reads and clears the unmasked interrupt causes.
    fn take_events(&self) -> Event;
    fn trigger_dest(&self) -> TriggerDest;
    fn trigger_source(&self) -> TriggerSource;
}

enum Engine<'a> {
    #[cfg(feature = "dw")]
    Dw(dw::DwChannel<'a>),
    #[cfg(feature = "dmac")]
    Dmac(dmac::DmacChannel<'a>),
    #[cfg(not(any(feature = "dw", feature = "dmac")))]
    #[allow(dead_code)]
    None(core::convert::Infallible, core::marker::PhantomData<&'a ()>),
}

impl<'a> Engine<'a> {
    fn new(hw: &DmaHw<'a>, res: Resource) -> Option<Self> {
        match res.kind {
            #[cfg(feature = "dw")]
            ResourceKind::Dw => Some(Engine::Dw(dw::DwChannel::new(
                hw.dw[res.block as usize],
                res.block,
                res.channel,
            ))),
            #[cfg(feature = "dmac")]
            ResourceKind::Dmac => Some(Engine::Dmac(dmac::DmacChannel::new(hw.dmac, res.channel))),
            _ => None,
        }
    }

    fn channel(&self) -> &dyn Channel {
        match *self {
            #[cfg(feature = "dw")]
            Engine::Dw(ref ch) => ch,
            #[cfg(feature = "dmac")]
            Engine::Dmac(ref ch) => ch,
            #[cfg(not(any(feature = "dw", feature = "dmac")))]
            Engine::None(never, _) => match never {},
        }
    }
}

/// The blocks a DMA channel may use.
#[derive(Clone, Copy)]
pub struct DmaHw<'a> {
    /// Datawire blocks.
    pub dw: [&'a pac::dw::RegisterBlock; DW_BLOCKS],
    /// DMAC.
    pub dmac: &'a pac::dmac::RegisterBlock,
    /// Trigger multiplexer.
    pub peri: &'a pac::peri::RegisterBlock,
    /// Resource manager the channel is allocated from.
    pub hwmgr: &'a HwManager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Started,
}

/// A DMA channel.
pub struct Dma<'a> {
    engine: Engine<'a>,
    resource: Resource,
    hwmgr: &'a HwManager,
    mux: TriggerMux<'a>,
    descriptor: &'a mut Descriptor,
    priority: Priority,
    direction: Direction,
    config: Option<TransferConfig>,
    input: Option<(TriggerSource, Input)>,
    output: Option<Output>,
    routed_to: Option<TriggerDest>,
    events: Event,
    callback: CallbackSlot<'a, Event>,
    state: State,
}

fn reserve_channel(hwmgr: &HwManager, direction: Direction) -> Result<Resource, Error> {
    let order = match direction {
        Direction::MemToMem => [EngineKind::Dmac, EngineKind::Datawire],
        _ => [EngineKind::Datawire, EngineKind::Dmac],
    };
    let mut result = Err(Error::UnsupportedHardware);
    for kind in order {
        if !kind.is_present() {
            continue;
        }
        match hwmgr.allocate(kind.resource_kind()) {
            Ok(res) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("dma: allocated {}", res);
                return Ok(res);
            }
            Err(hwmgr::Error::NoneFree) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("dma: no free {} channel", kind);
                result = Err(Error::Resource(hwmgr::Error::NoneFree));
            }
            Err(e) => return Err(e.into()),
        }
    }
    result
}

#[inline(always)]
fn barrier() {
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    cortex_m::asm::dsb();
    core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
}

impl<'a> Dma<'a> {
    /// Allocates a channel for `direction` without any trigger routing.
    pub fn init(
        hw: DmaHw<'a>,
        descriptor: &'a mut Descriptor,
        priority: Priority,
        direction: Direction,
    ) -> Result<Self, Error> {
        Self::init_adv(hw, descriptor, None, None, priority, direction)
    }

    /// Allocates a channel for `direction`.
    ///
    /// `src` is connected to the channel's trigger input and the channel's
    /// output trigger is routed to `dst`. If any step fails, everything done
    /// so far is undone.
    pub fn init_adv(
        hw: DmaHw<'a>,
        descriptor: &'a mut Descriptor,
        src: Option<(TriggerSource, Input)>,
        dst: Option<(TriggerDest, Output)>,
        priority: Priority,
        direction: Direction,
    ) -> Result<Self, Error> {
        let resource = reserve_channel(hw.hwmgr, direction)?;
        let Some(engine) = Engine::new(&hw, resource) else {
            hw.hwmgr.free(resource);
            return Err(Error::UnsupportedHardware);
        };

        let mut dma = Dma {
            engine,
            resource,
            hwmgr: hw.hwmgr,
            mux: TriggerMux::new(hw.peri),
            descriptor,
            priority,
            direction,
            config: None,
            input: None,
            output: None,
            routed_to: None,
            events: Event::empty(),
            callback: CallbackSlot::new(),
            state: State::Idle,
        };
        if let Err(e) = dma.route(src, dst) {
            dma.release();
            return Err(e);
        }
        Ok(dma)
    }

    fn route(
        &mut self,
        src: Option<(TriggerSource, Input)>,
        dst: Option<(TriggerDest, Output)>,
    ) -> Result<(), Error> {
        if let Some((source, input)) = src {
            self.connect_digital(source, input)?;
        }
        if let Some((dest, output)) = dst {
            let signal = self.enable_output(output)?;
            self.mux.connect(signal, dest, TriggerKind::Edge)?;
            self.routed_to = Some(dest);
        }
        Ok(())
    }

    /// Engine the channel lives on.
    pub fn engine_kind(&self) -> EngineKind {
        self.engine.channel().kind()
    }

    /// The reserved channel.
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// The channel's descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &*self.descriptor
    }

    /// Transfer direction the channel was allocated for.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Sets up the next transfer.
    pub fn configure(&mut self, cfg: TransferConfig) -> Result<(), Error> {
        if self.is_busy() {
            return Err(Error::ChannelBusy);
        }
        Plan::new(&cfg, self.engine.channel().limits())?;
        self.config = Some(cfg);
        self.state = State::Idle;
        self.write_descriptor()
    }

    /// Configures a transfer from one buffer to another.
    ///
    /// The shorter of the two buffers determines the length. Both stay
    /// borrowed as long as the channel exists.
    pub fn configure_buffers<RB, WB>(
        &mut self,
        from: &'a RB,
        to: &'a mut WB,
        action: TransferAction,
    ) -> Result<(), Error>
    where
        RB: ReadBuffer,
        WB: WriteBuffer<Word = RB::Word>,
    {
        let width = TransferWidth::from_word_size(core::mem::size_of::<RB::Word>())?;
        // Safety: both buffers are borrowed for the lifetime of the channel,
        // so they stay valid for every transfer it runs.
        let (src, src_len) = unsafe { from.read_buffer() };
        let (dst, dst_len) = unsafe { to.write_buffer() };
        self.configure(TransferConfig {
            src_addr: src as usize as u32,
            src_increment: 1,
            dst_addr: dst as usize as u32,
            dst_increment: 1,
            transfer_width: width,
            length: src_len.min(dst_len) as u32,
            burst_size: 0,
            action,
        })
    }

    fn write_descriptor(&mut self) -> Result<(), Error> {
        let Some(cfg) = self.config else {
            return Ok(());
        };
        let ch = self.engine.channel();
        let plan = Plan::new(&cfg, ch.limits())?;
        let disable = cfg.action.disables();
        let params = CtlParams {
            tr_in: self
                .input
                .map_or(cfg.action.tr_in(), |(_, input)| input as u32),
            tr_out: self.output.map_or(tr_type::DESCR, |o| o as u32),
            ch_disable: disable,
            src_word: self.direction.src_is_periph(),
            dst_word: self.direction.dst_is_periph(),
            data_size: cfg.transfer_width.data_size(),
            next: if disable { 0 } else { self.descriptor.addr() },
        };
        ch.write_descriptor(
            self.descriptor.words_mut(),
            cfg.src_addr,
            cfg.dst_addr,
            &plan,
            &params,
        );
        Ok(())
    }

    /// Starts the configured transfer with a software trigger.
    pub fn start_transfer(&mut self) -> Result<(), Error> {
        let ch = self.engine.channel();
        if ch.is_busy() {
            return Err(Error::ChannelBusy);
        }
        if self.state == State::Started && !ch.completion_pending() {
            #[cfg(feature = "defmt")]
            defmt::warn!("dma: transfer already started");
            return Err(Error::TransferAlreadyStarted);
        }
        if self.config.is_none() {
            return Err(Error::InvalidParameter);
        }
        barrier();
        ch.program(self.descriptor.addr(), self.priority);
        if let Err(e) = self.mux.sw_trigger(ch.trigger_dest(), SW_TRIGGER_CYCLES) {
            ch.disable();
            ch.set_intr_mask(self.events);
            return Err(e.into());
        }
        self.state = State::Started;
        Ok(())
    }

    /// Returns `true` while the channel has a transfer pending or running.
    pub fn is_busy(&self) -> bool {
        self.engine.channel().is_busy()
    }

    /// Enables or disables reporting of `event` to the callback.
    pub fn enable_event(&mut self, event: Event, enable: bool) {
        self.events.set(event, enable);
        self.engine.channel().set_intr_mask(self.events);
    }

    /// Installs the event callback.
    pub fn register_callback(&mut self, callback: &'a dyn Fn(Event)) {
        self.callback.register(callback);
    }

    /// Interrupt handler body. Call from the channel's interrupt.
    ///
    /// Returns the events passed to the callback.
    pub fn on_interrupt(&mut self) -> Event {
        let causes = self.engine.channel().take_events();
        if causes.contains(Event::TRANSFER_COMPLETE) {
            self.state = State::Idle;
        }
        #[cfg(feature = "defmt")]
        {
            if causes.intersects(!Event::TRANSFER_COMPLETE) {
                defmt::warn!("dma: {} error {}", self.resource, causes);
            }
        }
        let fired = causes & self.events;
        if !fired.is_empty() {
            self.callback.invoke(fired);
        }
        fired
    }

    /// Connects `source` to the channel's trigger input.
    ///
    /// Element triggers are level sensitive, the others edge sensitive.
    pub fn connect_digital(&mut self, source: TriggerSource, input: Input) -> Result<(), Error> {
        if self.is_busy() {
            return Err(Error::ChannelBusy);
        }
        let kind = match input {
            Input::SingleElement => TriggerKind::Level,
            Input::SingleBurst | Input::AllElements => TriggerKind::Edge,
        };
        self.mux
            .connect(source, self.engine.channel().trigger_dest(), kind)?;
        self.input = Some((source, input));
        self.write_descriptor()
    }

    /// Disconnects `source` from the channel's trigger input.
    pub fn disconnect_digital(&mut self, source: TriggerSource) -> Result<(), Error> {
        match self.input {
            Some((connected, _)) if connected == source => {}
            _ => return Err(Error::Trigger(triggers::Error::NotConnected)),
        }
        if self.is_busy() {
            return Err(Error::ChannelBusy);
        }
        self.mux.disconnect(self.engine.channel().trigger_dest())?;
        self.input = None;
        self.write_descriptor()
    }

    /// Enables the channel's output trigger and returns its signal.
    pub fn enable_output(&mut self, output: Output) -> Result<TriggerSource, Error> {
        if self.is_busy() {
            return Err(Error::ChannelBusy);
        }
        self.output = Some(output);
        self.write_descriptor()?;
        Ok(self.engine.channel().trigger_source())
    }

    /// Disables the output trigger and removes any route made by `init_adv`.
    pub fn disable_output(&mut self) -> Result<(), Error> {
        if self.is_busy() {
            return Err(Error::ChannelBusy);
        }
        if let Some(dest) = self.routed_to.take() {
            self.mux.disconnect(dest)?;
        }
        self.output = None;
        self.write_descriptor()
    }

    fn release(&mut self) {
        let ch = self.engine.channel();
        ch.disable();
        if self.input.take().is_some() {
            let _ = self.mux.disconnect(ch.trigger_dest());
        }
        if let Some(dest) = self.routed_to.take() {
            let _ = self.mux.disconnect(dest);
        }
        self.callback.clear();
        self.hwmgr.free(self.resource);
    }

    /// Disables the channel, removes its routing and returns it to the
    /// resource manager.
    pub fn free(mut self) {
        debug_assert!(!self.is_busy(), "freeing a busy DMA channel");
        self.release();
    }
}



#[cfg(all(test, feature = "dw", feature = "dmac"))]
mod tests {
    use super::fixture::{mem_cfg, Hw};
    use super::*;
    use crate::pac::{dmac as dmac_regs, dw as dw_regs, peri, DMAC_CHANNELS, DW_CHANNELS};
    use core::cell::Cell;
    use std::boxed::Box;

    #[test]
    fn engine_follows_direction() {
        let hw = Hw::new();
        let mut d0 = Descriptor::new();
        let mut d1 = Descriptor::new();
        let m2m = Dma::init(hw.dma(), &mut d0, Priority::Low, Direction::MemToMem).unwrap();
        let p2m = Dma::init(hw.dma(), &mut d1, Priority::Low, Direction::PeriphToMem).unwrap();
        assert_eq!(m2m.engine_kind(), EngineKind::Dmac);
        assert_eq!(p2m.engine_kind(), EngineKind::Datawire);
        assert_eq!(p2m.resource(), Resource::new(ResourceKind::Dw, 0, 0));
    }

    #[test]
    fn falls_back_when_preferred_engine_is_full() {
        let hw = Hw::new();
        for _ in 0..DMAC_CHANNELS {
            hw.hwmgr.allocate(ResourceKind::Dmac).unwrap();
        }
        let mut d = Descriptor::new();
        let dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToMem).unwrap();
        assert_eq!(dma.engine_kind(), EngineKind::Datawire);

        let hw = Hw::new();
        for _ in 0..2 * DW_CHANNELS {
            hw.hwmgr.allocate(ResourceKind::Dw).unwrap();
        }
        let mut d = Descriptor::new();
        let dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToPeriph).unwrap();
        assert_eq!(dma.engine_kind(), EngineKind::Dmac);
    }

    #[test]
    fn no_channel_anywhere() {
        let hw = Hw::new();
        for _ in 0..DMAC_CHANNELS {
            hw.hwmgr.allocate(ResourceKind::Dmac).unwrap();
        }
        for _ in 0..2 * DW_CHANNELS {
            hw.hwmgr.allocate(ResourceKind::Dw).unwrap();
        }
        let mut d = Descriptor::new();
        let err = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToMem).err();
        assert_eq!(err, Some(Error::Resource(hwmgr::Error::NoneFree)));
    }

    #[test]
    fn configure_writes_self_linked_descriptor() {
        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::PeriphToMem).unwrap();
        dma.configure(mem_cfg(16)).unwrap();

        let words = *dma.descriptor().words();
        let ctl = descriptor::DwCtl::from_bits(words[0]);
        assert_eq!(ctl.descr_type(), descriptor::descr_type::ONE_D);
        assert_eq!(ctl.data_size(), 2);
        assert_eq!(ctl.tr_in_type(), tr_type::DESCR);
        assert!(ctl.src_transfer_size());
        assert!(!ctl.dst_transfer_size());
        assert!(!ctl.ch_disable());
        assert_eq!(words[1], 0x0800_0000);
        assert_eq!(words[2], 0x0800_4000);
        assert_eq!(descriptor::DwLoopCtl::from_bits(words[3]).count(), 15);
        assert_eq!(words[5], dma.descriptor().addr());
    }

    #[test]
    fn disable_actions_end_the_chain() {
        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToMem).unwrap();
        dma.configure(TransferConfig {
            action: TransferAction::BurstDisable,
            burst_size: 4,
            ..mem_cfg(16)
        })
        .unwrap();

        let words = *dma.descriptor().words();
        let ctl = descriptor::DmacCtl::from_bits(words[0]);
        assert!(ctl.ch_disable());
        assert_eq!(ctl.tr_in_type(), tr_type::X_LOOP);
        assert_eq!(ctl.descr_type(), descriptor::descr_type::TWO_D);
        assert_eq!(words[7], 0);
    }

    #[test]
    fn busy_channel_rejects_configure_and_start() {
        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToMem).unwrap();
        let ch = dma.resource().channel;
        dma.configure(mem_cfg(4)).unwrap();

        hw.dmac.active.write(1 << ch);
        assert!(dma.is_busy());
        assert_eq!(dma.configure(mem_cfg(8)), Err(Error::ChannelBusy));
        assert_eq!(dma.start_transfer(), Err(Error::ChannelBusy));
        hw.dmac.active.write(0);
        assert!(dma.start_transfer().is_ok());
    }

    #[test]
    fn start_programs_channel_and_fires_trigger() {
        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::High, Direction::MemToPeriph).unwrap();
        assert_eq!(dma.start_transfer(), Err(Error::InvalidParameter));
        dma.configure(mem_cfg(4)).unwrap();
        dma.start_transfer().unwrap();

        let ch = &hw.dw0.ch_struct[0];
        assert_eq!(ch.ch_curr_ptr.read(), dma.descriptor().addr());
        assert_eq!(ch.ch_ctl.read_field(dw_regs::CH_CTL_PRIO), 1);
        assert!(ch.ch_ctl.is_set(dw_regs::CH_CTL_ENABLED.mask()));

        let cmd = hw.peri.tr_cmd.read();
        assert!(cmd & peri::TR_CMD_ACTIVATE.mask() != 0);
        assert_eq!(peri::TR_CMD_GROUP_SEL.get(cmd), 0);
        assert_eq!(peri::TR_CMD_TR_SEL.get(cmd), 0);
        assert_eq!(peri::TR_CMD_COUNT.get(cmd), SW_TRIGGER_CYCLES as u32);
    }

    #[test]
    fn blocked_software_trigger_leaves_channel_disabled() {
        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToPeriph).unwrap();
        dma.configure(mem_cfg(4)).unwrap();
        dma.enable_event(Event::TRANSFER_COMPLETE, true);

        hw.peri.tr_cmd.write(peri::TR_CMD_ACTIVATE.mask());
        assert_eq!(
            dma.start_transfer(),
            Err(Error::Trigger(triggers::Error::Busy))
        );
        let ch = &hw.dw0.ch_struct[0];
        assert!(!ch.ch_ctl.is_set(dw_regs::CH_CTL_ENABLED.mask()));
        assert_ne!(ch.intr_mask.read(), 0);

        // Not counted as started, so a retry goes through.
        hw.peri.tr_cmd.write(0);
        assert_eq!(dma.start_transfer(), Ok(()));
        assert!(ch.ch_ctl.is_set(dw_regs::CH_CTL_ENABLED.mask()));
    }

    #[test]
    fn restart_before_completion_is_a_warning() {
        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToMem).unwrap();
        let ch = dma.resource().channel as usize;
        dma.configure(mem_cfg(4)).unwrap();
        dma.start_transfer().unwrap();

        let err = dma.start_transfer().unwrap_err();
        assert_eq!(err, Error::TransferAlreadyStarted);
        assert_eq!(err.rslt().ty(), RsltType::Warning);

        // Hardware finished: completion flagged, software trigger released.
        hw.dmac.ch[ch]
            .intr
            .write(dmac_regs::intr::COMPLETION.mask());
        hw.peri.tr_cmd.write(0);
        assert_eq!(dma.start_transfer(), Ok(()));
    }

    #[test]
    fn interrupt_reports_enabled_events() {
        let seen = Cell::new(Event::empty());
        let on_event = |e: Event| seen.set(seen.get() | e);

        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToMem).unwrap();
        let ch = dma.resource().channel as usize;
        dma.register_callback(&on_event);
        dma.configure(mem_cfg(4)).unwrap();
        dma.start_transfer().unwrap();
        dma.enable_event(Event::TRANSFER_COMPLETE, true);
        assert_eq!(
            hw.dmac.ch[ch].intr_mask.read(),
            dmac_regs::intr::COMPLETION.mask()
        );

        hw.dmac.ch[ch].intr.write(
            dmac_regs::intr::COMPLETION.mask() | dmac_regs::intr::SRC_BUS_ERROR.mask(),
        );
        assert_eq!(dma.on_interrupt(), Event::TRANSFER_COMPLETE);
        assert_eq!(seen.get(), Event::TRANSFER_COMPLETE);

        // Completed, so a new start is accepted once the trigger is free.
        hw.peri.tr_cmd.write(0);
        assert_eq!(dma.start_transfer(), Ok(()));

        dma.enable_event(Event::TRANSFER_COMPLETE, false);
        assert_eq!(hw.dmac.ch[ch].intr_mask.read(), 0);
    }

    #[test]
    fn datawire_interrupt_uses_cause() {
        let seen = Cell::new(Event::empty());
        let on_event = |e: Event| seen.set(e);

        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::PeriphToMem).unwrap();
        dma.register_callback(&on_event);
        dma.enable_event(Event::DST_BUS_ERROR, true);

        let ch = &hw.dw0.ch_struct[0];
        ch.intr.write(dw_regs::INTR_CH.mask());
        ch.ch_status.write(dw_regs::intr_cause::DST_BUS_ERROR);
        assert_eq!(dma.on_interrupt(), Event::DST_BUS_ERROR);
        assert_eq!(seen.get(), Event::DST_BUS_ERROR);

        ch.ch_status.write(dw_regs::intr_cause::COMPLETION);
        assert_eq!(dma.on_interrupt(), Event::empty());
    }

    #[test]
    fn init_adv_routes_triggers() {
        let hw = Hw::new();
        let mux = TriggerMux::new(&hw.peri);
        let timer = TriggerSource::TcpwmOverflow { block: 0, counter: 1 };
        let mut d = Descriptor::new();
        let mut dma = Dma::init_adv(
            hw.dma(),
            &mut d,
            Some((timer, Input::SingleBurst)),
            Some((TriggerDest::SarStart, Output::AllElements)),
            Priority::Low,
            Direction::PeriphToMem,
        )
        .unwrap();
        let own_dest = TriggerDest::DwChannel { block: 0, channel: 0 };
        assert!(mux.is_connected(own_dest));
        assert!(mux.is_connected(TriggerDest::SarStart));

        dma.configure(mem_cfg(4)).unwrap();
        let ctl = descriptor::DwCtl::from_bits(dma.descriptor().words()[0]);
        assert_eq!(ctl.tr_in_type(), Input::SingleBurst as u32);
        assert_eq!(ctl.tr_out_type(), Output::AllElements as u32);

        let res = dma.resource();
        dma.free();
        assert!(!mux.is_connected(own_dest));
        assert!(!mux.is_connected(TriggerDest::SarStart));
        assert!(!hw.hwmgr.is_reserved(res));
    }

    #[test]
    fn init_adv_failure_releases_everything() {
        let hw = Hw::new();
        let mux = TriggerMux::new(&hw.peri);
        mux.connect(TriggerSource::SarDone, TriggerDest::SarStart, TriggerKind::Edge)
            .unwrap();

        let timer = TriggerSource::TcpwmOverflow { block: 0, counter: 1 };
        let mut d = Descriptor::new();
        let err = Dma::init_adv(
            hw.dma(),
            &mut d,
            Some((timer, Input::AllElements)),
            Some((TriggerDest::SarStart, Output::AllElements)),
            Priority::Low,
            Direction::PeriphToMem,
        )
        .err();
        assert_eq!(err, Some(Error::Trigger(triggers::Error::InUse)));
        assert!(!mux.is_connected(TriggerDest::DwChannel { block: 0, channel: 0 }));
        assert!(!hw
            .hwmgr
            .is_reserved(Resource::new(ResourceKind::Dw, 0, 0)));
    }

    #[test]
    fn digital_connections() {
        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToMem).unwrap();
        let timer = TriggerSource::TcpwmCompareMatch { block: 1, counter: 0 };
        let other = TriggerSource::SarDone;

        dma.connect_digital(timer, Input::SingleElement).unwrap();
        assert_eq!(
            dma.disconnect_digital(other),
            Err(Error::Trigger(triggers::Error::NotConnected))
        );
        dma.disconnect_digital(timer).unwrap();

        let out = dma.enable_output(Output::SingleBurst).unwrap();
        assert_eq!(out, TriggerSource::DmacDone { channel: 0 });
        dma.disable_output().unwrap();
    }

    #[test]
    fn configure_from_buffers() {
        let src: &'static [u16; 8] = Box::leak(Box::new([7u16; 8]));
        let mut dst: &'static mut [u16; 6] = Box::leak(Box::new([0u16; 6]));

        let hw = Hw::new();
        let mut d = Descriptor::new();
        let mut dma = Dma::init(hw.dma(), &mut d, Priority::Low, Direction::MemToMem).unwrap();
        dma.configure_buffers(&src, &mut dst, TransferAction::FullDisable)
            .unwrap();

        let words = *dma.descriptor().words();
        let ctl = descriptor::DmacCtl::from_bits(words[0]);
        assert_eq!(ctl.data_size(), 1);
        assert_eq!(words[3], 5);
        assert_eq!(words[1], src.as_ptr() as usize as u32);
    }

    #[test]
    fn priority_and_width_conversions() {
        assert_eq!(Priority::try_from(2), Ok(Priority::Medium));
        assert_eq!(Priority::try_from(4), Err(Error::InvalidPriority));
        assert_eq!(Priority::default(), Priority::Low);
        assert_eq!(TransferWidth::try_from(16), Ok(TransferWidth::Bits16));
        assert_eq!(TransferWidth::try_from(24), Err(Error::InvalidTransferWidth));
        assert_eq!(
            Error::UnsupportedHardware.rslt().ty(),
            RsltType::Fatal
        );
        assert_eq!(
            Error::Resource(hwmgr::Error::NoneFree).rslt().module(),
            module::HWMGR
        );
    }
}
