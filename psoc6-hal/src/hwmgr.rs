//! Hardware resource manager
//!
//! Blocks like the Datawire engines or the TCPWM counters are shared by
//! several drivers. Before touching one, a driver reserves it here, either a
//! specific instance with [`HwManager::reserve`] or the first free one with
//! [`HwManager::allocate`], and releases it again with [`HwManager::free`].
//!
//! ```
//! use psoc6_hal::hwmgr::{HwManager, Resource, ResourceKind};
//!
//! static HWMGR: HwManager = HwManager::new();
//!
//! let ch = HWMGR.allocate(ResourceKind::Dmac).unwrap();
//! assert_eq!(ch, Resource::new(ResourceKind::Dmac, 0, 0));
//! assert!(HWMGR.is_reserved(ch));
//! HWMGR.free(ch);
//! assert!(!HWMGR.is_reserved(ch));
//! ```

use crate::pac::{DMAC_CHANNELS, DW_BLOCKS, DW_CHANNELS, TCPWM_BLOCKS, TCPWM_COUNTERS};
use core::cell::Cell;
use critical_section::Mutex;
use mcu_hal_common::result::{module, ResultCode, Rslt, RsltType};

/// Class of a shared hardware block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResourceKind {
    /// Datawire DMA channel.
    Dw,
    /// DMAC channel.
    Dmac,
    /// TCPWM counter.
    Tcpwm,
    /// SAR ADC.
    Sar,
    /// CTDAC.
    Ctdac,
}

impl ResourceKind {
    /// Number of blocks of this kind.
    pub const fn blocks(self) -> u8 {
        match self {
            ResourceKind::Dw => DW_BLOCKS as u8,
            ResourceKind::Tcpwm => TCPWM_BLOCKS as u8,
            ResourceKind::Dmac | ResourceKind::Sar | ResourceKind::Ctdac => 1,
        }
    }

    /// Number of channels per block.
    pub const fn channels(self) -> u8 {
        match self {
            ResourceKind::Dw => DW_CHANNELS as u8,
            ResourceKind::Dmac => DMAC_CHANNELS as u8,
            ResourceKind::Tcpwm => TCPWM_COUNTERS as u8,
            ResourceKind::Sar | ResourceKind::Ctdac => 1,
        }
    }

    // Index of the first bitmap word used by this kind.
    const fn first_slot(self) -> usize {
        match self {
            ResourceKind::Dw => 0,
            ResourceKind::Dmac => DW_BLOCKS,
            ResourceKind::Tcpwm => DW_BLOCKS + 1,
            ResourceKind::Sar => DW_BLOCKS + 1 + TCPWM_BLOCKS,
            ResourceKind::Ctdac => DW_BLOCKS + 2 + TCPWM_BLOCKS,
        }
    }
}

const SLOTS: usize = DW_BLOCKS + 3 + TCPWM_BLOCKS;

/// One channel of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Resource {
    /// Class of the block.
    pub kind: ResourceKind,
    /// Block index.
    pub block: u8,
    /// Channel inside the block.
    pub channel: u8,
}

impl Resource {
    /// Names a resource. Validity is checked when it is reserved.
    pub const fn new(kind: ResourceKind, block: u8, channel: u8) -> Self {
        Self {
            kind,
            block,
            channel,
        }
    }

    fn is_valid(&self) -> bool {
        self.block < self.kind.blocks() && self.channel < self.kind.channels()
    }

    fn slot(&self) -> usize {
        self.kind.first_slot() + self.block as usize
    }

    fn bit(&self) -> u32 {
        1 << self.channel
    }
}

/// Resource manager errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Block or channel index out of range.
    InvalidResource,
    /// The resource is already reserved.
    InUse,
    /// Every resource of the requested kind is reserved.
    NoneFree,
}

impl ResultCode for Error {
    fn rslt(&self) -> Rslt {
        let code = match self {
            Error::InvalidResource => 0,
            Error::InUse => 1,
            Error::NoneFree => 2,
        };
        Rslt::create(RsltType::Error, module::HWMGR, code)
    }
}

/// Reservation bitmaps for every shared block of the device.
pub struct HwManager {
    used: Mutex<Cell<[u32; SLOTS]>>,
}

impl Default for HwManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HwManager {
    /// A manager with nothing reserved.
    pub const fn new() -> Self {
        Self {
            used: Mutex::new(Cell::new([0; SLOTS])),
        }
    }

    /// Reserves a specific resource.
    pub fn reserve(&self, res: Resource) -> Result<(), Error> {
        if !res.is_valid() {
            return Err(Error::InvalidResource);
        }
        critical_section::with(|cs| {
            let cell = self.used.borrow(cs);
            let mut used = cell.get();
            if used[res.slot()] & res.bit() != 0 {
                return Err(Error::InUse);
            }
            used[res.slot()] |= res.bit();
            cell.set(used);
            Ok(())
        })
    }

    /// Reserves the first free resource of `kind`, lowest block first.
    pub fn allocate(&self, kind: ResourceKind) -> Result<Resource, Error> {
        critical_section::with(|cs| {
            let cell = self.used.borrow(cs);
            let mut used = cell.get();
            for block in 0..kind.blocks() {
                let slot = kind.first_slot() + block as usize;
                let free = !used[slot] & channel_mask(kind);
                if free != 0 {
                    let channel = free.trailing_zeros() as u8;
                    used[slot] |= 1 << channel;
                    cell.set(used);
                    return Ok(Resource::new(kind, block, channel));
                }
            }
            Err(Error::NoneFree)
        })
    }

    /// Releases a resource. Freeing something that isn't reserved is a no-op.
    pub fn free(&self, res: Resource) {
        if !res.is_valid() {
            return;
        }
        critical_section::with(|cs| {
            let cell = self.used.borrow(cs);
            let mut used = cell.get();
            used[res.slot()] &= !res.bit();
            cell.set(used);
        })
    }

    /// Returns `true` if `res` is currently reserved.
    pub fn is_reserved(&self, res: Resource) -> bool {
        res.is_valid()
            && critical_section::with(|cs| self.used.borrow(cs).get()[res.slot()] & res.bit() != 0)
    }
}

const fn channel_mask(kind: ResourceKind) -> u32 {
    let n = kind.channels() as u32;
    if n >= 32 {
        u32::MAX
    } else {
        (1 << n) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_twice_is_in_use() {
        let mgr = HwManager::new();
        let res = Resource::new(ResourceKind::Tcpwm, 1, 3);
        assert_eq!(mgr.reserve(res), Ok(()));
        assert_eq!(mgr.reserve(res), Err(Error::InUse));
        mgr.free(res);
        assert_eq!(mgr.reserve(res), Ok(()));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mgr = HwManager::new();
        assert_eq!(
            mgr.reserve(Resource::new(ResourceKind::Dmac, 0, 8)),
            Err(Error::InvalidResource)
        );
        assert_eq!(
            mgr.reserve(Resource::new(ResourceKind::Dw, 2, 0)),
            Err(Error::InvalidResource)
        );
        assert!(!mgr.is_reserved(Resource::new(ResourceKind::Sar, 0, 1)));
    }

    #[test]
    fn allocate_moves_to_next_block() {
        let mgr = HwManager::new();
        for ch in 0..DW_CHANNELS as u8 {
            assert_eq!(
                mgr.allocate(ResourceKind::Dw),
                Ok(Resource::new(ResourceKind::Dw, 0, ch))
            );
        }
        assert_eq!(
            mgr.allocate(ResourceKind::Dw),
            Ok(Resource::new(ResourceKind::Dw, 1, 0))
        );
    }

    #[test]
    fn allocate_exhausts() {
        let mgr = HwManager::new();
        assert!(mgr.allocate(ResourceKind::Sar).is_ok());
        assert_eq!(mgr.allocate(ResourceKind::Sar), Err(Error::NoneFree));
        // Other kinds are tracked separately.
        assert!(mgr.allocate(ResourceKind::Ctdac).is_ok());
    }

    #[test]
    fn allocate_reuses_freed_channel() {
        let mgr = HwManager::new();
        let a = mgr.allocate(ResourceKind::Dmac).unwrap();
        let b = mgr.allocate(ResourceKind::Dmac).unwrap();
        mgr.free(a);
        assert_eq!(mgr.allocate(ResourceKind::Dmac), Ok(a));
        assert_ne!(a, b);
    }

    #[test]
    fn error_codes() {
        let r = Error::NoneFree.rslt();
        assert_eq!(r.module(), module::HWMGR);
        assert_eq!(r.ty(), RsltType::Error);
        assert_eq!(r.code(), 2);
    }
}
