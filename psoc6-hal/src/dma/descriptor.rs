//! Transfer descriptors
//!
//! Both engines fetch their work from a descriptor in memory. The memory is
//! owned by the caller and borrowed by the channel for as long as the channel
//! exists, so it can never be freed under a running transfer.
//!
//! Datawire descriptor words:
//!
//! | word | content          |
//! |------|------------------|
//! | 0    | control          |
//! | 1    | source address   |
//! | 2    | dest. address    |
//! | 3    | X loop control   |
//! | 4    | Y loop control   |
//! | 5    | next descriptor  |
//!
//! DMAC descriptor words:
//!
//! | word | content          |
//! |------|------------------|
//! | 0    | control          |
//! | 1    | source address   |
//! | 2    | dest. address    |
//! | 3    | X count          |
//! | 4    | X increments     |
//! | 5    | Y count          |
//! | 6    | Y increments     |
//! | 7    | next descriptor  |

use super::{Error, TransferConfig};

/// Memory for one transfer descriptor.
#[repr(C, align(32))]
#[derive(Debug, Default)]
pub struct Descriptor {
    words: [u32; 8],
}

impl Descriptor {
    /// A zeroed descriptor.
    pub const fn new() -> Self {
        Self { words: [0; 8] }
    }

    /// The raw descriptor words, as last written by `configure`.
    pub fn words(&self) -> &[u32; 8] {
        &self.words
    }

    pub(crate) fn words_mut(&mut self) -> &mut [u32; 8] {
        &mut self.words
    }

    /// Bus address of the descriptor.
    pub(crate) fn addr(&self) -> u32 {
        self as *const Self as usize as u32
    }
}

/// `DESCR_TYPE` values, shared by both engines.
pub(crate) mod descr_type {
    pub const SINGLE: u32 = 0;
    pub const ONE_D: u32 = 1;
    pub const TWO_D: u32 = 2;
}

/// Interrupt / trigger granularity values, shared by both engines.
pub(crate) mod tr_type {
    pub const X_LOOP: u32 = 1;
    pub const DESCR: u32 = 2;
}

bitfield::bitfield! {
    /// Datawire descriptor control word.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct DwCtl(u32);
    impl Debug;
    /// Trigger deactivation handling.
    pub u32, wait_for_deact, set_wait_for_deact: 1, 0;
    /// Interrupt granularity.
    pub u32, intr_type, set_intr_type: 3, 2;
    /// Output trigger granularity.
    pub u32, tr_out_type, set_tr_out_type: 5, 4;
    /// Work started by one input trigger.
    pub u32, tr_in_type, set_tr_in_type: 7, 6;
    /// Disable the channel once this descriptor completes.
    pub ch_disable, set_ch_disable: 24;
    /// Source accesses are 32-bit wide regardless of data size.
    pub src_transfer_size, set_src_transfer_size: 26;
    /// Destination accesses are 32-bit wide regardless of data size.
    pub dst_transfer_size, set_dst_transfer_size: 27;
    /// Element size: 0 byte, 1 halfword, 2 word.
    pub u32, data_size, set_data_size: 29, 28;
    /// Single, 1D or 2D.
    pub u32, descr_type, set_descr_type: 31, 30;
}

bitfield::bitfield! {
    /// Datawire X or Y loop control word.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct DwLoopCtl(u32);
    impl Debug;
    /// Source increment in elements, 12-bit two's complement.
    pub u32, src_incr, set_src_incr: 11, 0;
    /// Destination increment in elements, 12-bit two's complement.
    pub u32, dst_incr, set_dst_incr: 23, 12;
    /// Loop count minus one.
    pub u32, count, set_count: 31, 24;
}

bitfield::bitfield! {
    /// DMAC descriptor control word.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct DmacCtl(u32);
    impl Debug;
    /// Trigger deactivation handling.
    pub u32, wait_for_deact, set_wait_for_deact: 1, 0;
    /// Interrupt granularity.
    pub u32, intr_type, set_intr_type: 3, 2;
    /// Output trigger granularity.
    pub u32, tr_out_type, set_tr_out_type: 5, 4;
    /// Work started by one input trigger.
    pub u32, tr_in_type, set_tr_in_type: 7, 6;
    /// Prefetch source data before the trigger arrives.
    pub data_prefetch, set_data_prefetch: 8;
    /// Element size: 0 byte, 1 halfword, 2 word.
    pub u32, data_size, set_data_size: 17, 16;
    /// Disable the channel once this descriptor completes.
    pub ch_disable, set_ch_disable: 24;
    /// Source accesses are 32-bit wide regardless of data size.
    pub src_transfer_size, set_src_transfer_size: 26;
    /// Destination accesses are 32-bit wide regardless of data size.
    pub dst_transfer_size, set_dst_transfer_size: 27;
    /// Single, 1D, 2D, memory copy or scatter.
    pub u32, descr_type, set_descr_type: 30, 28;
}

bitfield::bitfield! {
    /// DMAC X or Y increment word.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct DmacIncr(u32);
    impl Debug;
    /// Source increment in elements, 16-bit two's complement.
    pub u32, src, set_src: 15, 0;
    /// Destination increment in elements, 16-bit two's complement.
    pub u32, dst, set_dst: 31, 16;
}

macro_rules! raw_word {
    ($($name:ident),+) => {
        $(
            impl $name {
                /// Wraps a raw descriptor word.
                pub const fn from_bits(bits: u32) -> Self {
                    Self(bits)
                }

                /// The raw descriptor word.
                pub const fn bits(self) -> u32 {
                    self.0
                }
            }
        )+
    };
}

raw_word!(DwCtl, DwLoopCtl, DmacCtl, DmacIncr);

/// Per-engine descriptor limits.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    /// Largest X or Y loop count.
    pub max_count: u32,
    /// Width of a signed increment field.
    pub incr_bits: u32,
}

/// Loop structure of a validated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Plan {
    pub descr_type: u32,
    pub x_count: u32,
    pub y_count: u32,
    pub src_x: i32,
    pub dst_x: i32,
    pub src_y: i32,
    pub dst_y: i32,
}

impl Plan {
    /// Validates `cfg` against `limits` and splits it into loops.
    ///
    /// Single element transfers use a single descriptor, a transfer whose
    /// burst covers everything is one X loop, and anything else becomes
    /// `length / burst_size` Y iterations of one burst each.
    pub fn new(cfg: &TransferConfig, limits: Limits) -> Result<Self, Error> {
        if cfg.length == 0 {
            return Err(Error::InvalidParameter);
        }
        if cfg.burst_size != 0 && cfg.length % cfg.burst_size != 0 {
            return Err(Error::InvalidBurstSize);
        }
        let bytes = cfg.transfer_width.bytes();
        if cfg.src_addr % bytes != 0 || cfg.dst_addr % bytes != 0 {
            return Err(Error::InvalidAlignment);
        }

        let src_x = cfg.src_increment as i32;
        let dst_x = cfg.dst_increment as i32;
        let plan = if cfg.length == 1 {
            Plan {
                descr_type: descr_type::SINGLE,
                x_count: 1,
                y_count: 1,
                src_x,
                dst_x,
                src_y: 0,
                dst_y: 0,
            }
        } else if cfg.burst_size == 0 || cfg.burst_size == cfg.length {
            Plan {
                descr_type: descr_type::ONE_D,
                x_count: cfg.length,
                y_count: 1,
                src_x,
                dst_x,
                src_y: 0,
                dst_y: 0,
            }
        } else {
            let burst = i32::try_from(cfg.burst_size).map_err(|_| Error::InvalidParameter)?;
            Plan {
                descr_type: descr_type::TWO_D,
                x_count: cfg.burst_size,
                y_count: cfg.length / cfg.burst_size,
                src_x,
                dst_x,
                src_y: src_x.checked_mul(burst).ok_or(Error::InvalidParameter)?,
                dst_y: dst_x.checked_mul(burst).ok_or(Error::InvalidParameter)?,
            }
        };

        if plan.x_count > limits.max_count || plan.y_count > limits.max_count {
            return Err(Error::InvalidParameter);
        }
        let fits = |v: i32| {
            let half = 1i32 << (limits.incr_bits - 1);
            (-half..half).contains(&v)
        };
        if ![plan.src_x, plan.dst_x, plan.src_y, plan.dst_y]
            .into_iter()
            .all(fits)
        {
            return Err(Error::InvalidParameter);
        }
        Ok(plan)
    }
}

/// Two's complement encoding of `v` in a `bits` wide field.
pub(crate) fn encode_incr(v: i32, bits: u32) -> u32 {
    (v as u32) & ((1 << bits) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dma::{TransferAction, TransferWidth};

    const DW: Limits = Limits {
        max_count: 256,
        incr_bits: 12,
    };
    const DMAC: Limits = Limits {
        max_count: 65536,
        incr_bits: 16,
    };

    fn cfg(length: u32, burst_size: u32) -> TransferConfig {
        TransferConfig {
            src_addr: 0x0800_0000,
            src_increment: 1,
            dst_addr: 0x0800_1000,
            dst_increment: 1,
            transfer_width: TransferWidth::Bits32,
            length,
            burst_size,
            action: TransferAction::Full,
        }
    }

    #[test]
    fn single_element() {
        let p = Plan::new(&cfg(1, 0), DW).unwrap();
        assert_eq!(p.descr_type, descr_type::SINGLE);
    }

    #[test]
    fn one_d_and_two_d() {
        let p = Plan::new(&cfg(64, 0), DW).unwrap();
        assert_eq!((p.descr_type, p.x_count, p.y_count), (descr_type::ONE_D, 64, 1));

        let p = Plan::new(&cfg(64, 64), DW).unwrap();
        assert_eq!(p.descr_type, descr_type::ONE_D);

        let p = Plan::new(&cfg(64, 16), DW).unwrap();
        assert_eq!((p.descr_type, p.x_count, p.y_count), (descr_type::TWO_D, 16, 4));
        assert_eq!((p.src_y, p.dst_y), (16, 16));
    }

    #[test]
    fn loop_limits_differ_per_engine() {
        assert_eq!(Plan::new(&cfg(256, 0), DW).map(|p| p.x_count), Ok(256));
        assert_eq!(Plan::new(&cfg(257, 0), DW), Err(Error::InvalidParameter));
        assert!(Plan::new(&cfg(257, 0), DMAC).is_ok());
        assert_eq!(Plan::new(&cfg(65537, 0), DMAC), Err(Error::InvalidParameter));
    }

    #[test]
    fn rejects_bad_configs() {
        assert_eq!(Plan::new(&cfg(0, 0), DW), Err(Error::InvalidParameter));
        assert_eq!(Plan::new(&cfg(10, 3), DW), Err(Error::InvalidBurstSize));

        let mut c = cfg(4, 0);
        c.src_addr += 2;
        assert_eq!(Plan::new(&c, DW), Err(Error::InvalidAlignment));
        c.transfer_width = TransferWidth::Bits16;
        assert!(Plan::new(&c, DW).is_ok());

        let mut c = cfg(4, 0);
        c.dst_increment = 2048;
        assert_eq!(Plan::new(&c, DW), Err(Error::InvalidParameter));
        assert!(Plan::new(&c, DMAC).is_ok());
    }

    #[test]
    fn y_increment_must_fit() {
        // 128-element bursts with an increment of 32 need a Y step of 4096.
        let mut c = cfg(256, 128);
        c.src_increment = 32;
        assert_eq!(Plan::new(&c, DW), Err(Error::InvalidParameter));
        assert!(Plan::new(&c, DMAC).is_ok());
    }

    #[test]
    fn oversized_y_increment_is_rejected() {
        let mut c = cfg(1 << 21, 1 << 20);
        c.src_increment = i16::MAX;
        assert_eq!(Plan::new(&c, DMAC), Err(Error::InvalidParameter));

        let mut c = cfg(1 << 21, 1 << 20);
        c.dst_increment = i16::MIN;
        assert_eq!(Plan::new(&c, DW), Err(Error::InvalidParameter));
    }

    #[test]
    fn negative_increments() {
        assert_eq!(encode_incr(-1, 12), 0xfff);
        assert_eq!(encode_incr(-1, 16), 0xffff);
        assert_eq!(encode_incr(5, 12), 5);

        let mut w = DwLoopCtl::from_bits(0);
        w.set_src_incr(encode_incr(-2, 12));
        w.set_count(255);
        assert_eq!(w.bits(), 0xff00_0ffe);
    }
}
