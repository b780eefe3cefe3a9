//! Register blocks and peripheral handles

pub mod dac;
pub mod vadc;

/// Number of VADC conversion groups.
pub const VADC_GROUPS: usize = 4;

mcu_hal_common::peripherals! {
    VADC: vadc @ 0x4000_4000, "Versatile analog-to-digital converter";
    DAC: dac @ 0x4801_8000, "Digital-to-analog converter";
}

/// A register block allocated in RAM, for exercising drivers off-target.
#[cfg(test)]
pub(crate) fn detached<T>() -> std::boxed::Box<T> {
    // Safety: register blocks only contain `Reg` cells and plain `u32`
    // padding, for which all-zeroes is a valid value.
    std::boxed::Box::new(unsafe { core::mem::zeroed() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_offsets() {
        let regs = detached::<vadc::RegisterBlock>();
        let base = &*regs as *const _ as usize;
        let at = |r: &mcu_hal_common::Reg| r.as_ptr() as usize - base;
        assert_eq!(at(&regs.globcfg), 0x080);
        assert_eq!(at(&regs.g[0].arbcfg), 0x480);
        assert_eq!(at(&regs.g[1].qinr0), 0x910);
        assert_eq!(at(&regs.g[2].res[3]), 0xb0c);
        assert_eq!(at(&regs.g[3].vfr), 0x13f8);
        assert_eq!(core::mem::size_of::<vadc::RegisterBlock>(), 0x1400);

        let regs = detached::<dac::RegisterBlock>();
        let base = &*regs as *const _ as usize;
        let at = |r: &mcu_hal_common::Reg| r.as_ptr() as usize - base;
        assert_eq!(at(&regs.ch[1].cfg1), 0x10);
        assert_eq!(at(&regs.data[1]), 0x18);
    }
}
