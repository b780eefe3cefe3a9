//! Volatile register cells and bit-fields
//!
//! Register blocks in the chip crates are `#[repr(C)]` structs built from
//! [`Reg`]. A block is normally reached through a peripheral handle that
//! dereferences to a fixed MMIO address, but since a block is just memory it
//! can also live in RAM, which is how the drivers are exercised on the host.
//!
//! ```
//! use mcu_hal_common::reg::{Field, Reg};
//!
//! const PRIO: Field = Field::new(16, 2);
//! const ENABLED: Field = Field::bit(31);
//!
//! let ctl = Reg::new(0);
//! ctl.write(PRIO.val(3) | ENABLED.mask());
//! assert_eq!(ctl.read_field(PRIO), 3);
//! ctl.clear_bits(ENABLED.mask());
//! assert!(!ctl.is_set(ENABLED.mask()));
//! ```

use vcell::VolatileCell;

/// A contiguous bit-field inside a 32-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    /// Position of the least significant bit.
    pub offset: u8,
    /// Number of bits.
    pub width: u8,
}

impl Field {
    /// A field of `width` bits starting at bit `offset`.
    pub const fn new(offset: u8, width: u8) -> Self {
        assert!(width > 0 && offset as u32 + width as u32 <= 32);
        Self { offset, width }
    }

    /// A single-bit field.
    pub const fn bit(offset: u8) -> Self {
        Self::new(offset, 1)
    }

    /// The field's mask, in register position.
    pub const fn mask(self) -> u32 {
        let ones = if self.width == 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        };
        ones << self.offset
    }

    /// Largest value the field can hold.
    pub const fn max(self) -> u32 {
        self.mask() >> self.offset
    }

    /// `value` shifted into field position. Bits that don't fit are dropped.
    pub const fn val(self, value: u32) -> u32 {
        (value << self.offset) & self.mask()
    }

    /// Extracts the field from a whole register value.
    pub const fn get(self, register: u32) -> u32 {
        (register & self.mask()) >> self.offset
    }

    /// Replaces the field inside a whole register value.
    pub const fn set(self, register: u32, value: u32) -> u32 {
        (register & !self.mask()) | self.val(value)
    }
}

/// A 32-bit memory mapped register.
#[repr(transparent)]
pub struct Reg {
    cell: VolatileCell<u32>,
}

impl Reg {
    /// Creates a register holding `value`.
    ///
    /// Only useful for register blocks that live in RAM.
    pub const fn new(value: u32) -> Self {
        Self {
            cell: VolatileCell::new(value),
        }
    }

    /// Volatile read of the whole register.
    #[inline(always)]
    pub fn read(&self) -> u32 {
        self.cell.get()
    }

    /// Volatile write of the whole register.
    #[inline(always)]
    pub fn write(&self, value: u32) {
        self.cell.set(value)
    }

    /// Read-modify-write.
    ///
    /// Not atomic: callers sharing a register with interrupt handlers must
    /// wrap this in a critical section.
    #[inline(always)]
    pub fn modify(&self, f: impl FnOnce(u32) -> u32) {
        self.write(f(self.read()))
    }

    /// Sets every bit in `mask`.
    #[inline]
    pub fn set_bits(&self, mask: u32) {
        self.modify(|r| r | mask)
    }

    /// Clears every bit in `mask`.
    #[inline]
    pub fn clear_bits(&self, mask: u32) {
        self.modify(|r| r & !mask)
    }

    /// Returns `true` if any bit of `mask` is set.
    #[inline]
    pub fn is_set(&self, mask: u32) -> bool {
        self.read() & mask != 0
    }

    /// Reads a single field.
    #[inline]
    pub fn read_field(&self, field: Field) -> u32 {
        field.get(self.read())
    }

    /// Updates a single field, leaving the rest of the register untouched.
    #[inline]
    pub fn write_field(&self, field: Field, value: u32) {
        self.modify(|r| field.set(r, value))
    }

    /// Raw pointer to the register, e.g. for handing its address to a DMA engine.
    pub fn as_ptr(&self) -> *mut u32 {
        self.cell.as_ptr()
    }
}

impl core::fmt::Debug for Reg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Reg({:#010x})", self.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_masks() {
        assert_eq!(Field::new(0, 32).mask(), u32::MAX);
        assert_eq!(Field::new(4, 3).mask(), 0b111_0000);
        assert_eq!(Field::bit(31).mask(), 0x8000_0000);
        assert_eq!(Field::new(8, 8).max(), 0xff);
    }

    #[test]
    fn val_truncates_to_width() {
        let f = Field::new(4, 2);
        assert_eq!(f.val(0b111), 0b11_0000);
        assert_eq!(f.get(0xffff_ffff), 0b11);
    }

    #[test]
    fn write_field_preserves_neighbours() {
        let r = Reg::new(0xffff_0000);
        r.write_field(Field::new(0, 8), 0x5a);
        assert_eq!(r.read(), 0xffff_005a);
        r.write_field(Field::new(16, 8), 0);
        assert_eq!(r.read(), 0xff00_005a);
    }

    #[test]
    fn set_and_clear_bits() {
        let r = Reg::new(0);
        r.set_bits(0b1010);
        assert!(r.is_set(0b0010));
        r.clear_bits(0b0010);
        assert_eq!(r.read(), 0b1000);
    }
}
