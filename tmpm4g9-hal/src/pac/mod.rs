//! Register blocks and peripheral handles

pub mod i2c;

mcu_hal_common::peripherals! {
    I2C0: i2c @ 0x400d_1000, "I2C channel 0";
    I2C1: i2c @ 0x400d_2000, "I2C channel 1";
    I2C2: i2c @ 0x400d_3000, "I2C channel 2";
}

/// A register block allocated in RAM, for exercising drivers off-target.
#[cfg(test)]
pub(crate) fn detached<T>() -> std::boxed::Box<T> {
    // Safety: register blocks only contain `Reg` cells, for which
    // all-zeroes is a valid value.
    std::boxed::Box::new(unsafe { core::mem::zeroed() })
}
