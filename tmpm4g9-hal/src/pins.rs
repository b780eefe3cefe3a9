//! I2C pin map
//!
//! Port pins are named by port letter and pin number, `PG2` being port G,
//! pin 2. Each SDA and SCL pin belongs to exactly one I2C channel.

/// A GPIO port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    J,
    K,
    L,
    M,
    N,
    P,
    R,
    T,
    U,
    V,
    W,
    Y,
}

/// A port pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinName {
    /// Port.
    pub port: Port,
    /// Pin inside the port.
    pub pin: u8,
}

impl PinName {
    /// Names pin `pin` of `port`.
    pub const fn new(port: Port, pin: u8) -> Self {
        Self { port, pin }
    }
}

macro_rules! i2c_pins {
    ($($i2c:literal {
        $($sda:ident = $sda_port:ident $sda_pin:literal, $scl:ident = $scl_port:ident $scl_pin:literal;)+
    })+) => {
        $($(
            #[doc = concat!("Port ", stringify!($sda_port), " pin ", $sda_pin, ", I2C", $i2c, " SDA.")]
            pub const $sda: PinName = PinName::new(Port::$sda_port, $sda_pin);
            #[doc = concat!("Port ", stringify!($scl_port), " pin ", $scl_pin, ", I2C", $i2c, " SCL.")]
            pub const $scl: PinName = PinName::new(Port::$scl_port, $scl_pin);
        )+)+

        const SDA: &[(PinName, u8)] = &[$($(($sda, $i2c),)+)+];
        const SCL: &[(PinName, u8)] = &[$($(($scl, $i2c),)+)+];
    };
}

i2c_pins! {
    0 {
        PG2 = G 2, PG3 = G 3;
        PA4 = A 4, PA5 = A 5;
    }
    1 {
        PF2 = F 2, PF3 = F 3;
        PK2 = K 2, PK3 = K 3;
    }
    2 {
        PG4 = G 4, PG5 = G 5;
        PL0 = L 0, PL1 = L 1;
    }
}

/// I2C channel `pin` can be SDA of.
pub fn sda_instance(pin: PinName) -> Option<u8> {
    lookup(SDA, pin)
}

/// I2C channel `pin` can be SCL of.
pub fn scl_instance(pin: PinName) -> Option<u8> {
    lookup(SCL, pin)
}

fn lookup(table: &[(PinName, u8)], pin: PinName) -> Option<u8> {
    table.iter().find(|(p, _)| *p == pin).map(|&(_, i2c)| i2c)
}

/// The I2C channel serving an SDA and SCL pair, if both pins belong to the
/// same one.
pub fn i2c_instance(sda: PinName, scl: PinName) -> Option<u8> {
    match (sda_instance(sda), scl_instance(scl)) {
        (Some(a), Some(b)) if a == b => Some(a),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs() {
        assert_eq!(i2c_instance(PG2, PG3), Some(0));
        assert_eq!(i2c_instance(PA4, PG3), Some(0));
        assert_eq!(i2c_instance(PK2, PF3), Some(1));
        assert_eq!(i2c_instance(PL0, PL1), Some(2));
        assert_eq!(i2c_instance(PG2, PG5), None);
        assert_eq!(i2c_instance(PG3, PG2), None);
        assert_eq!(sda_instance(PinName::new(Port::Y, 0)), None);
    }
}
