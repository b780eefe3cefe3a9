//! Analog pin map
//!
//! The analog drivers only need to know which port pins are wired to the
//! SAR input mux and to the CTDAC output. Pins are named by port and pin
//! number, `P10_3` being port 10, pin 3.

/// A port pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinName {
    /// Port number.
    pub port: u8,
    /// Pin inside the port.
    pub pin: u8,
}

impl PinName {
    /// Names pin `pin` of port `port`.
    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }
}

macro_rules! pin_names {
    ($($name:ident: $port:literal, $pin:literal;)+) => {
        $(
            #[doc = concat!("Port ", $port, " pin ", $pin, ".")]
            pub const $name: PinName = PinName::new($port, $pin);
        )+
    };
}

pin_names! {
    P9_6: 9, 6;
    P10_0: 10, 0;
    P10_1: 10, 1;
    P10_2: 10, 2;
    P10_3: 10, 3;
    P10_4: 10, 4;
    P10_5: 10, 5;
    P10_6: 10, 6;
    P10_7: 10, 7;
}

/// Port dedicated to the SAR input mux.
const SAR_PORT: u8 = 10;

/// SAR mux address of `pin`, if the pin can be sampled.
pub fn sar_address(pin: PinName) -> Option<u8> {
    (pin.port == SAR_PORT && pin.pin < 8).then_some(pin.pin)
}

/// Returns `true` if `pin` is the CTDAC output.
pub fn is_ctdac_output(pin: PinName) -> bool {
    pin == P9_6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sar_pins() {
        assert_eq!(sar_address(P10_0), Some(0));
        assert_eq!(sar_address(P10_7), Some(7));
        assert_eq!(sar_address(PinName::new(10, 8)), None);
        assert_eq!(sar_address(P9_6), None);
    }

    #[test]
    fn dac_pin() {
        assert!(is_ctdac_output(P9_6));
        assert!(!is_ctdac_output(P10_0));
    }
}
