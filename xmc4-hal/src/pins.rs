//! Analog pin map
//!
//! Ports 14 and 15 are the analog input ports. Every input reaches exactly
//! one VADC group channel; P14.8 and P14.9 double as the DAC outputs.

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

/// A VADC input: conversion group and channel inside the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VadcInput {
    /// Group, 0 to 3.
    pub group: u8,
    /// Channel inside the group, 0 to 7.
    pub channel: u8,
}

macro_rules! analog_pins {
    ($($name:ident: $port:literal, $pin:literal => ($group:literal, $ch:literal);)+) => {
        $(
            #[doc = concat!("Port ", $port, " pin ", $pin, ", VADC group ", $group, " channel ", $ch, ".")]
            pub const $name: PinName = PinName::new($port, $pin);
        )+

        const VADC_PINS: &[(PinName, VadcInput)] = &[
            $(($name, VadcInput { group: $group, channel: $ch }),)+
        ];
    };
}

analog_pins! {
    P14_0: 14, 0 => (0, 0);
    P14_1: 14, 1 => (0, 1);
    P14_2: 14, 2 => (0, 2);
    P14_3: 14, 3 => (0, 3);
    P14_4: 14, 4 => (0, 4);
    P14_5: 14, 5 => (0, 5);
    P14_6: 14, 6 => (0, 6);
    P14_7: 14, 7 => (0, 7);
    P14_8: 14, 8 => (1, 0);
    P14_9: 14, 9 => (1, 1);
    P14_12: 14, 12 => (1, 4);
    P14_13: 14, 13 => (1, 5);
    P14_14: 14, 14 => (1, 6);
    P14_15: 14, 15 => (1, 7);
    P15_2: 15, 2 => (2, 2);
    P15_3: 15, 3 => (2, 3);
    P15_4: 15, 4 => (2, 4);
    P15_5: 15, 5 => (2, 5);
    P15_6: 15, 6 => (2, 6);
    P15_7: 15, 7 => (2, 7);
    P15_8: 15, 8 => (3, 0);
    P15_9: 15, 9 => (3, 1);
    P15_10: 15, 10 => (3, 2);
    P15_11: 15, 11 => (3, 3);
    P15_12: 15, 12 => (3, 4);
    P15_13: 15, 13 => (3, 5);
    P15_14: 15, 14 => (3, 6);
    P15_15: 15, 15 => (3, 7);
}

const DAC_PINS: [PinName; 2] = [P14_8, P14_9];

/// VADC group and channel sampling `pin`.
pub fn vadc_input(pin: PinName) -> Option<VadcInput> {
    VADC_PINS
        .iter()
        .find(|(p, _)| *p == pin)
        .map(|&(_, input)| input)
}

/// DAC channel driving `pin`.
pub fn dac_channel(pin: PinName) -> Option<usize> {
    DAC_PINS.iter().position(|&p| p == pin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vadc_lookup() {
        assert_eq!(vadc_input(P14_0), Some(VadcInput { group: 0, channel: 0 }));
        assert_eq!(vadc_input(P14_13), Some(VadcInput { group: 1, channel: 5 }));
        assert_eq!(vadc_input(P15_2), Some(VadcInput { group: 2, channel: 2 }));
        assert_eq!(vadc_input(P15_15), Some(VadcInput { group: 3, channel: 7 }));
        assert_eq!(vadc_input(PinName::new(14, 10)), None);
        assert_eq!(vadc_input(PinName::new(0, 0)), None);
    }

    #[test]
    fn dac_outputs_are_also_inputs() {
        assert_eq!(dac_channel(P14_8), Some(0));
        assert_eq!(dac_channel(P14_9), Some(1));
        assert_eq!(dac_channel(P14_0), None);
        assert!(vadc_input(P14_9).is_some());
    }
}
