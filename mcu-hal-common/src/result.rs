//! Packed 32-bit result codes
//!
//! Drivers report failures through their own error enums. For callers that
//! need a single integer, every driver error also maps onto an [`Rslt`],
//! which packs a severity, the reporting module and a module specific code:
//!
//! ```text
//!  31  30 29                   18 17 16 15                            0
//! +------+-----------------------+-----+-------------------------------+
//! |  0   |        module         | type|             code              |
//! +------+-----------------------+-----+-------------------------------+
//! ```
//!
//! `0` is success.

/// Severity of a result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RsltType {
    /// Informational, not an error.
    Info = 0,
    /// The operation completed, but something noteworthy happened.
    Warning = 1,
    /// The operation failed.
    Error = 2,
    /// The operation cannot succeed on this hardware.
    Fatal = 3,
}

/// Module identifiers used in [`Rslt::module`].
pub mod module {
    /// Hardware resource manager.
    pub const HWMGR: u16 = 0x100;
    /// Trigger multiplexer.
    pub const TRIGGER: u16 = 0x101;
    /// DMA.
    pub const DMA: u16 = 0x102;
    /// Analog to digital converter.
    pub const ADC: u16 = 0x103;
    /// Digital to analog converter.
    pub const DAC: u16 = 0x104;
    /// Timer / counter / PWM.
    pub const TCPWM: u16 = 0x105;
    /// I2C controller.
    pub const I2C: u16 = 0x106;
    /// Boot image handling.
    pub const IMAGE: u16 = 0x107;
}

/// A packed result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rslt(pub u32);

const TYPE_POS: u32 = 16;
const TYPE_MASK: u32 = 0x3;
const MODULE_POS: u32 = 18;
const MODULE_MASK: u32 = 0xfff;
const CODE_MASK: u32 = 0xffff;

impl Rslt {
    /// The success code.
    pub const SUCCESS: Rslt = Rslt(0);

    /// Packs a result code.
    pub const fn create(ty: RsltType, module: u16, code: u16) -> Self {
        Rslt(
            ((ty as u32 & TYPE_MASK) << TYPE_POS)
                | ((module as u32 & MODULE_MASK) << MODULE_POS)
                | (code as u32 & CODE_MASK),
        )
    }

    /// `true` for [`Rslt::SUCCESS`].
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Severity field.
    pub const fn ty(self) -> RsltType {
        match (self.0 >> TYPE_POS) & TYPE_MASK {
            0 => RsltType::Info,
            1 => RsltType::Warning,
            2 => RsltType::Error,
            _ => RsltType::Fatal,
        }
    }

    /// Module field.
    pub const fn module(self) -> u16 {
        ((self.0 >> MODULE_POS) & MODULE_MASK) as u16
    }

    /// Module specific code.
    pub const fn code(self) -> u16 {
        (self.0 & CODE_MASK) as u16
    }
}

/// Implemented by every driver error type.
pub trait ResultCode {
    /// The packed result code for this error.
    fn rslt(&self) -> Rslt;
}

impl<T, E: ResultCode> ResultCode for Result<T, E> {
    fn rslt(&self) -> Rslt {
        match self {
            Ok(_) => Rslt::SUCCESS,
            Err(e) => e.rslt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack() {
        let r = Rslt::create(RsltType::Fatal, module::DMA, 7);
        assert_eq!(r.ty(), RsltType::Fatal);
        assert_eq!(r.module(), module::DMA);
        assert_eq!(r.code(), 7);
        assert!(!r.is_ok());
    }

    #[test]
    fn success_is_zero() {
        assert!(Rslt::SUCCESS.is_ok());
        let ok: Result<(), Never> = Ok(());
        assert_eq!(ok.rslt(), Rslt::SUCCESS);
    }

    enum Never {}

    impl ResultCode for Never {
        fn rslt(&self) -> Rslt {
            match *self {}
        }
    }
}
