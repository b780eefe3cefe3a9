//! Cordio TC2 boot image header
//!
//! Every image loaded by the Cordio boot ROM starts with a fixed 24-byte,
//! little-endian header:
//!
//! ```text
//! offset  size  field
//! 0       4     cookie     0x30444D53
//! 4       1     hdrLen     24
//! 5       1     type       see ImageType
//! 6       1     revMajor
//! 7       1     revMinor
//! 8       4     dataLen    bits 0-23 length, bit 30 encrypted
//! 12      4     offset     destination address
//! 16      4     entry      entry point
//! 20      4     crc        CRC-32 over header bytes 0-19 and the data
//! ```
//!
//! ```
//! use cordio_img::{ImageType, ImgHdr};
//!
//! let data = [0xde, 0xad, 0xbe, 0xef];
//! let hdr = ImgHdr::build(ImageType::Bt4Patch, (1, 2), 0x2000_0000, 0x2000_0001, false, &data).unwrap();
//! let bytes = hdr.to_bytes();
//! let parsed = ImgHdr::parse(&bytes).unwrap();
//! assert_eq!(parsed, hdr);
//! parsed.verify(&data).unwrap();
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod crc;
mod header;

pub use header::{DataLen, ImageType, ImgHdr, COOKIE, DATA_LEN_MASK, ENCRYPTED_BIT, HDR_LEN};

use mcu_hal_common::result::{module, ResultCode, Rslt, RsltType};

/// Header errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Fewer than [`HDR_LEN`] bytes.
    TooShort,
    /// The cookie isn't [`COOKIE`].
    BadCookie,
    /// The header length field isn't [`HDR_LEN`].
    BadHeaderLength(u8),
    /// Unknown image type.
    UnknownType(u8),
    /// The data length doesn't fit in 24 bits, or reserved length bits
    /// are set.
    LengthOverflow,
    /// The data isn't as long as the header says.
    DataLength,
    /// The checksum doesn't match.
    CrcMismatch,
}

impl ResultCode for Error {
    fn rslt(&self) -> Rslt {
        let code = match self {
            Error::TooShort => 0,
            Error::BadCookie => 1,
            Error::BadHeaderLength(_) => 2,
            Error::UnknownType(_) => 3,
            Error::LengthOverflow => 4,
            Error::DataLength => 5,
            Error::CrcMismatch => 6,
        };
        Rslt::create(RsltType::Error, module::IMAGE, code)
    }
}
