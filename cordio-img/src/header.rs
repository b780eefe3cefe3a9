use crate::{crc::Crc32, Error};

/// Value of the first header word.
pub const COOKIE: u32 = 0x3044_4d53;
/// Header size in bytes, also the value of the `hdrLen` field.
pub const HDR_LEN: usize = 24;
/// Length bits of the `dataLen` word.
pub const DATA_LEN_MASK: u32 = 0x00ff_ffff;
/// Bit of the `dataLen` word flagging encrypted data.
pub const ENCRYPTED_BIT: u32 = 30;

/// Header bytes covered by the CRC.
const CRC_COVERED: usize = 20;

/// What the image holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ImageType {
    /// Host firmware.
    HostFirmware = 0,
    /// Bluetooth controller firmware.
    Bt4Firmware = 1,
    /// Bluetooth controller patch.
    Bt4Patch = 2,
    /// Bluetooth controller trim data.
    Bt4Trim = 3,
    /// Host configuration.
    HostConfig = 4,
}

impl TryFrom<u8> for ImageType {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self, Error> {
        Ok(match v {
            0 => ImageType::HostFirmware,
            1 => ImageType::Bt4Firmware,
            2 => ImageType::Bt4Patch,
            3 => ImageType::Bt4Trim,
            4 => ImageType::HostConfig,
            _ => return Err(Error::UnknownType(v)),
        })
    }
}

bitfield::bitfield! {
    /// The `dataLen` word.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct DataLen(u32);
    impl Debug;
    /// Length of the data following the header.
    pub u32, len, set_len: 23, 0;
    /// The data is encrypted.
    pub encrypted, set_encrypted: 30;
}

impl DataLen {
    /// Returns `true` if bits outside the length and the encrypted flag
    /// are set.
    pub fn has_reserved_bits(&self) -> bool {
        self.0 & !(DATA_LEN_MASK | (1 << ENCRYPTED_BIT)) != 0
    }
}

/// A decoded image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImgHdr {
    /// Image type.
    pub image_type: ImageType,
    /// Major revision.
    pub rev_major: u8,
    /// Minor revision.
    pub rev_minor: u8,
    /// Length of the data following the header, at most 24 bits.
    pub data_len: u32,
    /// The data is encrypted.
    pub encrypted: bool,
    /// Address the data is copied to.
    pub offset: u32,
    /// Execution entry point.
    pub entry: u32,
    /// CRC-32 over the first 20 header bytes and the data.
    pub crc: u32,
}

fn le32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

impl ImgHdr {
    /// Decodes the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let b = bytes.get(..HDR_LEN).ok_or(Error::TooShort)?;
        if le32(b, 0) != COOKIE {
            return Err(Error::BadCookie);
        }
        if b[4] as usize != HDR_LEN {
            return Err(Error::BadHeaderLength(b[4]));
        }
        let image_type = ImageType::try_from(b[5])?;
        let len = DataLen(le32(b, 8));
        if len.has_reserved_bits() {
            return Err(Error::LengthOverflow);
        }
        Ok(ImgHdr {
            image_type,
            rev_major: b[6],
            rev_minor: b[7],
            data_len: len.len(),
            encrypted: len.encrypted(),
            offset: le32(b, 12),
            entry: le32(b, 16),
            crc: le32(b, 20),
        })
    }

    /// Builds the header for `data`, filling in its length and CRC.
    pub fn build(
        image_type: ImageType,
        (rev_major, rev_minor): (u8, u8),
        offset: u32,
        entry: u32,
        encrypted: bool,
        data: &[u8],
    ) -> Result<Self, Error> {
        let data_len = u32::try_from(data.len())
            .ok()
            .filter(|&l| l <= DATA_LEN_MASK)
            .ok_or(Error::LengthOverflow)?;
        let mut hdr = ImgHdr {
            image_type,
            rev_major,
            rev_minor,
            data_len,
            encrypted,
            offset,
            entry,
            crc: 0,
        };
        hdr.crc = hdr.compute_crc(data);
        Ok(hdr)
    }

    /// The `dataLen` word.
    ///
    /// Only the low 24 bits of `data_len` fit. Headers from [`ImgHdr::build`]
    /// and [`ImgHdr::parse`] always satisfy this, a hand-built one with a
    /// longer length is truncated in release builds.
    pub fn data_len_word(&self) -> DataLen {
        debug_assert!(
            self.data_len <= DATA_LEN_MASK,
            "data length {} doesn't fit in 24 bits",
            self.data_len
        );
        let mut w = DataLen(0);
        w.set_len(self.data_len & DATA_LEN_MASK);
        w.set_encrypted(self.encrypted);
        w
    }

    /// Encodes the header.
    pub fn to_bytes(&self) -> [u8; HDR_LEN] {
        let mut b = [0; HDR_LEN];
        b[0..4].copy_from_slice(&COOKIE.to_le_bytes());
        b[4] = HDR_LEN as u8;
        b[5] = self.image_type as u8;
        b[6] = self.rev_major;
        b[7] = self.rev_minor;
        b[8..12].copy_from_slice(&self.data_len_word().0.to_le_bytes());
        b[12..16].copy_from_slice(&self.offset.to_le_bytes());
        b[16..20].copy_from_slice(&self.entry.to_le_bytes());
        b[20..24].copy_from_slice(&self.crc.to_le_bytes());
        b
    }

    /// CRC over this header's first 20 bytes followed by `data`.
    pub fn compute_crc(&self, data: &[u8]) -> u32 {
        let mut crc = Crc32::new();
        crc.update(&self.to_bytes()[..CRC_COVERED]);
        crc.update(data);
        crc.finalise()
    }

    /// Checks `data` against the length and CRC recorded in the header.
    pub fn verify(&self, data: &[u8]) -> Result<(), Error> {
        if data.len() != self.data_len as usize {
            return Err(Error::DataLength);
        }
        if self.compute_crc(data) != self.crc {
            #[cfg(feature = "defmt")]
            defmt::warn!("image crc mismatch: header {=u32:#x}", self.crc);
            return Err(Error::CrcMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc32;

    const RAW: [u8; HDR_LEN] = [
        0x53, 0x4d, 0x44, 0x30, // cookie
        24, 2, 1, 7, // hdrLen, type, revMajor, revMinor
        0x04, 0x00, 0x00, 0x40, // dataLen: 4, encrypted
        0x00, 0x10, 0x00, 0x20, // offset
        0x01, 0x10, 0x00, 0x20, // entry
        0x78, 0x56, 0x34, 0x12, // crc
    ];

    #[test]
    fn parse_fields() {
        let hdr = ImgHdr::parse(&RAW).unwrap();
        assert_eq!(
            hdr,
            ImgHdr {
                image_type: ImageType::Bt4Patch,
                rev_major: 1,
                rev_minor: 7,
                data_len: 4,
                encrypted: true,
                offset: 0x2000_1000,
                entry: 0x2000_1001,
                crc: 0x1234_5678,
            }
        );
        assert_eq!(hdr.to_bytes(), RAW);
    }

    #[test]
    fn parse_ignores_trailing_data() {
        let mut image = [0xaa; HDR_LEN + 4];
        image[..HDR_LEN].copy_from_slice(&RAW);
        assert_eq!(ImgHdr::parse(&image).unwrap().data_len, 4);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(ImgHdr::parse(&RAW[..23]), Err(Error::TooShort));

        let mut b = RAW;
        b[3] = 0x31;
        assert_eq!(ImgHdr::parse(&b), Err(Error::BadCookie));

        let mut b = RAW;
        b[4] = 20;
        assert_eq!(ImgHdr::parse(&b), Err(Error::BadHeaderLength(20)));

        let mut b = RAW;
        b[5] = 5;
        assert_eq!(ImgHdr::parse(&b), Err(Error::UnknownType(5)));

        let mut b = RAW;
        b[11] = 0x01;
        assert_eq!(ImgHdr::parse(&b), Err(Error::LengthOverflow));
    }

    #[test]
    fn data_len_word() {
        let w = DataLen(0x40ab_cdef);
        assert_eq!(w.len(), 0xab_cdef);
        assert!(w.encrypted());
        assert!(!w.has_reserved_bits());
        assert!(DataLen(0x8000_0000).has_reserved_bits());
    }

    #[test]
    fn crc_covers_header_and_data() {
        let data = [1, 2, 3, 4, 5];
        let hdr = ImgHdr::build(ImageType::HostFirmware, (3, 0), 0, 0x101, false, &data).unwrap();
        assert_eq!(hdr.data_len, 5);

        let mut image = [0; CRC_COVERED + 5];
        image[..CRC_COVERED].copy_from_slice(&hdr.to_bytes()[..CRC_COVERED]);
        image[CRC_COVERED..].copy_from_slice(&data);
        assert_eq!(hdr.crc, crc32(&image));
        assert_eq!(hdr.verify(&data), Ok(()));

        assert_eq!(hdr.verify(&data[..4]), Err(Error::DataLength));
        assert_eq!(hdr.verify(&[1, 2, 3, 4, 6]), Err(Error::CrcMismatch));

        let mut tampered = hdr;
        tampered.entry = 0x201;
        assert_eq!(tampered.verify(&data), Err(Error::CrcMismatch));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "doesn't fit in 24 bits")]
    fn oversized_length_is_caught() {
        let hdr = ImgHdr {
            data_len: DATA_LEN_MASK + 1,
            ..ImgHdr::parse(&RAW).unwrap()
        };
        hdr.to_bytes();
    }

    #[test]
    fn type_codes() {
        for v in 0..=4u8 {
            assert_eq!(ImageType::try_from(v).unwrap() as u8, v);
        }
        assert_eq!(ImageType::try_from(0xff), Err(Error::UnknownType(0xff)));
    }
}
