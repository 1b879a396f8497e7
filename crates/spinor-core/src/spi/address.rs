//! Address width types

use core::fmt;

/// Address width negotiated with the chip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// 3-byte (24-bit) address - supports up to 16 MiB
    #[default]
    ThreeByte,
    /// 4-byte (32-bit) address - supports up to 4 GiB
    FourByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> usize {
        match self {
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Returns true if `address` fits in this width without truncation
    pub const fn reaches(&self, address: u32) -> bool {
        match self {
            Self::ThreeByte => address < (1 << 24),
            Self::FourByte => true,
        }
    }

    /// Encode an address into bytes, most significant first
    ///
    /// `buf` must hold at least [`bytes`](Self::bytes) bytes. Bits above
    /// the width are dropped, as the chip would.
    pub fn encode(&self, address: u32, buf: &mut [u8]) {
        match self {
            Self::ThreeByte => {
                buf[0] = (address >> 16) as u8;
                buf[1] = (address >> 8) as u8;
                buf[2] = address as u8;
            }
            Self::FourByte => {
                buf[0] = (address >> 24) as u8;
                buf[1] = (address >> 16) as u8;
                buf[2] = (address >> 8) as u8;
                buf[3] = address as u8;
            }
        }
    }
}

impl fmt::Display for AddressWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreeByte => write!(f, "3-byte"),
            Self::FourByte => write!(f, "4-byte"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reach() {
        assert!(AddressWidth::ThreeByte.reaches(0x00FF_FFFF));
        assert!(!AddressWidth::ThreeByte.reaches(0x0100_0000));
        assert!(AddressWidth::FourByte.reaches(0x0100_0000));
        assert!(AddressWidth::FourByte.reaches(u32::MAX));
    }

    #[test]
    fn test_encode_truncates_to_width() {
        let mut buf = [0u8; 4];
        AddressWidth::ThreeByte.encode(0x0112_3456, &mut buf);
        assert_eq!(&buf[..3], &[0x12, 0x34, 0x56]);

        AddressWidth::FourByte.encode(0x0112_3456, &mut buf);
        assert_eq!(buf, [0x01, 0x12, 0x34, 0x56]);
    }
}
