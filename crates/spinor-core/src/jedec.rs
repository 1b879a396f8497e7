//! JEDEC identity and manufacturer codes

use core::fmt;

/// JEDEC manufacturer IDs the driver branches on
///
/// Some codes are shared between vendors (Atmel/Adesto, XMC/ST); the
/// driver only ever matches on the raw byte.
pub mod mfr {
    /// Spansion / Cypress / Infineon
    pub const SPANSION: u8 = 0x01;
    /// XTX Technology
    pub const XTX: u8 = 0x0B;
    /// Atmel
    pub const ATMEL: u8 = 0x1F;
    /// Adesto (inherited the Atmel code)
    pub const ADESTO: u8 = 0x1F;
    /// Wuhan Xinxin (XMC)
    pub const XMC: u8 = 0x20;
    /// Elite Semiconductor (ESMT)
    pub const ESMT: u8 = 0x8C;
    /// SST / Microchip
    pub const SST: u8 = 0xBF;
    /// Macronix
    pub const MACRONIX: u8 = 0xC2;
    /// GigaDevice
    pub const GIGADEVICE: u8 = 0xC8;
    /// Winbond
    pub const WINBOND: u8 = 0xEF;
}

/// The three bytes returned by the read-ID command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlashIdentity {
    /// JEDEC manufacturer ID
    pub manufacturer: u8,
    /// Memory type byte
    pub memory_type: u8,
    /// Capacity code (log2 of the size in bytes on most parts)
    pub capacity: u8,
}

impl FlashIdentity {
    /// Create an identity from the three ID bytes
    pub const fn new(manufacturer: u8, memory_type: u8, capacity: u8) -> Self {
        Self {
            manufacturer,
            memory_type,
            capacity,
        }
    }

    /// Create an identity from the raw read-ID response
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// The raw ID bytes
    pub const fn to_bytes(&self) -> [u8; 3] {
        [self.manufacturer, self.memory_type, self.capacity]
    }

    /// True if the ID is exactly the given triple
    pub const fn is(&self, manufacturer: u8, memory_type: u8, capacity: u8) -> bool {
        self.manufacturer == manufacturer
            && self.memory_type == memory_type
            && self.capacity == capacity
    }

    /// Size in bytes derived from the capacity code, if it looks sane
    pub fn size_bytes(&self) -> Option<u32> {
        match self.capacity {
            0x10..=0x1F => Some(1u32 << self.capacity),
            _ => None,
        }
    }

    /// Human readable vendor name
    pub fn vendor_name(&self) -> &'static str {
        match self.manufacturer {
            mfr::SPANSION => "Spansion",
            mfr::XTX => "XTX",
            mfr::ATMEL => "Atmel/Adesto",
            mfr::XMC => "XMC",
            mfr::ESMT => "ESMT",
            mfr::SST => "SST",
            mfr::MACRONIX => "Macronix",
            mfr::GIGADEVICE => "GigaDevice",
            mfr::WINBOND => "Winbond",
            _ => "unknown",
        }
    }
}

impl fmt::Display for FlashIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x} {:02x} {:02x}",
            self.manufacturer, self.memory_type, self.capacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_size_from_capacity() {
        assert_eq!(FlashIdentity::new(0xC8, 0x40, 0x18).size_bytes(), Some(16 << 20));
        assert_eq!(FlashIdentity::new(0xEF, 0x40, 0x19).size_bytes(), Some(32 << 20));
        assert_eq!(FlashIdentity::new(0x9D, 0x60, 0x39).size_bytes(), None);
    }

    #[test]
    fn test_display_and_match() {
        let id = FlashIdentity::from_bytes([0xC2, 0x20, 0x1A]);
        assert_eq!(id.to_string(), "c2 20 1a");
        assert!(id.is(0xC2, 0x20, 0x1A));
        assert!(!id.is(0xC2, 0x20, 0x18));
        assert_eq!(id.vendor_name(), "Macronix");
    }
}
