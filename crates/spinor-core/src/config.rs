//! Boot configuration consumed by the init sequence
//!
//! The boot header handed over by the ROM may carry an SPI-NOR parameter
//! block ([`SpinorInfo`]). When it does, the requested read mode and the
//! declared flash size drive opcode and address width selection. When it
//! does not, the header only contributes a raw read opcode (the legacy
//! layout) and the driver stays in 3-byte mode.
//!
//! With the `std` feature a configuration can also be loaded from TOML:
//!
//! ```toml
//! read_opcode = 0x0b
//!
//! [spinor]
//! read_mode = "quad"
//! flash_size = 32
//! ```

use crate::spi::{opcodes, ReadMode};

/// Declared `flash_size` above which 4-byte addressing is attempted
///
/// The unit is the one used by the platform boot header (MiB on sunxi),
/// so parts above 16 MiB qualify.
pub const FOUR_BYTE_SIZE_THRESHOLD: u32 = 16;

/// SPI-NOR parameter block from the boot header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SpinorInfo {
    /// Requested read mode; `None` keeps the fast-read default
    #[cfg_attr(feature = "std", serde(default))]
    pub read_mode: Option<ReadMode>,
    /// Declared flash size in platform units
    #[cfg_attr(feature = "std", serde(default))]
    pub flash_size: u32,
}

impl SpinorInfo {
    /// True if the declared size calls for 4-byte addressing
    pub const fn wants_4byte(&self) -> bool {
        self.flash_size > FOUR_BYTE_SIZE_THRESHOLD
    }
}

/// Everything the init sequence reads from the boot environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BootConfig {
    /// Raw read opcode from the legacy boot header
    #[cfg_attr(feature = "std", serde(default = "default_read_opcode"))]
    pub read_opcode: u8,
    /// SPI-NOR parameter block, if the header carries one
    #[cfg_attr(feature = "std", serde(default))]
    pub spinor: Option<SpinorInfo>,
}

#[cfg(feature = "std")]
fn default_read_opcode() -> u8 {
    opcodes::FAST_READ
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            read_opcode: opcodes::FAST_READ,
            spinor: None,
        }
    }
}

impl BootConfig {
    /// Legacy header carrying only a raw read opcode
    pub const fn legacy(read_opcode: u8) -> Self {
        Self {
            read_opcode,
            spinor: None,
        }
    }

    /// Header with an SPI-NOR parameter block
    pub const fn with_spinor(read_mode: Option<ReadMode>, flash_size: u32) -> Self {
        Self {
            read_opcode: opcodes::FAST_READ,
            spinor: Some(SpinorInfo {
                read_mode,
                flash_size,
            }),
        }
    }

    /// The read opcode requested before any chip negotiation
    ///
    /// A parameter block with a read mode wins over the raw opcode.
    pub fn requested_read_opcode(&self) -> u8 {
        match self.spinor.and_then(|info| info.read_mode) {
            Some(mode) => mode.opcode(),
            None => self.read_opcode,
        }
    }

    /// Parse a configuration from TOML text
    #[cfg(feature = "std")]
    pub fn from_toml_str(s: &str) -> core::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fast_read_legacy() {
        let config = BootConfig::default();
        assert_eq!(config.requested_read_opcode(), opcodes::FAST_READ);
        assert!(config.spinor.is_none());
    }

    #[test]
    fn test_read_mode_overrides_raw_opcode() {
        let mut config = BootConfig::with_spinor(Some(ReadMode::Dual), 16);
        config.read_opcode = opcodes::READ;
        assert_eq!(config.requested_read_opcode(), opcodes::DOR);
    }

    #[test]
    fn test_spinor_without_mode_keeps_raw_opcode() {
        let config = BootConfig::with_spinor(None, 32);
        assert_eq!(config.requested_read_opcode(), opcodes::FAST_READ);
    }

    #[test]
    fn test_size_threshold() {
        assert!(!SpinorInfo { read_mode: None, flash_size: 16 }.wants_4byte());
        assert!(SpinorInfo { read_mode: None, flash_size: 17 }.wants_4byte());
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_from_toml() {
        let config = BootConfig::from_toml_str(
            "read_opcode = 0x3b\n\n[spinor]\nread_mode = \"quad\"\nflash_size = 32\n",
        )
        .unwrap();
        assert_eq!(config.read_opcode, 0x3B);
        assert_eq!(
            config.spinor,
            Some(SpinorInfo {
                read_mode: Some(ReadMode::Quad),
                flash_size: 32
            })
        );

        let legacy = BootConfig::from_toml_str("").unwrap();
        assert_eq!(legacy, BootConfig::default());
    }
}
