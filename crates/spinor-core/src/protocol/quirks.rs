//! Vendor quad-enable quirks
//!
//! Quad output reads only work once the chip's QE bit is set, and every
//! vendor family keeps that bit somewhere else. The manufacturer byte picks
//! a [`QuadEnable`] strategy; all strategies then share one
//! verify-after-write routine.

use core::fmt;

use crate::error::{Error, QuirkFailure, Result};
use crate::jedec::{mfr, FlashIdentity};
use crate::spi::{Config, Register, Status1, Status2};
use crate::transport::SpiTransport;

use super::registers::{read_register, write_register};

/// How to turn on quad mode for a given manufacturer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadEnable {
    /// QE is bit 6 of status register 1 (Macronix, XMC)
    Macronix,
    /// QE is bit 1 of status register 2, written with 0x31 (GigaDevice, Adesto)
    GigaDevice,
    /// QE is bit 1 of the configuration register (Spansion, Winbond, XTX)
    Spansion,
    /// No strategy known for this manufacturer
    Unsupported(u8),
}

impl QuadEnable {
    /// Look up the strategy for a manufacturer ID
    pub const fn for_manufacturer(manufacturer: u8) -> Self {
        match manufacturer {
            mfr::MACRONIX | mfr::XMC => Self::Macronix,
            mfr::GIGADEVICE | mfr::ADESTO => Self::GigaDevice,
            mfr::SPANSION | mfr::WINBOND | mfr::XTX => Self::Spansion,
            other => Self::Unsupported(other),
        }
    }

    /// Register holding the QE bit and the bit mask, if any
    pub const fn location(self) -> Option<(Register, u8)> {
        match self {
            Self::Macronix => Some((Register::Status1, Status1::QE_MXIC.bits())),
            Self::GigaDevice => Some((Register::Status2, Status2::QE.bits())),
            Self::Spansion => Some((Register::Config, Config::QE.bits())),
            Self::Unsupported(_) => None,
        }
    }
}

impl From<&FlashIdentity> for QuadEnable {
    fn from(id: &FlashIdentity) -> Self {
        Self::for_manufacturer(id.manufacturer)
    }
}

impl fmt::Display for QuadEnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Macronix => write!(f, "SR1 bit 6"),
            Self::GigaDevice => write!(f, "SR2 bit 1"),
            Self::Spansion => write!(f, "CR bit 1"),
            Self::Unsupported(mfr) => write!(f, "unsupported (0x{:02x})", mfr),
        }
    }
}

/// True for parts whose quad enable is volatile and always on
///
/// Macronix/XMC parts with a memory type in the 0xBx range come up with
/// quad I/O usable and must not have SR1 rewritten.
///
/// No shipping Macronix/XMC part is known to report a 0xBx memory type,
/// so in practice every one of them takes the SR1 path. Keep the match
/// this narrow.
pub const fn has_volatile_qe(id: &FlashIdentity) -> bool {
    matches!(id.manufacturer, mfr::MACRONIX | mfr::XMC) && id.memory_type >> 4 == 0xB
}

/// Set a QE bit and verify that it latched
///
/// Does nothing if the bit already reads back as set.
pub fn set_qe_bit<T: SpiTransport + ?Sized>(transport: &mut T, reg: Register, mask: u8) -> Result<()> {
    let value = read_register(transport, reg)?;
    if value & mask != 0 {
        log::debug!("SF: QE already set in {} (0x{:02x})", reg, value);
        return Ok(());
    }

    write_register(transport, reg, value | mask)?;

    let readback = read_register(transport, reg)?;
    if readback & mask == 0 {
        log::error!(
            "SF: QE bit did not latch in {} (wrote 0x{:02x}, read 0x{:02x})",
            reg,
            value | mask,
            readback
        );
        return Err(Error::Quirk(QuirkFailure::NotLatched(reg)));
    }

    log::debug!("SF: {} 0x{:02x} -> 0x{:02x}", reg, value, readback);
    Ok(())
}

/// Enable quad mode on the probed chip
///
/// Fails without touching the bus for manufacturers with no known
/// strategy. Safe to call repeatedly.
pub fn enable_quad<T: SpiTransport + ?Sized>(transport: &mut T, id: &FlashIdentity) -> Result<()> {
    let strategy = QuadEnable::from(id);

    let (reg, mask) = match strategy.location() {
        Some(location) => location,
        None => {
            log::error!("SF: no quad-enable quirk for manufacturer 0x{:02x}", id.manufacturer);
            return Err(Error::Quirk(QuirkFailure::Unsupported(id.manufacturer)));
        }
    };

    if has_volatile_qe(id) {
        log::debug!("SF: {} has volatile QE, skipping", id);
        return Ok(());
    }

    log::debug!("SF: enabling quad mode via {}", strategy);
    set_qe_bit(transport, reg, mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChip;
    use crate::spi::opcodes;

    fn id_of(chip: &MockChip) -> FlashIdentity {
        FlashIdentity::from_bytes(chip.id)
    }

    #[test]
    fn test_strategy_table() {
        assert_eq!(QuadEnable::for_manufacturer(0xC2), QuadEnable::Macronix);
        assert_eq!(QuadEnable::for_manufacturer(0x20), QuadEnable::Macronix);
        assert_eq!(QuadEnable::for_manufacturer(0xC8), QuadEnable::GigaDevice);
        assert_eq!(QuadEnable::for_manufacturer(0x1F), QuadEnable::GigaDevice);
        assert_eq!(QuadEnable::for_manufacturer(0x01), QuadEnable::Spansion);
        assert_eq!(QuadEnable::for_manufacturer(0xEF), QuadEnable::Spansion);
        assert_eq!(QuadEnable::for_manufacturer(0x0B), QuadEnable::Spansion);
        assert_eq!(QuadEnable::for_manufacturer(0xBF), QuadEnable::Unsupported(0xBF));
    }

    #[test]
    fn test_gigadevice_sets_sr2() {
        let mut chip = MockChip::new([0xC8, 0x40, 0x18]);
        let id = id_of(&chip);
        enable_quad(&mut chip, &id).unwrap();
        assert_eq!(chip.sr2 & 0x02, 0x02);
        assert!(chip.tx_log().contains(&vec![opcodes::WRSR2, 0x02]));
    }

    #[test]
    fn test_macronix_sets_sr1_bit6() {
        let mut chip = MockChip::new([0xC2, 0x20, 0x19]);
        let id = id_of(&chip);
        enable_quad(&mut chip, &id).unwrap();
        assert_eq!(chip.sr1 & 0x40, 0x40);
        assert!(chip.tx_log().contains(&vec![opcodes::WRSR, 0x40]));
    }

    #[test]
    fn test_winbond_sets_config_through_wrsr() {
        let mut chip = MockChip::new([0xEF, 0x40, 0x18]);
        chip.sr1 = 0x04;
        let id = id_of(&chip);
        enable_quad(&mut chip, &id).unwrap();
        assert_eq!(chip.cr & 0x02, 0x02);
        assert!(chip.tx_log().contains(&vec![opcodes::WRSR, 0x04, 0x02]));
    }

    #[test]
    fn test_idempotent_for_every_strategy() {
        for id in [[0xC2, 0x20, 0x19], [0xC8, 0x40, 0x18], [0x01, 0x02, 0x19]] {
            let mut chip = MockChip::new(id);
            let identity = FlashIdentity::from_bytes(id);
            enable_quad(&mut chip, &identity).unwrap();
            let regs = (chip.sr1, chip.sr2, chip.cr);

            chip.clear_log();
            enable_quad(&mut chip, &identity).unwrap();
            assert_eq!(chip.register_writes(), 0, "second pass wrote on {}", identity);
            assert_eq!((chip.sr1, chip.sr2, chip.cr), regs);
        }
    }

    #[test]
    fn test_unknown_manufacturer_touches_nothing() {
        let mut chip = MockChip::new([0x9D, 0x60, 0x18]);
        let id = id_of(&chip);
        assert_eq!(
            enable_quad(&mut chip, &id),
            Err(Error::Quirk(QuirkFailure::Unsupported(0x9D)))
        );
        assert!(chip.tx_log().is_empty());
    }

    #[test]
    fn test_volatile_qe_skips_writes() {
        let mut chip = MockChip::new([0xC2, 0xBA, 0x19]);
        let id = id_of(&chip);
        assert!(has_volatile_qe(&id));
        enable_quad(&mut chip, &id).unwrap();
        assert!(chip.tx_log().is_empty());
    }

    #[test]
    fn test_shipping_macronix_xmc_parts_are_not_volatile() {
        for id in [
            FlashIdentity::new(0xC2, 0x20, 0x18),
            FlashIdentity::new(0xC2, 0x25, 0x38),
            FlashIdentity::new(0x20, 0x40, 0x18),
            FlashIdentity::new(0x20, 0x70, 0x19),
        ] {
            assert!(!has_volatile_qe(&id), "{}", id);
        }
    }

    #[test]
    fn test_qe_not_latched() {
        let mut chip = MockChip::new([0xC8, 0x40, 0x18]);
        chip.qe_latches = false;
        let id = id_of(&chip);
        assert_eq!(
            enable_quad(&mut chip, &id),
            Err(Error::Quirk(QuirkFailure::NotLatched(Register::Status2)))
        );
    }

    #[test]
    fn test_transport_failure_propagates() {
        let mut chip = MockChip::new([0xEF, 0x40, 0x18]);
        chip.fail_opcode = Some(opcodes::WRSR);
        let id = id_of(&chip);
        assert_eq!(enable_quad(&mut chip, &id), Err(Error::Transport));
    }
}
