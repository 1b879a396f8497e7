//! Status and configuration register layouts

use bitflags::bitflags;
use core::fmt;

use super::opcodes;

/// One of the three 8-bit registers the driver touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Status register 1 (RDSR 0x05 / WRSR 0x01)
    Status1,
    /// Status register 2 (RDSR2 0x35 / WRSR2 0x31)
    Status2,
    /// Configuration register (RDCR 0x15, written as the second WRSR byte)
    Config,
}

impl Register {
    /// Opcode that reads this register
    pub const fn read_opcode(self) -> u8 {
        match self {
            Self::Status1 => opcodes::RDSR,
            Self::Status2 => opcodes::RDSR2,
            Self::Config => opcodes::RDCR,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status1 => write!(f, "SR1"),
            Self::Status2 => write!(f, "SR2"),
            Self::Config => write!(f, "CR"),
        }
    }
}

bitflags! {
    /// Status register 1
    ///
    /// Bit 6 is the quad-enable bit on Macronix/XMC parts and shares the
    /// register with the block-protect bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status1: u8 {
        /// Write In Progress / Busy
        const WIP = 0x01;
        /// Write Enable Latch
        const WEL = 0x02;
        /// Block Protect bit 0
        const BP0 = 0x04;
        /// Block Protect bit 1
        const BP1 = 0x08;
        /// Block Protect bit 2
        const BP2 = 0x10;
        /// Block Protect bit 3 (Top/Bottom on some parts)
        const BP3 = 0x20;
        /// Quad Enable (Macronix / XMC)
        const QE_MXIC = 0x40;
        /// Status Register Write Disable
        const SRWD = 0x80;

        /// All block-protect bits
        const BP_MASK = Self::BP0.bits() | Self::BP1.bits() | Self::BP2.bits() | Self::BP3.bits();
    }
}

bitflags! {
    /// Status register 2
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status2: u8 {
        /// Status Register Lock
        const SRL = 0x01;
        /// Quad Enable (GigaDevice / Adesto)
        const QE = 0x02;
        /// Complement Protect (GigaDevice)
        const CMP = 0x40;
        /// Erase/Program Suspend Status
        const SUS = 0x80;
    }
}

bitflags! {
    /// Configuration register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Config: u8 {
        /// Quad Enable (Spansion / Winbond / XTX)
        const QE = 0x02;
        /// Set while the chip is in 4-byte address mode
        const ADDR_4BYTE = 0x20;
    }
}
