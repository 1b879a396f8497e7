//! Read modes and read opcode families

use core::fmt;
use core::str::FromStr;

use super::opcodes;

/// Bus width requested for the data phase of reads
///
/// Each mode selects a read opcode family; the address width picked
/// during init then chooses the 3-byte or 4-byte member of that family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum ReadMode {
    /// Fast read on a single line (1-1-1)
    Single,
    /// Dual output fast read (1-1-2)
    Dual,
    /// Quad output fast read (1-1-4)
    Quad,
}

impl ReadMode {
    /// The 3-byte-address opcode for this mode
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Single => opcodes::FAST_READ,
            Self::Dual => opcodes::DOR,
            Self::Quad => opcodes::QOR,
        }
    }
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Dual => write!(f, "dual"),
            Self::Quad => write!(f, "quad"),
        }
    }
}

impl FromStr for ReadMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" | "1" => Ok(Self::Single),
            "dual" | "2" => Ok(Self::Dual),
            "quad" | "4" => Ok(Self::Quad),
            _ => Err("expected single, dual or quad"),
        }
    }
}

/// Returns true for the six read opcodes the driver knows how to frame
pub const fn is_read_opcode(opcode: u8) -> bool {
    matches!(
        opcode,
        opcodes::READ
            | opcodes::FAST_READ
            | opcodes::DOR
            | opcodes::QOR
            | opcodes::DOR_4B
            | opcodes::QOR_4B
    )
}

/// Returns true for read opcodes that need the quad-enable bit
pub const fn is_quad_read_opcode(opcode: u8) -> bool {
    matches!(opcode, opcodes::QOR | opcodes::QOR_4B)
}

/// Map a dual/quad read opcode to its 4-byte-address variant
///
/// Single-line opcodes have no 4-byte variant in this driver and are
/// returned unchanged.
pub const fn to_4byte_read_opcode(opcode: u8) -> u8 {
    match opcode {
        opcodes::DOR => opcodes::DOR_4B,
        opcodes::QOR => opcodes::QOR_4B,
        other => other,
    }
}

/// Map a dual/quad read opcode to its 3-byte-address variant
pub const fn to_3byte_read_opcode(opcode: u8) -> u8 {
    match opcode {
        opcodes::DOR_4B => opcodes::DOR,
        opcodes::QOR_4B => opcodes::QOR,
        other => other,
    }
}
