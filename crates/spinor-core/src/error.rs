//! Error types for spinor-core
//!
//! A single `no_std`, `Copy` error type is used by every layer of the
//! driver. Only a coarse status crosses the boot ABI, see [`Error::status`].

use core::fmt;

use crate::spi::Register;

/// Why the quad-enable quirk could not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuirkFailure {
    /// No quad-enable strategy is known for this manufacturer
    Unsupported(u8),
    /// The QE bit was written but did not read back as set
    NotLatched(Register),
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The SPI transport reported a failure
    Transport,
    /// The write-in-progress bit did not clear within the poll budget
    Timeout,
    /// Erase start or length is not a multiple of the sector size
    Alignment {
        /// Requested start address in bytes
        addr: u32,
        /// Requested length in bytes
        len: u32,
    },
    /// No chip answered the read-ID command
    ChipNotFound,
    /// Quad mode could not be enabled
    Quirk(QuirkFailure),
    /// The chip did not confirm the requested address mode
    AddressingNegotiation,
    /// A data-path operation was issued before `init`
    NotInitialized,
    /// Caller buffer is shorter than the requested transfer
    BufferTooSmall,
    /// Sector or byte arithmetic does not fit the 32-bit address space
    AddressOverflow,
}

impl Error {
    /// Status code for the boot loader ABI
    ///
    /// Every failure collapses to `-1`; the detail only goes to the log.
    pub const fn status(&self) -> i32 {
        -1
    }
}

/// Collapse a driver result into the `0` / `-1` convention of the boot ABI
pub fn status_of<T>(result: Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.status(),
    }
}

impl fmt::Display for QuirkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(mfr) => {
                write!(f, "no quad-enable quirk defined for manufacturer 0x{:02X}", mfr)
            }
            Self::NotLatched(reg) => write!(f, "quad-enable bit did not latch in {}", reg),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "SPI transfer failed"),
            Self::Timeout => write!(f, "timed out waiting for flash to become ready"),
            Self::Alignment { addr, len } => write!(
                f,
                "erase not sector aligned: addr 0x{:08X}, len 0x{:X}",
                addr, len
            ),
            Self::ChipNotFound => write!(f, "flash chip not found"),
            Self::Quirk(failure) => write!(f, "{}", failure),
            Self::AddressingNegotiation => write!(f, "4-byte address mode not confirmed"),
            Self::NotInitialized => write!(f, "flash driver not initialized"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::AddressOverflow => write!(f, "address out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_status_collapses_to_minus_one() {
        assert_eq!(status_of(Ok(())), 0);
        assert_eq!(status_of::<()>(Err(Error::Timeout)), -1);
        assert_eq!(
            status_of::<()>(Err(Error::Quirk(QuirkFailure::Unsupported(0x9D)))),
            -1
        );
    }

    #[test]
    fn test_display() {
        let e = Error::Alignment {
            addr: 0x1200,
            len: 0x1000,
        };
        assert_eq!(
            e.to_string(),
            "erase not sector aligned: addr 0x00001200, len 0x1000"
        );
        assert_eq!(
            Error::Quirk(QuirkFailure::NotLatched(Register::Status2)).to_string(),
            "quad-enable bit did not latch in SR2"
        );
    }
}
