//! Factory write-protection removal
//!
//! Several vendors ship parts with block protection set. Before the first
//! erase or program the protect bits are cleared; everything else in the
//! status registers is left alone.

use crate::error::Result;
use crate::jedec::{mfr, FlashIdentity};
use crate::spi::{Status1, Status2};
use crate::transport::SpiTransport;

use super::registers::{read_status1, read_status2, write_status1, write_status2};

/// Manufacturers whose parts may leave the factory with protect bits set
pub const fn ships_locked(manufacturer: u8) -> bool {
    matches!(
        manufacturer,
        mfr::ATMEL | mfr::SST | mfr::ESMT | mfr::GIGADEVICE | mfr::MACRONIX
    )
}

/// Manufacturers with per-block lock bits cleared by the global unlock
pub const fn has_individual_locks(manufacturer: u8) -> bool {
    matches!(
        manufacturer,
        mfr::WINBOND | mfr::MACRONIX | mfr::XTX | mfr::XMC
    )
}

/// Clear the GigaDevice complement-protect bit if it is set
fn clear_complement_protect<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<()> {
    let sr2 = Status2::from_bits_retain(read_status2(transport)?);
    if sr2.contains(Status2::CMP) {
        let new = sr2.difference(Status2::CMP);
        write_status2(transport, new.bits())?;
        log::info!("SF: SR2 0x{:02x} -> 0x{:02x}", sr2.bits(), new.bits());
    }
    Ok(())
}

/// Clear the block-protect bits in status register 1
///
/// Macronix keeps its QE bit in the same register, so that one bit is
/// carried over.
pub fn clear_block_protection<T: SpiTransport + ?Sized>(
    transport: &mut T,
    id: &FlashIdentity,
) -> Result<()> {
    if id.manufacturer == mfr::GIGADEVICE {
        clear_complement_protect(transport)?;
    }

    let sr1 = Status1::from_bits_retain(read_status1(transport)?)
        .difference(Status1::WIP | Status1::WEL);
    let target = if id.manufacturer == mfr::MACRONIX {
        sr1.intersection(Status1::QE_MXIC)
    } else {
        Status1::empty()
    };

    if sr1 != target {
        write_status1(transport, target.bits())?;
        log::info!("SF: SR1 0x{:02x} -> 0x{:02x}", sr1.bits(), target.bits());
    }
    Ok(())
}

/// Clear every individual block lock with the global unlock command
#[cfg(feature = "individual-lock")]
pub fn individual_block_unlock<T: SpiTransport + ?Sized>(
    transport: &mut T,
    id: &FlashIdentity,
) -> Result<()> {
    if has_individual_locks(id.manufacturer) {
        log::debug!("SF: global block unlock");
        super::registers::global_block_unlock(transport)?;
    }
    Ok(())
}

/// Remove write protection from the probed chip
///
/// Chips outside the ships-locked set see no register writes.
pub fn unlock_chip<T: SpiTransport + ?Sized>(transport: &mut T, id: &FlashIdentity) -> Result<()> {
    if ships_locked(id.manufacturer) {
        clear_block_protection(transport, id)?;
    }

    #[cfg(feature = "individual-lock")]
    individual_block_unlock(transport, id)?;

    Ok(())
}
