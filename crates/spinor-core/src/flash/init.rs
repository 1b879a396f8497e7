//! Init sequence
//!
//! Runs once per session: probe the chip, pick the read opcode and address
//! width, apply the per-part overrides, enable quad mode when a quad read
//! was selected, then commit everything to the [`Session`].

use crate::config::BootConfig;
use crate::error::{Error, Result};
use crate::jedec::{mfr, FlashIdentity};
use crate::protocol;
use crate::spi::{
    is_quad_read_opcode, is_read_opcode, opcodes, to_3byte_read_opcode, to_4byte_read_opcode,
    AddressWidth,
};
use crate::transport::SpiTransport;

use super::session::Session;

/// Parts whose read opcode is forced regardless of the boot configuration
const READ_OPCODE_OVERRIDES: &[(FlashIdentity, u8)] = &[
    (
        FlashIdentity::new(mfr::MACRONIX, 0x20, 0x1A),
        opcodes::FAST_READ,
    ),
    (FlashIdentity::new(mfr::MACRONIX, 0x20, 0x18), opcodes::QOR),
];

/// Read the JEDEC ID, treating a failed read or a zero manufacturer as
/// an absent chip
pub fn probe<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<FlashIdentity> {
    let id = match protocol::read_identity(transport) {
        Ok(id) => id,
        Err(e) => {
            log::error!("SF: failed to read ID: {}", e);
            return Err(Error::ChipNotFound);
        }
    };

    if id.manufacturer == 0x00 {
        log::error!("SF: no chip answered (ID {})", id);
        return Err(Error::ChipNotFound);
    }

    Ok(id)
}

/// Choose the read opcode and address width for a requested opcode
///
/// Only a boot configuration with an SPI-NOR block declaring more than
/// 16 MiB tries 4-byte mode. If the chip does not confirm it, the 3-byte
/// opcode is used instead; transport failures still abort. Opcodes outside
/// the known read set leave fast read in place.
pub fn negotiate_read<T: SpiTransport + ?Sized>(
    transport: &mut T,
    config: &BootConfig,
    requested: u8,
) -> Result<(u8, AddressWidth)> {
    if !is_read_opcode(requested) {
        log::warn!(
            "SF: ignoring unknown read opcode 0x{:02x}, using 0x{:02x}",
            requested,
            opcodes::FAST_READ
        );
        return Ok((opcodes::FAST_READ, AddressWidth::ThreeByte));
    }

    let wants_4byte = config.spinor.is_some_and(|info| info.wants_4byte());
    if wants_4byte {
        match protocol::set_4byte_mode(transport, true) {
            Ok(()) => return Ok((to_4byte_read_opcode(requested), AddressWidth::FourByte)),
            Err(Error::AddressingNegotiation) => {
                log::warn!("SF: falling back to 3-byte addressing");
            }
            Err(e) => return Err(e),
        }
    }

    Ok((to_3byte_read_opcode(requested), AddressWidth::ThreeByte))
}

/// Apply the per-part read opcode overrides
pub fn apply_identity_overrides(id: &FlashIdentity, opcode: u8) -> u8 {
    match READ_OPCODE_OVERRIDES.iter().find(|(part, _)| part == id) {
        Some(&(_, forced)) => {
            log::info!("SF: fix cmd {:02x} to {:02x}", opcode, forced);
            forced
        }
        None => opcode,
    }
}

/// Run the init sequence on `session`
///
/// Idempotent: an initialized session returns immediately without bus
/// traffic. On failure nothing is committed and the session stays
/// uninitialized.
pub fn initialize<T: SpiTransport + ?Sized>(
    transport: &mut T,
    session: &mut Session,
    config: &BootConfig,
) -> Result<()> {
    if session.initialized {
        return Ok(());
    }

    let requested = config.requested_read_opcode();

    transport.init()?;

    let id = probe(transport)?;
    let (opcode, width) = negotiate_read(transport, config, requested)?;
    let opcode = apply_identity_overrides(&id, opcode);

    log::info!(
        "SF: {} id {}, read cmd {:02x}, {}",
        id.vendor_name(),
        id,
        opcode,
        width
    );

    if is_quad_read_opcode(opcode) {
        if let Err(e) = protocol::enable_quad(transport, &id) {
            log::error!("SF: quad enable failed: {}", e);
            return Err(e);
        }
    }

    session.identity = Some(id);
    session.read_opcode = opcode;
    session.address_width = width;
    session.initialized = true;
    Ok(())
}
