//! Data-path operations
//!
//! Byte-addressed read, 4 KiB sector erase and chunked page program on an
//! initialized session. Erase and program lazily clear block protection
//! before touching the array. None of them roll back on failure: sectors
//! erased or chunks programmed before the error stay that way.

use crate::error::{Error, Result};
use crate::protocol;
use crate::spi::{opcodes, AddressWidth, CommandFrame, MAX_FRAME_LEN};
use crate::transport::SpiTransport;

use super::session::Session;

/// Largest single read transfer
pub const READ_CHUNK: usize = 8 * 1024 * 1024;

/// Erase granularity (sector erase, opcode 0x20)
pub const ERASE_SIZE: u32 = 4096;

/// Payload bytes per page program transaction
///
/// Chunks are cut at fixed offsets from the start address, not at page
/// boundaries.
pub const PROGRAM_CHUNK: usize = 128;

/// Sector size of the boot loader's block interface
pub const SECTOR_SIZE: u32 = 512;

const PROGRAM_TX_LEN: usize = PROGRAM_CHUNK + MAX_FRAME_LEN;

/// Convert a sector range into a byte range
pub fn sectors_to_bytes(start_sector: u32, sector_count: u32) -> Result<(u32, u32)> {
    let addr = start_sector
        .checked_mul(SECTOR_SIZE)
        .ok_or(Error::AddressOverflow)?;
    let len = sector_count
        .checked_mul(SECTOR_SIZE)
        .ok_or(Error::AddressOverflow)?;
    Ok((addr, len))
}

/// Reject ranges that run past the 32-bit address space
fn check_range(addr: u32, len: usize) -> Result<()> {
    if addr as u64 + len as u64 > u32::MAX as u64 + 1 {
        return Err(Error::AddressOverflow);
    }
    Ok(())
}

fn check_initialized(session: &Session) -> Result<()> {
    if session.initialized {
        Ok(())
    } else {
        Err(Error::NotInitialized)
    }
}

/// Clear block protection once per session
///
/// The flag only flips after a successful unlock, so a failed attempt is
/// retried by the next erase or program.
pub fn ensure_unlocked<T: SpiTransport + ?Sized>(
    transport: &mut T,
    session: &mut Session,
) -> Result<()> {
    if session.unlocked {
        return Ok(());
    }

    let id = session.ready_identity().ok_or(Error::NotInitialized)?;
    protocol::unlock_chip(transport, &id)?;
    session.unlocked = true;
    Ok(())
}

/// Read flash contents
///
/// Uses the session's read opcode and address width. Large buffers are
/// split into transfers of at most [`READ_CHUNK`] bytes.
pub fn read<T: SpiTransport + ?Sized>(
    transport: &mut T,
    session: &Session,
    addr: u32,
    buf: &mut [u8],
) -> Result<()> {
    check_initialized(session)?;
    check_range(addr, buf.len())?;

    let mut offset = 0usize;
    for chunk in buf.chunks_mut(READ_CHUNK) {
        let chunk_addr = addr + offset as u32;
        let frame = CommandFrame::read(session.read_opcode, chunk_addr, session.address_width);
        let len = chunk.len();
        transport.transfer(&frame.encode(), chunk)?;
        offset += len;
    }

    Ok(())
}

fn erase_sector<T: SpiTransport + ?Sized>(transport: &mut T, addr: u32) -> Result<()> {
    protocol::write_enable(transport)?;
    let frame = CommandFrame::new(opcodes::SE_20, addr, AddressWidth::ThreeByte);
    transport.write(&frame.encode())?;
    protocol::wait_ready(transport)
}

/// Erase a region of flash
///
/// Both `addr` and `len` must be multiples of [`ERASE_SIZE`]; this is
/// checked before anything goes out on the bus. Sector addresses are
/// always sent as 3 bytes.
pub fn erase<T: SpiTransport + ?Sized>(
    transport: &mut T,
    session: &mut Session,
    addr: u32,
    len: u32,
) -> Result<()> {
    check_initialized(session)?;

    if addr % ERASE_SIZE != 0 || len % ERASE_SIZE != 0 {
        log::error!(
            "SF: erase not aligned to {} bytes: addr 0x{:08x}, len 0x{:x}",
            ERASE_SIZE,
            addr,
            len
        );
        return Err(Error::Alignment { addr, len });
    }
    check_range(addr, len as usize)?;

    ensure_unlocked(transport, session)?;

    for i in 0..len / ERASE_SIZE {
        let sector = addr + i * ERASE_SIZE;
        if let Err(e) = erase_sector(transport, sector) {
            log::error!("SF: erase failed at 0x{:08x}: {}", sector, e);
            return Err(e);
        }
    }

    Ok(())
}

fn program_chunk<T: SpiTransport + ?Sized>(transport: &mut T, addr: u32, chunk: &[u8]) -> Result<()> {
    let frame = CommandFrame::new(opcodes::PP, addr, AddressWidth::ThreeByte);
    let mut tx: heapless::Vec<u8, PROGRAM_TX_LEN> = heapless::Vec::new();
    tx.extend_from_slice(&frame.encode())
        .map_err(|_| Error::BufferTooSmall)?;
    tx.extend_from_slice(chunk)
        .map_err(|_| Error::BufferTooSmall)?;

    protocol::write_enable(transport)?;
    transport.write(&tx)?;
    protocol::wait_ready(transport)
}

/// Program data at an arbitrary byte address
///
/// The target must already be erased. Data goes out in
/// [`PROGRAM_CHUNK`]-byte transactions, each with its own write enable and
/// ready poll.
pub fn program<T: SpiTransport + ?Sized>(
    transport: &mut T,
    session: &mut Session,
    addr: u32,
    data: &[u8],
) -> Result<()> {
    check_initialized(session)?;
    check_range(addr, data.len())?;

    ensure_unlocked(transport, session)?;

    for (i, chunk) in data.chunks(PROGRAM_CHUNK).enumerate() {
        let chunk_addr = addr + (i * PROGRAM_CHUNK) as u32;
        if let Err(e) = program_chunk(transport, chunk_addr, chunk) {
            log::error!("SF: program failed at 0x{:08x}: {}", chunk_addr, e);
            return Err(e);
        }
    }

    Ok(())
}
