//! Status/config register accessors and identification
//!
//! Every register write follows the same sequence: write enable, the write
//! command with its payload, then a bounded busy poll. A poll that runs out
//! of budget fails the calling operation with [`Error::Timeout`]; nothing
//! at this layer retries.

use crate::error::{Error, Result};
use crate::jedec::FlashIdentity;
use crate::spi::{opcodes, Config, Register, Status1};
use crate::transport::SpiTransport;

/// Maximum number of status polls before giving up on WIP
pub const POLL_BUDGET: u32 = 0x10000;

/// Read the JEDEC ID
pub fn read_identity<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<FlashIdentity> {
    let mut id = [0u8; 3];
    transport.transfer(&[opcodes::RDID], &mut id)?;
    Ok(FlashIdentity::from_bytes(id))
}

/// Read one of the three registers
pub fn read_register<T: SpiTransport + ?Sized>(transport: &mut T, reg: Register) -> Result<u8> {
    let mut buf = [0u8; 1];
    transport.transfer(&[reg.read_opcode()], &mut buf)?;
    Ok(buf[0])
}

/// Read the status register 1
pub fn read_status1<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<u8> {
    read_register(transport, Register::Status1)
}

/// Read the status register 2
pub fn read_status2<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<u8> {
    read_register(transport, Register::Status2)
}

/// Read the configuration register
pub fn read_config<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<u8> {
    read_register(transport, Register::Config)
}

/// Send the Write Enable command
///
/// The latch is followed by a status read; some controllers need the extra
/// transaction before the next command. Its value is not checked.
pub fn write_enable<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<()> {
    transport.write(&[opcodes::WREN])?;
    let _ = read_status1(transport);
    Ok(())
}

/// Check whether the chip has finished the last program/erase/write
pub fn is_ready<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<bool> {
    let status = Status1::from_bits_retain(read_status1(transport)?);
    Ok(!status.contains(Status1::WIP))
}

/// Wait for the WIP (Write In Progress) bit to clear
///
/// Polls back to back; there is no timer this early in boot, so the
/// budget is a count of status reads.
pub fn wait_ready<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<()> {
    for _ in 0..POLL_BUDGET {
        if is_ready(transport)? {
            return Ok(());
        }
    }

    log::error!("SF: timeout waiting for WIP to clear");
    Err(Error::Timeout)
}

/// Write the status register 1
pub fn write_status1<T: SpiTransport + ?Sized>(transport: &mut T, value: u8) -> Result<()> {
    write_enable(transport)?;
    transport.write(&[opcodes::WRSR, value])?;
    wait_ready(transport)
}

/// Write the status register 2 with its dedicated command
pub fn write_status2<T: SpiTransport + ?Sized>(transport: &mut T, value: u8) -> Result<()> {
    write_enable(transport)?;
    transport.write(&[opcodes::WRSR2, value])?;
    wait_ready(transport)
}

/// Write the configuration register
///
/// The configuration byte rides behind status register 1 in a 3-byte WRSR,
/// so SR1 is read first and written back unchanged.
pub fn write_config<T: SpiTransport + ?Sized>(transport: &mut T, value: u8) -> Result<()> {
    let sr1 = read_status1(transport)?;
    write_enable(transport)?;
    transport.write(&[opcodes::WRSR, sr1, value])?;
    wait_ready(transport)
}

/// Write one of the three registers with the command that register needs
pub fn write_register<T: SpiTransport + ?Sized>(
    transport: &mut T,
    reg: Register,
    value: u8,
) -> Result<()> {
    match reg {
        Register::Status1 => write_status1(transport, value),
        Register::Status2 => write_status2(transport, value),
        Register::Config => write_config(transport, value),
    }
}

/// Enter or exit 4-byte address mode and confirm it took
///
/// The mode command carries no address or payload. The chip reports its
/// current mode in bit 5 of the configuration register; a mismatch yields
/// [`Error::AddressingNegotiation`] so the caller can fall back to 3-byte
/// addressing.
pub fn set_4byte_mode<T: SpiTransport + ?Sized>(transport: &mut T, enable: bool) -> Result<()> {
    let opcode = if enable { opcodes::EN4B } else { opcodes::EX4B };
    transport.write(&[opcode])?;

    let cr = Config::from_bits_retain(read_config(transport)?);
    if cr.contains(Config::ADDR_4BYTE) == enable {
        log::info!(
            "SF: 4-byte address mode {}",
            if enable { "entered" } else { "exited" }
        );
        Ok(())
    } else {
        log::warn!("SF: 4-byte address mode not confirmed (CR=0x{:02x})", cr.bits());
        Err(Error::AddressingNegotiation)
    }
}

/// Clear every individual block/sector lock bit
pub fn global_block_unlock<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<()> {
    write_enable(transport)?;
    transport.write(&[opcodes::GBULK])?;
    let _ = read_status1(transport);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChip;

    #[test]
    fn test_read_identity() {
        let mut chip = MockChip::new([0xC8, 0x40, 0x18]);
        let id = read_identity(&mut chip).unwrap();
        assert_eq!(id, FlashIdentity::new(0xC8, 0x40, 0x18));
        assert_eq!(chip.tx_log(), vec![vec![0x9F]]);
    }

    #[test]
    fn test_write_status1_sequence() {
        let mut chip = MockChip::new([0xC2, 0x20, 0x18]);
        chip.busy_polls = 2;
        write_status1(&mut chip, 0x40).unwrap();

        let log = chip.tx_log();
        assert_eq!(log[0], vec![opcodes::WREN]);
        assert_eq!(log[1], vec![opcodes::RDSR]);
        assert_eq!(log[2], vec![opcodes::WRSR, 0x40]);
        // Two busy polls then one ready poll
        assert_eq!(&log[3..], &[vec![0x05], vec![0x05], vec![0x05]]);
        assert_eq!(chip.sr1, 0x40);
    }

    #[test]
    fn test_write_config_carries_sr1() {
        let mut chip = MockChip::new([0xEF, 0x40, 0x18]);
        chip.sr1 = 0x1C;
        write_config(&mut chip, 0x02).unwrap();

        assert!(chip.tx_log().contains(&vec![opcodes::WRSR, 0x1C, 0x02]));
        assert_eq!(chip.sr1, 0x1C);
        assert_eq!(chip.cr, 0x02);
    }

    #[test]
    fn test_write_status2_uses_dedicated_opcode() {
        let mut chip = MockChip::new([0xC8, 0x40, 0x18]);
        write_register(&mut chip, Register::Status2, 0x02).unwrap();
        assert!(chip.tx_log().contains(&vec![opcodes::WRSR2, 0x02]));
        assert_eq!(chip.sr2, 0x02);
    }

    #[test]
    fn test_wait_ready_times_out() {
        let mut chip = MockChip::new([0xC8, 0x40, 0x18]);
        chip.stuck_busy = true;
        assert_eq!(wait_ready(&mut chip), Err(Error::Timeout));
        assert_eq!(chip.count(opcodes::RDSR), POLL_BUDGET as usize);
    }

    #[test]
    fn test_timeout_aborts_register_write() {
        let mut chip = MockChip::new([0xC8, 0x40, 0x18]);
        chip.stuck_busy = true;
        assert_eq!(write_status2(&mut chip, 0x02), Err(Error::Timeout));
    }

    #[test]
    fn test_transport_error_stops_polling() {
        let mut chip = MockChip::new([0xC8, 0x40, 0x18]);
        chip.stuck_busy = true;
        chip.fail_opcode = Some(opcodes::RDSR);
        assert_eq!(wait_ready(&mut chip), Err(Error::Transport));
        assert_eq!(chip.count(opcodes::RDSR), 1);
    }

    #[test]
    fn test_4byte_mode_confirmed() {
        let mut chip = MockChip::new([0xC2, 0x20, 0x19]);
        chip.supports_4byte = true;
        set_4byte_mode(&mut chip, true).unwrap();
        assert_eq!(chip.tx_log(), vec![vec![0xB7], vec![0x15]]);
        set_4byte_mode(&mut chip, false).unwrap();
        assert_eq!(chip.cr & 0x20, 0);
    }

    #[test]
    fn test_4byte_mode_not_confirmed() {
        let mut chip = MockChip::new([0xEF, 0x40, 0x19]);
        chip.supports_4byte = false;
        assert_eq!(
            set_4byte_mode(&mut chip, true),
            Err(Error::AddressingNegotiation)
        );
    }
}
