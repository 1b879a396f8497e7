//! End-to-end driver scenarios against the emulated chip

use spinor_core::jedec::mfr;
use spinor_core::spi::{opcodes, Register, Status1, Status2};
use spinor_core::{AddressWidth, BootConfig, Error, FlashIdentity, ReadMode, SpiNor};
use spinor_dummy::{DummyConfig, DummyFlash};

fn chip(manufacturer: u8, memory_type: u8, capacity: u8) -> DummyConfig {
    DummyConfig::for_identity(FlashIdentity::new(manufacturer, memory_type, capacity))
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

#[test]
fn gigadevice_quad_read() {
    let data = pattern(8192);
    let flash = DummyFlash::with_data(chip(mfr::GIGADEVICE, 0x40, 0x18), &data);
    let mut nor = SpiNor::new(flash);

    nor.init(&BootConfig::with_spinor(Some(ReadMode::Quad), 16))
        .unwrap();

    assert_eq!(nor.session().read_opcode, opcodes::QOR);
    assert_eq!(nor.session().address_width, AddressWidth::ThreeByte);
    assert_ne!(
        nor.transport().register(Register::Status2) & Status2::QE.bits(),
        0
    );
    assert!(nor.transport().quad_enabled());

    let mut buf = vec![0u8; 4096];
    nor.read_at(0x1000, &mut buf).unwrap();
    assert_eq!(buf, data[0x1000..0x2000]);
}

#[test]
fn macronix_identity_forces_quad_read() {
    let mut nor = SpiNor::new(DummyFlash::new(chip(mfr::MACRONIX, 0x20, 0x18)));

    nor.init(&BootConfig::legacy(opcodes::FAST_READ)).unwrap();

    assert_eq!(nor.session().read_opcode, opcodes::QOR);
    assert_ne!(
        nor.transport().register(Register::Status1) & Status1::QE_MXIC.bits(),
        0
    );
}

#[test]
fn macronix_identity_forces_fast_read() {
    let mut nor = SpiNor::new(DummyFlash::new(chip(mfr::MACRONIX, 0x20, 0x1A)));

    nor.init(&BootConfig::with_spinor(Some(ReadMode::Quad), 0))
        .unwrap();

    assert_eq!(nor.session().read_opcode, opcodes::FAST_READ);
    assert_eq!(nor.transport().register_writes(), 0);
}

#[test]
fn large_flash_reads_above_16mib() {
    let mut flash = DummyFlash::new(chip(mfr::WINBOND, 0x40, 0x19));
    let payload = pattern(64);
    let addr = 0x0100_0040usize;
    flash.data_mut()[addr..addr + payload.len()].copy_from_slice(&payload);

    let mut nor = SpiNor::new(flash);
    nor.init(&BootConfig::with_spinor(Some(ReadMode::Dual), 32))
        .unwrap();

    assert_eq!(nor.session().read_opcode, opcodes::DOR_4B);
    assert_eq!(nor.session().address_width, AddressWidth::FourByte);
    assert!(nor.transport().in_4byte_mode());

    let mut buf = vec![0u8; payload.len()];
    nor.read_at(addr as u32, &mut buf).unwrap();
    assert_eq!(buf, payload);
}

#[test]
fn small_flash_falls_back_to_3byte() {
    let mut nor = SpiNor::new(DummyFlash::new(chip(mfr::WINBOND, 0x40, 0x18)));

    nor.init(&BootConfig::with_spinor(None, 32)).unwrap();

    assert_eq!(nor.session().read_opcode, opcodes::FAST_READ);
    assert_eq!(nor.session().address_width, AddressWidth::ThreeByte);
    assert_eq!(nor.transport().count(opcodes::EN4B), 1);
    assert!(!nor.transport().in_4byte_mode());
}

#[test]
fn transport_fault_during_4byte_negotiation_aborts_init() {
    let mut flash = DummyFlash::new(chip(mfr::WINBOND, 0x40, 0x19));
    flash.fail_on(opcodes::RDCR, 1);
    let mut nor = SpiNor::new(flash);

    assert_eq!(
        nor.init(&BootConfig::with_spinor(None, 32)),
        Err(Error::Transport)
    );
    assert!(!nor.session().initialized);
}

#[test]
fn unsupported_quad_vendor_fails_init() {
    let mut nor = SpiNor::new(DummyFlash::new(chip(mfr::SST, 0x26, 0x43)));

    let result = nor.init(&BootConfig::with_spinor(Some(ReadMode::Quad), 0));

    assert!(matches!(result, Err(Error::Quirk(_))));
    assert_eq!(nor.identity(), None);
    assert_eq!(nor.transport().register_writes(), 0);
}

#[test]
fn misaligned_erase_sends_nothing() {
    let mut nor = SpiNor::new(DummyFlash::new_default());
    nor.init(&BootConfig::default()).unwrap();
    nor.transport_mut().clear_log();

    assert_eq!(
        nor.erase_range(0x800, 0x1000),
        Err(Error::Alignment {
            addr: 0x800,
            len: 0x1000
        })
    );
    assert_eq!(
        nor.erase_range(0x1000, 0x1800),
        Err(Error::Alignment {
            addr: 0x1000,
            len: 0x1800
        })
    );
    assert!(nor.transport().tx_log().is_empty());
}

#[test]
fn program_stops_at_first_failed_chunk() {
    let mut flash = DummyFlash::new_default();
    flash.fail_on(opcodes::PP, 2);
    let mut nor = SpiNor::new(flash);
    nor.init(&BootConfig::default()).unwrap();

    let payload = pattern(300);
    assert_eq!(nor.program(0, &payload), Err(Error::Transport));

    let flash = nor.transport();
    assert_eq!(flash.count(opcodes::PP), 2);
    assert_eq!(flash.data()[..128], payload[..128]);
    assert!(flash.data()[128..300].iter().all(|&b| b == 0xFF));
}

#[test]
fn locked_gigadevice_is_unlocked_once() {
    let config = chip(mfr::GIGADEVICE, 0x40, 0x18).with_registers(
        Status1::BP_MASK.bits(),
        Status2::CMP.bits(),
        0,
    );
    let mut nor = SpiNor::new(DummyFlash::with_data(config, &[0u8; 8192]));
    nor.init(&BootConfig::default()).unwrap();

    nor.erase_range(0, 0x1000).unwrap();
    assert!(nor.transport().data()[..0x1000].iter().all(|&b| b == 0xFF));
    assert_eq!(nor.transport().register(Register::Status1), 0);
    assert_eq!(
        nor.transport().register(Register::Status2) & Status2::CMP.bits(),
        0
    );
    assert!(nor.session().unlocked);

    let writes = nor.transport().register_writes();
    nor.erase_range(0x1000, 0x1000).unwrap();
    nor.unlock().unwrap();
    assert_eq!(nor.transport().register_writes(), writes);
}

#[test]
fn sector_roundtrip() {
    let config = chip(mfr::WINBOND, 0x40, 0x18).with_busy_polls(3);
    let mut nor = SpiNor::new(DummyFlash::with_data(config, &[0u8; 0x4000]));
    nor.init(&BootConfig::default()).unwrap();

    let payload = pattern(4096);
    nor.erase(8, 8).unwrap();
    nor.write(8, 8, &payload).unwrap();

    let mut buf = vec![0u8; 4096];
    nor.read(8, 8, &mut buf).unwrap();
    assert_eq!(buf, payload);

    assert_eq!(nor.transport().count(opcodes::SE_20), 1);
    assert_eq!(nor.transport().count(opcodes::PP), 32);
}

#[test]
fn stuck_busy_times_out() {
    let mut nor = SpiNor::new(DummyFlash::new_default());
    nor.init(&BootConfig::default()).unwrap();
    nor.transport_mut().set_stuck_busy(true);

    assert_eq!(nor.erase_range(0, 0x1000), Err(Error::Timeout));
}

#[test]
fn init_failure_leaves_driver_uninitialized() {
    let mut flash = DummyFlash::new_default();
    flash.set_fail_init(true);
    let mut nor = SpiNor::new(flash);

    assert_eq!(nor.init(&BootConfig::default()), Err(Error::Transport));
    assert_eq!(nor.identity(), None);
    assert!(nor.transport().tx_log().is_empty());
    assert_eq!(nor.read_at(0, &mut [0u8; 16]), Err(Error::NotInitialized));

    nor.transport_mut().set_fail_init(false);
    nor.init(&BootConfig::default()).unwrap();
    assert_eq!(nor.transport().init_calls(), 1);
}

#[test]
fn absent_chip_is_not_found() {
    let mut nor = SpiNor::new(DummyFlash::new(chip(0x00, 0x00, 0x00)));
    assert_eq!(nor.init(&BootConfig::default()), Err(Error::ChipNotFound));
}

#[test]
fn exit_releases_the_bus() {
    let mut nor = SpiNor::new(DummyFlash::new_default());
    nor.init(&BootConfig::default()).unwrap();
    nor.init(&BootConfig::default()).unwrap();
    assert_eq!(nor.transport().count(opcodes::RDID), 1);

    nor.exit();
    let flash = nor.into_transport();
    assert_eq!(flash.teardown_calls(), 1);
}
