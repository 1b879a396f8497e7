//! spinor-dummy - In-memory SPI-NOR chip emulator for testing
//!
//! This crate provides a [`DummyFlash`] that implements
//! [`SpiTransport`] at the byte level: it decodes every transaction the
//! way a real SPI-NOR part would (opcode, address bytes in the current
//! address mode, dummy byte, payload) and keeps status, configuration and
//! array contents in memory.
//!
//! On top of the chip model it offers what the driver tests need: a log of
//! every transaction, fault injection on the n-th occurrence of an opcode,
//! a configurable number of busy polls after each write and a chip that
//! never becomes ready.

use spinor_core::error::{Error, Result};
use spinor_core::jedec::{mfr, FlashIdentity};
use spinor_core::spi::{opcodes, Config, Register, Status1, Status2};
use spinor_core::transport::SpiTransport;

/// Size of the erase sector used by opcode 0x20
pub const SECTOR_SIZE: usize = 4096;

/// Where the emulated part keeps its quad-enable bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadModel {
    /// Quad reads work without any setup
    AlwaysOn,
    /// Quad reads need this bit set in this register
    Bit(Register, u8),
    /// The part has no quad output
    Unsupported,
}

impl QuadModel {
    /// Vendor default for a JEDEC identity
    pub fn for_identity(id: &FlashIdentity) -> Self {
        match id.manufacturer {
            mfr::MACRONIX | mfr::XMC if id.memory_type >> 4 == 0xB => Self::AlwaysOn,
            mfr::MACRONIX | mfr::XMC => Self::Bit(Register::Status1, Status1::QE_MXIC.bits()),
            mfr::GIGADEVICE | mfr::ADESTO => Self::Bit(Register::Status2, Status2::QE.bits()),
            mfr::SPANSION | mfr::WINBOND | mfr::XTX => {
                Self::Bit(Register::Config, Config::QE.bits())
            }
            _ => Self::Unsupported,
        }
    }
}

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC identity returned by 0x9F
    pub identity: FlashIdentity,
    /// Array size in bytes
    pub size: usize,
    /// Program page size; writes wrap inside a page
    pub page_size: usize,
    /// Status register 1 at power-up
    pub status1: u8,
    /// Status register 2 at power-up
    pub status2: u8,
    /// Configuration register at power-up
    pub config: u8,
    /// Quad-enable location
    pub quad: QuadModel,
    /// WIP stays set for this many status polls after each write
    pub busy_polls: u32,
    /// The part answers the 4-byte mode commands
    pub supports_4byte: bool,
    /// Written QE bits stick
    pub qe_latches: bool,
    /// Per-block lock bits are set at power-up and cleared by 0x98
    pub individual_locks: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self::for_identity(FlashIdentity::new(mfr::WINBOND, 0x40, 0x18))
    }
}

impl DummyConfig {
    /// Configuration for a part with the given identity
    ///
    /// The array size follows the capacity code, falling back to 16 MiB.
    pub fn for_identity(identity: FlashIdentity) -> Self {
        Self {
            identity,
            size: identity.size_bytes().unwrap_or(16 << 20) as usize,
            page_size: 256,
            status1: 0,
            status2: 0,
            config: 0,
            quad: QuadModel::for_identity(&identity),
            busy_polls: 0,
            supports_4byte: identity.size_bytes().is_some_and(|s| s > 16 << 20),
            qe_latches: true,
            individual_locks: false,
        }
    }

    /// Set the array size
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the power-up status registers
    pub fn with_registers(mut self, status1: u8, status2: u8, config: u8) -> Self {
        self.status1 = status1;
        self.status2 = status2;
        self.config = config;
        self
    }

    /// Set the number of busy polls after each write
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }
}

/// Transport failure scheduled on the n-th occurrence of an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fault {
    opcode: u8,
    nth: usize,
}

/// Dummy SPI-NOR chip
///
/// Emulates a flash chip in memory for testing purposes.
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    status1: u8,
    status2: u8,
    config_reg: u8,
    write_enabled: bool,
    in_4byte_mode: bool,
    locked: bool,
    busy_remaining: u32,
    stuck_busy: bool,
    fail_init: bool,
    faults: Vec<Fault>,
    log: Vec<Vec<u8>>,
    init_calls: usize,
    teardown_calls: usize,
}

impl DummyFlash {
    /// Create a new dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            data,
            status1: config.status1,
            status2: config.status2,
            config_reg: config.config,
            write_enabled: false,
            in_4byte_mode: false,
            locked: config.individual_locks,
            busy_remaining: 0,
            stuck_busy: false,
            fail_init: false,
            faults: Vec::new(),
            log: Vec::new(),
            init_calls: 0,
            teardown_calls: 0,
            config,
        }
    }

    /// Create a new dummy flash with default configuration (W25Q128)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Current value of a register
    pub fn register(&self, reg: Register) -> u8 {
        match reg {
            Register::Status1 => self.status1,
            Register::Status2 => self.status2,
            Register::Config => self.config_reg,
        }
    }

    /// Overwrite a register, bypassing the write enable latch
    pub fn set_register(&mut self, reg: Register, value: u8) {
        match reg {
            Register::Status1 => self.status1 = value,
            Register::Status2 => self.status2 = value,
            Register::Config => self.config_reg = value,
        }
    }

    /// True while the chip is in 4-byte address mode
    pub fn in_4byte_mode(&self) -> bool {
        self.in_4byte_mode
    }

    /// True while the per-block locks are engaged
    pub fn individually_locked(&self) -> bool {
        self.locked
    }

    /// Keep WIP set forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Make `SpiTransport::init` fail
    pub fn set_fail_init(&mut self, fail: bool) {
        self.fail_init = fail;
    }

    /// Fail the `nth` (1-based) transaction that starts with `opcode`
    pub fn fail_on(&mut self, opcode: u8, nth: usize) {
        self.faults.push(Fault { opcode, nth });
    }

    /// Every transaction seen so far, outgoing bytes only
    pub fn tx_log(&self) -> &[Vec<u8>] {
        &self.log
    }

    /// Forget the transaction log
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Number of logged transactions starting with `opcode`
    pub fn count(&self, opcode: u8) -> usize {
        self.log
            .iter()
            .filter(|tx| tx.first() == Some(&opcode))
            .count()
    }

    /// Number of status/configuration register writes
    pub fn register_writes(&self) -> usize {
        self.count(opcodes::WRSR) + self.count(opcodes::WRSR2)
    }

    /// Number of `init` calls on the transport
    pub fn init_calls(&self) -> usize {
        self.init_calls
    }

    /// Number of `teardown` calls on the transport
    pub fn teardown_calls(&self) -> usize {
        self.teardown_calls
    }

    /// True if the quad output path is usable right now
    pub fn quad_enabled(&self) -> bool {
        match self.config.quad {
            QuadModel::AlwaysOn => true,
            QuadModel::Bit(reg, mask) => self.register(reg) & mask != 0,
            QuadModel::Unsupported => false,
        }
    }

    fn protected(&self) -> bool {
        let bp = Status1::from_bits_retain(self.status1).intersects(Status1::BP_MASK);
        let cmp = Status2::from_bits_retain(self.status2).contains(Status2::CMP);
        bp || cmp || self.locked
    }

    fn start_write(&mut self) {
        self.write_enabled = false;
        self.busy_remaining = self.config.busy_polls;
    }

    fn busy(&self) -> bool {
        self.stuck_busy || self.busy_remaining > 0
    }

    fn address_bytes(&self, opcode: u8) -> usize {
        if self.in_4byte_mode || matches!(opcode, opcodes::DOR_4B | opcodes::QOR_4B) {
            4
        } else {
            3
        }
    }

    /// Split an addressed transaction into (address, payload after address)
    fn decode_address<'a>(&self, tx: &'a [u8]) -> Result<(usize, &'a [u8])> {
        let n = self.address_bytes(tx[0]);
        if self.data.is_empty() {
            log::warn!("dummy: opcode 0x{:02x} on an empty array", tx[0]);
            return Err(Error::Transport);
        }
        if tx.len() < 1 + n {
            log::warn!("dummy: short frame for opcode 0x{:02x}", tx[0]);
            return Err(Error::Transport);
        }
        let addr = tx[1..1 + n]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        Ok((addr % self.data.len(), &tx[1 + n..]))
    }

    fn qe_filter(&self, reg: Register, old: u8, new: u8) -> u8 {
        match self.config.quad {
            QuadModel::Bit(qe_reg, mask) if qe_reg == reg && !self.config.qe_latches => {
                (new & !mask) | (old & mask)
            }
            _ => new,
        }
    }

    fn handle_read(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let (addr, rest) = self.decode_address(tx)?;
        let dummy = usize::from(tx[0] != opcodes::READ);
        if rest.len() != dummy {
            log::warn!(
                "dummy: read 0x{:02x} with {} trailing bytes, expected {}",
                tx[0],
                rest.len(),
                dummy
            );
            return Err(Error::Transport);
        }

        if matches!(tx[0], opcodes::QOR | opcodes::QOR_4B) && !self.quad_enabled() {
            // IO2/IO3 float with QE clear
            rx.fill(0xFF);
            return Ok(());
        }

        let size = self.data.len();
        for (i, byte) in rx.iter_mut().enumerate() {
            *byte = self.data[(addr + i) % size];
        }
        Ok(())
    }

    fn handle_page_program(&mut self, tx: &[u8]) -> Result<()> {
        if !self.write_enabled {
            return Ok(());
        }
        let (addr, payload) = self.decode_address(tx)?;
        self.start_write();
        if self.protected() {
            log::debug!("dummy: program at 0x{:x} ignored, protected", addr);
            return Ok(());
        }

        let page = self.config.page_size;
        let base = addr - addr % page;
        for (i, &byte) in payload.iter().enumerate() {
            // Flash programming: can only change 1 -> 0
            let offset = base + (addr % page + i) % page;
            if let Some(cell) = self.data.get_mut(offset) {
                *cell &= byte;
            }
        }
        Ok(())
    }

    fn handle_sector_erase(&mut self, tx: &[u8]) -> Result<()> {
        if !self.write_enabled {
            return Ok(());
        }
        let (addr, _) = self.decode_address(tx)?;
        self.start_write();
        if self.protected() {
            log::debug!("dummy: erase at 0x{:x} ignored, protected", addr);
            return Ok(());
        }

        let start = addr & !(SECTOR_SIZE - 1);
        let end = core::cmp::min(start + SECTOR_SIZE, self.data.len());
        self.data[start..end].fill(0xFF);
        Ok(())
    }

    fn handle_write_status(&mut self, tx: &[u8]) {
        if !self.write_enabled {
            return;
        }
        if let Some(&v) = tx.get(1) {
            let v = Status1::from_bits_retain(v).difference(Status1::WIP | Status1::WEL);
            self.status1 = self.qe_filter(Register::Status1, self.status1, v.bits());
        }
        if let Some(&v) = tx.get(2) {
            // ADDR_4BYTE is read-only, it tracks the address mode
            let keep = self.config_reg & Config::ADDR_4BYTE.bits();
            let v = (v & !Config::ADDR_4BYTE.bits()) | keep;
            self.config_reg = self.qe_filter(Register::Config, self.config_reg, v);
        }
        self.start_write();
    }

    fn handle_write_status2(&mut self, tx: &[u8]) {
        if !self.write_enabled {
            return;
        }
        if let Some(&v) = tx.get(1) {
            self.status2 = self.qe_filter(Register::Status2, self.status2, v);
        }
        self.start_write();
    }

    fn set_4byte_mode(&mut self, enable: bool) {
        if !self.config.supports_4byte {
            return;
        }
        self.in_4byte_mode = enable;
        if enable {
            self.config_reg |= Config::ADDR_4BYTE.bits();
        } else {
            self.config_reg &= !Config::ADDR_4BYTE.bits();
        }
    }

    fn injected_fault(&self, opcode: u8) -> bool {
        let seen = self.count(opcode);
        self.faults
            .iter()
            .any(|f| f.opcode == opcode && f.nth == seen)
    }
}

impl SpiTransport for DummyFlash {
    fn init(&mut self) -> Result<()> {
        if self.fail_init {
            return Err(Error::Transport);
        }
        self.init_calls += 1;
        Ok(())
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let opcode = *tx.first().ok_or(Error::Transport)?;
        self.log.push(tx.to_vec());
        if self.injected_fault(opcode) {
            log::debug!("dummy: injected fault on 0x{:02x}", opcode);
            return Err(Error::Transport);
        }

        match opcode {
            opcodes::RDID => {
                let id = self.config.identity.to_bytes();
                for (i, byte) in rx.iter_mut().enumerate() {
                    *byte = id.get(i).copied().unwrap_or(0);
                }
            }

            opcodes::RDSR => {
                let mut status = Status1::from_bits_retain(self.status1);
                status.set(Status1::WIP, self.busy());
                status.set(Status1::WEL, self.write_enabled);
                if self.busy_remaining > 0 {
                    self.busy_remaining -= 1;
                }
                rx.fill(status.bits());
            }
            opcodes::RDSR2 => rx.fill(self.status2),
            opcodes::RDCR => rx.fill(self.config_reg),

            opcodes::WREN => self.write_enabled = true,
            opcodes::WRSR => self.handle_write_status(tx),
            opcodes::WRSR2 => self.handle_write_status2(tx),

            opcodes::READ
            | opcodes::FAST_READ
            | opcodes::DOR
            | opcodes::QOR
            | opcodes::DOR_4B
            | opcodes::QOR_4B => self.handle_read(tx, rx)?,

            opcodes::PP => self.handle_page_program(tx)?,
            opcodes::SE_20 => self.handle_sector_erase(tx)?,

            opcodes::EN4B => self.set_4byte_mode(true),
            opcodes::EX4B => self.set_4byte_mode(false),

            opcodes::GBULK => {
                if self.write_enabled {
                    self.locked = false;
                    self.start_write();
                }
            }

            other => {
                log::warn!("dummy: unsupported opcode 0x{:02x}", other);
                return Err(Error::Transport);
            }
        }

        Ok(())
    }

    fn teardown(&mut self) {
        self.teardown_calls += 1;
    }
}
