//! Register-level mock chip for unit tests
//!
//! Models the three registers, the write enable latch and busy polling,
//! and records every transaction. Array access is not modelled; the
//! end-to-end tests use `spinor-dummy` for that.

use std::vec::Vec;

use crate::error::{Error, Result};
use crate::spi::opcodes;
use crate::transport::SpiTransport;

pub(crate) struct MockChip {
    pub id: [u8; 3],
    pub sr1: u8,
    pub sr2: u8,
    pub cr: u8,
    pub wel: bool,
    /// QE bits written by software stick
    pub qe_latches: bool,
    pub supports_4byte: bool,
    /// Number of WIP polls after each write
    pub busy_polls: u32,
    pub stuck_busy: bool,
    pub fail_opcode: Option<u8>,
    busy_remaining: u32,
    log: Vec<Vec<u8>>,
}

impl MockChip {
    pub fn new(id: [u8; 3]) -> Self {
        Self {
            id,
            sr1: 0,
            sr2: 0,
            cr: 0,
            wel: false,
            qe_latches: true,
            supports_4byte: true,
            busy_polls: 0,
            stuck_busy: false,
            fail_opcode: None,
            busy_remaining: 0,
            log: Vec::new(),
        }
    }

    pub fn tx_log(&self) -> Vec<Vec<u8>> {
        self.log.clone()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Number of transactions starting with `opcode`
    pub fn count(&self, opcode: u8) -> usize {
        self.log.iter().filter(|tx| tx.first() == Some(&opcode)).count()
    }

    /// Number of register writes of any kind
    pub fn register_writes(&self) -> usize {
        self.count(opcodes::WRSR) + self.count(opcodes::WRSR2)
    }

    fn start_write(&mut self) {
        self.wel = false;
        self.busy_remaining = self.busy_polls;
    }

    fn qe_filter(&self, reg_value: u8, qe_mask: u8, old: u8) -> u8 {
        if self.qe_latches {
            reg_value
        } else {
            (reg_value & !qe_mask) | (old & qe_mask)
        }
    }
}

impl SpiTransport for MockChip {
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.log.push(tx.to_vec());
        let opcode = *tx.first().ok_or(Error::Transport)?;
        if self.fail_opcode == Some(opcode) {
            return Err(Error::Transport);
        }

        match opcode {
            opcodes::RDID => rx.copy_from_slice(&self.id[..rx.len()]),
            opcodes::RDSR => {
                let busy = self.stuck_busy || self.busy_remaining > 0;
                if self.busy_remaining > 0 {
                    self.busy_remaining -= 1;
                }
                let wip = if busy { 0x01 } else { 0x00 };
                let wel = if self.wel { 0x02 } else { 0x00 };
                rx.fill(self.sr1 | wip | wel);
            }
            opcodes::RDSR2 => rx.fill(self.sr2),
            opcodes::RDCR => rx.fill(self.cr),
            opcodes::WREN => self.wel = true,
            opcodes::WRSR if self.wel => {
                if let Some(&v) = tx.get(1) {
                    self.sr1 = self.qe_filter(v & !0x03, 0x40, self.sr1);
                }
                if let Some(&v) = tx.get(2) {
                    self.cr = self.qe_filter(v, 0x02, self.cr);
                }
                self.start_write();
            }
            opcodes::WRSR2 if self.wel => {
                if let Some(&v) = tx.get(1) {
                    self.sr2 = self.qe_filter(v, 0x02, self.sr2);
                }
                self.start_write();
            }
            opcodes::EN4B if self.supports_4byte => self.cr |= 0x20,
            opcodes::EX4B if self.supports_4byte => self.cr &= !0x20,
            opcodes::GBULK if self.wel => self.start_write(),
            _ => {}
        }
        Ok(())
    }
}
