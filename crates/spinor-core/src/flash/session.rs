//! Session state for one flash device

use crate::jedec::FlashIdentity;
use crate::spi::{opcodes, AddressWidth};

/// Runtime state negotiated during init and consumed by the data path
///
/// `initialized` and the negotiated fields only change inside init (and
/// `exit`); `unlocked` goes from false to true once, on the first erase or
/// program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// JEDEC ID read during init
    pub identity: Option<FlashIdentity>,
    /// Init completed
    pub initialized: bool,
    /// Block protection has been cleared
    pub unlocked: bool,
    /// Address width used for read frames
    pub address_width: AddressWidth,
    /// Opcode used for array reads
    pub read_opcode: u8,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            identity: None,
            initialized: false,
            unlocked: false,
            address_width: AddressWidth::ThreeByte,
            read_opcode: opcodes::FAST_READ,
        }
    }
}

impl Session {
    /// A fresh, uninitialized session
    pub fn new() -> Self {
        Self::default()
    }

    /// The probed identity, if init has completed
    pub fn ready_identity(&self) -> Option<FlashIdentity> {
        if self.initialized {
            self.identity
        } else {
            None
        }
    }
}
