//! Command frame structure
//!
//! A frame is the header clocked out at the start of every addressed
//! transaction: opcode, address and an optional dummy byte. Payload bytes
//! (page program) or response bytes (reads) follow it in the same
//! transfer.

use core::ops::Deref;

use super::{opcodes, AddressWidth};

/// Longest possible header: opcode + 4 address bytes + dummy
pub const MAX_FRAME_LEN: usize = 6;

/// Value clocked out during the dummy cycle
pub const DUMMY_BYTE: u8 = 0x00;

/// Header of one addressed SPI transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandFrame {
    /// The opcode byte
    pub opcode: u8,
    /// Byte address on the chip
    pub address: u32,
    /// Number of address bytes to send
    pub width: AddressWidth,
    /// Append one dummy byte after the address
    pub dummy: bool,
}

impl CommandFrame {
    /// Frame for a command with an address and no dummy cycle (PP, SE)
    pub const fn new(opcode: u8, address: u32, width: AddressWidth) -> Self {
        Self {
            opcode,
            address,
            width,
            dummy: false,
        }
    }

    /// Frame for a read command
    ///
    /// Every read opcode except the slow legacy `READ` needs a dummy byte
    /// before data comes back.
    pub const fn read(opcode: u8, address: u32, width: AddressWidth) -> Self {
        Self {
            opcode,
            address,
            width,
            dummy: opcode != opcodes::READ,
        }
    }

    /// Number of bytes [`encode`](Self::encode) produces
    pub const fn len(&self) -> usize {
        1 + self.width.bytes() + self.dummy as usize
    }

    /// Always false; a frame carries at least the opcode
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Encode the frame into its wire bytes
    pub fn encode(&self) -> FrameBytes {
        let mut buf = [0u8; MAX_FRAME_LEN];
        buf[0] = self.opcode;
        let addr_end = 1 + self.width.bytes();
        self.width.encode(self.address, &mut buf[1..addr_end]);
        if self.dummy {
            buf[addr_end] = DUMMY_BYTE;
        }
        FrameBytes {
            buf,
            len: self.len(),
        }
    }
}

/// Encoded frame, borrowed as `&[u8]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBytes {
    buf: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl FrameBytes {
    /// The encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Deref for FrameBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}
