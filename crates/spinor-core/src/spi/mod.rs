//! SPI types and command framing
//!
//! This module provides the opcodes the driver speaks, the status and
//! configuration register layouts, address widths, read modes and the
//! command frame encoder.

mod address;
mod frame;
mod read_mode;
mod status;
pub mod opcodes;

pub use address::AddressWidth;
pub use frame::{CommandFrame, FrameBytes, DUMMY_BYTE, MAX_FRAME_LEN};
pub use read_mode::{
    is_quad_read_opcode, is_read_opcode, to_3byte_read_opcode, to_4byte_read_opcode, ReadMode,
};
pub use status::{Config, Register, Status1, Status2};
