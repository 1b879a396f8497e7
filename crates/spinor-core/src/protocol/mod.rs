//! Protocol implementations
//!
//! This module contains the SPI-NOR command sequences: register access,
//! the per-vendor quad-enable quirks and the block protection unlock.

mod quirks;
mod registers;
mod unlock;

pub use quirks::*;
pub use registers::*;
pub use unlock::*;
