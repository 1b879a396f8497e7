//! spinor-core - Boot-stage SPI-NOR flash driver
//!
//! This crate brings up a raw SPI-NOR flash chip from an early boot stage:
//! it probes the JEDEC ID, negotiates the read opcode and address width,
//! enables quad mode where the vendor needs it, clears factory block
//! protection and then streams data with sector erase, page program and
//! bulk read operations.
//!
//! It is `no_std` and does not allocate. All bus traffic goes through a
//! single [`transport::SpiTransport`] owned by the driver.
//!
//! # Features
//!
//! - `std` - Enable `std::error::Error`, serde support and TOML boot configs
//! - `individual-lock` - Also issue the global block unlock on chips with
//!   per-block lock bits
//!
//! # Example
//!
//! ```ignore
//! use spinor_core::{BootConfig, SpiNor};
//!
//! fn load_stage2<T: spinor_core::transport::SpiTransport>(bus: T, dst: &mut [u8]) {
//!     let mut nor = SpiNor::new(bus);
//!     if nor.init(&BootConfig::default()).is_ok() {
//!         let sectors = (dst.len() / 512) as u32;
//!         nor.read(64, sectors, dst).ok();
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

pub mod config;
pub mod error;
pub mod flash;
pub mod jedec;
pub mod protocol;
pub mod spi;
pub mod transport;

#[cfg(test)]
mod mock;

pub use config::{BootConfig, SpinorInfo};
pub use error::{Error, QuirkFailure, Result};
pub use flash::{Session, SpiNor};
pub use jedec::FlashIdentity;
pub use spi::{AddressWidth, ReadMode};
