//! spinor-linux-spi - Linux spidev transport
//!
//! This crate lets the boot-stage driver run against a real SPI-NOR chip
//! wired to a Linux host, through the `/dev/spidevX.Y` device interface.
//!
//! # Example
//!
//! ```no_run
//! use spinor_core::{BootConfig, SpiNor};
//! use spinor_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! let config = LinuxSpiConfig::new("/dev/spidev0.0").with_speed(4_000_000);
//! let mut nor = SpiNor::new(LinuxSpi::new(config));
//! nor.init(&BootConfig::default())?;
//! if let Some(id) = nor.identity() {
//!     println!("JEDEC ID: {}", id);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the spinor CLI
//!
//! ```bash
//! spinor probe -p linux_spi:dev=/dev/spidev0.0
//! spinor read -p linux_spi:dev=/dev/spidev0.0,spispeed=4000,mode=3 -o flash.bin
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y` device
//! - Transactions are limited by the spidev `bufsiz` module parameter

pub mod device;
pub mod error;

// Re-exports
pub use device::{mode, parse_options, LinuxSpi, LinuxSpiConfig};
pub use error::{LinuxSpiError, Result};

/// Build a transport from backend options
///
/// The device is opened when the driver calls `init`.
///
/// - `dev=/dev/spidev0.0` - Required: device path
/// - `spispeed=4000` - Optional: speed in kHz (default: 2000)
/// - `mode=0` - Optional: SPI mode 0-3 (default: 0)
pub fn open_linux_spi(options: &[(&str, &str)]) -> Result<LinuxSpi> {
    let config = parse_options(options)?;
    Ok(LinuxSpi::new(config))
}
