//! SPI transport trait
//!
//! The driver talks to the flash through exactly one transport. A
//! transport performs complete, synchronous transactions: chip select is
//! asserted, `tx` is clocked out, then `rx.len()` bytes are captured, and
//! chip select is released. There is no concurrent access and no async
//! variant.
//!
//! ## Example: bare-metal controller
//!
//! ```ignore
//! impl SpiTransport for SunxiSpi {
//!     fn init(&mut self) -> Result<()> {
//!         self.setup_clocks();
//!         Ok(())
//!     }
//!
//!     fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
//!         self.xfer(tx, rx).map_err(|_| Error::Transport)
//!     }
//!
//!     fn teardown(&mut self) {
//!         self.gate_clocks();
//!     }
//! }
//! ```

use crate::error::Result;

/// Synchronous full-duplex SPI transport
pub trait SpiTransport {
    /// Bring the bus up before the first transaction
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Execute one transaction
    ///
    /// Any failure must be reported as [`Error::Transport`](crate::Error::Transport).
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()>;

    /// Release the bus
    fn teardown(&mut self) {}

    /// Execute a write-only transaction
    fn write(&mut self, tx: &[u8]) -> Result<()> {
        self.transfer(tx, &mut [])
    }
}

impl<T: SpiTransport + ?Sized> SpiTransport for &mut T {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        (**self).transfer(tx, rx)
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}

// Boxed transports let host tools pick a backend at runtime
#[cfg(feature = "std")]
impl<T: SpiTransport + ?Sized> SpiTransport for std::boxed::Box<T> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        (**self).transfer(tx, rx)
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}
