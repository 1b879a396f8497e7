//! Driver handle for one SPI-NOR device

use crate::config::BootConfig;
use crate::error::Result;
use crate::jedec::FlashIdentity;
use crate::transport::SpiTransport;

use super::init;
use super::operations::{self, sectors_to_bytes};
use super::session::Session;

/// SPI-NOR driver
///
/// Owns the transport and the session state of a single chip. The boot
/// loader calls [`init`](Self::init) once and then uses the 512-byte
/// sector interface ([`read`](Self::read), [`erase`](Self::erase),
/// [`write`](Self::write)) or the byte-addressed variants.
pub struct SpiNor<T: SpiTransport> {
    transport: T,
    session: Session,
}

impl<T: SpiTransport> SpiNor<T> {
    /// Wrap a transport in an uninitialized driver
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            session: Session::new(),
        }
    }

    /// Probe the chip and negotiate the read path
    ///
    /// Does nothing if already initialized.
    pub fn init(&mut self, config: &BootConfig) -> Result<()> {
        init::initialize(&mut self.transport, &mut self.session, config)
    }

    /// Release the bus and mark the driver uninitialized
    ///
    /// The negotiated state is kept; a later `init` renegotiates it.
    pub fn exit(&mut self) {
        self.transport.teardown();
        self.session.initialized = false;
    }

    /// Remove factory block protection
    ///
    /// Runs at most once per session; erase and program call it
    /// implicitly.
    pub fn unlock(&mut self) -> Result<()> {
        operations::ensure_unlocked(&mut self.transport, &mut self.session)
    }

    /// Read `sector_count` 512-byte sectors starting at `start_sector`
    pub fn read(&mut self, start_sector: u32, sector_count: u32, buf: &mut [u8]) -> Result<()> {
        let (addr, len) = sectors_to_bytes(start_sector, sector_count)?;
        let buf = buf
            .get_mut(..len as usize)
            .ok_or(crate::Error::BufferTooSmall)?;
        self.read_at(addr, buf)
    }

    /// Erase `sector_count` 512-byte sectors starting at `start_sector`
    ///
    /// The resulting byte range must be 4 KiB aligned.
    pub fn erase(&mut self, start_sector: u32, sector_count: u32) -> Result<()> {
        let (addr, len) = sectors_to_bytes(start_sector, sector_count)?;
        self.erase_range(addr, len)
    }

    /// Program `sector_count` 512-byte sectors starting at `start_sector`
    pub fn write(&mut self, start_sector: u32, sector_count: u32, buf: &[u8]) -> Result<()> {
        let (addr, len) = sectors_to_bytes(start_sector, sector_count)?;
        let data = buf
            .get(..len as usize)
            .ok_or(crate::Error::BufferTooSmall)?;
        self.program(addr, data)
    }

    /// Read at a byte address
    pub fn read_at(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        operations::read(&mut self.transport, &self.session, addr, buf)
    }

    /// Erase a 4 KiB aligned byte range
    pub fn erase_range(&mut self, addr: u32, len: u32) -> Result<()> {
        operations::erase(&mut self.transport, &mut self.session, addr, len)
    }

    /// Program at an arbitrary byte address
    pub fn program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        operations::program(&mut self.transport, &mut self.session, addr, data)
    }

    /// The probed identity, once initialized
    pub fn identity(&self) -> Option<FlashIdentity> {
        self.session.ready_identity()
    }

    /// Current session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn into_transport(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mock::MockChip;
    use crate::spi::opcodes;

    #[test]
    fn test_sector_api_checks_buffer() {
        let mut nor = SpiNor::new(MockChip::new([0xEF, 0x40, 0x18]));
        nor.init(&BootConfig::default()).unwrap();

        let mut small = [0u8; 511];
        assert_eq!(nor.read(0, 1, &mut small), Err(Error::BufferTooSmall));
        assert_eq!(nor.write(0, 1, &small), Err(Error::BufferTooSmall));

        let mut buf = [0u8; 1024];
        nor.read(2, 2, &mut buf).unwrap();
        assert!(nor
            .transport()
            .tx_log()
            .contains(&vec![opcodes::FAST_READ, 0x00, 0x04, 0x00, 0x00]));
    }

    #[test]
    fn test_sector_erase_alignment() {
        let mut nor = SpiNor::new(MockChip::new([0xEF, 0x40, 0x18]));
        nor.init(&BootConfig::default()).unwrap();
        nor.transport_mut().clear_log();

        assert_eq!(
            nor.erase(1, 8),
            Err(Error::Alignment { addr: 0x200, len: 0x1000 })
        );
        assert!(nor.transport().tx_log().is_empty());

        nor.erase(8, 16).unwrap();
        assert_eq!(nor.transport().count(opcodes::SE_20), 2);
    }

    #[test]
    fn test_exit_and_reinit() {
        let mut nor = SpiNor::new(MockChip::new([0xC8, 0x40, 0x18]));
        assert_eq!(nor.identity(), None);
        nor.init(&BootConfig::default()).unwrap();
        assert_eq!(nor.identity(), Some(FlashIdentity::new(0xC8, 0x40, 0x18)));

        nor.exit();
        assert!(!nor.session().initialized);
        assert_eq!(nor.read_at(0, &mut [0u8; 4]), Err(Error::NotInitialized));

        nor.init(&BootConfig::default()).unwrap();
        assert_eq!(nor.transport().count(opcodes::RDID), 2);
    }

    #[test]
    fn test_unlock_before_init() {
        let mut nor = SpiNor::new(MockChip::new([0xC8, 0x40, 0x18]));
        assert_eq!(nor.unlock(), Err(Error::NotInitialized));
    }
}
