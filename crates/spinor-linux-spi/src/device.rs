//! spidev transport
//!
//! [`LinuxSpi`] implements [`SpiTransport`] on top of `/dev/spidevX.Y`.
//! The device is opened by `init` and closed by `teardown`, so it follows
//! the bus lifecycle of the driver.

use crate::error::{LinuxSpiError, Result};

use spinor_core::error::{Error as CoreError, Result as CoreResult};
use spinor_core::transport::SpiTransport;

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default SPI clock speed in Hz (2 MHz)
const DEFAULT_SPEED_HZ: u32 = 2_000_000;

/// SPI mode constants
pub mod mode {
    /// SPI mode 0: CPOL=0, CPHA=0
    pub const MODE_0: u8 = 0;
    /// SPI mode 3: CPOL=1, CPHA=1
    pub const MODE_3: u8 = 3;
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    const SPI_IOC_MAGIC: u8 = b'k';

    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of struct spi_ioc_transfer
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(spi_ioc_transfer)])
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// Kernel struct spi_ioc_transfer
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    _pad: u8,
}

impl SpiIocTransfer {
    fn tx(buf: &[u8], speed_hz: u32) -> Self {
        Self {
            tx_buf: buf.as_ptr() as u64,
            len: buf.len() as u32,
            speed_hz,
            bits_per_word: 8,
            ..Default::default()
        }
    }

    fn rx(buf: &mut [u8], speed_hz: u32) -> Self {
        Self {
            rx_buf: buf.as_mut_ptr() as u64,
            len: buf.len() as u32,
            speed_hz,
            bits_per_word: 8,
            ..Default::default()
        }
    }
}

/// Configuration for a spidev transport
#[derive(Debug, Clone)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz (default: 2 MHz)
    pub speed_hz: u32,
    /// SPI mode (0-3, default: 0)
    pub mode: u8,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: mode::MODE_0,
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode (0-3)
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }
}

/// SPI transport over Linux spidev
pub struct LinuxSpi {
    config: LinuxSpiConfig,
    file: Option<File>,
    max_kernel_buf_size: usize,
}

impl LinuxSpi {
    /// Create a transport for the device; nothing is opened yet
    pub fn new(config: LinuxSpiConfig) -> Self {
        Self {
            config,
            file: None,
            max_kernel_buf_size: get_max_kernel_buf_size(),
        }
    }

    /// Open and configure the device
    pub fn open(&mut self) -> Result<()> {
        if self.config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: opening device {}", self.config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: self.config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();
        let setup_err = |what, value, e: nix::errno::Errno| LinuxSpiError::SetupFailed {
            what,
            value,
            source: std::io::Error::from_raw_os_error(e as i32),
        };

        let mode = self.config.mode;
        unsafe { ioctl::spi_ioc_wr_mode(fd, &mode) }
            .map_err(|e| setup_err("mode", mode as u32, e))?;

        let bits: u8 = 8;
        unsafe { ioctl::spi_ioc_wr_bits_per_word(fd, &bits) }
            .map_err(|e| setup_err("bits per word", bits as u32, e))?;

        let speed = self.config.speed_hz;
        unsafe { ioctl::spi_ioc_wr_max_speed_hz(fd, &speed) }
            .map_err(|e| setup_err("clock speed", speed, e))?;

        log::info!(
            "linux_spi: opened {} (mode={}, speed={} kHz, bufsiz={})",
            self.config.device,
            mode,
            speed / 1000,
            self.max_kernel_buf_size
        );

        self.file = Some(file);
        Ok(())
    }

    /// Close the device
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            log::debug!("linux_spi: closed {}", self.config.device);
        }
    }

    /// Largest transaction (command plus data) the kernel accepts
    pub fn max_transfer_len(&self) -> usize {
        self.max_kernel_buf_size
    }

    /// The configuration this transport was built with
    pub fn config(&self) -> &LinuxSpiConfig {
        &self.config
    }

    /// One chip-select-framed transaction: write phase, then read phase
    fn spi_transfer(&mut self, write_data: &[u8], read_buf: &mut [u8]) -> Result<()> {
        let fd = self.file.as_ref().ok_or(LinuxSpiError::NotOpen)?.as_raw_fd();

        let len = write_data.len() + read_buf.len();
        if len > self.max_kernel_buf_size {
            return Err(LinuxSpiError::TooLarge {
                len,
                max: self.max_kernel_buf_size,
            });
        }

        let speed = self.config.speed_hz;
        let mut transfers = vec![SpiIocTransfer::tx(write_data, speed)];
        if !read_buf.is_empty() {
            transfers.push(SpiIocTransfer::rx(read_buf, speed));
        }

        let ioctl_num = ioctl::spi_ioc_message(transfers.len() as u8);
        let ret = unsafe { libc::ioctl(fd, ioctl_num, transfers.as_ptr()) };
        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        Ok(())
    }
}

impl SpiTransport for LinuxSpi {
    fn init(&mut self) -> CoreResult<()> {
        if self.file.is_some() {
            return Ok(());
        }
        self.open().map_err(|e| {
            log::error!("linux_spi: {}", e);
            CoreError::Transport
        })
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> CoreResult<()> {
        self.spi_transfer(tx, rx).map_err(|e| {
            log::error!("linux_spi: {}", e);
            CoreError::Transport
        })
    }

    fn teardown(&mut self) {
        self.close();
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                return size;
            }
        }
        log::warn!("linux_spi: invalid buffer size in {}", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    log::debug!("linux_spi: using page size {} as buffer size", page_size);
    page_size
}

/// Parse backend options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxSpiConfig> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                // Speed in kHz
                config.speed_hz = value
                    .parse::<u32>()
                    .ok()
                    .and_then(|khz| khz.checked_mul(1000))
                    .ok_or_else(|| {
                        LinuxSpiError::InvalidParameter(format!("spispeed={}", value))
                    })?;
            }
            "mode" => {
                let mode: u8 = value
                    .parse()
                    .ok()
                    .filter(|m| *m <= mode::MODE_3)
                    .ok_or_else(|| {
                        LinuxSpiError::InvalidParameter(format!("mode={} (must be 0-3)", value))
                    })?;
                config.mode = mode;
            }
            _ => {
                log::warn!("linux_spi: unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err(LinuxSpiError::NoDevice);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("dev", "/dev/spidev1.0"),
            ("spispeed", "4000"),
            ("mode", "3"),
        ])
        .unwrap();
        assert_eq!(config.device, "/dev/spidev1.0");
        assert_eq!(config.speed_hz, 4_000_000);
        assert_eq!(config.mode, 3);
    }

    #[test]
    fn test_parse_options_rejects_bad_values() {
        assert!(matches!(parse_options(&[]), Err(LinuxSpiError::NoDevice)));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("mode", "4")]),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "fast")]),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "4294968")]),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_transfer_before_init_fails() {
        let mut spi = LinuxSpi::new(LinuxSpiConfig::new("/dev/spidev0.0"));
        assert_eq!(spi.transfer(&[0x9F], &mut [0u8; 3]), Err(CoreError::Transport));
    }

    #[test]
    fn test_init_reports_missing_device() {
        let mut spi = LinuxSpi::new(LinuxSpiConfig::new("/nonexistent/spidev9.9"));
        assert_eq!(spi.init(), Err(CoreError::Transport));
        assert!(matches!(spi.open(), Err(LinuxSpiError::OpenFailed { .. })));
    }
}
