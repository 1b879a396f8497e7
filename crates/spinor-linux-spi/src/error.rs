//! Error types for the spidev transport

use thiserror::Error;

/// Linux SPI specific errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// One of the setup ioctls was rejected
    #[error("failed to set {what} to {value}: {source}")]
    SetupFailed {
        what: &'static str,
        value: u32,
        #[source]
        source: std::io::Error,
    },

    /// The device is not open
    #[error("spidev device is not open")]
    NotOpen,

    /// Transaction larger than the kernel buffer
    #[error("transfer of {len} bytes exceeds spidev buffer of {max} bytes")]
    TooLarge { len: usize, max: usize },

    /// SPI_IOC_MESSAGE failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Bad option in the backend string
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device not specified
    #[error("no device specified, use dev=/dev/spidevX.Y")]
    NoDevice,
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;
