//! CLI command implementations

mod erase;
mod probe;
mod read;
mod unlock;
mod write;

pub use erase::run_erase;
pub use probe::run_probe;
pub use read::run_read;
pub use unlock::run_unlock;
pub use write::run_write;

use crate::backends;
use crate::cli::BootArgs;
use indicatif::{ProgressBar, ProgressStyle};
use spinor_core::transport::SpiTransport;
use spinor_core::{AddressWidth, BootConfig, SpiNor, SpinorInfo};

/// Result type shared by every command
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// An initialized driver on an opened backend
///
/// The bus is released when the target is dropped, including on error
/// paths.
pub struct Target {
    /// The driver
    pub nor: SpiNor<Box<dyn SpiTransport>>,
    /// Boot configuration the driver was initialized with
    pub config: BootConfig,
    /// Largest read the backend takes in one transaction
    pub max_read_len: usize,
}

impl Target {
    /// Chip size from the JEDEC capacity byte, else the declared size
    pub fn chip_size(&self) -> Option<u32> {
        self.nor.identity().and_then(|id| id.size_bytes()).or_else(|| {
            self.config
                .spinor
                .filter(|info| info.flash_size > 0)
                .and_then(|info| info.flash_size.checked_mul(1024 * 1024))
        })
    }

    /// Byte count from `start` to the end of the chip
    pub fn rest_of_chip(&self, start: u32) -> Result<u32, Box<dyn std::error::Error>> {
        let size = self
            .chip_size()
            .ok_or("Cannot determine chip size; pass --length or --flash-size")?;
        size.checked_sub(start)
            .filter(|len| *len > 0)
            .ok_or_else(|| {
                format!(
                    "Start address 0x{:08X} is outside the chip (0x{:08X} bytes)",
                    start, size
                )
                .into()
            })
    }

    /// Refuse erase and program while the chip is in 4-byte mode
    ///
    /// Both always send 3-byte frames, which a chip in 4-byte mode
    /// misreads.
    pub fn check_writable(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.nor.session().address_width == AddressWidth::FourByte {
            return Err("Erase/program use 3-byte addressing but the chip is in 4-byte mode; \
                 re-run without --flash-size above 16"
                .into());
        }
        Ok(())
    }
}

impl Drop for Target {
    fn drop(&mut self) {
        self.nor.exit();
    }
}

/// Build the boot configuration from a config file and command-line overrides
pub fn boot_config(args: &BootArgs) -> Result<BootConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.boot_config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            BootConfig::from_toml_str(&text)
                .map_err(|e| format!("Invalid boot config {}: {}", path.display(), e))?
        }
        None => BootConfig::default(),
    };

    if let Some(opcode) = args.read_opcode {
        config.read_opcode = opcode;
    }

    if args.read_mode.is_some() || args.flash_size.is_some() {
        let info = config.spinor.get_or_insert_with(SpinorInfo::default);
        if let Some(mode) = args.read_mode {
            info.read_mode = Some(mode);
        }
        if let Some(size) = args.flash_size {
            info.flash_size = size;
        }
    }

    Ok(config)
}

/// Open a backend and initialize the driver on it
pub fn open_target(
    programmer: &str,
    boot: &BootArgs,
) -> Result<Target, Box<dyn std::error::Error>> {
    let config = boot_config(boot)?;
    log::debug!("Boot config: {:?}", config);

    let backend = backends::open_backend(programmer)?;
    let mut target = Target {
        nor: SpiNor::new(backend.transport),
        config,
        max_read_len: backend.max_read_len.max(1),
    };

    target
        .nor
        .init(&target.config)
        .map_err(|e| format!("Flash init failed: {}", e))?;

    if let Some(id) = target.nor.identity() {
        println!("Found: {} flash (ID {})", id.vendor_name(), id);
    }

    Ok(target)
}

/// Byte progress bar in the style used by every command
pub fn progress_bar(total: u64, phase: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
