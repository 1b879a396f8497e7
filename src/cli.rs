//! CLI argument parsing

use clap::{Parser, Subcommand};
use spinor_core::ReadMode;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a read opcode, hex with or without the 0x prefix
fn parse_opcode(s: &str) -> Result<u8, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid opcode: {}", e))
}

const BACKEND_HELP: &str =
    "Backend to use, e.g. dummy:mfr=c8,type=40,cap=18 or linux_spi:dev=/dev/spidev0.0";

#[derive(Parser)]
#[command(name = "spinor")]
#[command(
    author,
    version,
    about = "Drive an SPI-NOR flash the way the boot stage does",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Boot configuration options shared across commands
///
/// Without any of these the driver takes the legacy path with fast read.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BootArgs {
    /// Boot configuration file (TOML format)
    #[arg(long)]
    pub boot_config: Option<PathBuf>,

    /// Requested read mode (single, dual, quad)
    #[arg(long)]
    pub read_mode: Option<ReadMode>,

    /// Declared flash size in MiB; above 16 the driver tries 4-byte mode
    #[arg(long)]
    pub flash_size: Option<u32>,

    /// Raw read opcode from a legacy boot header (hex, e.g. 3b)
    #[arg(long, value_parser = parse_opcode)]
    pub read_opcode: Option<u8>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the driver and show what it negotiated
    Probe {
        /// Backend to use
        #[arg(short, long, help = BACKEND_HELP)]
        programmer: String,

        #[command(flatten)]
        boot: BootArgs,
    },

    /// Read flash contents to file
    Read {
        /// Backend to use
        #[arg(short, long, help = BACKEND_HELP)]
        programmer: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Number of bytes to read (default: rest of the chip)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,

        #[command(flatten)]
        boot: BootArgs,
    },

    /// Write file to flash
    Write {
        /// Backend to use
        #[arg(short, long, help = BACKEND_HELP)]
        programmer: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Don't erase before writing
        #[arg(long)]
        no_erase: bool,

        /// Skip the read-back comparison
        #[arg(long)]
        no_verify: bool,

        #[command(flatten)]
        boot: BootArgs,
    },

    /// Erase 4 KiB sectors
    Erase {
        /// Backend to use
        #[arg(short, long, help = BACKEND_HELP)]
        programmer: String,

        /// Start address, 4 KiB aligned (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Length of region to erase, 4 KiB aligned (default: rest of the chip)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,

        #[command(flatten)]
        boot: BootArgs,
    },

    /// Clear factory block protection
    Unlock {
        /// Backend to use
        #[arg(short, long, help = BACKEND_HELP)]
        programmer: String,

        #[command(flatten)]
        boot: BootArgs,
    },

    /// List available backends
    ListBackends,
}
