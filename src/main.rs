//! spinor - Drive an SPI-NOR flash through the boot-stage driver
//!
//! The host tool runs the same init, unlock, erase, program and read
//! paths a boot loader uses, on top of a runtime-selected transport:
//! - **dummy** - an in-memory chip model, for trying boot configurations
//!   against a given JEDEC ID
//! - **linux_spi** - a real chip behind `/dev/spidevX.Y`

mod backends;
mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let result = match cli.command {
        Commands::Probe { programmer, boot } => commands::run_probe(&programmer, &boot),
        Commands::Read {
            programmer,
            output,
            start,
            length,
            boot,
        } => commands::run_read(&programmer, &boot, &output, start, length),
        Commands::Write {
            programmer,
            input,
            start,
            no_erase,
            no_verify,
            boot,
        } => commands::run_write(&programmer, &boot, &input, start, no_erase, no_verify),
        Commands::Erase {
            programmer,
            start,
            length,
            boot,
        } => commands::run_erase(&programmer, &boot, start, length),
        Commands::Unlock { programmer, boot } => commands::run_unlock(&programmer, &boot),
        Commands::ListBackends => {
            print!("{}", backends::backend_help());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
