//! Erase command implementation

use super::{open_target, progress_bar, CmdResult, Target};
use crate::cli::BootArgs;
use spinor_core::flash::operations::ERASE_SIZE;

/// Run the erase command
pub fn run_erase(
    programmer: &str,
    boot: &BootArgs,
    start: u32,
    length: Option<u32>,
) -> CmdResult {
    let mut target = open_target(programmer, boot)?;
    target.check_writable()?;

    let length = match length {
        Some(len) => len,
        None => target.rest_of_chip(start)?,
    };

    if start % ERASE_SIZE != 0 || length % ERASE_SIZE != 0 {
        return Err(format!(
            "Erase range 0x{:08X}+0x{:X} is not {} byte aligned",
            start, length, ERASE_SIZE
        )
        .into());
    }

    erase_with_progress(&mut target, start, length)?;
    println!("Erased {} bytes starting at 0x{:08X}", length, start);

    Ok(())
}

/// Erase an aligned range one sector at a time with a progress bar
pub(super) fn erase_with_progress(
    target: &mut Target,
    start: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = progress_bar(length as u64, "Erasing");

    let mut done = 0u32;
    while done < length {
        let addr = start
            .checked_add(done)
            .ok_or("Erase range overflows the address space")?;
        target.nor.erase_range(addr, ERASE_SIZE)?;
        done += ERASE_SIZE;
        pb.set_position(done as u64);
    }

    pb.finish_and_clear();
    Ok(())
}
