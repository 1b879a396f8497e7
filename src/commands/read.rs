//! Read command implementation

use super::{open_target, progress_bar, CmdResult, Target};
use crate::cli::BootArgs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Run the read command
pub fn run_read(
    programmer: &str,
    boot: &BootArgs,
    output: &Path,
    start: u32,
    length: Option<u32>,
) -> CmdResult {
    let mut target = open_target(programmer, boot)?;

    let length = match length {
        Some(len) => len,
        None => target.rest_of_chip(start)?,
    };

    let data = read_with_progress(&mut target, start, length, "Reading")?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!(
        "Read {} bytes from 0x{:08X} to {:?}",
        data.len(),
        start,
        output
    );

    Ok(())
}

/// Read a byte range in backend-sized chunks with a progress bar
pub(super) fn read_with_progress(
    target: &mut Target,
    start: u32,
    length: u32,
    phase: &str,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let total = length as usize;
    let mut data = vec![0u8; total];

    let pb = progress_bar(total as u64, phase);

    let mut offset = 0usize;
    while offset < total {
        let chunk_size = std::cmp::min(target.max_read_len, total - offset);
        let addr = start
            .checked_add(offset as u32)
            .ok_or("Read range overflows the address space")?;

        target
            .nor
            .read_at(addr, &mut data[offset..offset + chunk_size])?;

        offset += chunk_size;
        pb.set_position(offset as u64);
    }

    pb.finish_and_clear();
    Ok(data)
}
