//! Write command implementation

use super::erase::erase_with_progress;
use super::read::read_with_progress;
use super::{open_target, progress_bar, CmdResult, Target};
use crate::cli::BootArgs;
use spinor_core::flash::operations::ERASE_SIZE;
use std::path::Path;

/// Bytes handed to the driver per program call
const WRITE_CHUNK_SIZE: usize = 4096;

/// Run the write command
pub fn run_write(
    programmer: &str,
    boot: &BootArgs,
    input: &Path,
    start: u32,
    no_erase: bool,
    no_verify: bool,
) -> CmdResult {
    let data = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", data.len(), input);

    if data.is_empty() {
        return Err("Input file is empty".into());
    }
    let length = u32::try_from(data.len()).map_err(|_| "Input file is too large")?;

    if !no_erase && start % ERASE_SIZE != 0 {
        return Err(format!(
            "Start address 0x{:08X} is not {} byte aligned (use --no-erase to program only)",
            start, ERASE_SIZE
        )
        .into());
    }

    let mut target = open_target(programmer, boot)?;
    target.check_writable()?;

    if let Some(size) = target.chip_size() {
        let end = start as u64 + length as u64;
        if end > size as u64 {
            return Err(format!(
                "Write range 0x{:08X}..0x{:08X} is outside chip bounds (0x{:08X})",
                start, end, size
            )
            .into());
        }
    }

    if !no_erase {
        let erase_len = length
            .div_ceil(ERASE_SIZE)
            .checked_mul(ERASE_SIZE)
            .ok_or("Erase range overflows the address space")?;
        erase_with_progress(&mut target, start, erase_len)?;
    }

    write_with_progress(&mut target, start, &data)?;

    if !no_verify {
        let readback = read_with_progress(&mut target, start, length, "Verifying")?;
        if let Some(offset) = first_mismatch(&data, &readback) {
            return Err(format!(
                "Verification failed at 0x{:08X}: expected 0x{:02X}, got 0x{:02X}",
                start as usize + offset,
                data[offset],
                readback[offset]
            )
            .into());
        }
        println!("Verified {} bytes", length);
    }

    println!("Wrote {} bytes at 0x{:08X}", length, start);
    Ok(())
}

fn write_with_progress(
    target: &mut Target,
    start: u32,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = progress_bar(data.len() as u64, "Writing");

    let mut offset = 0usize;
    for chunk in data.chunks(WRITE_CHUNK_SIZE) {
        target.nor.program(start + offset as u32, chunk)?;
        offset += chunk.len();
        pb.set_position(offset as u64);
    }

    pb.finish_and_clear();
    Ok(())
}

/// Offset of the first byte that differs
fn first_mismatch(expected: &[u8], actual: &[u8]) -> Option<usize> {
    expected
        .iter()
        .zip(actual)
        .position(|(a, b)| a != b)
        .or_else(|| (expected.len() != actual.len()).then(|| expected.len().min(actual.len())))
}
