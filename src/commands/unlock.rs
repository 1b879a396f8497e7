//! Unlock command implementation

use super::{open_target, CmdResult};
use crate::cli::BootArgs;
use spinor_core::protocol;

/// Clear factory block protection and show the resulting status
pub fn run_unlock(programmer: &str, boot: &BootArgs) -> CmdResult {
    let mut target = open_target(programmer, boot)?;

    let before = protocol::read_status1(target.nor.transport_mut())?;
    target.nor.unlock()?;
    let after = protocol::read_status1(target.nor.transport_mut())?;

    if before == after {
        println!("Block protection clear (SR1 0x{:02X})", after);
    } else {
        println!("Unlocked: SR1 0x{:02X} -> 0x{:02X}", before, after);
    }

    Ok(())
}
